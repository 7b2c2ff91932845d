//! Geometry kernel: vectors, angles, and intersection tests.
//!
//! All functions are pure and operate on plain `(f32, f32)` tuples.
//! Angles are degrees in `0..360`, measured counter-clockwise from +X.
//!
//! Angle comparisons go through [`angle_delta`], which folds the 0/360
//! wraparound. Comparing raw differences gives 340 where the real arc is 20;
//! every heading check in the crate must use the shortest arc.

/// A position in arena coordinates
pub type Point = (f32, f32);

/// A displacement in arena coordinates
pub type Vec2 = (f32, f32);

/// Vector from `from` to `to`
#[inline]
pub fn vector(from: Point, to: Point) -> Vec2 {
    (to.0 - from.0, to.1 - from.1)
}

/// Length of a vector
#[inline]
pub fn magnitude(v: Vec2) -> f32 {
    (v.0 * v.0 + v.1 * v.1).sqrt()
}

/// Squared length of a vector (for comparisons without sqrt overhead)
#[inline]
pub fn magnitude_squared(v: Vec2) -> f32 {
    v.0 * v.0 + v.1 * v.1
}

/// Normalize a vector to unit length.
///
/// Returns `(0.0, 0.0)` for near-zero vectors.
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let mag = magnitude(v);
    if mag < 1e-6 {
        (0.0, 0.0)
    } else {
        (v.0 / mag, v.1 / mag)
    }
}

/// Distance between two points
#[inline]
pub fn distance(a: Point, b: Point) -> f32 {
    magnitude(vector(a, b))
}

/// Squared distance between two points
#[inline]
pub fn distance_squared(a: Point, b: Point) -> f32 {
    magnitude_squared(vector(a, b))
}

/// Rotate a vector counter-clockwise by `degrees`
pub fn rotate(v: Vec2, degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    (v.0 * cos - v.1 * sin, v.0 * sin + v.1 * cos)
}

/// Direction of a vector in degrees, normalized to `0..360`.
///
/// Zero-length vectors report 0.
pub fn direction(v: Vec2) -> f32 {
    let deg = v.1.atan2(v.0).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// Point at `dist` from `origin` along `direction_deg`
pub fn point_at(origin: Point, direction_deg: f32, dist: f32) -> Point {
    let rad = direction_deg.to_radians();
    (origin.0 + rad.cos() * dist, origin.1 + rad.sin() * dist)
}

/// Shortest-arc distance between two headings in degrees.
///
/// `angle_delta(350.0, 10.0)` is 20, not 340.
#[inline]
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// True if the closed segment `p1..p2` passes within `radius` of `center`.
///
/// Covers both "is the line of fire clear of this teammate" and "does the
/// straight path cross this danger zone".
pub fn segment_circle_intersects(p1: Point, p2: Point, center: Point, radius: f32) -> bool {
    let seg = vector(p1, p2);
    let len2 = magnitude_squared(seg);
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((center.0 - p1.0) * seg.0 + (center.1 - p1.1) * seg.1) / len2).clamp(0.0, 1.0)
    };
    let closest = (p1.0 + seg.0 * t, p1.1 + seg.1 * t);
    distance_squared(closest, center) <= radius * radius
}

/// True if `p` lies inside the arena rectangle, `margin` in from every wall
#[inline]
pub fn within_bounds(p: Point, width: f32, height: f32, margin: f32) -> bool {
    p.0 >= margin && p.0 <= width - margin && p.1 >= margin && p.1 <= height - margin
}
