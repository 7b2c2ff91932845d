//! Tuning constants for the coordination core.
//!
//! Grouped by concern so call sites read as `unit::RADIUS`, `arena::WALL_MARGIN`.

// ============================================================
// Unit geometry
// ============================================================
pub mod unit {
    /// Collision radius of a drone body (world units)
    pub const RADIUS: f32 = 14.0;

    /// Radius of a fired projectile
    pub const PROJECTILE_RADIUS: f32 = 4.0;

    /// Clearance a fire line must keep from a teammate's center.
    /// Two body radii (shooter-side and teammate-side slop) plus the projectile.
    pub const FIRE_LINE_CLEARANCE: f32 = 2.0 * RADIUS + PROJECTILE_RADIUS;

    /// Minimum separation between two teammates' standoff points
    pub const ENVELOPE: f32 = 2.0 * RADIUS;
}

// ============================================================
// Arena bounds
// ============================================================
pub mod arena {
    /// Safety margin kept from arena walls when placing standoff points
    pub const WALL_MARGIN: f32 = 30.0;
}

// ============================================================
// Combat thresholds
// ============================================================
pub mod combat {
    /// Health fraction below which an agent breaks off and returns home
    pub const REPAIR_THRESHOLD: f32 = 0.35;

    /// Health fraction at which a repaired agent resumes its role
    pub const RESUME_THRESHOLD: f32 = 0.9;

    /// A base with a live enemy agent inside this range counts as defended
    pub const BASE_GUARD_RANGE: f32 = 220.0;

    /// Fraction of weapon range used as the preferred attack standoff
    pub const STANDOFF_RANGE_FACTOR: f32 = 0.9;
}

// ============================================================
// Formation rings
// ============================================================
pub mod formation {
    /// Defense slots maintained around the home base
    pub const DEFENSE_SLOTS: u8 = 4;

    /// Radius of the defense ring around the home base
    pub const DEFENSE_RING_RADIUS: f32 = 120.0;

    /// Siege slots maintained around an undefended enemy base
    pub const SIEGE_SLOTS: u8 = 6;
}

// ============================================================
// Position solver search budget
// ============================================================
pub mod solver {
    /// Candidate points sampled per standoff ring
    pub const RING_STEPS: usize = 24;

    /// Fallback ring scale factors, tried in order until one yields a candidate
    pub const RING_SCALES: [f32; 3] = [1.0, 0.75, 0.5];

    /// Candidate points sampled when fleeing
    pub const FLEE_STEPS: usize = 16;
}
