//! Draw & Collect - draw strokes that turn into physics, guide balls into a cup
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stroke pipeline, physics world, scoring)
//! - `renderer`: CPU tessellation of the world into triangle lists
//! - `settings`: Data-driven tuning with JSON overrides

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one step per camera frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions (screen space, y grows downward)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;
    /// Downward gravity (pixels/s²)
    pub const GRAVITY: f32 = 900.0;

    /// Ground line sits this far above the bottom edge
    pub const GROUND_OFFSET: f32 = 50.0;
    pub const GROUND_THICKNESS: f32 = 5.0;
    pub const GROUND_ELASTICITY: f32 = 0.9;

    /// Friction shared by every surface unless overridden
    pub const DEFAULT_FRICTION: f32 = 0.8;

    /// Stroke sampling
    pub const STROKE_MIN_SPACING: f32 = 10.0;
    pub const STROKE_EPSILON: f32 = 4.0;
    pub const PROVISIONAL_EDGE_THICKNESS: f32 = 2.0;

    /// Finalized curve bodies
    pub const CURVE_SEGMENT_RADIUS: f32 = 3.0;
    pub const CURVE_LINEAR_DENSITY: f32 = 0.1;
    pub const CURVE_ELASTICITY: f32 = 0.5;
    /// Single-point strokes become a ball this big
    pub const DOT_RADIUS: f32 = 5.0;

    /// Balls dropped from the top each level
    pub const BALL_RADIUS: f32 = 12.0;
    pub const BALL_MASS_PER_AREA: f32 = 0.06;
    pub const BALL_ELASTICITY: f32 = 0.5;
    pub const BALL_SPAWN_MARGIN: f32 = 50.0;

    /// Cup geometry (a trapezoid open at the top)
    pub const CUP_BASE_RADIUS: f32 = 35.0;
    pub const CUP_RIM_RADIUS: f32 = 60.0;
    pub const CUP_HEIGHT: f32 = 80.0;
    pub const CUP_FLOOR_OFFSET: f32 = 57.0;
    pub const CUP_MARGIN: f32 = 100.0;
}
