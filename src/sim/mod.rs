//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by handle)
//! - No rendering or platform dependencies

pub mod composite;
pub mod containment;
pub mod score;
pub mod simplify;
pub mod state;
pub mod stroke;
pub mod tick;
pub mod world;

pub use composite::{BuildError, Capsule, CompositeBody, CurveMaterial, build_composite};
pub use containment::{Quad, is_inside_quad};
pub use score::{balls_in_cup, cup_quad};
pub use simplify::simplify;
pub use state::{GameEvent, GamePhase, GameState};
pub use stroke::{StrokeLifecycle, StrokeOutcome, StrokePhase};
pub use tick::{TickInput, end_round, start_level, tick};
pub use world::{Body, BodyDesc, BodyHandle, BodyShape, EdgeHandle, PhysicsBackend, World, WorldConfig};
