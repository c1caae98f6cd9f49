//! Game state and core simulation types
//!
//! Everything the tick mutates lives here: the physics world, the open stroke
//! and the handles that tell cup, balls and drawn bodies apart.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::composite::{BuildError, CompositeBody, build_composite};
use super::stroke::StrokeLifecycle;
use super::world::{BodyDesc, BodyHandle, EdgeHandle, PhysicsBackend, World};
use crate::settings::Settings;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Between levels, waiting for the host to start the next one
    Menu,
    /// Level running: strokes are accepted and physics advances
    Playing,
}

/// Something the host may want to react to (sound, HUD flash, logging)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: u32, balls: usize },
    StrokeCommitted { body: BodyHandle, points: usize },
    DotCommitted { body: BodyHandle },
    StrokeRejected { reason: BuildError },
    StrokeAborted { removed_edges: usize },
    RoundScored { balls_in_cup: u32, total: u64 },
}

/// RNG state wrapper for serialization
///
/// Each level draws from its own stream so layouts replay exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// RNG for the current stream, then move to the next one
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::seed_from_u64(self.seed.wrapping_add(self.stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)));
        self.stream += 1;
        rng
    }
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    /// Level currently being played (0 before the first one starts)
    pub level: u32,
    /// Cumulative score across rounds
    pub score: u64,
    /// Balls inside the cup as of the last tick
    pub balls_in_cup: u32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Last pointer position seen (for the cursor ring)
    pub pointer: Option<Vec2>,
    pub settings: Settings,
    pub world: World,
    pub stroke: StrokeLifecycle,
    pub ground: Option<EdgeHandle>,
    pub cup: Option<BodyHandle>,
    /// Balls to collect, in spawn order
    pub balls: Vec<BodyHandle>,
    /// Bodies created from finished strokes, in creation order
    pub drawn: Vec<BodyHandle>,
    /// Events raised by the last tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, settings: Settings) -> Self {
        Self {
            seed,
            rng_state: RngState::new(seed),
            level: 0,
            score: 0,
            balls_in_cup: 0,
            phase: GamePhase::Menu,
            time_ticks: 0,
            pointer: None,
            world: World::new(settings.physics),
            settings,
            stroke: StrokeLifecycle::new(),
            ground: None,
            cup: None,
            balls: Vec::new(),
            drawn: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Add the ground edge once; later calls return the existing edge
    pub fn ensure_ground(&mut self) -> EdgeHandle {
        if let Some(ground) = self.ground {
            return ground;
        }
        let arena = self.settings.arena;
        let y = arena.height - arena.ground_offset;
        let ground = self.world.add_static_edge(
            Vec2::new(0.0, y),
            Vec2::new(arena.width, y),
            arena.ground_thickness,
            arena.ground_friction,
            arena.ground_elasticity,
        );
        self.ground = Some(ground);
        ground
    }

    /// Place a cup whose base is centred on `base_center`
    pub fn spawn_cup(&mut self, base_center: Vec2) -> Result<BodyHandle, BuildError> {
        let body = cup_body(&self.settings, base_center)?;
        let handle = self.world.add_body(body.into());
        self.cup = Some(handle);
        Ok(handle)
    }

    /// Drop a ball to be collected
    pub fn spawn_ball(&mut self, position: Vec2) -> BodyHandle {
        let ball = self.settings.ball;
        let handle = self.world.add_body(BodyDesc::ball(
            position,
            ball.radius,
            ball.mass_for(ball.radius),
            ball.friction,
            ball.elasticity,
        ));
        self.balls.push(handle);
        handle
    }

    /// Remove the cup, balls, drawn bodies and any open stroke
    ///
    /// The ground stays.
    pub fn clear_level(&mut self) {
        let removed = self.stroke.cancel(&mut self.world);
        if removed > 0 {
            log::debug!("Discarded open stroke with {removed} edges");
        }
        for handle in self.drawn.drain(..).chain(self.balls.drain(..)).chain(self.cup.take()) {
            self.world.remove_body(handle);
        }
        self.balls_in_cup = 0;
    }
}

/// Cup outline: rim-left, base-left, base-right, rim-right
pub fn cup_outline(base_radius: f32, rim_radius: f32, height: f32, base_center: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(base_center.x - rim_radius, base_center.y - height),
        Vec2::new(base_center.x - base_radius, base_center.y),
        Vec2::new(base_center.x + base_radius, base_center.y),
        Vec2::new(base_center.x + rim_radius, base_center.y - height),
    ]
}

/// The cup is a dynamic curve like any drawn stroke
pub fn cup_body(settings: &Settings, base_center: Vec2) -> Result<CompositeBody, BuildError> {
    let cup = settings.cup;
    let outline = cup_outline(cup.base_radius, cup.rim_radius, cup.height, base_center);
    build_composite(&outline, &settings.curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_streams_replay() {
        let mut a = RngState::new(42);
        let mut b = RngState::new(42);
        let first: u32 = a.next_rng().random();
        assert_eq!(first, b.next_rng().random::<u32>());
        let second: u32 = a.next_rng().random();
        assert_ne!(first, second);
        assert_eq!(a.stream, 2);
    }

    #[test]
    fn test_ground_created_once() {
        let mut state = GameState::new(1, Settings::default());
        let g1 = state.ensure_ground();
        let g2 = state.ensure_ground();
        assert_eq!(g1, g2);
        assert_eq!(state.world.edges().len(), 1);
        assert_eq!(state.world.edges()[0].a.y, 550.0);
    }

    #[test]
    fn test_cup_outline_order() {
        let q = cup_outline(35.0, 60.0, 80.0, Vec2::new(400.0, 543.0));
        assert_eq!(q[0], Vec2::new(340.0, 463.0));
        assert_eq!(q[1], Vec2::new(365.0, 543.0));
        assert_eq!(q[2], Vec2::new(435.0, 543.0));
        assert_eq!(q[3], Vec2::new(460.0, 463.0));
    }

    #[test]
    fn test_cup_body_has_three_walls() {
        let body = cup_body(&Settings::default(), Vec2::new(400.0, 543.0)).unwrap();
        assert_eq!(body.shapes.len(), 3);
        assert!(body.mass > 0.0);
    }

    #[test]
    fn test_clear_level_keeps_ground() {
        let mut state = GameState::new(3, Settings::default());
        state.ensure_ground();
        state.spawn_cup(Vec2::new(400.0, 543.0)).unwrap();
        state.spawn_ball(Vec2::new(200.0, 0.0));
        state.stroke.begin();
        let stroke_settings = state.settings.stroke;
        state.stroke.sample(&mut state.world, Some(Vec2::new(10.0, 10.0)), &stroke_settings);
        state.stroke.sample(&mut state.world, Some(Vec2::new(40.0, 10.0)), &stroke_settings);
        assert_eq!(state.world.edges().len(), 2);

        state.clear_level();
        assert!(state.world.bodies().is_empty());
        assert!(state.cup.is_none());
        assert!(state.balls.is_empty());
        assert_eq!(state.world.edges().len(), 1);
    }
}
