//! Fixed timestep simulation tick
//!
//! One tick: consume input, drive the stroke state machine, step physics,
//! then recount the balls in the cup.

use glam::Vec2;
use rand::Rng;

use super::score::balls_in_cup;
use super::state::{GameEvent, GamePhase, GameState};
use super::stroke::StrokeOutcome;
use super::world::PhysicsBackend;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tracked fingertip position, `None` when no hand was detected
    pub pointer: Option<Vec2>,
    /// Pen down (edge-triggered)
    pub draw_start: bool,
    /// Pen up (edge-triggered)
    pub draw_end: bool,
    /// Throw away the stroke being drawn
    pub abort: bool,
    /// Bank the balls currently in the cup and leave the level
    pub end_round: bool,
    /// Start the next level from the menu
    pub next_level: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();
    state.pointer = input.pointer;

    if input.abort {
        let removed_edges = state.stroke.cancel(&mut state.world);
        if removed_edges > 0 {
            state.events.push(GameEvent::StrokeAborted { removed_edges });
        }
    }

    match state.phase {
        GamePhase::Menu => {
            if input.next_level {
                start_level(state);
            }
        }

        GamePhase::Playing => {
            if input.draw_start {
                state.stroke.begin();
            }
            if input.draw_end {
                finish_stroke(state);
            }
            let stroke_settings = state.settings.stroke;
            state
                .stroke
                .sample(&mut state.world, input.pointer, &stroke_settings);

            if input.end_round {
                end_round(state);
                return;
            }

            state.time_ticks += 1;
            state.world.step(dt);
            state.balls_in_cup = balls_in_cup(state);
        }
    }
}

fn finish_stroke(state: &mut GameState) {
    let settings = &state.settings;
    let outcome = state
        .stroke
        .finish(&mut state.world, &settings.stroke, &settings.curve, &settings.ball);

    match outcome {
        StrokeOutcome::Curve { body, points, .. } => {
            state.drawn.push(body);
            state.events.push(GameEvent::StrokeCommitted { body, points });
        }
        StrokeOutcome::Dot { body, .. } => {
            state.drawn.push(body);
            state.events.push(GameEvent::DotCommitted { body });
        }
        StrokeOutcome::Rejected { error, .. } => {
            state.events.push(GameEvent::StrokeRejected { reason: error });
        }
        StrokeOutcome::NotDrawing | StrokeOutcome::Empty => {}
    }
}

/// Add the balls in the cup to the score and return to the menu
pub fn end_round(state: &mut GameState) {
    let in_cup = balls_in_cup(state);
    state.score += u64::from(in_cup);
    state.balls_in_cup = in_cup;
    state.phase = GamePhase::Menu;
    log::info!(
        "Level {} ended: {} in cup, total score {}",
        state.level,
        in_cup,
        state.score
    );
    state.events.push(GameEvent::RoundScored {
        balls_in_cup: in_cup,
        total: state.score,
    });
}

/// Clear the previous level and lay out the next one
///
/// Level `n` drops `n` balls. The cup and ball positions come from the
/// level's RNG stream.
pub fn start_level(state: &mut GameState) {
    state.clear_level();
    state.ensure_ground();
    state.level += 1;

    let arena = state.settings.arena;
    let cup = state.settings.cup;
    let mut rng = state.rng_state.next_rng();

    let cup_x = random_x(&mut rng, cup.margin, arena.width - cup.margin);
    let base = Vec2::new(cup_x, arena.height - cup.floor_offset);
    if let Err(e) = state.spawn_cup(base) {
        log::warn!("Cup could not be built: {e}");
    }

    for _ in 0..state.level {
        let x = random_x(&mut rng, arena.spawn_margin, arena.width - arena.spawn_margin);
        state.spawn_ball(Vec2::new(x, 0.0));
    }

    state.phase = GamePhase::Playing;
    log::info!(
        "Level {} started: cup at x={:.0}, {} balls",
        state.level,
        cup_x,
        state.balls.len()
    );
    state.events.push(GameEvent::LevelStarted {
        level: state.level,
        balls: state.balls.len(),
    });
}

/// Uniform x in [lo, hi], collapsing to the midpoint if the range is empty
fn random_x(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        (lo + hi) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::Settings;
    use crate::sim::stroke::StrokePhase;

    fn playing_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Settings::default());
        tick(
            &mut state,
            &TickInput {
                next_level: true,
                ..Default::default()
            },
            SIM_DT,
        );
        state
    }

    fn pointer(x: f32, y: f32) -> TickInput {
        TickInput {
            pointer: Some(Vec2::new(x, y)),
            ..Default::default()
        }
    }

    #[test]
    fn test_menu_to_playing() {
        let mut state = GameState::new(12345, Settings::default());
        assert_eq!(state.phase, GamePhase::Menu);

        // Nothing happens in the menu without input
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.world.bodies().is_empty());

        let state = playing_state(12345);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.level, 1);
        assert_eq!(state.balls.len(), 1);
        assert!(state.cup.is_some());
        assert!(state.ground.is_some());
        assert!(matches!(state.events[0], GameEvent::LevelStarted { level: 1, balls: 1 }));
    }

    #[test]
    fn test_layout_inside_arena() {
        let state = playing_state(7);
        let cup = state.world.body(state.cup.unwrap()).unwrap();
        assert!(cup.position.x >= 100.0 && cup.position.x <= 700.0);
        let ball = state.world.body(state.balls[0]).unwrap();
        assert!(ball.position.x >= 50.0 && ball.position.x <= 750.0);
    }

    #[test]
    fn test_draw_stroke_end_to_end() {
        let mut state = playing_state(1);
        let edges_before = state.world.edges().len();

        tick(
            &mut state,
            &TickInput {
                draw_start: true,
                pointer: Some(Vec2::new(100.0, 100.0)),
                ..Default::default()
            },
            SIM_DT,
        );
        tick(&mut state, &pointer(100.0, 130.0), SIM_DT);
        tick(&mut state, &pointer(130.0, 160.0), SIM_DT);
        assert_eq!(state.stroke.phase(), StrokePhase::Drawing);
        assert_eq!(state.world.edges().len(), edges_before + 2);

        let bodies_before = state.world.bodies().len();
        tick(
            &mut state,
            &TickInput {
                draw_end: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.world.edges().len(), edges_before);
        assert_eq!(state.world.bodies().len(), bodies_before + 1);
        assert_eq!(state.drawn.len(), 1);
        assert!(matches!(
            state.events[0],
            GameEvent::StrokeCommitted { points: 3, .. }
        ));

        let body = state.world.body(state.drawn[0]).unwrap();
        assert!((body.mass - 0.1 * (30.0 + 1800.0f32.sqrt())).abs() < 1e-3);
        assert!(body.moment > 0.0);
    }

    #[test]
    fn test_abort_leaves_no_geometry() {
        let mut state = playing_state(1);
        let edges_before = state.world.edges().len();
        let bodies_before = state.world.bodies().len();

        tick(
            &mut state,
            &TickInput {
                draw_start: true,
                pointer: Some(Vec2::new(300.0, 200.0)),
                ..Default::default()
            },
            SIM_DT,
        );
        tick(&mut state, &pointer(340.0, 200.0), SIM_DT);
        tick(
            &mut state,
            &TickInput {
                abort: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert!(matches!(state.events[0], GameEvent::StrokeAborted { removed_edges: 1 }));

        tick(
            &mut state,
            &TickInput {
                draw_end: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.world.edges().len(), edges_before);
        assert_eq!(state.world.bodies().len(), bodies_before);
        assert!(state.drawn.is_empty());
    }

    #[test]
    fn test_stroke_ignored_in_menu() {
        let mut state = GameState::new(5, Settings::default());
        tick(
            &mut state,
            &TickInput {
                draw_start: true,
                pointer: Some(Vec2::new(10.0, 10.0)),
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.stroke.phase(), StrokePhase::Idle);
        assert!(state.world.edges().is_empty());
    }

    #[test]
    fn test_ball_lands_in_cup_and_scores() {
        let mut state = playing_state(99);
        let cup = state.world.body(state.cup.unwrap()).unwrap().position;
        // Drop the ball straight over the cup opening
        let ball = state.balls[0];
        state.world.body_mut(ball).unwrap().position = Vec2::new(cup.x, 380.0);

        for _ in 0..180 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert_eq!(state.balls_in_cup, 1);

        tick(
            &mut state,
            &TickInput {
                end_round: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.score, 1);
        assert!(matches!(
            state.events[0],
            GameEvent::RoundScored { balls_in_cup: 1, total: 1 }
        ));
    }

    #[test]
    fn test_next_level_resets_world() {
        let mut state = playing_state(11);
        tick(
            &mut state,
            &TickInput {
                draw_start: true,
                pointer: Some(Vec2::new(100.0, 100.0)),
                ..Default::default()
            },
            SIM_DT,
        );
        tick(&mut state, &pointer(150.0, 100.0), SIM_DT);
        tick(
            &mut state,
            &TickInput {
                draw_end: true,
                ..Default::default()
            },
            SIM_DT,
        );
        tick(
            &mut state,
            &TickInput {
                end_round: true,
                ..Default::default()
            },
            SIM_DT,
        );
        tick(
            &mut state,
            &TickInput {
                next_level: true,
                ..Default::default()
            },
            SIM_DT,
        );

        assert_eq!(state.level, 2);
        assert_eq!(state.balls.len(), 2);
        assert!(state.drawn.is_empty());
        // Cup plus two balls; only the ground edge remains static
        assert_eq!(state.world.bodies().len(), 3);
        assert_eq!(state.world.edges().len(), 1);
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            TickInput {
                next_level: true,
                ..Default::default()
            },
            TickInput {
                draw_start: true,
                pointer: Some(Vec2::new(200.0, 300.0)),
                ..Default::default()
            },
            pointer(240.0, 320.0),
            pointer(290.0, 330.0),
            TickInput {
                draw_end: true,
                ..Default::default()
            },
            TickInput::default(),
            TickInput::default(),
        ];

        let mut state1 = GameState::new(99999, Settings::default());
        let mut state2 = GameState::new(99999, Settings::default());
        for input in &inputs {
            tick(&mut state1, input, SIM_DT);
            tick(&mut state2, input, SIM_DT);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.world.bodies().len(), state2.world.bodies().len());
        for (a, b) in state1.world.bodies().iter().zip(state2.world.bodies()) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.moment.to_bits(), b.moment.to_bits());
        }
    }
}
