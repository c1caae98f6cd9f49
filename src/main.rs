//! Draw & Collect entry point
//!
//! Headless native driver: feeds a scripted fingertip path through the fixed
//! timestep loop, the same way a camera-driven host would, and logs the result.
//! Pass a settings JSON path as the first argument to override the defaults.

use glam::Vec2;

use draw_and_collect::consts::{MAX_SUBSTEPS, SIM_DT};
use draw_and_collect::renderer::build_frame;
use draw_and_collect::settings::Settings;
use draw_and_collect::sim::{GameEvent, GameState, TickInput, tick};

/// Frame time of the simulated camera (slightly slower than the sim rate)
const FRAME_DT: f32 = 1.0 / 55.0;
/// How long to let the balls settle after drawing
const SETTLE_FRAMES: usize = 240;

/// Game instance holding the loop bookkeeping
struct Game {
    state: GameState,
    accumulator: f32,
    input: TickInput,
}

impl Game {
    fn new(seed: u64, settings: Settings) -> Self {
        Self {
            state: GameState::new(seed, settings),
            accumulator: 0.0,
            input: TickInput::default(),
        }
    }

    /// Run simulation ticks for one rendered frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            for event in &self.state.events {
                match event {
                    GameEvent::StrokeCommitted { points, .. } => {
                        log::info!("Stroke simplified to {points} points");
                    }
                    other => log::debug!("{other:?}"),
                }
            }

            // Clear one-shot inputs after processing
            self.input.draw_start = false;
            self.input.draw_end = false;
            self.input.abort = false;
            self.input.end_round = false;
            self.input.next_level = false;
        }
    }

    /// One camera frame: latest fingertip (if any), then simulate
    fn frame(&mut self, pointer: Option<Vec2>) {
        self.input.pointer = pointer;
        self.update(FRAME_DT);
    }
}

/// A ramp from the upper left toward the cup, sampled like a shaky finger
fn scripted_path(from: Vec2, to: Vec2, samples: usize) -> Vec<Vec2> {
    (0..samples)
        .map(|i| {
            let t = i as f32 / (samples - 1).max(1) as f32;
            let wobble = Vec2::new(0.0, ((i * 7) % 5) as f32 - 2.0);
            from.lerp(to, t) + wobble
        })
        .collect()
}

fn main() {
    env_logger::init();
    log::info!("Draw & Collect (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };

    let seed = 0x5EED;
    let mut game = Game::new(seed, settings);
    log::info!("Game initialized with seed: {}", seed);

    game.input.next_level = true;
    game.frame(None);

    let Some(cup) = game.state.cup.and_then(|h| game.state.world.body(h)) else {
        log::error!("Level has no cup");
        return;
    };
    let cup_x = cup.position.x;
    let ball_x = game
        .state
        .balls
        .first()
        .and_then(|&h| game.state.world.body(h))
        .map_or(cup_x, |b| b.position.x);

    // Ramp under the falling ball that ends above the cup opening
    let path = scripted_path(Vec2::new(ball_x - 40.0, 250.0), Vec2::new(cup_x, 400.0), 40);
    game.input.draw_start = true;
    for point in path {
        game.frame(Some(point));
    }
    // Hand briefly lost before release
    game.frame(None);
    game.input.draw_end = true;
    game.frame(None);

    for _ in 0..SETTLE_FRAMES {
        game.frame(None);
    }
    log::info!(
        "Balls in cup: {} ({} vertices in last frame)",
        game.state.balls_in_cup,
        build_frame(&game.state).len()
    );

    game.input.end_round = true;
    game.frame(None);
    println!(
        "Level {} finished, score {}",
        game.state.level, game.state.score
    );
}
