//! Frame building
//!
//! Turns the current game state into a flat triangle list. The host uploads
//! the bytes (`bytemuck::cast_slice`) to whatever GPU or canvas it drives.
//! Nothing here mutates the simulation.

pub mod shapes;
pub mod vertex;

pub use vertex::{Vertex, colors};

use crate::sim::{Body, BodyShape, GameState};

/// Segments used for every circle
const CIRCLE_SEGMENTS: u32 = 24;
/// Line width of the stroke being drawn
const LIVE_STROKE_HALF_WIDTH: f32 = 1.0;

/// Tessellate the whole scene, back to front
pub fn build_frame(state: &GameState) -> Vec<Vertex> {
    let mut vertices = Vec::new();

    for edge in state.world.edges() {
        // Provisional edges are drawn from the raw stroke instead
        if state.stroke.provisional_edges().contains(&edge.handle) {
            continue;
        }
        vertices.extend(shapes::capsule(
            edge.a,
            edge.b,
            edge.radius,
            colors::SOLID,
            CIRCLE_SEGMENTS,
        ));
    }

    for body in state.drawn.iter().filter_map(|&h| state.world.body(h)) {
        vertices.extend(body_vertices(body, colors::SOLID));
    }

    let targets = state.cup.iter().chain(state.balls.iter());
    for body in targets.filter_map(|&h| state.world.body(h)) {
        vertices.extend(body_vertices(body, colors::TARGET));
    }

    vertices.extend(shapes::polyline(
        state.stroke.points(),
        LIVE_STROKE_HALF_WIDTH,
        colors::LIVE_STROKE,
    ));

    if let Some(pointer) = state.pointer {
        vertices.extend(shapes::ring(pointer, 5.0, 10.0, colors::POINTER, CIRCLE_SEGMENTS));
    }

    vertices
}

/// Tessellate one body at its current pose
pub fn body_vertices(body: &Body, color: [f32; 4]) -> Vec<Vertex> {
    match &body.shape {
        BodyShape::Circle { radius, .. } => {
            shapes::circle(body.position, *radius, color, CIRCLE_SEGMENTS)
        }
        BodyShape::Segments(capsules) => capsules
            .iter()
            .flat_map(|c| {
                shapes::capsule(
                    body.world_point(c.a),
                    body.world_point(c.b),
                    c.radius,
                    color,
                    CIRCLE_SEGMENTS / 2,
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::settings::Settings;
    use crate::sim::{TickInput, tick};
    use glam::Vec2;

    #[test]
    fn test_empty_state_renders_nothing() {
        let state = GameState::new(1, Settings::default());
        assert!(build_frame(&state).is_empty());
    }

    #[test]
    fn test_frame_contains_level() {
        let mut state = GameState::new(1, Settings::default());
        tick(
            &mut state,
            &TickInput {
                next_level: true,
                pointer: Some(Vec2::new(10.0, 10.0)),
                ..Default::default()
            },
            SIM_DT,
        );
        let frame = build_frame(&state);
        assert!(!frame.is_empty());
        assert_eq!(frame.len() % 3, 0);
        assert!(frame.iter().any(|v| v.color == colors::TARGET));
        assert!(frame.iter().any(|v| v.color == colors::POINTER));

        // Bytes are ready for upload
        let bytes: &[u8] = bytemuck::cast_slice(&frame);
        assert_eq!(bytes.len(), frame.len() * std::mem::size_of::<Vertex>());
    }

    #[test]
    fn test_live_stroke_drawn_once() {
        let mut state = GameState::new(1, Settings::default());
        tick(
            &mut state,
            &TickInput {
                next_level: true,
                ..Default::default()
            },
            SIM_DT,
        );
        let before = build_frame(&state).len();
        for (i, p) in [Vec2::new(100.0, 100.0), Vec2::new(150.0, 100.0)].into_iter().enumerate() {
            tick(
                &mut state,
                &TickInput {
                    draw_start: i == 0,
                    pointer: Some(p),
                    ..Default::default()
                },
                SIM_DT,
            );
        }
        let frame = build_frame(&state);
        let live = frame.iter().filter(|v| v.color == colors::LIVE_STROKE).count();
        assert_eq!(live, 6);
        let pointer = frame.iter().filter(|v| v.color == colors::POINTER).count();
        // Only the live line and the cursor ring were added
        assert_eq!(frame.len(), before + live + pointer);
    }
}
