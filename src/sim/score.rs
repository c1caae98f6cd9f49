//! Scoring: how many balls sit inside the cup right now

use super::containment::{Quad, is_inside_quad};
use super::state::GameState;
use super::world::{Body, BodyShape};

/// World-space outline of a cup body
///
/// Corners are the start of each wall followed by the end of the last wall,
/// so the walls must form a connected chain. Returns `None` unless the body
/// has exactly three walls.
pub fn cup_quad(cup: &Body) -> Option<Quad> {
    let BodyShape::Segments(walls) = &cup.shape else {
        return None;
    };
    let [first, second, third] = walls.as_slice() else {
        return None;
    };
    Some([
        cup.world_point(first.a),
        cup.world_point(second.a),
        cup.world_point(third.a),
        cup.world_point(third.b),
    ])
}

/// Count the balls whose centre lies inside the cup
pub fn balls_in_cup(state: &GameState) -> u32 {
    let Some(quad) = state.cup.and_then(|h| state.world.body(h)).and_then(cup_quad) else {
        return 0;
    };

    state
        .balls
        .iter()
        .filter_map(|&h| state.world.body(h))
        .filter(|ball| is_inside_quad(&quad, ball.position))
        .count() as u32
}
