//! Point-in-quad test used for scoring
//!
//! The cup is a dynamic body that can tip over and slide, so scoring always
//! works on its current world-space outline. The test is winding-agnostic.

use glam::Vec2;

/// Four corners in edge-connectivity order (either winding)
pub type Quad = [Vec2; 4];

/// Cross product of (b - a) and (c - a)
///
/// Positive when `c` is to the left of a→b in a y-up frame.
#[inline]
pub fn cross(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Check whether `point` lies inside a convex quad
///
/// Points exactly on an edge count as inside. Results for non-convex or
/// self-intersecting quads are unspecified.
pub fn is_inside_quad(quad: &Quad, point: Vec2) -> bool {
    let mut any_negative = false;
    let mut any_positive = false;

    for i in 0..4 {
        let c = cross(quad[i], quad[(i + 1) % 4], point);
        if c < 0.0 {
            any_negative = true;
        } else if c > 0.0 {
            any_positive = true;
        }
    }

    !(any_negative && any_positive)
}

/// Transform body-local points into world space
pub fn to_world(position: Vec2, angle: f32, local: Vec2) -> Vec2 {
    position + Vec2::from_angle(angle).rotate(local)
}
