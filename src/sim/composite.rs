//! Composite rigid bodies built from polylines
//!
//! A drawn stroke becomes one rigid body made of capsule segments. Mass is
//! proportional to segment length; the body's inertia is the sum of each
//! capsule's own inertia plus its parallel-axis transfer to the shared centroid.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Physical material applied to every segment of a composite body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveMaterial {
    /// Capsule radius (collision and render thickness)
    pub segment_radius: f32,
    /// Mass per unit of segment length
    pub linear_density: f32,
    pub friction: f32,
    pub elasticity: f32,
}

impl Default for CurveMaterial {
    fn default() -> Self {
        Self {
            segment_radius: crate::consts::CURVE_SEGMENT_RADIUS,
            linear_density: crate::consts::CURVE_LINEAR_DENSITY,
            friction: crate::consts::DEFAULT_FRICTION,
            elasticity: crate::consts::CURVE_ELASTICITY,
        }
    }
}

/// A capsule collider in body-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub a: Vec2,
    pub b: Vec2,
    pub radius: f32,
    pub friction: f32,
    pub elasticity: f32,
    /// This segment's share of the body mass
    pub mass: f32,
}

/// Mass properties of a single segment, before composition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentMass {
    pub a: Vec2,
    pub b: Vec2,
    pub mass: f32,
    /// Midpoint in world space
    pub center: Vec2,
    /// Moment of inertia about `center`
    pub moment: f32,
}

/// A rigid body assembled from a polyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBody {
    pub mass: f32,
    /// World-space center of mass
    pub position: Vec2,
    /// Moment of inertia about the center of mass
    pub moment: f32,
    /// Capsules relative to `position`
    pub shapes: Vec<Capsule>,
}

/// Why a polyline could not become a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// Fewer than two points; the caller should fall back to a dot
    TooFewPoints(usize),
    /// Every segment had zero length, so there is nothing to weigh
    ZeroMass,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::TooFewPoints(n) => {
                write!(f, "need at least 2 points to build a curve, got {n}")
            }
            BuildError::ZeroMass => write!(f, "every segment of the curve has zero length"),
        }
    }
}

impl std::error::Error for BuildError {}

/// Moment of inertia of a capsule segment about the body origin
///
/// The capsule is approximated as a box of length `|b - a| + 2r` and width
/// `2r`, shifted by the segment midpoint.
pub fn moment_for_segment(mass: f32, a: Vec2, b: Vec2, radius: f32) -> f32 {
    let offset = (a + b) * 0.5;
    let length = a.distance(b) + 2.0 * radius;
    let width = 2.0 * radius;
    mass * ((length * length + width * width) / 12.0 + offset.length_squared())
}

/// Moment of inertia of a solid disc about its center
pub fn moment_for_circle(mass: f32, radius: f32) -> f32 {
    0.5 * mass * radius * radius
}

/// Per-segment mass properties, skipping degenerate segments
pub fn segment_masses(points: &[Vec2], material: &CurveMaterial) -> Vec<SegmentMass> {
    points
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let length = a.distance(b);
            if !length.is_finite() || length <= f32::EPSILON {
                log::debug!("Skipping degenerate segment {a} -> {b}");
                return None;
            }

            let mass = material.linear_density * length;
            let center = (a + b) * 0.5;
            let moment = moment_for_segment(mass, a - center, b - center, material.segment_radius);
            Some(SegmentMass {
                a,
                b,
                mass,
                center,
                moment,
            })
        })
        .collect()
}

/// Compose segment masses into a single body
pub fn compose(segments: &[SegmentMass], material: &CurveMaterial) -> Result<CompositeBody, BuildError> {
    let total_mass: f32 = segments.iter().map(|s| s.mass).sum();
    if total_mass.is_nan() || total_mass <= 0.0 {
        return Err(BuildError::ZeroMass);
    }

    let weighted: Vec2 = segments.iter().map(|s| s.center * s.mass).sum();
    let centroid = weighted / total_mass;

    let moment = segments
        .iter()
        .map(|s| s.moment + s.mass * s.center.distance_squared(centroid))
        .sum::<f32>();

    let shapes = segments
        .iter()
        .map(|s| Capsule {
            a: s.a - centroid,
            b: s.b - centroid,
            radius: material.segment_radius,
            friction: material.friction,
            elasticity: material.elasticity,
            mass: s.mass,
        })
        .collect();

    Ok(CompositeBody {
        mass: total_mass,
        position: centroid,
        moment,
        shapes,
    })
}

/// Build a composite body from a polyline of at least two points
pub fn build_composite(points: &[Vec2], material: &CurveMaterial) -> Result<CompositeBody, BuildError> {
    if points.len() < 2 {
        return Err(BuildError::TooFewPoints(points.len()));
    }
    compose(&segment_masses(points, material), material)
}
