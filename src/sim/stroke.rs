//! Stroke lifecycle
//!
//! While the user draws, each accepted sample is joined to the previous one
//! by a thin static edge so balls already in flight collide with the stroke.
//! On release those provisional edges are swapped for a single dynamic body
//! inside one call, so no physics step ever sees both or neither.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::composite::{BuildError, CurveMaterial, build_composite};
use super::simplify::simplify;
use super::world::{BodyDesc, BodyHandle, EdgeHandle, PhysicsBackend};
use crate::settings::{BallSettings, StrokeSettings};

/// Stroke state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokePhase {
    /// No stroke in progress
    #[default]
    Idle,
    /// Pointer is down, samples are being accumulated
    Drawing,
}

/// Result of releasing a stroke
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeOutcome {
    /// Release arrived with no stroke open
    NotDrawing,
    /// Stroke closed without any samples
    Empty,
    /// Stroke became a composite body
    Curve {
        body: BodyHandle,
        /// Points left after simplification
        points: usize,
        removed_edges: usize,
    },
    /// Stroke collapsed to a single point and became a small ball
    Dot { body: BodyHandle, removed_edges: usize },
    /// Every segment was degenerate; nothing was created
    Rejected {
        error: BuildError,
        removed_edges: usize,
    },
}

/// Per-stroke accumulation and the provisional geometry it owns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrokeLifecycle {
    phase: StrokePhase,
    points: Vec<Vec2>,
    provisional: Vec<EdgeHandle>,
}

impl StrokeLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Raw points accepted so far
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Static edges registered for the open stroke
    pub fn provisional_edges(&self) -> &[EdgeHandle] {
        &self.provisional
    }

    /// Open a stroke. Returns false if one was already open.
    pub fn begin(&mut self) -> bool {
        if self.phase == StrokePhase::Drawing {
            return false;
        }
        self.phase = StrokePhase::Drawing;
        self.points.clear();
        true
    }

    /// Feed one pointer sample
    ///
    /// `None` means no pointer this frame. Returns the provisional edge added
    /// for this sample, if any.
    pub fn sample<W: PhysicsBackend>(
        &mut self,
        world: &mut W,
        pointer: Option<Vec2>,
        settings: &StrokeSettings,
    ) -> Option<EdgeHandle> {
        if self.phase != StrokePhase::Drawing {
            return None;
        }
        let point = pointer?;
        if !point.is_finite() || self.points.contains(&point) {
            return None;
        }

        let Some(&last) = self.points.last() else {
            self.points.push(point);
            return None;
        };
        if last.distance(point) <= settings.min_spacing {
            return None;
        }

        self.points.push(point);
        let edge = world.add_static_edge(
            last,
            point,
            settings.edge_thickness,
            settings.edge_friction,
            settings.edge_elasticity,
        );
        self.provisional.push(edge);
        Some(edge)
    }

    /// Close the stroke, replacing provisional edges with a dynamic body
    pub fn finish<W: PhysicsBackend>(
        &mut self,
        world: &mut W,
        settings: &StrokeSettings,
        curve: &CurveMaterial,
        ball: &BallSettings,
    ) -> StrokeOutcome {
        if self.phase != StrokePhase::Drawing {
            return StrokeOutcome::NotDrawing;
        }
        self.phase = StrokePhase::Idle;

        let removed_edges = self.provisional.len();
        world.remove_edges(&self.provisional);
        self.provisional.clear();

        let points = std::mem::take(&mut self.points);
        if points.is_empty() {
            return StrokeOutcome::Empty;
        }

        let simplified = simplify(&points, settings.epsilon);
        match build_composite(&simplified, curve) {
            Ok(body) => {
                let shapes = body.shapes.len();
                let handle = world.add_body(body.into());
                log::debug!(
                    "Stroke committed: {} samples -> {} points, {} segments",
                    points.len(),
                    simplified.len(),
                    shapes
                );
                StrokeOutcome::Curve {
                    body: handle,
                    points: simplified.len(),
                    removed_edges,
                }
            }
            Err(BuildError::TooFewPoints(_)) => {
                let handle = world.add_body(dot_desc(simplified[0], settings, ball));
                log::debug!("Stroke committed as dot at {}", simplified[0]);
                StrokeOutcome::Dot {
                    body: handle,
                    removed_edges,
                }
            }
            Err(error) => {
                log::warn!("Stroke rejected: {error}");
                StrokeOutcome::Rejected {
                    error,
                    removed_edges,
                }
            }
        }
    }

    /// Drop the open stroke and its provisional edges without creating a body
    ///
    /// Returns the number of edges removed.
    pub fn cancel<W: PhysicsBackend>(&mut self, world: &mut W) -> usize {
        let removed = self.provisional.len();
        world.remove_edges(&self.provisional);
        self.provisional.clear();
        self.points.clear();
        self.phase = StrokePhase::Idle;
        removed
    }
}

/// Small ball placed where a single-point stroke was drawn
fn dot_desc(at: Vec2, settings: &StrokeSettings, ball: &BallSettings) -> BodyDesc {
    let radius = settings.dot_radius;
    BodyDesc::ball(at, radius, ball.mass_for(radius), ball.friction, ball.elasticity)
}
