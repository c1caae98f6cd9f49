//! Rigid body world
//!
//! A small impulse-based solver. Every collider is a capsule: circles are
//! capsules with coincident endpoints, drawn curves are lists of capsules
//! and static edges are capsules attached to nothing. The stroke pipeline
//! talks to it only through [`PhysicsBackend`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::composite::{Capsule, CompositeBody, moment_for_circle};
use super::containment::{cross, to_world};

/// Handle to a static edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeHandle(pub u32);

/// Handle to a dynamic body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Collision geometry of a dynamic body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Circle {
        radius: f32,
        friction: f32,
        elasticity: f32,
    },
    /// Capsules in body-local coordinates
    Segments(Vec<Capsule>),
}

impl BodyShape {
    /// Local-space capsules making up this shape
    pub fn capsules(&self) -> Vec<Capsule> {
        match self {
            BodyShape::Circle {
                radius,
                friction,
                elasticity,
            } => vec![Capsule {
                a: Vec2::ZERO,
                b: Vec2::ZERO,
                radius: *radius,
                friction: *friction,
                elasticity: *elasticity,
                mass: 0.0,
            }],
            BodyShape::Segments(capsules) => capsules.clone(),
        }
    }
}

/// Everything needed to add a dynamic body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub mass: f32,
    pub moment: f32,
    pub position: Vec2,
    pub shape: BodyShape,
}

impl BodyDesc {
    /// A solid ball
    pub fn ball(position: Vec2, radius: f32, mass: f32, friction: f32, elasticity: f32) -> Self {
        Self {
            mass,
            moment: moment_for_circle(mass, radius),
            position,
            shape: BodyShape::Circle {
                radius,
                friction,
                elasticity,
            },
        }
    }
}

impl From<CompositeBody> for BodyDesc {
    fn from(body: CompositeBody) -> Self {
        Self {
            mass: body.mass,
            moment: body.moment,
            position: body.position,
            shape: BodyShape::Segments(body.shapes),
        }
    }
}

/// A static capsule edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticEdge {
    pub handle: EdgeHandle,
    pub a: Vec2,
    pub b: Vec2,
    pub radius: f32,
    pub friction: f32,
    pub elasticity: f32,
}

/// A simulated dynamic body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub handle: BodyHandle,
    pub mass: f32,
    pub moment: f32,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub shape: BodyShape,
    inv_mass: f32,
    inv_moment: f32,
    /// Local capsules (circles become one zero-length capsule)
    local: Vec<Capsule>,
}

impl Body {
    fn new(handle: BodyHandle, desc: BodyDesc) -> Self {
        let inv = |v: f32| if v > 0.0 && v.is_finite() { 1.0 / v } else { 0.0 };
        Self {
            handle,
            mass: desc.mass,
            moment: desc.moment,
            position: desc.position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            inv_mass: inv(desc.mass),
            inv_moment: inv(desc.moment),
            local: desc.shape.capsules(),
            shape: desc.shape,
        }
    }

    /// Transform a body-local point into world space
    pub fn world_point(&self, local: Vec2) -> Vec2 {
        to_world(self.position, self.angle, local)
    }

    /// Colliders in world space
    pub fn world_capsules(&self) -> impl Iterator<Item = Capsule> + '_ {
        self.local.iter().map(|c| Capsule {
            a: self.world_point(c.a),
            b: self.world_point(c.b),
            ..*c
        })
    }

    /// Velocity of a world-space point attached to this body
    fn point_velocity(&self, point: Vec2) -> Vec2 {
        let r = point - self.position;
        self.velocity + Vec2::new(-r.y, r.x) * self.angular_velocity
    }

    fn apply_impulse(&mut self, impulse: Vec2, point: Vec2) {
        let r = point - self.position;
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += r.perp_dot(impulse) * self.inv_moment;
    }
}

/// Physics world contract used by the stroke pipeline
pub trait PhysicsBackend {
    /// Register a static capsule edge; `thickness` is the capsule radius
    fn add_static_edge(
        &mut self,
        a: Vec2,
        b: Vec2,
        thickness: f32,
        friction: f32,
        elasticity: f32,
    ) -> EdgeHandle;
    /// Remove edges; unknown handles are ignored
    fn remove_edges(&mut self, handles: &[EdgeHandle]);
    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Returns false if the body was not present
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    /// Advance the simulation by a fixed timestep
    fn step(&mut self, dt: f32);
}

/// Solver tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec2,
    /// Sub-steps per `step` call (limits tunneling through thin edges)
    pub substeps: u32,
    /// Velocity iterations per sub-step
    pub iterations: u32,
    /// Fraction of penetration corrected per sub-step
    pub correction_percent: f32,
    /// Penetration allowed before correction kicks in
    pub correction_slop: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, crate::consts::GRAVITY),
            substeps: 4,
            iterations: 8,
            correction_percent: 0.4,
            correction_slop: 0.05,
        }
    }
}

/// Which side of a contact the second collider belongs to
#[derive(Debug, Clone, Copy)]
enum Other {
    Static,
    Body(usize),
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    body: usize,
    other: Other,
    /// Points from `other` toward `body`
    normal: Vec2,
    point: Vec2,
    penetration: f32,
    friction: f32,
    /// Target separating speed from restitution
    bounce: f32,
    normal_impulse: f32,
    tangent_impulse: f32,
}

/// Below this approach speed contacts don't bounce (prevents resting jitter)
const BOUNCE_THRESHOLD: f32 = 30.0;

/// The simulation world
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub config: WorldConfig,
    /// Bodies, sorted by handle for deterministic iteration
    bodies: Vec<Body>,
    edges: Vec<StaticEdge>,
    next_handle: u32,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn edges(&self) -> &[StaticEdge] {
        &self.edges
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.iter().find(|b| b.handle == handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.iter_mut().find(|b| b.handle == handle)
    }

    pub fn contains_edge(&self, handle: EdgeHandle) -> bool {
        self.edges.iter().any(|e| e.handle == handle)
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn substep(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        for body in &mut self.bodies {
            if body.inv_mass > 0.0 {
                body.velocity += gravity * dt;
            }
        }

        let mut contacts = self.find_contacts();

        for _ in 0..self.config.iterations {
            for contact in &mut contacts {
                self.solve_contact(contact);
            }
        }

        for body in &mut self.bodies {
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
        }

        for contact in &contacts {
            self.correct_position(contact);
        }
    }

    fn find_contacts(&self) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for (i, body) in self.bodies.iter().enumerate() {
            if body.inv_mass == 0.0 {
                continue;
            }
            for shape in body.world_capsules() {
                for edge in &self.edges {
                    let other = Capsule {
                        a: edge.a,
                        b: edge.b,
                        radius: edge.radius,
                        friction: edge.friction,
                        elasticity: edge.elasticity,
                        mass: 0.0,
                    };
                    self.push_contacts(&mut contacts, i, Other::Static, &shape, &other);
                }

                for (j, other_body) in self.bodies.iter().enumerate().skip(i + 1) {
                    for other in other_body.world_capsules() {
                        self.push_contacts(&mut contacts, i, Other::Body(j), &shape, &other);
                    }
                }
            }
        }

        contacts
    }

    fn push_contacts(
        &self,
        contacts: &mut Vec<Contact>,
        body: usize,
        other: Other,
        shape: &Capsule,
        other_shape: &Capsule,
    ) {
        let found = capsule_contacts(shape, other_shape);
        for (point, normal, penetration) in found {
            let approach = self.relative_velocity(body, other, point).dot(normal);
            let elasticity = shape.elasticity * other_shape.elasticity;
            let bounce = if approach < -BOUNCE_THRESHOLD {
                -elasticity * approach
            } else {
                0.0
            };
            contacts.push(Contact {
                body,
                other,
                normal,
                point,
                penetration,
                friction: shape.friction * other_shape.friction,
                bounce,
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
            });
        }
    }

    fn relative_velocity(&self, body: usize, other: Other, point: Vec2) -> Vec2 {
        let v = self.bodies[body].point_velocity(point);
        match other {
            Other::Static => v,
            Other::Body(j) => v - self.bodies[j].point_velocity(point),
        }
    }

    /// Effective mass denominator along `dir` at the contact
    fn inverse_mass_along(&self, contact: &Contact, dir: Vec2) -> f32 {
        let term = |b: &Body| {
            let r = contact.point - b.position;
            let rn = r.perp_dot(dir);
            b.inv_mass + rn * rn * b.inv_moment
        };
        let mut k = term(&self.bodies[contact.body]);
        if let Other::Body(j) = contact.other {
            k += term(&self.bodies[j]);
        }
        k
    }

    fn apply(&mut self, contact: &Contact, impulse: Vec2) {
        self.bodies[contact.body].apply_impulse(impulse, contact.point);
        if let Other::Body(j) = contact.other {
            self.bodies[j].apply_impulse(-impulse, contact.point);
        }
    }

    fn solve_contact(&mut self, contact: &mut Contact) {
        let n = contact.normal;
        let k_normal = self.inverse_mass_along(contact, n);
        if k_normal <= 0.0 {
            return;
        }

        // Normal impulse with accumulated clamping
        let vn = self.relative_velocity(contact.body, contact.other, contact.point).dot(n);
        let delta = (contact.bounce - vn) / k_normal;
        let accumulated = (contact.normal_impulse + delta).max(0.0);
        let applied = accumulated - contact.normal_impulse;
        contact.normal_impulse = accumulated;
        self.apply(contact, n * applied);

        // Coulomb friction bounded by the normal impulse
        let t = n.perp();
        let k_tangent = self.inverse_mass_along(contact, t);
        if k_tangent <= 0.0 {
            return;
        }
        let vt = self.relative_velocity(contact.body, contact.other, contact.point).dot(t);
        let max_friction = contact.friction * contact.normal_impulse;
        let accumulated = (contact.tangent_impulse - vt / k_tangent).clamp(-max_friction, max_friction);
        let applied = accumulated - contact.tangent_impulse;
        contact.tangent_impulse = accumulated;
        self.apply(contact, t * applied);
    }

    fn correct_position(&mut self, contact: &Contact) {
        let depth = contact.penetration - self.config.correction_slop;
        if depth <= 0.0 {
            return;
        }

        let inv_a = self.bodies[contact.body].inv_mass;
        let inv_b = match contact.other {
            Other::Static => 0.0,
            Other::Body(j) => self.bodies[j].inv_mass,
        };
        let total = inv_a + inv_b;
        if total <= 0.0 {
            return;
        }

        let correction = contact.normal * (depth * self.config.correction_percent / total);
        self.bodies[contact.body].position += correction * inv_a;
        if let Other::Body(j) = contact.other {
            self.bodies[j].position -= correction * inv_b;
        }
    }
}

impl PhysicsBackend for World {
    fn add_static_edge(
        &mut self,
        a: Vec2,
        b: Vec2,
        thickness: f32,
        friction: f32,
        elasticity: f32,
    ) -> EdgeHandle {
        let handle = EdgeHandle(self.next_id());
        self.edges.push(StaticEdge {
            handle,
            a,
            b,
            radius: thickness,
            friction,
            elasticity,
        });
        handle
    }

    fn remove_edges(&mut self, handles: &[EdgeHandle]) {
        self.edges.retain(|e| !handles.contains(&e.handle));
    }

    fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let handle = BodyHandle(self.next_id());
        self.bodies.push(Body::new(handle, desc));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.handle != handle);
        self.bodies.len() != before
    }

    fn step(&mut self, dt: f32) {
        let substeps = self.config.substeps.max(1);
        let h = dt / substeps as f32;
        for _ in 0..substeps {
            self.substep(h);
        }
    }
}

/// Closest point to `p` on the segment a-b
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Overlaps between two capsules as (point, normal toward `a`, penetration)
///
/// Crossing core segments give a single contact. Otherwise each endpoint of one
/// capsule is tested against the other's core segment, which yields two
/// contacts for capsules resting side by side.
fn capsule_contacts(a: &Capsule, b: &Capsule) -> Vec<(Vec2, Vec2, f32)> {
    let reach = a.radius + b.radius;
    if let Some(contact) = crossing_contact(a, b, reach) {
        return vec![contact];
    }
    let mut found: Vec<(Vec2, Vec2, f32)> = Vec::with_capacity(2);

    let mut consider = |on_a: Vec2, on_b: Vec2, fallback: Vec2| {
        let delta = on_a - on_b;
        let dist = delta.length();
        if dist >= reach {
            return;
        }
        let normal = if dist > 1e-6 { delta / dist } else { fallback };
        let point = on_b + normal * (b.radius - (reach - dist) * 0.5);
        if found.iter().any(|(p, _, _)| p.distance_squared(point) < 0.25) {
            return;
        }
        found.push((point, normal, reach - dist));
    };

    let fallback = {
        let axis = b.b - b.a;
        let perp = if axis.length_squared() > 1e-8 {
            axis.perp().normalize()
        } else {
            Vec2::NEG_Y
        };
        let toward = (a.a + a.b) * 0.5 - (b.a + b.b) * 0.5;
        if perp.dot(toward) < 0.0 { -perp } else { perp }
    };

    for end in [a.a, a.b] {
        consider(end, closest_point_on_segment(end, b.a, b.b), fallback);
    }
    for end in [b.a, b.b] {
        consider(closest_point_on_segment(end, a.a, a.b), end, fallback);
    }

    found
}

/// Contact for two capsules whose core segments cross
///
/// Each core line is a candidate axis. Pushing along an axis clears the
/// shorter end of the other segment, so the depth is that end's distance
/// plus both radii. The shallower axis wins.
fn crossing_contact(a: &Capsule, b: &Capsule, reach: f32) -> Option<(Vec2, Vec2, f32)> {
    let d1 = cross(b.a, b.b, a.a);
    let d2 = cross(b.a, b.b, a.b);
    let d3 = cross(a.a, a.b, b.a);
    let d4 = cross(a.a, a.b, b.b);
    if d1 * d2 >= 0.0 || d3 * d4 >= 0.0 {
        return None;
    }

    let point = a.a + (a.b - a.a) * (d1 / (d1 - d2));

    // Normal of b's line, flipped toward the larger part of a
    let axis_b = (b.b - b.a).perp().normalize_or_zero();
    let (s1, s2) = ((a.a - b.a).dot(axis_b), (a.b - b.a).dot(axis_b));
    let normal_b = if s1.abs() >= s2.abs() { axis_b * s1.signum() } else { axis_b * s2.signum() };
    let depth_b = s1.abs().min(s2.abs()) + reach;

    // Normal of a's line, pointing away from the larger part of b
    let axis_a = (a.b - a.a).perp().normalize_or_zero();
    let (t1, t2) = ((b.a - a.a).dot(axis_a), (b.b - a.a).dot(axis_a));
    let normal_a = if t1.abs() >= t2.abs() { -axis_a * t1.signum() } else { -axis_a * t2.signum() };
    let depth_a = t1.abs().min(t2.abs()) + reach;

    if depth_b <= depth_a {
        Some((point, normal_b, depth_b))
    } else {
        Some((point, normal_a, depth_a))
    }
}
