//! Hit-test engine.
//!
//! Pure geometric predicates over an assembled scene: point-to-segment
//! distance with a clamped projection parameter, ray-casting
//! point-in-polygon, and a per-primitive [`Touchable`] predicate dispatched
//! over the [`Primitive`] enum. No state, safely callable concurrently.

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::scene::model::{Label, LineSegment, Polygon, Scene, Vertex};
use crate::types::Tolerances;

/// What category of primitive a query point resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitKind {
    OnLine,
    InsideShape,
    OnVertex,
    OnLabel,
}

/// The transient answer to "what did the user just touch".
///
/// Carries a copy of the primitive hit; never retained in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct HitResult {
    pub primitive: Primitive,
    pub kind: HitKind,
    /// Distance from the query point in scene units (0 inside a shape).
    pub distance: f64,
    /// The query point, in scene coordinates.
    pub point: DVec2,
    /// Clamped position along a segment (0..1), for line hits only.
    /// Collaborators vary feedback intensity along a segment with this.
    pub progress: Option<f64>,
}

/// Per-primitive "does this point touch me" predicate.
///
/// Each primitive kind carries its own empirically tuned tolerance:
/// vertices tightest, labels loosest, reflecting touch-target ergonomics.
#[enum_dispatch]
pub trait Touchable {
    /// Full hit answer, or `None` when the point is out of tolerance.
    fn hit(&self, point: DVec2, tol: &Tolerances) -> Option<HitResult>;

    /// Whether the point touches this primitive within tolerance.
    fn contains_point(&self, point: DVec2, tol: &Tolerances) -> bool {
        self.hit(point, tol).is_some()
    }
}

/// Any touchable primitive of a scene.
#[enum_dispatch(Touchable)]
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Segment(LineSegment),
    Vertex(Vertex),
    Polygon(Polygon),
    Label(Label),
}

// ============================================================================
// Pure predicates
// ============================================================================

/// Distance from `p` to the segment `a`-`b`, plus the clamped projection
/// parameter (0 at `a`, 1 at `b`).
pub fn point_segment_distance(p: DVec2, a: DVec2, b: DVec2) -> (f64, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return (p.distance(a), 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p.distance(a + ab * t), t)
}

/// Ray-casting parity test. Undefined (false) for fewer than three
/// boundary points.
pub fn point_in_polygon(p: DVec2, boundary: &[DVec2]) -> bool {
    if boundary.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = boundary.len() - 1;
    for i in 0..boundary.len() {
        let (a, b) = (boundary[i], boundary[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ============================================================================
// Touchable implementations
// ============================================================================

impl Touchable for LineSegment {
    fn hit(&self, point: DVec2, tol: &Tolerances) -> Option<HitResult> {
        let (distance, t) = point_segment_distance(point, self.start, self.end);
        (distance <= tol.hit_segment).then(|| HitResult {
            primitive: Primitive::Segment(self.clone()),
            kind: HitKind::OnLine,
            distance,
            point,
            progress: Some(t),
        })
    }
}

impl Touchable for Vertex {
    fn hit(&self, point: DVec2, tol: &Tolerances) -> Option<HitResult> {
        let distance = point.distance(self.position);
        (distance <= tol.hit_vertex).then(|| HitResult {
            primitive: Primitive::Vertex(self.clone()),
            kind: HitKind::OnVertex,
            distance,
            point,
            progress: None,
        })
    }
}

impl Touchable for Polygon {
    fn hit(&self, point: DVec2, _tol: &Tolerances) -> Option<HitResult> {
        point_in_polygon(point, &self.points).then(|| HitResult {
            primitive: Primitive::Polygon(self.clone()),
            kind: HitKind::InsideShape,
            distance: 0.0,
            point,
            progress: None,
        })
    }
}

impl Touchable for Label {
    fn hit(&self, point: DVec2, tol: &Tolerances) -> Option<HitResult> {
        // Estimated extent box around the anchor, padded by the label
        // tolerance (the loosest touch target).
        let d = point - self.position;
        let half = self.size * 0.5;
        let within = d.x.abs() <= half.x + tol.hit_label && d.y.abs() <= half.y + tol.hit_label;
        within.then(|| HitResult {
            primitive: Primitive::Label(self.clone()),
            kind: HitKind::OnLabel,
            distance: point.distance(self.position),
            point,
            progress: None,
        })
    }
}

// ============================================================================
// Scene queries
// ============================================================================

impl Scene {
    /// Resolve a touch at `point` (surface coordinates) to the primitive
    /// it lands on, or `None` over empty canvas.
    ///
    /// Priority follows touch ergonomics, tightest target first: vertex,
    /// then segment, then label, then polygon interior, so a touch near a
    /// junction reports the junction rather than one of its segments.
    /// Within one kind the nearest primitive wins.
    pub fn hit_test(&self, point: DVec2, tol: &Tolerances) -> Option<HitResult> {
        let p = self.transform.unapply(point);

        best_hit(self.vertices.iter().map(|v| v.hit(p, tol)))
            .or_else(|| best_hit(self.segments.iter().map(|s| s.hit(p, tol))))
            .or_else(|| best_hit(self.labels.iter().map(|l| l.hit(p, tol))))
            .or_else(|| best_hit(self.polygons.iter().map(|poly| poly.hit(p, tol))))
    }
}

fn best_hit(hits: impl Iterator<Item = Option<HitResult>>) -> Option<HitResult> {
    hits.flatten()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
