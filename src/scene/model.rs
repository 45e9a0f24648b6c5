//! Scene data model.
//!
//! Everything a collaborator can read out of a parsed diagram. A [`Scene`]
//! is assembled once and never mutated; it owns all contained primitives and
//! primitives never reference the scene back. All types serialize with serde
//! for the caching contract.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::errors::DecodeError;
use crate::types::{LabelId, PolygonId, SceneId, SegmentId, VertexId, ViewBox};
use crate::types::Orientation;

/// A straight stroke of the diagram.
///
/// Created once during extraction; immutable thereafter except for label
/// attachment, which produces a new value carrying the resolved text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub id: SegmentId,
    pub start: DVec2,
    pub end: DVec2,
    pub stroke_width: f64,
    pub label: Option<String>,
}

impl LineSegment {
    pub fn new(id: SegmentId, start: DVec2, end: DVec2, stroke_width: f64) -> Self {
        LineSegment {
            id,
            start,
            end,
            stroke_width,
            label: None,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Angle of the segment in degrees, `(-180, 180]` as `atan2` gives it.
    pub fn angle_degrees(&self) -> f64 {
        let d = self.end - self.start;
        d.y.atan2(d.x).to_degrees()
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_angle_degrees(self.angle_degrees())
    }

    /// Unit direction from start to end; zero for a degenerate segment.
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    /// Label attachment returns a new value; the original stays untouched.
    #[must_use]
    pub fn with_label(&self, text: impl Into<String>) -> Self {
        LineSegment {
            label: Some(text.into()),
            ..self.clone()
        }
    }
}

/// A merge point of the vertex graph: every endpoint and explicit marker
/// within snap tolerance of this position, plus the segments that end here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: DVec2,
    pub segments: Vec<SegmentId>,
    /// 1-based human-facing number, assigned in creation order.
    pub ordinal: Option<u32>,
}

/// An enclosed shape: an explicit `polygon`/`rect` element or a detected
/// cycle of the vertex graph. Non-empty boundaries have at least 3 points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: PolygonId,
    pub points: Vec<DVec2>,
    pub filled: bool,
    pub label: Option<String>,
    pub segments: Vec<SegmentId>,
}

impl Polygon {
    pub fn centroid(&self) -> DVec2 {
        if self.points.is_empty() {
            return DVec2::ZERO;
        }
        self.points.iter().copied().sum::<DVec2>() / self.points.len() as f64
    }
}

/// A finished text label, possibly merged from several raw fragments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub position: DVec2,
    pub text: String,
    /// Nearest qualifying segment, when association succeeded.
    pub segment: Option<SegmentId>,
    /// Estimated extent, for hit-testing.
    pub size: DVec2,
}

/// Scene-to-surface coordinate mapping. Identity unless a consumer rescales.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneTransform {
    pub scale: DVec2,
    pub offset: DVec2,
}

impl SceneTransform {
    pub const IDENTITY: SceneTransform = SceneTransform {
        scale: DVec2::new(1.0, 1.0),
        offset: DVec2::new(0.0, 0.0),
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Scene coordinates to surface coordinates.
    pub fn apply(&self, p: DVec2) -> DVec2 {
        p * self.scale + self.offset
    }

    /// Surface coordinates back to scene coordinates. A zero scale axis
    /// maps to the scene origin of that axis rather than dividing by zero.
    pub fn unapply(&self, p: DVec2) -> DVec2 {
        let d = p - self.offset;
        DVec2::new(
            if self.scale.x != 0.0 { d.x / self.scale.x } else { 0.0 },
            if self.scale.y != 0.0 { d.y / self.scale.y } else { 0.0 },
        )
    }
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The immutable output of parsing one diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub segments: Vec<LineSegment>,
    pub polygons: Vec<Polygon>,
    pub vertices: Vec<Vertex>,
    pub labels: Vec<Label>,
    pub view_box: ViewBox,
    pub transform: SceneTransform,
    pub title: Option<String>,
    pub descriptions: Vec<String>,
}

impl Scene {
    /// A scene with no primitives at all (the outcome for empty or entirely
    /// unparseable input; informational, not an error).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
            && self.polygons.is_empty()
            && self.vertices.is_empty()
            && self.labels.is_empty()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&LineSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id == id)
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    #[must_use]
    pub fn with_id(mut self, id: SceneId) -> Self {
        self.id = id;
        self
    }

    /// A copy of the scene carrying a scene-to-surface transform. Geometry
    /// stays in scene units; hit-test queries map through the transform.
    #[must_use]
    pub fn rescaled(&self, scale: DVec2, offset: DVec2) -> Self {
        Scene {
            transform: SceneTransform { scale, offset },
            ..self.clone()
        }
    }

    /// Serialize for the caching collaborator.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("scene types serialize infallibly")
    }

    /// Reconstruct a scene serialized with [`Scene::to_json`].
    ///
    /// This is the one genuine error path in the crate: a payload that does
    /// not decode implies corruption, not an expected parsing gap.
    pub fn from_json(payload: &str) -> Result<Scene, DecodeError> {
        let scene: Scene = serde_json::from_str(payload)
            .map_err(|source| DecodeError::MalformedPayload { source })?;
        scene.validate()?;
        Ok(scene)
    }

    /// Structural invariants that a decoded payload must still satisfy.
    fn validate(&self) -> Result<(), DecodeError> {
        for poly in &self.polygons {
            if !poly.points.is_empty() && poly.points.len() < 3 {
                return Err(DecodeError::InvalidScene {
                    reason: format!("polygon {} has {} boundary points", poly.id, poly.points.len()),
                });
            }
        }
        if self.view_box.size.x < 0.0 || self.view_box.size.y < 0.0 {
            return Err(DecodeError::InvalidScene {
                reason: "view box has negative size".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
        LineSegment::new(
            SegmentId(0),
            DVec2::new(x1, y1),
            DVec2::new(x2, y2),
            1.0,
        )
    }

    #[test]
    fn segment_length_and_angle() {
        let s = seg(0.0, 0.0, 3.0, 4.0);
        assert_eq!(s.length(), 5.0);
        let horizontal = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(horizontal.angle_degrees(), 0.0);
        assert_eq!(horizontal.orientation(), Orientation::Horizontal);
    }

    #[test]
    fn segment_orientation_classification() {
        assert_eq!(seg(0.0, 0.0, 10.0, 1.0).orientation(), Orientation::Horizontal);
        assert_eq!(seg(0.0, 0.0, 1.0, 10.0).orientation(), Orientation::Vertical);
        assert_eq!(seg(0.0, 0.0, 10.0, 10.0).orientation(), Orientation::Diagonal);
        // Direction does not matter.
        assert_eq!(seg(10.0, 0.0, 0.0, 0.0).orientation(), Orientation::Horizontal);
        assert_eq!(seg(0.0, 10.0, 0.0, 0.0).orientation(), Orientation::Vertical);
    }

    #[test]
    fn with_label_leaves_original_untouched() {
        let s = seg(0.0, 0.0, 10.0, 0.0);
        let labeled = s.with_label("35 in");
        assert_eq!(labeled.label.as_deref(), Some("35 in"));
        assert!(s.label.is_none());
        assert_eq!(labeled.start, s.start);
    }

    #[test]
    fn transform_roundtrip() {
        let t = SceneTransform {
            scale: DVec2::new(2.0, 3.0),
            offset: DVec2::new(10.0, -5.0),
        };
        let p = DVec2::new(7.0, 9.0);
        let back = t.unapply(t.apply(p));
        assert!((back - p).length() < 1e-12);
        assert!(SceneTransform::IDENTITY.is_identity());
        assert!(!t.is_identity());
    }

    #[test]
    fn polygon_centroid() {
        let p = Polygon {
            id: PolygonId(0),
            points: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(4.0, 0.0),
                DVec2::new(4.0, 4.0),
                DVec2::new(0.0, 4.0),
            ],
            filled: false,
            label: None,
            segments: Vec::new(),
        };
        assert_eq!(p.centroid(), DVec2::new(2.0, 2.0));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            Scene::from_json("not json at all"),
            Err(DecodeError::MalformedPayload { .. })
        ));
    }
}
