//! Identity newtypes, coordinate frame, and tolerance configuration.
//!
//! Design goals:
//! - No raw `u32` ids in domain logic; each primitive kind gets its own newtype
//! - Ids are positional (extraction order), so two parses of the same input
//!   produce structurally equal scenes
//! - Every empirical constant is a `Tolerances` field, never a magic number
//!   buried in a pipeline stage

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::scene::defaults;

/// Identity of a line segment within one scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SegmentId(pub u32);

/// Identity of a vertex within one scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(pub u32);

/// Identity of a polygon within one scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PolygonId(pub u32);

/// Identity of a label within one scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct LabelId(pub u32);

/// Identity of a scene. Defaults to 0; callers that manage several scenes
/// assign their own via [`crate::Scene::with_id`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct SceneId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for PolygonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}", self.0)
    }
}

/// The source coordinate frame of a diagram.
///
/// Resolved from an explicit `viewBox` attribute, else from `width`/`height`,
/// else [`defaults::DEFAULT_VIEW_BOX`]. Never an error.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub origin: DVec2,
    pub size: DVec2,
}

impl ViewBox {
    /// Build a view box, clamping negative dimensions to zero.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        ViewBox {
            origin: DVec2::new(x, y),
            size: DVec2::new(width.max(0.0), height.max(0.0)),
        }
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    /// True when a point falls inside the frame (inclusive edges).
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x <= self.origin.x + self.size.x
            && p.y <= self.origin.y + self.size.y
    }
}

impl Default for ViewBox {
    fn default() -> Self {
        defaults::DEFAULT_VIEW_BOX
    }
}

/// Coarse slope classification of a segment.
///
/// Within 15 degrees of the horizontal axis counts as horizontal, within 15
/// degrees of the vertical axis as vertical, everything else diagonal.
/// Boundary angles (exactly 15, exactly 75) belong to the nearer axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
    Diagonal,
}

impl Orientation {
    /// Classify an angle in degrees (any range; folded into [0, 180)).
    pub fn from_angle_degrees(angle: f64) -> Self {
        let folded = angle.rem_euclid(180.0);
        if folded <= defaults::AXIS_ANGLE_TOLERANCE
            || folded >= 180.0 - defaults::AXIS_ANGLE_TOLERANCE
        {
            Orientation::Horizontal
        } else if (folded - 90.0).abs() <= defaults::AXIS_ANGLE_TOLERANCE {
            Orientation::Vertical
        } else {
            Orientation::Diagonal
        }
    }

    pub fn is_axis_aligned(self) -> bool {
        !matches!(self, Orientation::Diagonal)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
            Orientation::Diagonal => write!(f, "diagonal"),
        }
    }
}

/// Empirically calibrated distances driving the whole pipeline.
///
/// The defaults reproduce the values tuned against real diagram corpora.
/// None of them is load-bearing in the algorithms themselves; callers with
/// denser or sparser material should recalibrate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Two points closer than this (per axis) merge into one vertex.
    pub vertex_snap: f64,
    /// Segments shorter than this are extraction noise and are dropped.
    pub min_segment_length: f64,
    /// Same-band text fragments closer than this merge into one label.
    pub band_merge_gap: f64,
    /// Relaxed merge gap when one fragment is a bare unit token.
    pub unit_merge_gap: f64,
    /// Vertical distance within which two fragments share a band.
    pub band_height: f64,
    /// Search radius of the cross-band number/unit pairing pass.
    pub cross_pair_radius: f64,
    /// Max perpendicular distance for label-to-segment association,
    /// axis-aligned segments.
    pub assoc_distance_axis: f64,
    /// Max perpendicular distance for label-to-segment association,
    /// diagonal segments.
    pub assoc_distance_diag: f64,
    /// Labels may project slightly past a segment endpoint by this much.
    pub assoc_overhang: f64,
    /// Association candidates within this distance of each other go to the
    /// plausibility tie-break.
    pub assoc_tie_break: f64,
    /// A label closer to its segment than this gets nudged clear.
    pub label_clearance: f64,
    /// Offset applied when nudging an ambiguous label off its segment.
    pub label_offset: f64,
    /// Hit-test tolerance around a segment.
    pub hit_segment: f64,
    /// Hit-test tolerance around a vertex (tightest touch target).
    pub hit_vertex: f64,
    /// Hit-test tolerance around a label (loosest touch target).
    pub hit_label: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Tolerances {
            vertex_snap: defaults::VERTEX_SNAP,
            min_segment_length: defaults::MIN_SEGMENT_LENGTH,
            band_merge_gap: defaults::BAND_MERGE_GAP,
            unit_merge_gap: defaults::UNIT_MERGE_GAP,
            band_height: defaults::BAND_HEIGHT,
            cross_pair_radius: defaults::CROSS_PAIR_RADIUS,
            assoc_distance_axis: defaults::ASSOC_DISTANCE_AXIS,
            assoc_distance_diag: defaults::ASSOC_DISTANCE_DIAG,
            assoc_overhang: defaults::ASSOC_OVERHANG,
            assoc_tie_break: defaults::ASSOC_TIE_BREAK,
            label_clearance: defaults::LABEL_CLEARANCE,
            label_offset: defaults::LABEL_OFFSET,
            hit_segment: defaults::HIT_SEGMENT,
            hit_vertex: defaults::HIT_VERTEX,
            hit_label: defaults::HIT_LABEL,
        }
    }
}
