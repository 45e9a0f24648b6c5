//! Default tolerances and frame constants.
//!
//! These are empirically chosen against real diagram corpora; treat them as
//! calibration data, not law. [`crate::Tolerances`] exposes all of them.

use crate::types::ViewBox;
use glam::DVec2;

/// Frame substituted when markup carries neither `viewBox` nor usable
/// `width`/`height`.
pub const DEFAULT_VIEW_BOX: ViewBox = ViewBox {
    origin: DVec2::new(0.0, 0.0),
    size: DVec2::new(1000.0, 1000.0),
};

/// Degrees of slack either side of an axis before a segment counts as
/// diagonal.
pub const AXIS_ANGLE_TOLERANCE: f64 = 15.0;

/// Endpoints within this many units (per axis) collapse into one vertex.
pub const VERTEX_SNAP: f64 = 8.0;

/// Segments shorter than this are treated as extraction noise.
pub const MIN_SEGMENT_LENGTH: f64 = 1.0;

/// Close-path draws a closing segment only when the gap back to the subpath
/// start exceeds this.
pub const CLOSE_PATH_MIN_GAP: f64 = 0.5;

/// Horizontal gap within which same-band text fragments merge.
pub const BAND_MERGE_GAP: f64 = 50.0;

/// Relaxed merge gap when one side is a bare unit token; units are often
/// rendered with larger gaps from their number.
pub const UNIT_MERGE_GAP: f64 = 65.0;

/// Vertical distance within which two fragments count as one band.
pub const BAND_HEIGHT: f64 = 12.0;

/// Radius of the second-pass search pairing a leftover bare number with a
/// leftover bare unit.
pub const CROSS_PAIR_RADIUS: f64 = 350.0;

/// Label association thresholds: axis-aligned segments demand a closer
/// label than diagonal ones.
pub const ASSOC_DISTANCE_AXIS: f64 = 30.0;
pub const ASSOC_DISTANCE_DIAG: f64 = 45.0;

/// A label projecting slightly past a segment endpoint still qualifies.
pub const ASSOC_OVERHANG: f64 = 10.0;

/// Candidate segments within this distance of each other are tie-broken by
/// plausibility rather than raw distance.
pub const ASSOC_TIE_BREAK: f64 = 5.0;

/// A label closer to its segment than this is ambiguous and gets nudged.
pub const LABEL_CLEARANCE: f64 = 10.0;

/// Distance a nudged label ends up from its segment.
pub const LABEL_OFFSET: f64 = 14.0;

/// Per-primitive touch tolerances. Vertices are the tightest target,
/// labels the loosest.
pub const HIT_SEGMENT: f64 = 12.0;
pub const HIT_VERTEX: f64 = 10.0;
pub const HIT_LABEL: f64 = 18.0;

/// Stroke width recorded when the markup does not say.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

/// Font size assumed for label extent estimation when unspecified.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
