//! Geometry normalization.
//!
//! Resolves the coordinate frame and cleans the flat segment list before
//! the vertex graph is built: duplicate strokes (including reversed
//! duplicates) collapse to one, and near-zero-length segments are dropped
//! as extraction noise.

use std::collections::HashSet;

use glam::DVec2;

use crate::ast::FrameHints;
use crate::log::debug;
use crate::types::{Tolerances, ViewBox};

/// A segment after expansion but before identity assignment.
#[derive(Debug, Clone, Copy)]
pub struct RawSegment {
    pub start: DVec2,
    pub end: DVec2,
    pub stroke_width: f64,
}

/// Resolve the drawing's coordinate frame: explicit `viewBox` first, then
/// `width`/`height`, then the fixed default. Never an error.
pub fn resolve_view_box(hints: &FrameHints) -> ViewBox {
    if let Some([x, y, w, h]) = hints.view_box {
        return ViewBox::new(x, y, w, h);
    }
    if let (Some(w), Some(h)) = (hints.width, hints.height) {
        if w > 0.0 && h > 0.0 {
            return ViewBox::new(0.0, 0.0, w, h);
        }
    }
    ViewBox::default()
}

/// Drop degenerate segments and collapse duplicates.
///
/// Duplicates are found by canonicalizing endpoint order, so a segment and
/// its reverse collide on the same key. First occurrence wins, preserving
/// extraction order for positional ids.
pub fn normalize_segments(raw: Vec<RawSegment>, tol: &Tolerances) -> Vec<RawSegment> {
    let mut seen: HashSet<(i64, i64, i64, i64)> = HashSet::new();
    let before = raw.len();
    let kept: Vec<RawSegment> = raw
        .into_iter()
        .filter(|seg| seg.start.distance(seg.end) >= tol.min_segment_length)
        .filter(|seg| seen.insert(canonical_key(seg.start, seg.end)))
        .collect();
    debug!(before, after = kept.len(), "segment normalization");
    kept
}

/// Endpoint-order-independent key, quantized so float noise from different
/// extraction routes (attribute vs path expansion) still collides.
pub(crate) fn canonical_key(a: DVec2, b: DVec2) -> (i64, i64, i64, i64) {
    let qa = (quantize(a.x), quantize(a.y));
    let qb = (quantize(b.x), quantize(b.y));
    let (lo, hi) = if qa <= qb { (qa, qb) } else { (qb, qa) };
    (lo.0, lo.1, hi.0, hi.1)
}

fn quantize(v: f64) -> i64 {
    (v * 1000.0).round() as i64
}
