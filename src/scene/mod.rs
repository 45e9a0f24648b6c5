//! Scene assembly.
//!
//! This module is organized into submodules:
//! - `defaults`: empirical constants behind [`crate::Tolerances`]
//! - `model`: the immutable scene data model
//! - `normalize`: coordinate-frame resolution and segment cleanup
//! - `graph`: vertex merging and enclosed-shape detection
//! - `labels`: text fragment combination and segment association
//!
//! [`assemble`] wires the stages into the one linear, synchronous pipeline:
//! raw shapes in, immutable [`Scene`] out. Everything in between is local
//! to the invocation, so scenes may be assembled concurrently with no
//! shared state.

pub mod defaults;
pub mod graph;
pub mod labels;
pub mod model;
pub mod normalize;

pub use model::*;

use std::collections::HashMap;

use glam::DVec2;

use crate::ast::{Diagram, RawShape};
use crate::log::debug;
use crate::path::expand_path;
use crate::types::{PolygonId, SegmentId, Tolerances};
use labels::Fragment;
use normalize::{RawSegment, canonical_key};

/// An explicit enclosed shape awaiting segment-id resolution.
struct PendingPolygon {
    corners: Vec<DVec2>,
    filled: bool,
}

/// Compose an extracted [`Diagram`] into an immutable [`Scene`].
pub fn assemble(diagram: Diagram, tol: &Tolerances) -> Scene {
    let view_box = normalize::resolve_view_box(&diagram.frame);

    // Flatten every shape family into segment, marker, fragment, and
    // pending-polygon streams. Extraction order is preserved so positional
    // ids are deterministic.
    let mut raw_segments: Vec<RawSegment> = Vec::new();
    let mut markers: Vec<DVec2> = Vec::new();
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut pending: Vec<PendingPolygon> = Vec::new();

    for shape in diagram.shapes {
        match shape {
            RawShape::Line(line) => raw_segments.push(RawSegment {
                start: line.start,
                end: line.end,
                stroke_width: line.stroke_width,
            }),
            RawShape::Rect(rect) => {
                if rect.size.x <= 0.0 || rect.size.y <= 0.0 {
                    continue;
                }
                let corners = vec![
                    rect.origin,
                    rect.origin + DVec2::new(rect.size.x, 0.0),
                    rect.origin + rect.size,
                    rect.origin + DVec2::new(0.0, rect.size.y),
                ];
                push_ring(&mut raw_segments, &corners, true, rect.stroke_width);
                pending.push(PendingPolygon {
                    corners,
                    filled: rect.filled,
                });
            }
            RawShape::PointList(list) => {
                push_ring(&mut raw_segments, &list.points, list.closed, list.stroke_width);
                if list.closed && list.points.len() >= 3 {
                    pending.push(PendingPolygon {
                        corners: list.points,
                        filled: list.filled,
                    });
                }
            }
            RawShape::Path(path) => {
                for (start, end) in expand_path(&path.commands) {
                    raw_segments.push(RawSegment {
                        start,
                        end,
                        stroke_width: path.stroke_width,
                    });
                }
            }
            RawShape::Marker(marker) => markers.push(marker.center),
            RawShape::Text(text) => fragments.push(Fragment {
                position: text.position,
                text: text.content,
                font_size: text.font_size,
            }),
        }
    }

    let mut segments: Vec<LineSegment> = normalize::normalize_segments(raw_segments, tol)
        .into_iter()
        .enumerate()
        .map(|(i, raw)| LineSegment::new(SegmentId(i as u32), raw.start, raw.end, raw.stroke_width))
        .collect();

    // Component-segment lookup for explicit polygons, by canonical
    // endpoint key (dedup may have collapsed a shared edge either way
    // round).
    let by_key: HashMap<(i64, i64, i64, i64), SegmentId> = segments
        .iter()
        .map(|s| (canonical_key(s.start, s.end), s.id))
        .collect();

    let mut polygons: Vec<Polygon> = pending
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let ids = ring_segment_ids(&p.corners, &by_key);
            Polygon {
                id: PolygonId(i as u32),
                label: Some(graph::polygon_type_name(p.corners.len())),
                points: p.corners,
                filled: p.filled,
                segments: ids,
            }
        })
        .collect();

    let vertices = graph::build_vertices(&segments, &markers, tol);

    let (label_list, assignments) = labels::associate_labels(fragments, &segments, tol);
    for (id, text) in assignments {
        if let Some(seg) = segments.iter_mut().find(|s| s.id == id) {
            *seg = seg.with_label(text);
        }
    }

    let detected = graph::detect_polygons(
        &segments,
        &vertices,
        &polygons,
        polygons.len() as u32,
        tol,
    );
    polygons.extend(detected);

    debug!(
        segments = segments.len(),
        vertices = vertices.len(),
        polygons = polygons.len(),
        labels = label_list.len(),
        "scene assembled"
    );

    Scene {
        id: Default::default(),
        segments,
        polygons,
        vertices,
        labels: label_list,
        view_box,
        transform: SceneTransform::IDENTITY,
        title: diagram.title,
        descriptions: diagram.descriptions,
    }
}

/// Append the segments of a point chain, closing it when asked.
fn push_ring(out: &mut Vec<RawSegment>, points: &[DVec2], closed: bool, stroke_width: f64) {
    for pair in points.windows(2) {
        out.push(RawSegment {
            start: pair[0],
            end: pair[1],
            stroke_width,
        });
    }
    if closed && points.len() >= 3 {
        out.push(RawSegment {
            start: points[points.len() - 1],
            end: points[0],
            stroke_width,
        });
    }
}

/// Resolve an explicit polygon's boundary into the ids of its surviving
/// component segments. Edges lost to degenerate-filtering simply drop out.
fn ring_segment_ids(
    corners: &[DVec2],
    by_key: &HashMap<(i64, i64, i64, i64), SegmentId>,
) -> Vec<SegmentId> {
    let mut ids = Vec::new();
    for i in 0..corners.len() {
        let a = corners[i];
        let b = corners[(i + 1) % corners.len()];
        if let Some(&id) = by_key.get(&canonical_key(a, b)) {
            ids.push(id);
        }
    }
    ids
}
