//! Vertex graph construction and enclosed-shape detection.
//!
//! Endpoint merging: every segment endpoint and explicit point marker is
//! snapped to an existing vertex when one lies within the snap tolerance on
//! both axes; otherwise it becomes a new vertex. First-found-within-tolerance
//! wins, with no distance minimization across candidates; sufficient at
//! normal diagram density. Worst case every point becomes its own vertex;
//! there is no failure mode.
//!
//! Cycle detection: for every graph edge, the shortest alternative path
//! between its endpoints (breadth-first, with the edge removed) closes the
//! smallest cycle through that edge. Cycles deduplicate on their vertex set.
//! The input graph is not assumed planar-embedded (geometry figures cross
//! diagonals freely), so this wins over face traversal here.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::DVec2;

use crate::log::debug;
use crate::scene::model::{LineSegment, Polygon, Vertex};
use crate::types::{PolygonId, SegmentId, Tolerances, VertexId};

/// Merge segment endpoints and explicit markers into the vertex set,
/// recording per-vertex connectivity. Idempotent: feeding the resulting
/// vertex positions back in cannot create or move vertices.
pub fn build_vertices(
    segments: &[LineSegment],
    markers: &[DVec2],
    tol: &Tolerances,
) -> Vec<Vertex> {
    let mut vertices: Vec<Vertex> = Vec::new();

    let touch = |point: DVec2, segment: Option<SegmentId>, vertices: &mut Vec<Vertex>| {
        let found = vertices
            .iter_mut()
            .find(|v| within_snap(v.position, point, tol.vertex_snap));
        match found {
            Some(v) => {
                if let Some(id) = segment {
                    if !v.segments.contains(&id) {
                        v.segments.push(id);
                    }
                }
            }
            None => {
                let ordinal = vertices.len() as u32 + 1;
                vertices.push(Vertex {
                    id: VertexId(vertices.len() as u32),
                    position: point,
                    segments: segment.into_iter().collect(),
                    ordinal: Some(ordinal),
                });
            }
        }
    };

    for seg in segments {
        touch(seg.start, Some(seg.id), &mut vertices);
        touch(seg.end, Some(seg.id), &mut vertices);
    }
    for &marker in markers {
        touch(marker, None, &mut vertices);
    }

    debug!(count = vertices.len(), "vertex graph built");
    vertices
}

/// Snap test is per-axis, not euclidean: a cheap box check that matches the
/// tolerance's meaning of "the same drawn point".
fn within_snap(a: DVec2, b: DVec2, snap: f64) -> bool {
    (a.x - b.x).abs() <= snap && (a.y - b.y).abs() <= snap
}

/// Detect closed cycles in the vertex graph and report them as polygons,
/// skipping any cycle whose vertex set matches an explicit polygon already
/// in the scene. Ids continue from `next_id`.
pub fn detect_polygons(
    segments: &[LineSegment],
    vertices: &[Vertex],
    explicit: &[Polygon],
    next_id: u32,
    tol: &Tolerances,
) -> Vec<Polygon> {
    let edges = collect_edges(segments, vertices);
    if edges.is_empty() {
        return Vec::new();
    }

    // Adjacency over vertex indices.
    let mut adjacency: HashMap<usize, Vec<(usize, SegmentId)>> = HashMap::new();
    for &(u, v, seg) in &edges {
        adjacency.entry(u).or_default().push((v, seg));
        adjacency.entry(v).or_default().push((u, seg));
    }

    let explicit_keys: HashSet<Vec<usize>> = explicit
        .iter()
        .filter_map(|p| boundary_key(&p.points, vertices, tol))
        .collect();

    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut found = Vec::new();

    for &(u, v, seg) in &edges {
        let Some(path) = shortest_path(&adjacency, u, v, seg) else {
            continue;
        };
        // Two vertices linked by parallel segments close a degenerate
        // two-point "cycle"; a real enclosed shape needs three corners.
        if path.len() < 3 {
            continue;
        }
        let mut key: Vec<usize> = path.iter().map(|&(idx, _)| idx).collect();
        key.sort_unstable();
        if !seen.insert(key.clone()) || explicit_keys.contains(&key) {
            continue;
        }

        let points: Vec<DVec2> = path.iter().map(|&(idx, _)| vertices[idx].position).collect();
        let mut cycle_segments: Vec<SegmentId> =
            path.iter().filter_map(|&(_, s)| s).collect();
        cycle_segments.push(seg);

        found.push(Polygon {
            id: PolygonId(next_id + found.len() as u32),
            points,
            filled: false,
            label: Some(polygon_type_name(path.len())),
            segments: cycle_segments,
        });
    }

    debug!(count = found.len(), "cycles detected");
    found
}

/// Human-facing name for an `n`-sided enclosed shape.
pub fn polygon_type_name(sides: usize) -> String {
    match sides {
        3 => "triangle".to_string(),
        4 => "quadrilateral".to_string(),
        5 => "pentagon".to_string(),
        6 => "hexagon".to_string(),
        7 => "heptagon".to_string(),
        8 => "octagon".to_string(),
        n => format!("{n}-sided polygon"),
    }
}

/// Edges of the vertex graph: segments whose two endpoints merged into two
/// distinct vertices. A segment collapsed onto one vertex is a loop and
/// carries no cycle information.
fn collect_edges(
    segments: &[LineSegment],
    vertices: &[Vertex],
) -> Vec<(usize, usize, SegmentId)> {
    let mut by_segment: HashMap<SegmentId, Vec<usize>> = HashMap::new();
    for (idx, vertex) in vertices.iter().enumerate() {
        for &seg in &vertex.segments {
            by_segment.entry(seg).or_default().push(idx);
        }
    }
    segments
        .iter()
        .filter_map(|seg| {
            let ends = by_segment.get(&seg.id)?;
            match ends.as_slice() {
                &[u, v] if u != v => Some((u, v, seg.id)),
                _ => None,
            }
        })
        .collect()
}

/// Breadth-first shortest path from `from` to `to`, never crossing
/// `excluded`. Returns the visited vertices in order, each with the segment
/// that led into it (`None` for the start).
fn shortest_path(
    adjacency: &HashMap<usize, Vec<(usize, SegmentId)>>,
    from: usize,
    to: usize,
    excluded: SegmentId,
) -> Option<Vec<(usize, Option<SegmentId>)>> {
    let mut queue = VecDeque::from([from]);
    let mut came_from: HashMap<usize, (usize, SegmentId)> = HashMap::new();
    let mut visited: HashSet<usize> = HashSet::from([from]);

    while let Some(current) = queue.pop_front() {
        if current == to {
            break;
        }
        let Some(neighbors) = adjacency.get(&current) else {
            continue;
        };
        for &(next, seg) in neighbors {
            if seg == excluded || !visited.insert(next) {
                continue;
            }
            came_from.insert(next, (current, seg));
            queue.push_back(next);
        }
    }

    if !visited.contains(&to) || !came_from.contains_key(&to) {
        return None;
    }

    let mut path = vec![(to, None)];
    let mut cursor = to;
    while cursor != from {
        let &(prev, seg) = came_from.get(&cursor)?;
        path.last_mut()?.1 = Some(seg);
        path.push((prev, None));
        cursor = prev;
    }
    path.reverse();
    Some(path)
}

/// Map a polygon boundary onto vertex indices, when every corner lies
/// within snap tolerance of some vertex.
fn boundary_key(points: &[DVec2], vertices: &[Vertex], tol: &Tolerances) -> Option<Vec<usize>> {
    let mut key: Vec<usize> = points
        .iter()
        .map(|&p| {
            vertices
                .iter()
                .position(|v| within_snap(v.position, p, tol.vertex_snap))
        })
        .collect::<Option<Vec<usize>>>()?;
    key.sort_unstable();
    key.dedup();
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: u32, x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
        LineSegment::new(
            SegmentId(id),
            DVec2::new(x1, y1),
            DVec2::new(x2, y2),
            1.0,
        )
    }

    #[test]
    fn endpoints_within_snap_merge() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            // Starts 5 units from the first segment's end: same vertex.
            seg(1, 103.0, 4.0, 100.0, 100.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        assert_eq!(vertices.len(), 3);
        let shared = vertices
            .iter()
            .find(|v| v.segments.len() == 2)
            .expect("one shared vertex");
        assert_eq!(shared.position, DVec2::new(100.0, 0.0));
        assert_eq!(shared.segments, vec![SegmentId(0), SegmentId(1)]);
    }

    #[test]
    fn merge_is_idempotent() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            seg(1, 99.0, 3.0, 0.0, 100.0),
            seg(2, 2.0, 101.0, 1.0, 1.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        let positions: Vec<DVec2> = vertices.iter().map(|v| v.position).collect();
        let again = build_vertices(&[], &positions, &tol);
        assert_eq!(again.len(), vertices.len());
        for (a, b) in vertices.iter().zip(&again) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn no_two_vertices_within_tolerance() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 50.0, 0.0),
            seg(1, 3.0, 3.0, 50.0, 40.0),
            seg(2, 47.0, 2.0, 0.0, 40.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        for (i, a) in vertices.iter().enumerate() {
            for b in &vertices[i + 1..] {
                assert!(
                    !within_snap(a.position, b.position, tol.vertex_snap),
                    "{:?} and {:?} are within snap",
                    a.position,
                    b.position
                );
            }
        }
    }

    #[test]
    fn markers_become_vertices() {
        let tol = Tolerances::default();
        let vertices = build_vertices(&[], &[DVec2::new(10.0, 10.0)], &tol);
        assert_eq!(vertices.len(), 1);
        assert!(vertices[0].segments.is_empty());
        assert_eq!(vertices[0].ordinal, Some(1));
    }

    #[test]
    fn ordinals_are_one_based_in_creation_order() {
        let tol = Tolerances::default();
        let segments = [seg(0, 0.0, 0.0, 100.0, 0.0)];
        let vertices = build_vertices(&segments, &[], &tol);
        assert_eq!(vertices[0].ordinal, Some(1));
        assert_eq!(vertices[1].ordinal, Some(2));
    }

    #[test]
    fn triangle_cycle_detected() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            seg(1, 100.0, 0.0, 50.0, 80.0),
            seg(2, 50.0, 80.0, 0.0, 0.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        let polygons = detect_polygons(&segments, &vertices, &[], 0, &tol);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].points.len(), 3);
        assert_eq!(polygons[0].label.as_deref(), Some("triangle"));
        assert_eq!(polygons[0].segments.len(), 3);
    }

    #[test]
    fn square_cycle_detected_once() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            seg(1, 100.0, 0.0, 100.0, 100.0),
            seg(2, 100.0, 100.0, 0.0, 100.0),
            seg(3, 0.0, 100.0, 0.0, 0.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        let polygons = detect_polygons(&segments, &vertices, &[], 0, &tol);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].label.as_deref(), Some("quadrilateral"));
    }

    #[test]
    fn open_chain_yields_no_cycle() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            seg(1, 100.0, 0.0, 100.0, 100.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        assert!(detect_polygons(&segments, &vertices, &[], 0, &tol).is_empty());
    }

    #[test]
    fn explicit_polygon_suppresses_detected_duplicate() {
        let tol = Tolerances::default();
        let segments = [
            seg(0, 0.0, 0.0, 100.0, 0.0),
            seg(1, 100.0, 0.0, 50.0, 80.0),
            seg(2, 50.0, 80.0, 0.0, 0.0),
        ];
        let vertices = build_vertices(&segments, &[], &tol);
        let explicit = [Polygon {
            id: PolygonId(0),
            points: vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(50.0, 80.0),
            ],
            filled: true,
            label: None,
            segments: vec![SegmentId(0), SegmentId(1), SegmentId(2)],
        }];
        let polygons = detect_polygons(&segments, &vertices, &explicit, 1, &tol);
        assert!(polygons.is_empty());
    }

    #[test]
    fn type_names() {
        assert_eq!(polygon_type_name(3), "triangle");
        assert_eq!(polygon_type_name(8), "octagon");
        assert_eq!(polygon_type_name(11), "11-sided polygon");
    }
}
