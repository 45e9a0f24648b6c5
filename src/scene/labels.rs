//! Label combination and segment association.
//!
//! The most heuristic-heavy stage. Raw text fragments arrive fractured by
//! OCR and sloppy authoring: a measurement like "35 in" may be two or three
//! fragments, a period may come through as a stray "0", a unit may sit a
//! long way from its number. The pipeline here is two-phase:
//! candidates are computed over an immutable snapshot of the fragments,
//! then resolved in one pass, so no order-dependent mutation can change
//! the outcome.
//!
//! Passes, in order:
//! 1. canonicalize fused digit/unit runs ("35in" -> "35 in")
//! 2. band-merge: same horizontal band, left-to-right, proximity-gated
//! 3. cross-band pairing: leftover bare number + bare unit, wider radius
//! 4. suppression: a unit token with no number partner is never shown
//! 5. nearest-segment association, orientation-dependent thresholds
//! 6. position correction for labels sitting on top of their segment

use glam::DVec2;

use crate::log::{debug, trace};
use crate::scene::model::{Label, LineSegment};
use crate::types::{LabelId, Orientation, SegmentId, Tolerances};

/// A raw text fragment, straight out of extraction.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub position: DVec2,
    pub text: String,
    pub font_size: f64,
}

/// Measurement unit tokens that may trail a number, with or without a
/// trailing period.
const UNIT_TOKENS: [&str; 7] = ["in", "ft", "yd", "m", "cm", "mm", "mi"];

/// Combine fragments into finished labels and associate each with its
/// nearest qualifying segment. Returns the labels plus the text each
/// segment should carry.
pub fn associate_labels(
    fragments: Vec<Fragment>,
    segments: &[LineSegment],
    tol: &Tolerances,
) -> (Vec<Label>, Vec<(SegmentId, String)>) {
    let fragments: Vec<Fragment> = fragments
        .into_iter()
        .map(canonicalize)
        .filter(|f| !f.text.is_empty())
        .collect();

    let mut combined = band_merge(fragments, tol);
    cross_band_pair(&mut combined, tol);

    // A fragment left as a bare unit with no number partner is suppressed
    // entirely; a standalone unit reads as noise, not a measurement.
    combined.retain(|c| !c.consumed && !is_bare_unit(&c.text));

    let mut labels = Vec::new();
    let mut assignments = Vec::new();
    for (idx, c) in combined.iter().enumerate() {
        let segment = associate(c, segments, tol);
        let position = match segment {
            Some(id) => correct_position(c, segments, id, tol),
            None => c.position,
        };
        if let Some(id) = segment {
            assignments.push((id, c.text.clone()));
        }
        labels.push(Label {
            id: LabelId(idx as u32),
            position,
            text: c.text.clone(),
            segment,
            size: DVec2::new(text_width(&c.text, c.font_size), c.font_size),
        });
    }

    debug!(labels = labels.len(), "label association finished");
    (labels, assignments)
}

/// One combined label candidate moving through the pipeline.
#[derive(Debug, Clone)]
struct Combined {
    position: DVec2,
    text: String,
    font_size: f64,
    consumed: bool,
}

// ============================================================================
// Pass 1: canonicalization
// ============================================================================

/// Normalize OCR-characteristic glitches inside one fragment: a digit run
/// directly fused to a unit letter gets the missing space inserted and the
/// unit lower-cased ("35IN" -> "35 in").
fn canonicalize(mut fragment: Fragment) -> Fragment {
    let words: Vec<String> = fragment
        .text
        .split_whitespace()
        .map(|word| {
            if let Some((number, unit)) = split_fused(word) {
                format!("{number} {unit}")
            } else {
                word.to_string()
            }
        })
        .collect();
    fragment.text = words.join(" ");
    fragment
}

/// Split "35in" into ("35", "in") when the suffix is a known unit token.
fn split_fused(word: &str) -> Option<(&str, String)> {
    let split_at = word.find(|c: char| c.is_ascii_alphabetic())?;
    let (number, suffix) = word.split_at(split_at);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let unit = suffix.trim_end_matches('.').to_ascii_lowercase();
    UNIT_TOKENS.contains(&unit.as_str()).then_some((number, unit))
}

// ============================================================================
// Pass 2: band merge
// ============================================================================

/// Merge fragments that share a horizontal band and sit within proximity,
/// left to right. The merge gap relaxes when one side is a bare unit
/// token, which authoring tools space further from the number.
fn band_merge(fragments: Vec<Fragment>, tol: &Tolerances) -> Vec<Combined> {
    let mut sorted = fragments;
    sorted.sort_by(|a, b| {
        a.position
            .y
            .total_cmp(&b.position.y)
            .then(a.position.x.total_cmp(&b.position.x))
    });

    // Phase one: over the immutable sorted snapshot, decide for every
    // adjacent pair whether it merges.
    let merges_with_next: Vec<bool> = sorted
        .windows(2)
        .map(|w| {
            let (a, b) = (&w[0], &w[1]);
            if (a.position.y - b.position.y).abs() > tol.band_height {
                return false;
            }
            let gap = b.position.x - (a.position.x + text_width(&a.text, a.font_size));
            let threshold = if is_bare_unit(&a.text) || is_bare_unit(&b.text) {
                tol.unit_merge_gap
            } else {
                tol.band_merge_gap
            };
            gap <= threshold
        })
        .collect();

    // Phase two: resolve the adjacency into runs, concatenating left to
    // right. Anchor position is the first numeric fragment's, preserving
    // visual alignment with the measured feature.
    let mut out: Vec<Combined> = Vec::new();
    let mut run_start = true;
    for (i, frag) in sorted.iter().enumerate() {
        if run_start {
            out.push(Combined {
                position: frag.position,
                text: frag.text.clone(),
                font_size: frag.font_size,
                consumed: false,
            });
        } else if let Some(current) = out.last_mut() {
            append_fragment(current, frag);
        }
        run_start = !merges_with_next.get(i).copied().unwrap_or(true);
    }

    trace!(merged = out.len(), "band merge resolved");
    out
}

/// Concatenate a fragment onto a run, applying the stray-"0" noise rule:
/// a fragment that is exactly "0" abutting a number already ending in a
/// digit or decimal point is a misread period and is discarded.
fn append_fragment(current: &mut Combined, frag: &Fragment) {
    let stray_zero = frag.text == "0"
        && current
            .text
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_digit() || c == '.');
    if !stray_zero {
        if starts_numeric(&frag.text) && !starts_numeric(&current.text) {
            // The number anchors the label even when a stray token
            // preceded it in reading order.
            current.position = frag.position;
        }
        current.text.push(' ');
        current.text.push_str(&frag.text);
        current.font_size = current.font_size.max(frag.font_size);
    }
}

// ============================================================================
// Pass 3: cross-band pairing
// ============================================================================

/// Recover labels whose number and unit were rendered in visually
/// separated positions: a leftover bare number searches all remaining
/// fragments within a wider radius for a complementary bare unit.
///
/// Candidates go through a coarse spatial grid (cell edge = the pairing
/// radius) so this pass stays near-linear on pathological inputs with very
/// many fragments.
fn cross_band_pair(combined: &mut [Combined], tol: &Tolerances) {
    let grid = Grid::build(
        combined
            .iter()
            .enumerate()
            .filter(|(_, c)| is_bare_unit(&c.text))
            .map(|(i, c)| (i, c.position)),
        tol.cross_pair_radius,
    );

    for number_idx in 0..combined.len() {
        if !is_bare_number(&combined[number_idx].text) || combined[number_idx].consumed {
            continue;
        }
        let origin = combined[number_idx].position;
        let Some(unit_idx) = grid
            .near(origin)
            .filter(|&i| i != number_idx && !combined[i].consumed)
            .filter(|&i| combined[i].position.distance(origin) <= tol.cross_pair_radius)
            .min_by(|&a, &b| {
                combined[a]
                    .position
                    .distance(origin)
                    .total_cmp(&combined[b].position.distance(origin))
            })
        else {
            continue;
        };

        let unit = combined[unit_idx].text.trim_end_matches('.').to_ascii_lowercase();
        trace!(number = %combined[number_idx].text, %unit, "cross-band pair");
        let text = format!("{} {}", combined[number_idx].text, unit);
        // Anchor stays at the number's original position.
        combined[number_idx].text = text;
        combined[unit_idx].consumed = true;
    }
}

/// Coarse bucketing of points for radius-bounded neighbor queries.
struct Grid {
    cell: f64,
    buckets: std::collections::HashMap<(i64, i64), Vec<usize>>,
}

impl Grid {
    fn build(points: impl Iterator<Item = (usize, DVec2)>, cell: f64) -> Self {
        let mut buckets: std::collections::HashMap<(i64, i64), Vec<usize>> =
            std::collections::HashMap::new();
        for (idx, p) in points {
            buckets.entry(Self::key(p, cell)).or_default().push(idx);
        }
        Grid { cell, buckets }
    }

    fn key(p: DVec2, cell: f64) -> (i64, i64) {
        ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64)
    }

    /// Indices in the 3x3 cell neighborhood of `p`; everything within one
    /// cell edge of `p` is guaranteed to be here.
    fn near(&self, p: DVec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = Self::key(p, self.cell);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                self.buckets
                    .get(&(cx + dx, cy + dy))
                    .into_iter()
                    .flatten()
                    .copied()
            })
        })
    }
}

// ============================================================================
// Token classification
// ============================================================================

fn is_bare_unit(text: &str) -> bool {
    let t = text.trim().trim_end_matches('.').to_ascii_lowercase();
    UNIT_TOKENS.contains(&t.as_str())
}

fn is_bare_number(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty()
        && t.chars().any(|c| c.is_ascii_digit())
        && t.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn starts_numeric(text: &str) -> bool {
    text.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Estimated rendered width using proportional glyph advances.
fn text_width(text: &str, font_size: f64) -> f64 {
    let hundredths: u32 = text
        .chars()
        .map(|c| {
            if (' '..='~').contains(&c) {
                GLYPH_ADVANCE[(c as usize) - 0x20] as u32
            } else {
                100
            }
        })
        .sum();
    hundredths as f64 * font_size / 150.0
}

/// Proportional character advances, hundredths of an em-ish unit.
#[rustfmt::skip]
const GLYPH_ADVANCE: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

// ============================================================================
// Pass 5: segment association
// ============================================================================

/// Match a label to the nearest segment under two joint conditions: the
/// perpendicular distance stays below an orientation-dependent threshold,
/// and the projection onto the segment's line falls within the span plus a
/// small overhang. Near-ties go to a plausibility score instead of raw
/// distance.
fn associate(label: &Combined, segments: &[LineSegment], tol: &Tolerances) -> Option<SegmentId> {
    struct Candidate {
        id: SegmentId,
        distance: f64,
        score: f64,
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for seg in segments {
        let dir = seg.direction();
        if dir == DVec2::ZERO {
            continue;
        }
        let rel = label.position - seg.start;
        let along = rel.dot(dir);
        let perp = rel.perp_dot(dir).abs();
        let len = seg.length();

        if along < -tol.assoc_overhang || along > len + tol.assoc_overhang {
            continue;
        }
        let orientation = seg.orientation();
        let max_perp = if orientation.is_axis_aligned() {
            tol.assoc_distance_axis
        } else {
            tol.assoc_distance_diag
        };
        if perp > max_perp {
            continue;
        }

        // Plausibility: penalize (never exclude) pairings a sighted reader
        // would find odd: a label hanging past an endpoint, or a label far
        // off-axis from a vertical segment's side position.
        let overhang_excess = (-along).max(along - len).max(0.0);
        let mut score = perp + 2.0 * overhang_excess;
        if orientation == Orientation::Vertical {
            let dy = (label.position.y - (seg.start.y + seg.end.y) * 0.5).abs();
            score += (dy - len * 0.5).max(0.0);
        }
        candidates.push(Candidate {
            id: seg.id,
            distance: perp,
            score,
        });
    }

    let best = candidates
        .iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))?;
    // Distances within the tie-break window are decided on score.
    let winner = candidates
        .iter()
        .filter(|c| c.distance - best.distance <= tol.assoc_tie_break)
        .min_by(|a, b| a.score.total_cmp(&b.score))?;
    Some(winner.id)
}

// ============================================================================
// Pass 6: position correction
// ============================================================================

/// Nudge a label clear of its segment, but only when its current placement
/// is ambiguous (on top of, or hugging, the stroke). A comfortably placed
/// label keeps the author's intent.
fn correct_position(
    label: &Combined,
    segments: &[LineSegment],
    id: SegmentId,
    tol: &Tolerances,
) -> DVec2 {
    let Some(seg) = segments.iter().find(|s| s.id == id) else {
        return label.position;
    };
    let dir = seg.direction();
    if dir == DVec2::ZERO {
        return label.position;
    }
    let rel = label.position - seg.start;
    let signed_perp = rel.perp_dot(dir);
    if signed_perp.abs() >= tol.label_clearance {
        return label.position;
    }

    // The perpendicular component of `rel` is `signed_perp * normal`, so
    // displacing along `normal * sign(signed_perp)` keeps the side the
    // author chose. A label dead on the stroke goes to the positive-normal
    // side (up, for a horizontal segment in SVG coordinates).
    let side = if signed_perp >= 0.0 { 1.0 } else { -1.0 };
    let along = rel.dot(dir).clamp(0.0, seg.length());
    let foot = seg.start + dir * along;
    let normal = DVec2::new(dir.y, -dir.x);
    foot + normal * (side * tol.label_offset)
}
