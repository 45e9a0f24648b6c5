//! Tolerant markup extraction.
//!
//! Turns a markup string into the [`Diagram`] IR by string-scanning for one
//! tag family at a time. The scanner is deliberately not an XML parser:
//! real-world diagram markup arrives with mixed quoting, missing ids, and
//! OCR damage, and a validating parser would reject whole documents that
//! still contain perfectly usable geometry. Anything unrecognizable is
//! skipped; this module never fails.
//!
//! Numeric attributes default to 0 on parse failure. Quoting style (single,
//! double, or absent) does not affect extraction.

use glam::DVec2;

use crate::ast::{
    Diagram, FrameHints, RawLine, RawMarker, RawPath, RawPointList, RawRect, RawShape, RawText,
};
use crate::log::trace;
use crate::scene::defaults;

/// Extract every recognizable shape and metadata block from `source`.
///
/// An input with zero recognizable shapes yields an empty [`Diagram`],
/// not an error.
pub fn extract(source: &str) -> Diagram {
    let mut diagram = Diagram {
        frame: extract_frame(source),
        ..Diagram::default()
    };

    for cap in captures(source, "line") {
        diagram.shapes.push(RawShape::Line(RawLine {
            start: DVec2::new(num_attr(cap.attrs, "x1"), num_attr(cap.attrs, "y1")),
            end: DVec2::new(num_attr(cap.attrs, "x2"), num_attr(cap.attrs, "y2")),
            stroke_width: stroke_width(cap.attrs),
        }));
    }

    for cap in captures(source, "rect") {
        diagram.shapes.push(RawShape::Rect(RawRect {
            origin: DVec2::new(num_attr(cap.attrs, "x"), num_attr(cap.attrs, "y")),
            size: DVec2::new(num_attr(cap.attrs, "width"), num_attr(cap.attrs, "height")),
            filled: is_filled(cap.attrs),
            stroke_width: stroke_width(cap.attrs),
        }));
    }

    for tag in ["polygon", "polyline"] {
        for cap in captures(source, tag) {
            let points = attr(cap.attrs, "points")
                .map(parse_point_list)
                .unwrap_or_default();
            if points.len() < 2 {
                continue;
            }
            diagram.shapes.push(RawShape::PointList(RawPointList {
                points,
                closed: tag == "polygon",
                filled: is_filled(cap.attrs),
                stroke_width: stroke_width(cap.attrs),
            }));
        }
    }

    for cap in captures(source, "path") {
        let Some(commands) = attr(cap.attrs, "d") else {
            continue;
        };
        diagram.shapes.push(RawShape::Path(RawPath {
            commands: commands.to_string(),
            stroke_width: stroke_width(cap.attrs),
        }));
    }

    for tag in ["circle", "ellipse"] {
        for cap in captures(source, tag) {
            let radius = opt_num_attr(cap.attrs, "r")
                .or_else(|| opt_num_attr(cap.attrs, "rx"))
                .unwrap_or(0.0);
            diagram.shapes.push(RawShape::Marker(RawMarker {
                center: DVec2::new(num_attr(cap.attrs, "cx"), num_attr(cap.attrs, "cy")),
                radius,
            }));
        }
    }

    for cap in captures(source, "text") {
        let content = cap.inner.map(clean_text).unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        diagram.shapes.push(RawShape::Text(RawText {
            position: DVec2::new(num_attr(cap.attrs, "x"), num_attr(cap.attrs, "y")),
            content,
            font_size: opt_num_attr(cap.attrs, "font-size")
                .unwrap_or(defaults::DEFAULT_FONT_SIZE),
        }));
    }

    if let Some(cap) = captures(source, "title").into_iter().next() {
        let title = cap.inner.map(clean_text).unwrap_or_default();
        if !title.is_empty() {
            diagram.title = Some(title);
        }
    }
    for cap in captures(source, "desc") {
        let desc = cap.inner.map(clean_text).unwrap_or_default();
        if !desc.is_empty() {
            diagram.descriptions.push(desc);
        }
    }

    trace!(shapes = diagram.shapes.len(), "extraction finished");
    diagram
}

/// Read the coordinate-frame hints off the root element.
fn extract_frame(source: &str) -> FrameHints {
    let Some(root) = captures(source, "svg").into_iter().next() else {
        return FrameHints::default();
    };

    let view_box = attr(root.attrs, "viewBox").and_then(|v| {
        let nums: Vec<f64> = v
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .filter_map(parse_number)
            .collect();
        <[f64; 4]>::try_from(nums).ok()
    });

    FrameHints {
        view_box,
        width: opt_num_attr(root.attrs, "width"),
        height: opt_num_attr(root.attrs, "height"),
    }
}

// ============================================================================
// Attribute reader
// ============================================================================

/// Read attribute `name` out of a tag's attribute substring.
///
/// Tolerates single quotes, double quotes, and no quotes at all. Returns the
/// raw value text; numeric conversion is the caller's problem.
pub(crate) fn attr<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let bytes = body.as_bytes();
    let mut search = 0;
    while let Some(rel) = find_ignore_case(&body[search..], name) {
        let at = search + rel;
        search = at + name.len();

        // Must be a whole attribute name, not a suffix/prefix of another
        // (e.g. "x" inside "x1", or "width" inside "stroke-width").
        let before_ok = at == 0 || {
            let c = bytes[at - 1];
            c.is_ascii_whitespace() || c == b'\'' || c == b'"'
        };
        if !before_ok {
            continue;
        }
        let mut i = at + name.len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }

        return Some(match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let start = i + 1;
                let end = body[start..]
                    .find(quote as char)
                    .map(|p| start + p)
                    .unwrap_or(body.len());
                &body[start..end]
            }
            _ => {
                let start = i;
                let end = body[start..]
                    .find(|c: char| c.is_whitespace())
                    .map(|p| start + p)
                    .unwrap_or(body.len());
                &body[start..end]
            }
        });
    }
    None
}

/// Numeric attribute with the documented 0 default.
pub(crate) fn num_attr(body: &str, name: &str) -> f64 {
    opt_num_attr(body, name).unwrap_or(0.0)
}

pub(crate) fn opt_num_attr(body: &str, name: &str) -> Option<f64> {
    attr(body, name).and_then(parse_number)
}

fn stroke_width(body: &str) -> f64 {
    opt_num_attr(body, "stroke-width").unwrap_or(defaults::DEFAULT_STROKE_WIDTH)
}

fn is_filled(body: &str) -> bool {
    attr(body, "fill").is_some_and(|f| !f.trim().eq_ignore_ascii_case("none"))
}

/// Parse a number, tolerating a trailing unit suffix ("120px", "4.5pt").
fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if let Ok(v) = t.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    // Cut at the first byte that can't appear in a float literal and retry.
    let end = t
        .bytes()
        .position(|b| !(b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')))
        .unwrap_or(t.len());
    let v = t[..end].parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Parse a `points` attribute: coordinates separated by commas and/or
/// whitespace. A trailing odd coordinate is dropped.
fn parse_point_list(s: &str) -> Vec<DVec2> {
    let nums: Vec<f64> = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .filter_map(parse_number)
        .collect();
    nums.chunks_exact(2).map(|c| DVec2::new(c[0], c[1])).collect()
}

// ============================================================================
// Tag scanner
// ============================================================================

struct TagCapture<'a> {
    /// The attribute substring of the opening tag.
    attrs: &'a str,
    /// Inner markup up to the matching close tag, for container elements.
    inner: Option<&'a str>,
}

/// Find every occurrence of `<tag ...>` in `source`, case-insensitively.
///
/// Malformed occurrences (no closing `>`) are skipped, not reported.
fn captures<'a>(source: &'a str, tag: &str) -> Vec<TagCapture<'a>> {
    let bytes = source.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(rel) = source[pos..].find('<') else {
            break;
        };
        let open = pos + rel;
        pos = open + 1;

        let name_start = open + 1;
        let name_end = name_start + tag.len();
        if name_end > bytes.len()
            || !bytes[name_start..name_end].eq_ignore_ascii_case(tag.as_bytes())
        {
            continue;
        }
        // Reject prefix matches: `<line` must not capture `<linearGradient`.
        if bytes
            .get(name_end)
            .is_some_and(|&b| !(b.is_ascii_whitespace() || b == b'>' || b == b'/'))
        {
            continue;
        }

        let Some((attrs_end, self_closing)) = find_tag_end(source, name_end) else {
            continue;
        };
        let attrs = &source[name_end..attrs_end];
        pos = attrs_end + 1;

        let inner = if self_closing {
            None
        } else {
            find_close_tag(source, pos, tag).map(|close| {
                let inner = &source[pos..close];
                pos = close;
                inner
            })
        };

        out.push(TagCapture { attrs, inner });
    }
    out
}

/// Locate the `>` ending an opening tag, honoring quoted attribute values.
/// Returns the attribute-substring end and whether the tag self-closes.
fn find_tag_end(source: &str, from: usize) -> Option<(usize, bool)> {
    let bytes = source.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => {
                    let self_closing = i > from && bytes[i - 1] == b'/';
                    let attrs_end = if self_closing { i - 1 } else { i };
                    return Some((attrs_end, self_closing));
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Find the start of `</tag` at or after `from`, case-insensitively.
fn find_close_tag(source: &str, from: usize, tag: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut pos = from;
    while let Some(rel) = source[pos..].find('<') {
        let at = pos + rel;
        pos = at + 1;
        let rest = &bytes[at..];
        if rest.len() >= tag.len() + 2
            && rest[1] == b'/'
            && rest[2..2 + tag.len()].eq_ignore_ascii_case(tag.as_bytes())
        {
            return Some(at);
        }
    }
    None
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

// ============================================================================
// Text cleanup
// ============================================================================

/// Strip nested tags, decode the basic entities, collapse whitespace.
fn clean_text(inner: &str) -> String {
    let mut stripped = String::with_capacity(inner.len());
    let mut in_tag = false;
    for c in inner.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_double_quoted() {
        assert_eq!(attr(r#" x1="10" y1="20""#, "x1"), Some("10"));
    }

    #[test]
    fn attr_single_quoted() {
        assert_eq!(attr(" x1='10' y1='20'", "y1"), Some("20"));
    }

    #[test]
    fn attr_unquoted() {
        assert_eq!(attr(" x1=10 y1=20", "x1"), Some("10"));
        assert_eq!(attr(" x1=10 y1=20", "y1"), Some("20"));
    }

    #[test]
    fn attr_name_is_not_a_prefix_match() {
        // Asking for "x" must not return the value of "x1" or "x2".
        assert_eq!(attr(r#" x1="10" x2="90""#, "x"), None);
        assert_eq!(attr(r#" x="5" x1="10""#, "x"), Some("5"));
        // "width" must not match inside "stroke-width".
        assert_eq!(attr(r#" stroke-width="3""#, "width"), None);
    }

    #[test]
    fn attr_spaces_around_equals() {
        assert_eq!(attr(r#" cx = "40""#, "cx"), Some("40"));
    }

    #[test]
    fn num_attr_defaults_to_zero() {
        assert_eq!(num_attr(r#" x1="oops""#, "x1"), 0.0);
        assert_eq!(num_attr("", "x1"), 0.0);
    }

    #[test]
    fn parse_number_tolerates_units() {
        assert_eq!(parse_number("120px"), Some(120.0));
        assert_eq!(parse_number(" 4.5pt "), Some(4.5));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("px"), None);
    }

    #[test]
    fn extract_line_mixed_quoting() {
        let d = extract(r#"<svg><line x1="0" y1='0' x2=100 y2="0"/></svg>"#);
        assert_eq!(d.shapes.len(), 1);
        let RawShape::Line(line) = &d.shapes[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.end, DVec2::new(100.0, 0.0));
    }

    #[test]
    fn extract_tolerates_unknown_and_unterminated_tags() {
        // `<blob>` is ignored; the `<line` missing its closing `>` still
        // yields its coordinates (the scanner reads up to the next `>`).
        let d = extract("<svg><blob a=1/><line x1=0 y1=0 x2=5 y2=5</svg>");
        assert_eq!(d.shapes.len(), 1);
        let RawShape::Line(line) = &d.shapes[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.end, DVec2::new(5.0, 5.0));
    }

    #[test]
    fn extract_empty_input() {
        let d = extract("");
        assert!(d.is_empty());
        assert!(d.title.is_none());
    }

    #[test]
    fn extract_frame_viewbox() {
        let d = extract(r#"<svg viewBox="0 0 640 480"></svg>"#);
        assert_eq!(d.frame.view_box, Some([0.0, 0.0, 640.0, 480.0]));
    }

    #[test]
    fn extract_frame_comma_separated_viewbox() {
        let d = extract(r#"<svg viewBox="0,0,640,480"></svg>"#);
        assert_eq!(d.frame.view_box, Some([0.0, 0.0, 640.0, 480.0]));
    }

    #[test]
    fn extract_frame_width_height_with_units() {
        let d = extract(r#"<svg width="800px" height="600px"></svg>"#);
        assert_eq!(d.frame.view_box, None);
        assert_eq!(d.frame.width, Some(800.0));
        assert_eq!(d.frame.height, Some(600.0));
    }

    #[test]
    fn extract_text_strips_nested_markup() {
        let d = extract(r#"<svg><text x="5" y="9">4<tspan dy="2">5</tspan> cm</text></svg>"#);
        let RawShape::Text(t) = &d.shapes[0] else {
            panic!("expected text");
        };
        assert_eq!(t.content, "4 5 cm");
        assert_eq!(t.position, DVec2::new(5.0, 9.0));
    }

    #[test]
    fn extract_text_decodes_entities() {
        let d = extract(r#"<svg><text x="0" y="0">5 &amp; 6</text></svg>"#);
        let RawShape::Text(t) = &d.shapes[0] else {
            panic!("expected text");
        };
        assert_eq!(t.content, "5 & 6");
    }

    #[test]
    fn extract_polygon_and_polyline() {
        let d = extract(
            r#"<svg><polygon points="0,0 10,0 10,10" fill="red"/>
               <polyline points="0 0, 5 5, 10 0" fill="none"/></svg>"#,
        );
        let lists: Vec<_> = d
            .shapes
            .iter()
            .filter_map(|s| match s {
                RawShape::PointList(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 2);
        assert!(lists[0].closed && lists[0].filled);
        assert!(!lists[1].closed && !lists[1].filled);
        assert_eq!(lists[1].points.len(), 3);
    }

    #[test]
    fn extract_markers() {
        let d = extract(r#"<svg><circle cx="10" cy="20" r="3"/><ellipse cx=1 cy=2 rx=4 ry=2/></svg>"#);
        let markers: Vec<_> = d
            .shapes
            .iter()
            .filter_map(|s| match s {
                RawShape::Marker(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].center, DVec2::new(10.0, 20.0));
        assert_eq!(markers[1].radius, 4.0);
    }

    #[test]
    fn extract_line_does_not_capture_lineargradient() {
        let d = extract(r#"<svg><linearGradient x1="0" y1="0" x2="1" y2="1"/></svg>"#);
        assert!(d.shapes.is_empty());
    }

    #[test]
    fn extract_title_and_descriptions() {
        let d = extract(
            "<svg><title>Right triangle</title><desc>A 3-4-5 triangle</desc>\
             <desc>Units in cm</desc></svg>",
        );
        assert_eq!(d.title.as_deref(), Some("Right triangle"));
        assert_eq!(d.descriptions.len(), 2);
    }

    #[test]
    fn extract_quoted_gt_does_not_end_tag() {
        let d = extract(r#"<svg><line x1="0" y1="0" x2="8" y2="0" data-note="a>b"/></svg>"#);
        let RawShape::Line(line) = &d.shapes[0] else {
            panic!("expected a line");
        };
        assert_eq!(line.end.x, 8.0);
    }
}
