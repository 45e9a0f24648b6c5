//! Raw shape records extracted from markup.
//!
//! These types sit between the tolerant tag scanner ([`crate::parse`]) and
//! the geometry pipeline ([`crate::scene`]): extraction resolves attributes
//! to typed values here, and no geometry logic runs until a whole
//! [`Diagram`] exists. Keeping the two apart keeps extraction testable on
//! its own.

use glam::DVec2;

/// Everything extraction recovered from one markup string.
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub frame: FrameHints,
    pub shapes: Vec<RawShape>,
    pub title: Option<String>,
    pub descriptions: Vec<String>,
}

/// Coordinate-frame attributes found on the root element, before resolution.
///
/// `view_box` is the four numbers of an explicit `viewBox`; `width`/`height`
/// are the root dimension attributes with any unit suffix stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameHints {
    pub view_box: Option<[f64; 4]>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// One extracted shape, prior to normalization.
#[derive(Debug, Clone)]
pub enum RawShape {
    /// A straight `line` element.
    Line(RawLine),
    /// A `circle` or `ellipse`, read as an explicit point marker.
    Marker(RawMarker),
    /// A single text run with nested markup stripped.
    Text(RawText),
    /// A `rect`, expanded later into four segments and a polygon.
    Rect(RawRect),
    /// A `polygon` (closed) or `polyline` (open) point list.
    PointList(RawPointList),
    /// A `path` element's command string, expanded by the interpreter.
    Path(RawPath),
}

#[derive(Debug, Clone)]
pub struct RawLine {
    pub start: DVec2,
    pub end: DVec2,
    pub stroke_width: f64,
}

#[derive(Debug, Clone)]
pub struct RawMarker {
    pub center: DVec2,
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct RawText {
    pub position: DVec2,
    pub content: String,
    pub font_size: f64,
}

#[derive(Debug, Clone)]
pub struct RawRect {
    pub origin: DVec2,
    pub size: DVec2,
    pub filled: bool,
    pub stroke_width: f64,
}

#[derive(Debug, Clone)]
pub struct RawPointList {
    pub points: Vec<DVec2>,
    /// True for `polygon` (implicitly closed), false for `polyline`.
    pub closed: bool,
    pub filled: bool,
    pub stroke_width: f64,
}

#[derive(Debug, Clone)]
pub struct RawPath {
    pub commands: String,
    pub stroke_width: f64,
}

impl Diagram {
    /// True when extraction recognized nothing drawable.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
