//! tacton converts vector-graphic markup (an SVG-dialect line diagram such
//! as a geometry figure) into a structured scene of touchable primitives:
//! line segments, vertices, polygons, and text labels. A non-visual
//! exploration layer (haptics, audio, hit-testing) can then let a user
//! "feel" the diagram through sequential touch.
//!
//! Parsing is deliberately forgiving. Real diagram markup arrives with
//! missing ids, mixed quoting, and OCR-fractured text; the engine degrades
//! to fewer primitives instead of failing, merges near-coincident points
//! into one vertex graph, and re-assembles fragmented number/unit text into
//! measurement labels. Empty or unparseable input yields an empty scene,
//! never an error.
//!
//! ```
//! use tacton::{parse_markup, Tolerances};
//! use glam::DVec2;
//!
//! let markup = r##"<svg viewBox="0 0 200 100">
//!   <line x1="0" y1="50" x2="200" y2="50"/>
//!   <text x="90" y="35">120</text>
//!   <text x="140" y="35">cm</text>
//! </svg>"##;
//!
//! let scene = parse_markup(markup);
//! assert_eq!(scene.segments.len(), 1);
//! assert_eq!(scene.labels[0].text, "120 cm");
//!
//! let hit = scene.hit_test(DVec2::new(100.0, 52.0), &Tolerances::default());
//! assert!(hit.is_some());
//! ```
//!
//! Parsing one markup string is a pure function of the input and the
//! [`Tolerances`]; the resulting [`Scene`] is immutable and safe to share
//! across threads. Known limitation: curve and arc path commands are
//! argument-consumed but emit no segments, so curved diagram parts are
//! approximated away.

pub mod ast;
pub mod errors;
pub mod hit;
mod log;
pub mod parse;
pub mod path;
pub mod scene;
pub mod types;

use std::collections::HashMap;

pub use errors::DecodeError;
pub use hit::{HitKind, HitResult, Primitive, Touchable, point_in_polygon, point_segment_distance};
pub use scene::model::{Label, LineSegment, Polygon, Scene, SceneTransform, Vertex};
pub use types::{
    LabelId, Orientation, PolygonId, SceneId, SegmentId, Tolerances, VertexId, ViewBox,
};

/// Parse a markup string into a [`Scene`] with default tolerances.
pub fn parse_markup(source: &str) -> Scene {
    parse_markup_with(source, &Tolerances::default())
}

/// Parse a markup string with caller-calibrated tolerances.
///
/// Repeated parses of identical input under identical tolerances produce
/// structurally equal scenes, so callers can cache scenes keyed on the
/// input without hashing the engine's internals.
pub fn parse_markup_with(source: &str, tol: &Tolerances) -> Scene {
    scene::assemble(parse::extract(source), tol)
}

/// Explicit scene cache interface.
///
/// Injected into callers that want to skip re-parsing; there is no
/// process-wide implicit store. The engine's only contract toward a cache
/// is the structural-equality guarantee of [`parse_markup_with`].
pub trait SceneCache {
    fn get(&self, key: &str) -> Option<Scene>;
    fn put(&mut self, key: &str, scene: Scene);
    fn clear(&mut self);
}

/// In-memory [`SceneCache`] backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Scene>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SceneCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Scene> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, scene: Scene) {
        self.entries.insert(key.to_string(), scene);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
