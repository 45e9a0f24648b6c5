//! Path command interpreter.
//!
//! Expands a path-data command string into straight-line segments. Supported
//! commands: absolute/relative move and line (including the axis-restricted
//! horizontal/vertical forms) and close-path. Curves and arcs (C/S/Q/T/A)
//! are parsed so their arguments are consumed and the current point stays
//! correct, but they emit no segment; curved diagram parts are approximated
//! away, a documented limitation, not an error.

use glam::DVec2;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::log::trace;
use crate::scene::defaults;

#[derive(Parser)]
#[grammar = "pathdata.pest"]
struct PathParser;

/// Expand a path command string into an ordered list of straight segments.
///
/// A command string the grammar cannot read at all yields an empty list,
/// never an error.
pub fn expand_path(commands: &str) -> Vec<(DVec2, DVec2)> {
    let Ok(mut pairs) = PathParser::parse(Rule::path, commands) else {
        trace!("unreadable path data, emitting no segments");
        return Vec::new();
    };
    let Some(path) = pairs.next() else {
        return Vec::new();
    };

    let mut interp = Interp::default();
    for command in path.into_inner() {
        interp.apply(command);
    }
    interp.segments
}

/// Interpreter state: current point, subpath start for close-path, and the
/// segments produced so far.
#[derive(Default)]
struct Interp {
    current: Option<DVec2>,
    subpath_start: Option<DVec2>,
    segments: Vec<(DVec2, DVec2)>,
}

impl Interp {
    fn apply(&mut self, command: Pair<Rule>) {
        let letter = command.as_str().chars().next().unwrap_or('M');
        let relative = letter.is_ascii_lowercase();
        let rule = command.as_rule();
        let args: Vec<f64> = command
            .into_inner()
            .filter(|p| p.as_rule() == Rule::number)
            .filter_map(|p| p.as_str().parse().ok())
            .collect();

        match rule {
            Rule::move_to => self.move_to(&args, relative),
            Rule::line_to => self.line_to(&args, relative),
            Rule::hline_to => self.axis_line_to(&args, relative, true),
            Rule::vline_to => self.axis_line_to(&args, relative, false),
            Rule::close => self.close(),
            // Curves and arcs: emit nothing, but track the endpoint so any
            // following relative command resolves correctly.
            Rule::cubic | Rule::quad | Rule::arc => self.skip_to_endpoint(letter, &args, relative),
            _ => {}
        }
    }

    fn resolve(&self, x: f64, y: f64, relative: bool) -> DVec2 {
        match (relative, self.current) {
            (true, Some(cur)) => cur + DVec2::new(x, y),
            _ => DVec2::new(x, y),
        }
    }

    fn emit(&mut self, to: DVec2) {
        if let Some(from) = self.current {
            self.segments.push((from, to));
        }
        self.current = Some(to);
    }

    fn move_to(&mut self, args: &[f64], relative: bool) {
        let mut pairs = args.chunks_exact(2);
        let Some(first) = pairs.next() else {
            return;
        };
        let start = self.resolve(first[0], first[1], relative);
        self.current = Some(start);
        self.subpath_start = Some(start);
        // Extra coordinate pairs after a move are implicit line-tos in the
        // same absolute/relative mode.
        for pair in pairs {
            let to = self.resolve(pair[0], pair[1], relative);
            self.emit(to);
        }
    }

    fn line_to(&mut self, args: &[f64], relative: bool) {
        for pair in args.chunks_exact(2) {
            let to = self.resolve(pair[0], pair[1], relative);
            self.emit(to);
        }
    }

    fn axis_line_to(&mut self, args: &[f64], relative: bool, horizontal: bool) {
        for &v in args {
            let Some(cur) = self.current else {
                return;
            };
            let to = match (horizontal, relative) {
                (true, true) => DVec2::new(cur.x + v, cur.y),
                (true, false) => DVec2::new(v, cur.y),
                (false, true) => DVec2::new(cur.x, cur.y + v),
                (false, false) => DVec2::new(cur.x, v),
            };
            self.emit(to);
        }
    }

    /// Close-path draws back to the subpath start only when the gap is real;
    /// a close on an already-closed subpath is a no-op.
    fn close(&mut self) {
        let (Some(cur), Some(start)) = (self.current, self.subpath_start) else {
            return;
        };
        if cur.distance(start) > defaults::CLOSE_PATH_MIN_GAP {
            self.segments.push((cur, start));
        }
        self.current = Some(start);
    }

    fn skip_to_endpoint(&mut self, letter: char, args: &[f64], relative: bool) {
        // Argument counts per repetition; the endpoint is always the
        // trailing pair, so walking chunks keeps the current point exact
        // without emitting anything.
        let per = match letter.to_ascii_uppercase() {
            'C' => 6,
            'S' | 'Q' => 4,
            'T' => 2,
            'A' => 7,
            _ => return,
        };
        for chunk in args.chunks_exact(per) {
            let (x, y) = (chunk[per - 2], chunk[per - 1]);
            let to = self.resolve(x, y, relative);
            self.current = Some(to);
        }
    }
}
