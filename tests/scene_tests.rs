//! End-to-end tests over the public API: markup in, scene out, queries
//! against the assembled scene.

use glam::DVec2;
use tacton::{
    HitKind, Orientation, Scene, Tolerances, parse_markup, parse_markup_with,
    point_in_polygon, point_segment_distance,
};

#[test]
fn spec_scenario_horizontal_line_with_split_measurement() {
    // One horizontal line, a number fragment and a unit fragment nearby:
    // exactly one horizontal segment, one "50 ft" label anchored at the
    // number's position and associated with the line.
    let markup = r#"<svg viewBox="0 0 300 100">
        <line x1="0" y1="0" x2="100" y2="0"/>
        <text x="50" y="-10">50</text>
        <text x="85" y="-10">ft</text>
    </svg>"#;
    let scene = parse_markup(markup);

    assert_eq!(scene.segments.len(), 1);
    assert_eq!(scene.segments[0].orientation(), Orientation::Horizontal);

    assert_eq!(scene.labels.len(), 1);
    let label = &scene.labels[0];
    assert_eq!(label.text, "50 ft");
    assert!(label.position.distance(DVec2::new(50.0, -10.0)) < 1.0);
    assert_eq!(label.segment, Some(scene.segments[0].id));
}

#[test]
fn swapped_endpoint_duplicates_collapse() {
    let markup = r#"<svg>
        <line x1="10" y1="10" x2="90" y2="90"/>
        <line x1="90" y1="90" x2="10" y2="10"/>
    </svg>"#;
    assert_eq!(parse_markup(markup).segments.len(), 1);
}

#[test]
fn lone_unit_fragment_is_dropped() {
    let markup = r#"<svg><text x="500" y="500">in</text></svg>"#;
    let scene = parse_markup(markup);
    assert!(scene.labels.is_empty());
}

#[test]
fn unit_square_point_in_polygon() {
    let square = [
        DVec2::new(0.0, 0.0),
        DVec2::new(1.0, 0.0),
        DVec2::new(1.0, 1.0),
        DVec2::new(0.0, 1.0),
    ];
    assert!(point_in_polygon(DVec2::new(0.5, 0.5), &square));
    assert!(!point_in_polygon(DVec2::new(2.0, 2.0), &square));
}

#[test]
fn segment_distance_and_progress() {
    let a = DVec2::new(0.0, 0.0);
    let b = DVec2::new(10.0, 0.0);
    let (d, t) = point_segment_distance(DVec2::new(5.0, 5.0), a, b);
    assert_eq!((d, t), (5.0, 0.5));
    let (d, t) = point_segment_distance(DVec2::new(-5.0, 0.0), a, b);
    assert_eq!((d, t), (5.0, 0.0));
}

#[test]
fn square_markup_produces_one_quadrilateral() {
    let markup = r#"<svg>
        <line x1="0" y1="0" x2="100" y2="0"/>
        <line x1="100" y1="0" x2="100" y2="100"/>
        <line x1="100" y1="100" x2="0" y2="100"/>
        <line x1="0" y1="100" x2="0" y2="0"/>
    </svg>"#;
    let scene = parse_markup(markup);
    assert_eq!(scene.polygons.len(), 1);
    let poly = &scene.polygons[0];
    assert_eq!(poly.points.len(), 4);
    assert_eq!(poly.label.as_deref(), Some("quadrilateral"));
    assert_eq!(poly.segments.len(), 4);
}

#[test]
fn vertex_graph_tolerates_sloppy_joins() {
    // Triangle drawn with endpoints off by a few units at each corner.
    let markup = r#"<svg>
        <line x1="0" y1="0" x2="100" y2="0"/>
        <line x1="103" y1="3" x2="52" y2="81"/>
        <line x1="49" y1="79" x2="-2" y2="2"/>
    </svg>"#;
    let scene = parse_markup(markup);
    assert_eq!(scene.vertices.len(), 3);
    // Every corner joins two segments.
    assert!(scene.vertices.iter().all(|v| v.segments.len() == 2));
    // The sloppy triangle still closes into a cycle.
    assert_eq!(scene.polygons.len(), 1);
    assert_eq!(scene.polygons[0].label.as_deref(), Some("triangle"));
}

#[test]
fn hit_priority_vertex_over_segment() {
    let markup = r#"<svg>
        <line x1="0" y1="0" x2="100" y2="0"/>
        <line x1="100" y1="0" x2="100" y2="100"/>
    </svg>"#;
    let scene = parse_markup(markup);
    let tol = Tolerances::default();

    // Directly on the shared corner: the vertex wins over both segments.
    let hit = scene.hit_test(DVec2::new(99.0, 1.0), &tol).expect("hit");
    assert_eq!(hit.kind, HitKind::OnVertex);

    // Mid-segment: a line hit with progress near the middle.
    let hit = scene.hit_test(DVec2::new(50.0, 3.0), &tol).expect("hit");
    assert_eq!(hit.kind, HitKind::OnLine);
    let progress = hit.progress.expect("line hits carry progress");
    assert!((progress - 0.5).abs() < 0.05);

    // Empty canvas.
    assert!(scene.hit_test(DVec2::new(500.0, 500.0), &tol).is_none());
}

#[test]
fn metadata_is_carried_verbatim() {
    let markup = r#"<svg viewBox="0 0 10 10">
        <title>Right triangle</title>
        <desc>A triangle with legs 3 and 4</desc>
    </svg>"#;
    let scene = parse_markup(markup);
    assert_eq!(scene.title.as_deref(), Some("Right triangle"));
    assert_eq!(scene.descriptions, vec!["A triangle with legs 3 and 4"]);
}

#[test]
fn view_box_resolution_chain() {
    let explicit = parse_markup(r#"<svg viewBox="5 5 90 90"></svg>"#);
    assert_eq!(explicit.view_box.origin, DVec2::new(5.0, 5.0));

    let from_dims = parse_markup(r#"<svg width="640" height="480"></svg>"#);
    assert_eq!(from_dims.view_box.size, DVec2::new(640.0, 480.0));

    let fallback = parse_markup("<svg></svg>");
    assert_eq!(fallback.view_box.size, DVec2::new(1000.0, 1000.0));
}

#[test]
fn custom_tolerances_change_merging() {
    let markup = r#"<svg>
        <line x1="0" y1="0" x2="100" y2="0"/>
        <line x1="120" y1="0" x2="200" y2="0"/>
    </svg>"#;

    // Default snap keeps the 20-unit gap as four vertices.
    assert_eq!(parse_markup(markup).vertices.len(), 4);

    // A generous snap merges the near endpoints.
    let loose = Tolerances {
        vertex_snap: 25.0,
        ..Tolerances::default()
    };
    assert_eq!(parse_markup_with(markup, &loose).vertices.len(), 3);
}

#[test]
fn unparseable_input_yields_empty_scene() {
    for garbage in ["", "hello world", "<<<>>>", "{\"not\": \"markup\"}"] {
        let scene = parse_markup(garbage);
        assert!(scene.is_empty(), "expected empty scene for {garbage:?}");
    }
}

#[test]
fn serialization_round_trip_preserves_everything() {
    let markup = r##"<svg viewBox="0 0 400 400">
        <title>Figure 7</title>
        <polygon points="50,50 350,50 200,300" fill="#eee"/>
        <circle cx="200" cy="150" r="4"/>
        <text x="160" y="40">300</text>
        <text x="240" y="40">mm</text>
    </svg>"##;
    let scene = parse_markup(markup);
    let decoded = Scene::from_json(&scene.to_json()).expect("decode");
    assert_eq!(scene, decoded);

    // The decoded scene answers queries identically.
    let tol = Tolerances::default();
    let p = DVec2::new(200.0, 150.0);
    assert_eq!(
        scene.hit_test(p, &tol).map(|h| h.kind),
        decoded.hit_test(p, &tol).map(|h| h.kind)
    );
}
