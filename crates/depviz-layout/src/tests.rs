use crate::test_utils::*;
use crate::*;
use depviz_core::{
    Artifacts, Direction, Edge, EdgeKey, GraphStore, LayoutConfig, NodeId, Placement, Point,
    TypeVisibility, impact_slice,
};
use proptest::prelude::*;
use std::time::Duration;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn engine() -> LayoutEngine {
    LayoutEngine::default()
}

fn routed(store: &GraphStore, layout: &Layout) -> std::collections::HashMap<EdgeKey, RoutedEdge> {
    route_all(store, layout, &LayoutConfig::default())
}

#[test]
fn test_module_box_from_flow_pass() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);

    assert_eq!(layout.box_of(&id("M")), Some(Rect::new(0.0, 0.0, 220.0, 220.0)));
    assert_eq!(layout.func_rect(&id("F")), Some(Rect::new(10.0, 38.0, 200.0, 42.0)));
    assert_eq!(layout.box_of(&id("K")), Some(Rect::new(10.0, 96.0, 200.0, 106.0)));
    assert_eq!(layout.func_rect(&id("G")), Some(Rect::new(20.0, 134.0, 180.0, 42.0)));
    assert_eq!(layout.box_of(&id("N")), Some(Rect::new(600.0, 0.0, 220.0, 106.0)));
    assert_eq!(engine().open_height(&store, &id("M")), 220.0);
}

#[test]
fn test_flow_pass_orders_by_last_offset() {
    let mut f = func("F", "M");
    f.dx = Some(10.0);
    f.dy = Some(500.0);
    let mut k = class("K", "M");
    k.dx = Some(10.0);
    k.dy = Some(38.0);
    let mut store = GraphStore::from_artifacts(Artifacts {
        nodes: vec![open_module("M", "m.py", 0.0, 0.0), f, k, func("G", "K")],
        edges: vec![],
    });

    let first = engine().layout(&mut store);
    assert_eq!(first.box_of(&id("K")).map(|r| r.y), Some(38.0));
    assert_eq!(first.func_rect(&id("F")).map(|r| r.y), Some(152.0));

    let offset = store.node(&id("F")).and_then(|n| n.placement()).and_then(Placement::offset);
    assert_eq!(offset, Some(Point::new(10.0, 152.0)));

    let second = engine().layout(&mut store);
    assert_eq!(first.funcs, second.funcs);
    assert_eq!(first.boxes, second.boxes);
}

#[test]
fn test_collapsed_module_hides_interior() {
    let mut store = two_open_modules();
    store.toggle_collapsed(&id("M"));
    let layout = engine().layout(&mut store);

    assert_eq!(layout.box_of(&id("M")), Some(Rect::new(0.0, 0.0, 220.0, 48.0)));
    for hidden in ["F", "K", "G"] {
        assert!(layout.is_hidden(&id(hidden)), "{hidden} should be hidden");
        assert!(layout.rect_of(&id(hidden)).is_none());
    }
}

#[test]
fn test_edges_reanchor_on_collapse() {
    let mut store = two_open_modules();
    let open = engine().layout(&mut store);
    assert_eq!(anchor_point(&store, &open, &id("G")), Some(Point::new(110.0, 155.0)));

    store.toggle_collapsed(&id("M"));
    let closed = engine().layout(&mut store);
    let center = Point::new(110.0, 24.0);
    for member in ["F", "K", "G", "M"] {
        assert_eq!(anchor_point(&store, &closed, &id(member)), Some(center));
    }

    let routes = routed(&store, &closed);
    let Some(EdgePath::Curve { curve, .. }) = routes.get(&Edge::call("H", "G").key()).map(|r| r.path) else {
        panic!("edge H->G should still be drawn");
    };
    assert_eq!(curve.end, center);
}

#[test]
fn test_edge_through_foreign_module_goes_behind() {
    let mut store = two_open_modules();
    store.merge(Artifacts {
        nodes: vec![open_module("P", "src/p.py", 300.0, 0.0), func("Q", "P")],
        edges: vec![],
    });
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);

    // H (610..810, 38..80) to F (10..210, 38..80) passes straight through P
    let through = &routes[&Edge::call("H", "F").key()];
    assert!(through.behind);

    store.remove(&id("P"));
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    assert!(!routes[&Edge::call("H", "F").key()].behind);
}

#[test]
fn test_dangling_import_is_flagged_not_drawn() {
    let mut store = two_open_modules();
    store.add_edge(Edge::import("N", "mod_missing"));
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let r = &routes[&Edge::import("N", "mod_missing").key()];
    assert!(r.unresolved);
    assert!(r.path.is_hidden());
}

#[test]
fn test_scene_layer_order() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let scene = Scene::build(&store, &layout, &routes, &SceneOptions::default());

    let layers: Vec<Layer> = scene.items.iter().map(|i| i.layer).collect();
    let mut sorted = layers.clone();
    sorted.sort();
    assert_eq!(layers, sorted);

    assert_eq!(scene.layer_of("M"), Some(Layer::Modules));
    assert_eq!(scene.layer_of("K"), Some(Layer::ClassesDocked));
    assert_eq!(scene.layer_of("G"), Some(Layer::FuncsDocked));
    assert_eq!(scene.layer_of("H->F:call"), Some(Layer::EdgesFront));
    // one arrow per drawn call edge
    assert_eq!(
        scene.items.iter().filter(|i| matches!(i.command, DrawCommand::Arrow { .. })).count(),
        2
    );
}

#[test]
fn test_collapsed_module_renders_above_edges() {
    let mut store = two_open_modules();
    store.toggle_collapsed(&id("M"));
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let scene = Scene::build(&store, &layout, &routes, &SceneOptions::default());

    assert_eq!(scene.layer_of("M"), Some(Layer::ModulesCollapsed));
    assert!(scene.layer_of("F").is_none());
    assert!(Layer::ModulesCollapsed > Layer::EdgesFront);

    let item = scene
        .items
        .iter()
        .find(|i| i.layer == Layer::ModulesCollapsed)
        .cloned();
    insta::assert_json_snapshot!(item, @r#"
    {
      "layer": "modulesCollapsed",
      "command": {
        "type": "container",
        "id": "M",
        "kind": "module",
        "rect": {
          "x": 0.0,
          "y": 0.0,
          "w": 220.0,
          "h": 48.0
        },
        "label": "src/m.py",
        "collapsed": true,
        "emphasis": "normal"
      }
    }
    "#);
}

#[test]
fn test_free_items_use_free_layers() {
    let mut store = two_open_modules();
    store.merge(Artifacts {
        nodes: vec![free_func("X", "N", 900.0, 400.0)],
        edges: vec![],
    });
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let scene = Scene::build(&store, &layout, &routes, &SceneOptions::default());
    assert_eq!(scene.layer_of("X"), Some(Layer::FuncsFree));
    assert_eq!(layout.func_rect(&id("X")).map(|r| r.origin()), Some(Point::new(900.0, 400.0)));
}

#[test]
fn test_free_function_width() {
    let mut store = two_open_modules();
    let mut wide = free_func("Y", "N", 900.0, 600.0);
    wide.width = Some(240.0);
    store.merge(Artifacts {
        nodes: vec![free_func("X", "N", 900.0, 400.0), wide],
        edges: vec![],
    });
    let engine = engine();
    let layout = engine.layout(&mut store);
    assert_eq!(layout.func_rect(&id("X")).map(|r| r.w), Some(180.0));
    assert_eq!(layout.func_rect(&id("Y")).map(|r| r.w), Some(240.0));

    // a detached function keeps its docked width
    if let Some(p) = store.node_mut(&id("F")).and_then(|n| n.placement_mut()) {
        *p = Placement::Free {
            pos: Point::new(400.0, 400.0),
        };
    }
    let layout = engine.layout(&mut store);
    assert_eq!(layout.func_rect(&id("F")), Some(Rect::new(400.0, 400.0, 200.0, 42.0)));
}

fn edge_emphasis(scene: &Scene, key: &str) -> Option<Emphasis> {
    scene.items.iter().find_map(|i| match &i.command {
        DrawCommand::Edge { key: k, emphasis, .. } if k.0 == key => Some(*emphasis),
        _ => None,
    })
}

fn node_emphasis(scene: &Scene, node: &str) -> Option<Emphasis> {
    scene.items.iter().find_map(|i| match &i.command {
        DrawCommand::Container { id, emphasis, .. } | DrawCommand::Func { id, emphasis, .. }
            if id.as_str() == node =>
        {
            Some(*emphasis)
        }
        _ => None,
    })
}

#[test]
fn test_focus_hides_unrelated_edges() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let focus = Focus::Node(id("F"));

    let options = SceneOptions {
        focus: Some(&focus),
        ..Default::default()
    };
    let scene = Scene::build(&store, &layout, &routes, &options);
    assert_eq!(edge_emphasis(&scene, "H->F:call"), Some(Emphasis::Normal));
    assert_eq!(edge_emphasis(&scene, "H->G:call"), Some(Emphasis::Hidden));

    let module_focus = Focus::Module(id("M"));
    let options = SceneOptions {
        focus: Some(&module_focus),
        ..Default::default()
    };
    let scene = Scene::build(&store, &layout, &routes, &options);
    assert_eq!(edge_emphasis(&scene, "H->F:call"), Some(Emphasis::Normal));
    assert_eq!(edge_emphasis(&scene, "N->M:import"), Some(Emphasis::Normal));
    // G sits inside K, not directly inside M
    assert_eq!(edge_emphasis(&scene, "H->G:call"), Some(Emphasis::Hidden));

    let options = SceneOptions {
        focus: Some(&focus),
        searching: true,
        ..Default::default()
    };
    let scene = Scene::build(&store, &layout, &routes, &options);
    assert_eq!(edge_emphasis(&scene, "H->G:call"), Some(Emphasis::Normal));
}

#[test]
fn test_type_toggle_hides_edges() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let options = SceneOptions {
        visibility: TypeVisibility {
            import: true,
            call: false,
        },
        ..Default::default()
    };
    let scene = Scene::build(&store, &layout, &routes, &options);
    assert_eq!(edge_emphasis(&scene, "H->F:call"), Some(Emphasis::Hidden));
    assert_eq!(edge_emphasis(&scene, "N->M:import"), Some(Emphasis::Normal));
}

#[test]
fn test_slice_overlay_dims_the_rest() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let slice = impact_slice(
        &store,
        &id("F"),
        Direction::Inbound,
        TypeVisibility::default(),
        Duration::from_secs(1),
    );
    let options = SceneOptions {
        slice: Some(&slice),
        ..Default::default()
    };
    let scene = Scene::build(&store, &layout, &routes, &options);
    assert_eq!(node_emphasis(&scene, "F"), Some(Emphasis::Related));
    assert_eq!(node_emphasis(&scene, "H"), Some(Emphasis::Related));
    assert_eq!(node_emphasis(&scene, "G"), Some(Emphasis::Dimmed));
    assert_eq!(edge_emphasis(&scene, "H->F:call"), Some(Emphasis::Related));
    assert_eq!(edge_emphasis(&scene, "H->G:call"), Some(Emphasis::Dimmed));
}

#[test]
fn test_svg_export_contains_every_visible_node() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let routes = routed(&store, &layout);
    let scene = Scene::build(&store, &layout, &routes, &SceneOptions::default());
    let svg = scene.to_svg(layout.extent());

    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    for node in ["M", "F", "K", "G", "N", "H"] {
        assert!(svg.contains(&format!(r#"data-id="{node}""#)), "missing {node}");
    }
    assert!(svg.contains("edge-arrow call"));
}

#[test]
fn test_node_at_prefers_innermost() {
    let mut store = two_open_modules();
    let layout = engine().layout(&mut store);
    let hit = |x, y| node_at(&store, &layout, Point::new(x, y)).map(|n| n.id.as_str().to_string());
    assert_eq!(hit(25.0, 140.0).as_deref(), Some("G"));
    assert_eq!(hit(15.0, 100.0).as_deref(), Some("K"));
    assert_eq!(hit(5.0, 5.0).as_deref(), Some("M"));
    assert_eq!(hit(400.0, 400.0), None);
}

#[test]
fn test_by_folder_arrange() {
    let mut store = folder_tree();
    let engine = engine();
    assert_eq!(arrange(&mut store, &engine, ArrangeMode::ByFolder), 5);

    let pos = |s: &str| store.node(&id(s)).and_then(|n| n.as_module()).map(|m| m.pos);
    assert_eq!(pos("a"), Some(Point::new(0.0, 0.0)));
    assert_eq!(pos("e"), Some(Point::new(0.0, 168.0)));
    assert_eq!(pos("c"), Some(Point::new(440.0, 0.0)));
    assert_eq!(pos("b"), Some(Point::new(440.0, 168.0)));
    assert_eq!(pos("d"), Some(Point::new(880.0, 0.0)));
}

#[test]
fn test_by_folder_depth_ignores_absolute_fs_path() {
    let mut a = open_module("a", "a.ts", 900.0, 900.0);
    a.fs_path = Some("/home/u/proj/a.ts".to_string());
    let mut b = open_module("b", "lib/b.ts", 0.0, 0.0);
    b.fs_path = Some("C:\\work\\proj\\lib\\b.ts".to_string());
    let mut store = GraphStore::from_artifacts(Artifacts {
        nodes: vec![a, b],
        edges: vec![],
    });
    arrange(&mut store, &engine(), ArrangeMode::ByFolder);

    let pos = |s: &str| store.node(&id(s)).and_then(|n| n.as_module()).map(|m| m.pos);
    assert_eq!(pos("a"), Some(Point::new(0.0, 0.0)));
    assert_eq!(pos("b"), Some(Point::new(440.0, 0.0)));
}

#[test]
fn test_arrange_is_deterministic() {
    let engine = engine();
    for mode in [ArrangeMode::ByFolder, ArrangeMode::Balanced] {
        let mut store = folder_tree();
        let first = plan(&store, &engine, mode);
        arrange(&mut store, &engine, mode);
        let second = plan(&store, &engine, mode);
        assert_eq!(first, second);
    }
}

#[test]
fn test_balanced_arrange_rows() {
    let mut store = folder_tree();
    let engine = engine();
    arrange(&mut store, &engine, ArrangeMode::Balanced);
    let pos = |s: &str| store.node(&id(s)).and_then(|n| n.as_module()).map(|m| m.pos);

    // heights: b=164, d=106, a=c=e=48; two rows
    assert_eq!(pos("b"), Some(Point::new(0.0, 0.0)));
    assert_eq!(pos("d"), Some(Point::new(0.0, 284.0)));
    assert_eq!(pos("a"), Some(Point::new(380.0, 0.0)));
    assert_eq!(pos("c"), Some(Point::new(380.0, 284.0)));
    assert_eq!(pos("e"), Some(Point::new(760.0, 0.0)));
}

#[test]
fn test_push_out_clears_every_obstacle() {
    let obstacles = [Rect::new(0.0, 0.0, 220.0, 100.0), Rect::new(500.0, 0.0, 220.0, 100.0)];
    let dragged = Rect::new(200.0, 20.0, 220.0, 60.0);
    let origin = push_out(dragged, &obstacles, 24);
    let moved = dragged.moved_to(origin);
    assert!(obstacles.iter().all(|o| !moved.intersects(o)));
}

#[test]
fn test_resolve_leaf_moves_only_target() {
    let config = LayoutConfig::default();
    let others = [Rect::new(0.0, 0.0, 180.0, 42.0)];
    let target = Rect::new(30.0, 10.0, 180.0, 42.0);
    let origin = resolve_leaf(target, &others, &config);
    let moved = target.moved_to(origin);
    let (ox, oy) = moved.overlap(&others[0]);
    assert!(ox.min(oy) < config.leaf_min_overlap);
    assert_eq!(others[0], Rect::new(0.0, 0.0, 180.0, 42.0));
}

#[test]
fn test_leaf_step_tie_pushes_horizontally() {
    let target = Rect::new(0.0, 0.0, 100.0, 100.0);
    let other = Rect::new(50.0, 50.0, 100.0, 100.0);
    let v = leaf_step(&target, &[other], 20.0, 4.0);
    assert_eq!(v, Some(Point::new(-54.0, 0.0)));
}

proptest! {
    #[test]
    fn prop_leaf_overlap_decreases(
        ax in 0i32..200, ay in 0i32..200,
        dx in -150i32..150, dy in -40i32..40,
    ) {
        let config = LayoutConfig::default();
        let other = Rect::new(ax as f64, ay as f64, 180.0, 42.0);
        let mut target = other.translate(dx as f64, dy as f64);
        let mut area = target.overlap_area(&other);
        for _ in 0..config.leaf_rounds {
            match leaf_step(&target, &[other], config.leaf_min_overlap, config.leaf_margin) {
                Some(v) => {
                    target = target.translate(v.x, v.y);
                    let next = target.overlap_area(&other);
                    prop_assert!(next < area);
                    area = next;
                }
                None => break,
            }
        }
        let (ox, oy) = target.overlap(&other);
        prop_assert!(ox.min(oy) < config.leaf_min_overlap);
    }

    #[test]
    fn prop_push_out_separates_from_single_obstacle(
        x in -300i32..300, y in -300i32..300,
        w in 20i32..300, h in 20i32..300,
    ) {
        let obstacle = Rect::new(0.0, 0.0, 220.0, 160.0);
        let rect = Rect::new(x as f64, y as f64, w as f64, h as f64);
        let moved = rect.moved_to(push_out(rect, &[obstacle], 24));
        prop_assert!(!moved.intersects(&obstacle));
    }
}
