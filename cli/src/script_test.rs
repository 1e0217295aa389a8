#![allow(clippy::float_cmp)]

use super::*;
use slideview::annotation::AnnotationKind;
use slideview::loader::SlideId;

fn active_core() -> EngineCore {
    let mut core = EngineCore::new();
    let (_ticket, _) = core.set_active_slide(SlideId::new("s1"));
    core
}

fn run(core: &mut EngineCore, script: &str) -> Vec<Action> {
    parse(script).unwrap().iter().flat_map(|step| apply(core, step).unwrap()).collect()
}

// =============================================================
// Parsing
// =============================================================

#[test]
fn parses_every_op() {
    let script = r##"
{"op":"tool","tool":"circle"}
{"op":"down","x":1,"y":2}
{"op":"move","x":3.5,"y":4}
{"op":"up","x":3.5,"y":4}
{"op":"leave"}
{"op":"pan","dx":-5,"dy":6}
{"op":"zoom_in"}
{"op":"zoom_out"}
{"op":"reset"}
{"op":"clear"}
{"op":"label","text":"tumor"}
{"op":"label"}
{"op":"color","color":"#00f"}
"##;
    let steps = parse(script).unwrap();
    assert_eq!(steps.len(), 13);
    assert_eq!(steps[0], ScriptStep::Tool { tool: Tool::Circle });
    assert_eq!(steps[2], ScriptStep::Move { x: 3.5, y: 4.0 });
    assert_eq!(steps[5], ScriptStep::Pan { dx: -5.0, dy: 6.0 });
    assert_eq!(steps[10], ScriptStep::Label { text: Some("tumor".into()) });
    assert_eq!(steps[11], ScriptStep::Label { text: None });
}

#[test]
fn skips_blank_and_comment_lines() {
    let steps = parse("\n# draw a box\n\n{\"op\":\"reset\"}\n").unwrap();
    assert_eq!(steps, vec![ScriptStep::Reset]);
}

#[test]
fn reports_line_of_bad_step() {
    let err = parse("{\"op\":\"reset\"}\n\n{\"op\":\"spin\"}\n").unwrap_err();
    assert_eq!(err.line, 3);
    assert!(err.to_string().starts_with("script line 3:"));
}

#[test]
fn missing_coordinates_are_rejected() {
    assert!(parse("{\"op\":\"down\",\"x\":1}").is_err());
}

// =============================================================
// Applying
// =============================================================

#[test]
fn rectangle_script_emits_one_annotation() {
    let mut core = active_core();
    let actions = run(
        &mut core,
        r#"{"op":"tool","tool":"rectangle"}
{"op":"down","x":10,"y":10}
{"op":"move","x":50,"y":40}
{"op":"up","x":50,"y":40}"#,
    );
    let created: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::AnnotationCreated(ann) => Some(ann),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].kind, AnnotationKind::Rectangle);
    assert_eq!((created[0].width, created[0].height), (40.0, 30.0));
}

#[test]
fn label_and_color_apply_to_next_annotation() {
    let mut core = active_core();
    let actions = run(
        &mut core,
        r##"{"op":"color","color":"#00F"}
{"op":"label","text":"cell"}
{"op":"tool","tool":"point"}
{"op":"down","x":1,"y":1}"##,
    );
    let Some(Action::AnnotationCreated(ann)) = actions.iter().find(|a| matches!(a, Action::AnnotationCreated(_))) else {
        panic!("no annotation in {actions:?}");
    };
    assert_eq!(ann.color, "#00f");
    assert_eq!(ann.label.as_deref(), Some("cell"));
}

#[test]
fn invalid_color_step_fails() {
    let mut core = active_core();
    let step = ScriptStep::Color { color: "blue".into() };
    assert!(apply(&mut core, &step).is_err());
}

#[test]
fn pan_step_moves_viewport() {
    let mut core = active_core();
    run(&mut core, "{\"op\":\"pan\",\"dx\":5,\"dy\":-5}\n{\"op\":\"zoom_in\"}");
    let vp = core.viewport();
    assert_eq!((vp.pan_x, vp.pan_y), (5.0, -5.0));
    assert_eq!(vp.zoom, 1.5);
}
