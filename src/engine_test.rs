#![allow(clippy::float_cmp)]

use super::*;
use crate::annotation::AnnotationKind;
use crate::display_list::{DisplayList, DrawCommand};
use crate::loader::ImageSurface;

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn surface(width: u32, height: u32) -> ImageSurface {
    ImageSurface { width, height, pixels: vec![0; (width * height * 4) as usize] }
}

/// An engine with an 800x600 canvas and slide "s1" active.
fn active_core() -> (EngineCore, LoadTicket) {
    let mut core = EngineCore::new();
    let _ = core.set_canvas_size(800.0, 600.0, 1.0);
    let (ticket, _) = core.set_active_slide(SlideId::new("s1"));
    (core, ticket)
}

fn created(actions: &[Action]) -> Vec<&Annotation> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::AnnotationCreated(ann) => Some(ann),
            _ => None,
        })
        .collect()
}

fn has_render(actions: &[Action]) -> bool {
    needs_render(actions)
}

fn drag(core: &mut EngineCore, from: Point, to: Point) -> Vec<Action> {
    let mut actions = core.on_pointer_down(from);
    actions.extend(core.on_pointer_move(to));
    actions.extend(core.on_pointer_up(to));
    actions
}

fn frame(core: &EngineCore) -> Vec<DrawCommand> {
    let mut list = DisplayList::new();
    let Ok(()) = core.render_to(&mut list);
    list.commands
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_core_is_idle() {
    let core = EngineCore::new();
    assert_eq!(core.viewport(), Viewport::default());
    assert!(core.annotations().is_empty());
    assert_eq!(core.tool(), Tool::Pan);
    assert_eq!(*core.input(), InputState::Idle);
    assert!(core.image().is_none());
    assert!(core.active_slide().is_none());
    assert_eq!(*core.load_status(), LoadStatus::Idle);
    assert_eq!(core.dpr(), 1.0);
}

#[test]
fn with_config_uses_configured_color() {
    let config = ViewerConfig { annotation_color: "#00ffaa".into(), ..ViewerConfig::default() };
    let mut core = EngineCore::with_config(&config);
    let _ = core.set_active_slide(SlideId::new("s1"));
    let _ = core.set_tool(Tool::Point);
    let actions = core.on_pointer_down(pt(1.0, 1.0));
    assert_eq!(created(&actions)[0].color, "#00ffaa");
}

// =============================================================
// Slide lifecycle
// =============================================================

#[test]
fn activation_issues_fresh_tickets() {
    let mut core = EngineCore::new();
    let (a, _) = core.set_active_slide(SlideId::new("s1"));
    let (b, _) = core.set_active_slide(SlideId::new("s1"));
    assert_eq!(a.slide, b.slide);
    assert_ne!(a, b);
    assert_eq!(core.active_slide(), Some(&SlideId::new("s1")));
    assert_eq!(*core.load_status(), LoadStatus::Loading);
}

#[test]
fn activation_restores_cursor_and_requests_render() {
    let (mut core, _) = active_core();
    let _ = core.on_pointer_down(pt(10.0, 10.0));
    assert_eq!(core.cursor(), "grabbing");

    let (_, actions) = core.set_active_slide(SlideId::new("s2"));
    assert_eq!(actions, vec![Action::SetCursor("grab".into()), Action::RenderNeeded]);
    assert_eq!(core.cursor(), "grab");
    assert_eq!(*core.input(), InputState::Idle);
}

#[test]
fn activation_resets_viewport_store_and_gesture() {
    let (mut core, _) = active_core();
    let _ = core.zoom_in();
    let _ = core.pan_by(15.0, -5.0);
    let _ = core.set_tool(Tool::Point);
    let _ = core.on_pointer_down(pt(5.0, 5.0));
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(1.0, 1.0));
    assert!(core.draft().is_some());

    let _ = core.set_active_slide(SlideId::new("s2"));
    assert_eq!(core.viewport(), Viewport::default());
    assert!(core.annotations().is_empty());
    assert!(core.draft().is_none());
    assert!(core.image().is_none());
    assert_eq!(core.tool(), Tool::Rectangle);
}

#[test]
fn successful_load_becomes_base_image() {
    let (mut core, ticket) = active_core();
    let outcome = core.apply_image_load(LoadCompletion { ticket, result: Ok(surface(4, 2)) });
    assert_eq!(outcome, LoadOutcome::Applied);
    assert_eq!(*core.load_status(), LoadStatus::Ready);
    assert_eq!(core.image().map(|i| i.surface.width), Some(4));
}

#[test]
fn failed_load_leaves_no_image() {
    let (mut core, ticket) = active_core();
    let err = LoadError::Status { status: 404 };
    let outcome = core.apply_image_load(LoadCompletion { ticket, result: Err(err.clone()) });
    assert_eq!(outcome, LoadOutcome::Failed(err.clone()));
    assert_eq!(*core.load_status(), LoadStatus::Failed(err));
    assert!(core.image().is_none());
}

#[test]
fn failed_load_still_allows_annotation() {
    let (mut core, ticket) = active_core();
    let _ = core.apply_image_load(LoadCompletion { ticket, result: Err(LoadError::Decode("bad".into())) });
    let _ = core.set_tool(Tool::Point);
    let actions = core.on_pointer_down(pt(2.0, 2.0));
    assert_eq!(created(&actions).len(), 1);
}

#[test]
fn stale_load_is_ignored() {
    let mut core = EngineCore::new();
    let (old, _) = core.set_active_slide(SlideId::new("a"));
    let _ = core.set_active_slide(SlideId::new("b"));

    let actions = core.complete_image_load(LoadCompletion { ticket: old, result: Ok(surface(2, 2)) });
    assert!(actions.is_empty());
    assert!(core.image().is_none());
    assert_eq!(*core.load_status(), LoadStatus::Loading);
}

#[test]
fn stale_load_of_same_slide_is_ignored() {
    let mut core = EngineCore::new();
    let (old, _) = core.set_active_slide(SlideId::new("a"));
    let (current, _) = core.set_active_slide(SlideId::new("a"));

    let outcome = core.apply_image_load(LoadCompletion { ticket: old, result: Ok(surface(2, 2)) });
    assert_eq!(outcome, LoadOutcome::StaleIgnored);
    let outcome = core.apply_image_load(LoadCompletion { ticket: current, result: Ok(surface(3, 3)) });
    assert_eq!(outcome, LoadOutcome::Applied);
    assert_eq!(core.image().map(|i| i.surface.width), Some(3));
}

#[test]
fn load_after_clear_is_stale() {
    let (mut core, ticket) = active_core();
    let _ = core.clear_active_slide();
    let outcome = core.apply_image_load(LoadCompletion { ticket, result: Ok(surface(2, 2)) });
    assert_eq!(outcome, LoadOutcome::StaleIgnored);
    assert!(core.active_slide().is_none());
    assert_eq!(*core.load_status(), LoadStatus::Idle);
}

#[test]
fn completed_load_requests_render() {
    let (mut core, ticket) = active_core();
    let actions = core.complete_image_load(LoadCompletion { ticket, result: Ok(surface(2, 2)) });
    assert_eq!(actions, vec![Action::RenderNeeded]);
}

// =============================================================
// Viewport commands
// =============================================================

#[test]
fn zoom_is_clamped() {
    let (mut core, _) = active_core();
    for _ in 0..20 {
        let _ = core.zoom_in();
    }
    assert_eq!(core.viewport().zoom, 10.0);
    for _ in 0..40 {
        let _ = core.zoom_out();
    }
    assert_eq!(core.viewport().zoom, 0.1);
}

#[test]
fn reset_restores_identity() {
    let (mut core, _) = active_core();
    let _ = core.zoom_in();
    let _ = core.pan_by(30.0, 40.0);
    let actions = core.reset();
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.viewport(), Viewport::default());
}

#[test]
fn pan_drag_follows_pointer() {
    let (mut core, _) = active_core();
    let _ = core.pan_by(10.0, 10.0);

    let down = core.on_pointer_down(pt(100.0, 100.0));
    assert_eq!(down, vec![Action::SetCursor("grabbing".into())]);
    assert_eq!(core.cursor(), "grabbing");

    let _ = core.on_pointer_move(pt(130.0, 80.0));
    assert_eq!(core.viewport().pan(), pt(40.0, -10.0));

    let up = core.on_pointer_up(pt(130.0, 80.0));
    assert_eq!(up, vec![Action::SetCursor("grab".into())]);
    assert_eq!(core.viewport().pan(), pt(40.0, -10.0));
    assert!(core.annotations().is_empty());
}

#[test]
fn programmatic_pan_requests_render() {
    let (mut core, _) = active_core();
    let actions = core.pan_by(12.0, -3.0);
    assert!(needs_render(&actions));
    assert_eq!(core.viewport().pan(), pt(12.0, -3.0));
}

#[test]
fn cursor_and_annotation_actions_do_not_need_render() {
    assert!(!needs_render(&[]));
    assert!(!needs_render(&[Action::SetCursor("grab".into())]));
    assert!(needs_render(&[Action::SetCursor("grab".into()), Action::RenderNeeded]));
}

#[test]
fn pan_leave_ends_gesture() {
    let (mut core, _) = active_core();
    let _ = core.on_pointer_down(pt(0.0, 0.0));
    let _ = core.on_pointer_move(pt(5.0, 5.0));
    let actions = core.on_pointer_leave();
    assert_eq!(actions, vec![Action::SetCursor("grab".into())]);
    assert_eq!(*core.input(), InputState::Idle);
    assert_eq!(core.viewport().pan(), pt(5.0, 5.0));
}

// =============================================================
// Point tool
// =============================================================

#[test]
fn point_click_emits_exactly_one_annotation() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Point);
    let mut actions = core.on_pointer_down(pt(12.0, 34.0));
    actions.extend(core.on_pointer_move(pt(50.0, 50.0)));
    actions.extend(core.on_pointer_up(pt(50.0, 50.0)));

    let anns = created(&actions);
    assert_eq!(anns.len(), 1);
    assert_eq!(anns[0].kind, AnnotationKind::Point);
    assert_eq!((anns[0].anchor_x, anns[0].anchor_y), (12.0, 34.0));
    assert_eq!((anns[0].width, anns[0].height), (0.0, 0.0));
    assert_eq!(core.annotations().len(), 1);
}

#[test]
fn point_uses_current_color_and_label() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Point);
    core.set_annotation_color("#ABC").unwrap();
    core.set_label(Some("nucleus".into()));
    let actions = core.on_pointer_down(pt(1.0, 1.0));
    let ann = created(&actions)[0];
    assert_eq!(ann.color, "#abc");
    assert_eq!(ann.label.as_deref(), Some("nucleus"));
}

#[test]
fn invalid_color_is_rejected_and_kept() {
    let (mut core, _) = active_core();
    assert!(core.set_annotation_color("red").is_err());
    assert_eq!(core.ui().color, "#ff0000");
}

#[test]
fn empty_label_clears_label() {
    let mut core = EngineCore::new();
    core.set_label(Some("x".into()));
    core.set_label(Some(String::new()));
    assert!(core.ui().label.is_none());
}

// =============================================================
// Rectangle / circle tools
// =============================================================

#[test]
fn rectangle_drag_emits_signed_box() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let actions = drag(&mut core, pt(10.0, 10.0), pt(50.0, 40.0));

    let anns = created(&actions);
    assert_eq!(anns.len(), 1);
    let a = anns[0];
    assert_eq!(a.kind, AnnotationKind::Rectangle);
    assert_eq!((a.anchor_x, a.anchor_y, a.width, a.height), (10.0, 10.0, 40.0, 30.0));
    assert!(core.draft().is_none());
}

#[test]
fn inverted_drag_keeps_negative_extent() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let actions = drag(&mut core, pt(50.0, 40.0), pt(10.0, 10.0));
    let a = created(&actions)[0];
    assert_eq!((a.anchor_x, a.anchor_y, a.width, a.height), (50.0, 40.0, -40.0, -30.0));
}

#[test]
fn circle_drag_emits_circle() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Circle);
    let actions = drag(&mut core, pt(0.0, 0.0), pt(20.0, 10.0));
    let a = created(&actions)[0];
    assert_eq!(a.kind, AnnotationKind::Circle);
    assert_eq!((a.width, a.height), (20.0, 10.0));
}

#[test]
fn click_without_move_emits_zero_size_shape() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(7.0, 8.0));
    let actions = core.on_pointer_up(pt(7.0, 8.0));
    let a = created(&actions)[0];
    assert_eq!((a.width, a.height), (0.0, 0.0));
}

#[test]
fn pointer_up_uses_last_move_not_up_position() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(0.0, 0.0));
    let _ = core.on_pointer_move(pt(10.0, 10.0));
    let actions = core.on_pointer_up(pt(99.0, 99.0));
    let a = created(&actions)[0];
    assert_eq!((a.width, a.height), (10.0, 10.0));
}

#[test]
fn draft_tracks_each_move() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(10.0, 10.0));
    let actions = core.on_pointer_move(pt(30.0, 5.0));
    assert!(has_render(&actions));
    let (shape, draft) = core.draft().unwrap();
    assert_eq!(shape, ShapeKind::Rectangle);
    assert_eq!((draft.width, draft.height), (20.0, -5.0));
    assert!(core.annotations().is_empty());
}

#[test]
fn leave_discards_draft_without_emitting() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Circle);
    let _ = core.on_pointer_down(pt(10.0, 10.0));
    let _ = core.on_pointer_move(pt(40.0, 40.0));
    let actions = core.on_pointer_leave();

    assert!(created(&actions).is_empty());
    assert!(has_render(&actions));
    assert!(core.draft().is_none());
    assert!(core.annotations().is_empty());

    // A later pointer-up has nothing to finalize.
    assert!(core.on_pointer_up(pt(40.0, 40.0)).is_empty());
}

#[test]
fn tool_switch_mid_drag_discards_draft() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(10.0, 10.0));
    let _ = core.on_pointer_move(pt(40.0, 40.0));
    let actions = core.set_tool(Tool::Circle);

    assert!(created(&actions).is_empty());
    assert!(has_render(&actions));
    assert!(actions.contains(&Action::SetCursor("crosshair".into())));
    assert!(core.draft().is_none());
    assert!(core.on_pointer_up(pt(40.0, 40.0)).is_empty());
    assert!(core.annotations().is_empty());
}

#[test]
fn second_pointer_down_during_drag_is_ignored() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(10.0, 10.0));
    assert!(core.on_pointer_down(pt(90.0, 90.0)).is_empty());
    let (_, draft) = core.draft().unwrap();
    assert_eq!(draft.start, pt(10.0, 10.0));
}

#[test]
fn move_without_gesture_is_noop() {
    let (mut core, _) = active_core();
    assert!(core.on_pointer_move(pt(1.0, 1.0)).is_empty());
    assert!(core.on_pointer_up(pt(1.0, 1.0)).is_empty());
    assert!(core.on_pointer_leave().is_empty());
}

#[test]
fn gestures_need_an_active_slide() {
    let mut core = EngineCore::new();
    let _ = core.set_tool(Tool::Point);
    assert!(core.on_pointer_down(pt(1.0, 1.0)).is_empty());
    assert!(core.annotations().is_empty());
}

#[test]
fn annotations_do_not_move_with_viewport() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let actions = drag(&mut core, pt(10.0, 10.0), pt(50.0, 40.0));
    let before = created(&actions)[0].clone();
    let _ = core.zoom_in();
    let _ = core.pan_by(100.0, 100.0);
    assert_eq!(core.annotations().as_slice()[0], before);
}

// =============================================================
// Clear
// =============================================================

#[test]
fn clear_empties_store_but_emitted_records_survive() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Point);
    let actions = core.on_pointer_down(pt(3.0, 3.0));
    let emitted = created(&actions)[0].clone();

    let cleared = core.clear_annotations();
    assert_eq!(cleared, vec![Action::RenderNeeded]);
    assert!(core.annotations().is_empty());
    assert_eq!((emitted.anchor_x, emitted.anchor_y), (3.0, 3.0));
}

#[test]
fn clear_keeps_active_draft() {
    let (mut core, _) = active_core();
    let _ = core.set_tool(Tool::Rectangle);
    let _ = core.on_pointer_down(pt(1.0, 1.0));
    let _ = core.clear_annotations();
    assert!(core.draft().is_some());
}

// =============================================================
// Canvas / cursor
// =============================================================

#[test]
fn canvas_size_sanitizes_dpr() {
    let mut core = EngineCore::new();
    let _ = core.set_canvas_size(640.0, 480.0, 0.0);
    assert_eq!(core.canvas_size(), Size::new(640.0, 480.0));
    assert_eq!(core.dpr(), 1.0);
    let _ = core.set_canvas_size(640.0, 480.0, 2.0);
    assert_eq!(core.dpr(), 2.0);
}

#[test]
fn cursor_follows_tool() {
    let mut core = EngineCore::new();
    assert_eq!(core.cursor(), "grab");
    let actions = core.set_tool(Tool::Point);
    assert_eq!(actions, vec![Action::SetCursor("crosshair".into())]);
    assert_eq!(core.cursor(), "crosshair");
}

// =============================================================
// Rendering
// =============================================================

#[test]
fn frame_layers_in_order() {
    let (mut core, ticket) = active_core();
    let _ = core.apply_image_load(LoadCompletion { ticket, result: Ok(surface(100, 100)) });
    let _ = core.set_tool(Tool::Rectangle);
    let _ = drag(&mut core, pt(0.0, 0.0), pt(10.0, 10.0));
    let _ = core.set_tool(Tool::Circle);
    let _ = core.on_pointer_down(pt(20.0, 20.0));
    let _ = core.on_pointer_move(pt(40.0, 40.0));

    let cmds = frame(&core);
    assert_eq!(cmds.len(), 4);
    assert_eq!(cmds[0], DrawCommand::Clear { size: Size::new(800.0, 600.0) });
    assert!(matches!(&cmds[1], DrawCommand::Image { dest, .. } if *dest == crate::viewport::Rect::new(350.0, 250.0, 100.0, 100.0)));
    assert!(matches!(cmds[2], DrawCommand::StrokeRect { .. }));
    assert!(matches!(&cmds[3], DrawCommand::StrokeCircle { stroke, .. } if stroke.dash == [5.0, 5.0]));
}

#[test]
fn stale_load_never_reaches_frame() {
    let mut core = EngineCore::new();
    let (old, _) = core.set_active_slide(SlideId::new("a"));
    let _ = core.set_active_slide(SlideId::new("b"));
    let _ = core.apply_image_load(LoadCompletion { ticket: old, result: Ok(surface(2, 2)) });
    assert!(!frame(&core).iter().any(|c| matches!(c, DrawCommand::Image { .. })));
}
