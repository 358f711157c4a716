use core_types::{AttrValue, Datum};
use dom::{Document, NodeRef, NodeTree};
use selection::{KeyFn, Scene, Selection, ValueSource};
use transition::{
    Ease, Timeline, TransitionConfig, TransitionController, TransitionError, TransitionEvent,
    TransitionState,
};

fn scene_with_rects(count: usize) -> (Scene<Document>, NodeRef, Selection) {
    let mut doc = Document::new();
    let svg = doc.append_element(doc.root(), "svg").unwrap();
    for _ in 0..count {
        doc.append_element(svg, "rect").unwrap();
    }
    let scene = Scene::new(doc);
    let rects = scene.select_all("rect");
    (scene, svg, rects)
}

fn attr(scene: &Scene<Document>, node: NodeRef, name: &str) -> Option<String> {
    scene.tree().attribute(node, name).unwrap().map(str::to_string)
}

fn number(scene: &Scene<Document>, node: NodeRef, name: &str) -> f64 {
    attr(scene, node, name)
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| panic!("{name} of {node} is not numeric"))
}

#[test]
fn supersession_continues_from_committed_value() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();

    let t1 = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(500, 0), &rects)
        .unwrap();
    ctl.attr(&mut scene, t1, "x", 10).unwrap();
    ctl.tick(&mut scene, 250).unwrap();
    assert!((number(&scene, node, "x") - 5.0).abs() < 1e-9);

    let t2 = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(200, 0), &rects)
        .unwrap();
    assert_eq!(ctl.state(t1, node), TransitionState::Interrupted);
    // Interrupted writes stop; the committed value stands.
    assert!((number(&scene, node, "x") - 5.0).abs() < 1e-9);

    ctl.attr(&mut scene, t2, "x", 0).unwrap();
    ctl.tick(&mut scene, 350).unwrap();
    assert!((number(&scene, node, "x") - 2.5).abs() < 1e-9);
    let events = ctl.tick(&mut scene, 450).unwrap();
    assert_eq!(attr(&scene, node, "x").as_deref(), Some("0"));
    assert_eq!(events, vec![TransitionEvent::Ended { handle: t2, node }]);
    assert_eq!(ctl.state(t2, node), TransitionState::Completed);
    assert_eq!(ctl.active_count(), 0);
}

#[test]
fn zero_duration_and_delay_write_immediately() {
    let (mut scene, _, rects) = scene_with_rects(2);
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(0, 0), &rects)
        .unwrap();
    let width = |_: Option<&Datum>, i: usize| AttrValue::from(i as f64 * 3.0);
    ctl.attr(&mut scene, handle, "width", ValueSource::by_datum(&width))
        .unwrap();

    let (mut direct, _, direct_rects) = scene_with_rects(2);
    direct
        .set_attribute(&direct_rects, "width", ValueSource::by_datum(&width))
        .unwrap();
    assert_eq!(
        dom::outline(scene.tree(), scene.tree().root()),
        dom::outline(direct.tree(), direct.tree().root())
    );

    let events = ctl.tick(&mut scene, 0).unwrap();
    let ended = events
        .iter()
        .filter(|e| matches!(e, TransitionEvent::Ended { .. }))
        .count();
    assert_eq!(ended, 2);
}

#[test]
fn delay_defers_start_and_start_value_is_read_when_running() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 50), &rects)
        .unwrap();
    ctl.attr(&mut scene, handle, "y", 100).unwrap();
    assert_eq!(ctl.state(handle, node), TransitionState::Scheduled);

    // Written by someone else while the transition waits.
    scene.set_attribute(&rects, "y", 50).unwrap();
    let events = ctl.tick(&mut scene, 40).unwrap();
    assert!(events.is_empty());
    assert_eq!(attr(&scene, node, "y").as_deref(), Some("50"));

    let events = ctl.tick(&mut scene, 100).unwrap();
    assert_eq!(events, vec![TransitionEvent::Started { handle, node }]);
    assert_eq!(ctl.state(handle, node), TransitionState::Running);
    assert!((number(&scene, node, "y") - 75.0).abs() < 1e-9);
}

#[test]
fn named_transitions_need_a_configured_timeline() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();

    let err = ctl
        .start_transition(&scene, &TransitionConfig::named("fade"), &rects)
        .unwrap_err();
    assert_eq!(err, TransitionError::UnconfiguredTransition("fade".to_string()));
    assert_eq!(ctl.active_count(), 0);
    assert_eq!(attr(&scene, node, "opacity"), None);

    ctl.configure_timeline(
        "fade",
        Timeline {
            duration: 100,
            delay: 0,
            ease: Ease::Linear,
        },
    );
    // Timing on a named reference is ignored.
    let mut config = TransitionConfig::named("fade");
    config.duration = 10_000;
    let handle = ctl.start_transition(&scene, &config, &rects).unwrap();
    ctl.attr(&mut scene, handle, "opacity", 1).unwrap();
    ctl.tick(&mut scene, 100).unwrap();
    assert_eq!(attr(&scene, node, "opacity").as_deref(), Some("1"));
    assert_eq!(ctl.state(handle, node), TransitionState::Completed);
}

#[test]
fn differently_named_transitions_run_side_by_side() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let timeline = Timeline {
        duration: 100,
        delay: 0,
        ease: Ease::Linear,
    };
    ctl.configure_timeline("move", timeline);
    ctl.configure_timeline("fade", timeline);

    let moving = ctl
        .start_transition(&scene, &TransitionConfig::named("move"), &rects)
        .unwrap();
    ctl.attr(&mut scene, moving, "x", 100).unwrap();
    let fading = ctl
        .start_transition(&scene, &TransitionConfig::named("fade"), &rects)
        .unwrap();
    ctl.attr(&mut scene, fading, "opacity", 1).unwrap();

    assert_eq!(ctl.state(moving, node), TransitionState::Running);
    ctl.tick(&mut scene, 50).unwrap();
    assert!((number(&scene, node, "x") - 50.0).abs() < 1e-9);
    assert!((number(&scene, node, "opacity") - 0.5).abs() < 1e-9);
}

#[test]
fn later_schedule_takes_over_a_shared_attribute() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let timeline = Timeline {
        duration: 100,
        delay: 0,
        ease: Ease::Linear,
    };
    ctl.configure_timeline("a", timeline);
    ctl.configure_timeline("b", timeline);

    let first = ctl
        .start_transition(&scene, &TransitionConfig::named("a"), &rects)
        .unwrap();
    ctl.attr(&mut scene, first, "x", 100).unwrap();
    ctl.tick(&mut scene, 50).unwrap();

    let second = ctl
        .start_transition(&scene, &TransitionConfig::named("b"), &rects)
        .unwrap();
    ctl.attr(&mut scene, second, "x", 0).unwrap();
    ctl.tick(&mut scene, 100).unwrap();
    // "a" completes without touching x again.
    assert_eq!(ctl.state(first, node), TransitionState::Completed);
    assert!((number(&scene, node, "x") - 25.0).abs() < 1e-9);
    ctl.tick(&mut scene, 150).unwrap();
    assert_eq!(attr(&scene, node, "x").as_deref(), Some("0"));
}

#[test]
fn remove_waits_for_completion() {
    let (mut scene, svg, rects) = scene_with_rects(2);
    let nodes = rects.nodes().collect::<Vec<_>>();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 0), &rects)
        .unwrap();
    ctl.attr(&mut scene, handle, "opacity", 0).unwrap();
    assert_eq!(ctl.remove(handle), 2);

    ctl.tick(&mut scene, 60).unwrap();
    assert_eq!(scene.tree().children(svg).unwrap().len(), 2);

    let events = ctl.tick(&mut scene, 100).unwrap();
    assert!(scene.tree().children(svg).unwrap().is_empty());
    assert!(events.contains(&TransitionEvent::Removed { handle, node: nodes[0] }));
    assert!(events.contains(&TransitionEvent::Removed { handle, node: nodes[1] }));
}

#[test]
fn interrupted_transition_drops_its_removal() {
    let (mut scene, svg, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let exit = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 0), &rects)
        .unwrap();
    ctl.remove(exit);
    ctl.tick(&mut scene, 50).unwrap();

    let back = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 0), &rects)
        .unwrap();
    ctl.attr(&mut scene, back, "opacity", 1).unwrap();
    let events = ctl.tick(&mut scene, 200).unwrap();
    assert!(scene.is_live(node));
    assert_eq!(scene.tree().children(svg).unwrap(), vec![node]);
    assert_eq!(events[0], TransitionEvent::Interrupted { handle: exit, node });
}

#[test]
fn removing_nodes_cancels_only_their_schedules() {
    let (mut scene, svg, rects) = scene_with_rects(2);
    let nodes = rects.nodes().collect::<Vec<_>>();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 0), &rects)
        .unwrap();
    ctl.attr(&mut scene, handle, "x", 10).unwrap();
    ctl.tick(&mut scene, 0).unwrap();

    let first = Selection::from_nodes(svg, [nodes[0]]);
    scene.remove(&first).unwrap();
    let events = ctl.tick(&mut scene, 50).unwrap();
    assert_eq!(
        events,
        vec![TransitionEvent::Interrupted { handle, node: nodes[0] }]
    );
    assert_eq!(ctl.state(handle, nodes[1]), TransitionState::Running);
    assert!((number(&scene, nodes[1], "x") - 5.0).abs() < 1e-9);
}

#[test]
fn explicit_interrupt_and_node_cancellation() {
    let (scene, _, rects) = scene_with_rects(2);
    let nodes = rects.nodes().collect::<Vec<_>>();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 10), &rects)
        .unwrap();
    assert_eq!(ctl.interrupt(&scene, &rects, "other").unwrap(), 0);
    assert_eq!(ctl.cancel_nodes(&nodes[..1]), 1);
    assert_eq!(ctl.state(handle, nodes[0]), TransitionState::Interrupted);
    assert_eq!(ctl.interrupt(&scene, &rects, "").unwrap(), 1);
    assert_eq!(ctl.active_count(), 0);
}

#[test]
fn text_applies_when_running_begins() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 20), &rects)
        .unwrap();
    ctl.text(&mut scene, handle, "label").unwrap();
    assert_eq!(scene.tree().text(node).unwrap(), "");
    ctl.tick(&mut scene, 20).unwrap();
    assert_eq!(scene.tree().text(node).unwrap(), "label");
}

#[test]
fn backwards_clock_is_clamped() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(100, 0), &rects)
        .unwrap();
    ctl.attr(&mut scene, handle, "x", 100).unwrap();
    ctl.tick(&mut scene, 60).unwrap();
    ctl.tick(&mut scene, 10).unwrap();
    assert_eq!(ctl.now(), 60);
    assert!((number(&scene, node, "x") - 60.0).abs() < 1e-9);
}

#[test]
fn eased_and_string_tweens() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    scene
        .set_attribute(&rects, "transform", "translate(0,0)")
        .unwrap();
    let mut ctl = TransitionController::new();
    let config = TransitionConfig::anonymous(100, 0).with_ease(Ease::CubicIn);
    let handle = ctl.start_transition(&scene, &config, &rects).unwrap();
    ctl.attr(&mut scene, handle, "transform", "translate(100,40)")
        .unwrap();
    ctl.attr(&mut scene, handle, "fill", "red").unwrap();
    ctl.tick(&mut scene, 50).unwrap();
    assert_eq!(
        attr(&scene, node, "transform").as_deref(),
        Some("translate(12.5,5)")
    );
    assert_eq!(attr(&scene, node, "fill"), None);
    ctl.tick(&mut scene, 100).unwrap();
    assert_eq!(attr(&scene, node, "fill").as_deref(), Some("red"));
}

#[test]
fn stale_selections_are_rejected() {
    let (mut scene, svg, rects) = scene_with_rects(1);
    let mut ctl = TransitionController::new();
    scene.remove(&rects).unwrap();
    let err = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(10, 0), &rects)
        .unwrap_err();
    assert!(matches!(err, TransitionError::Selection(_)));
    assert_eq!(ctl.active_count(), 0);
    assert!(scene.tree().children(svg).unwrap().is_empty());
}

#[test]
fn value_functions_see_bound_data() {
    let (mut scene, svg, _) = scene_with_rects(0);
    let top = Selection::from_nodes(scene.tree().root(), [svg]);
    let bars = scene.select_all_within(&top, "rect").unwrap();
    let data = [Datum::from(2), Datum::from(4)];
    let join = scene.join(&bars, &data, &KeyFn::Positional).unwrap();
    let entered = scene.append(&join.enter, "rect").unwrap();

    let mut ctl = TransitionController::new();
    let handle = ctl
        .start_transition(&scene, &TransitionConfig::anonymous(10, 0), &entered)
        .unwrap();
    let height = |d: Option<&Datum>, _: usize| {
        AttrValue::from(d.and_then(Datum::as_number).unwrap_or(0.0) * 10.0)
    };
    ctl.attr(&mut scene, handle, "height", ValueSource::by_datum(&height))
        .unwrap();
    ctl.tick(&mut scene, 10).unwrap();
    let heights = entered
        .nodes()
        .map(|n| attr(&scene, n, "height").unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(heights, vec!["20", "40"]);
}

#[test]
fn repeated_transitions_on_a_live_node_keep_one_settled_entry_per_name() {
    let (mut scene, _, rects) = scene_with_rects(1);
    let node = rects.nodes().next().unwrap();
    let mut ctl = TransitionController::new();

    let mut now = 0;
    let mut handles = Vec::new();
    for i in 0..1000i32 {
        let handle = ctl
            .start_transition(&scene, &TransitionConfig::anonymous(10, 0), &rects)
            .unwrap();
        ctl.attr(&mut scene, handle, "x", i).unwrap();
        now += 20;
        ctl.tick(&mut scene, now).unwrap();
        handles.push(handle);
    }
    assert_eq!(ctl.active_count(), 0);
    assert_eq!(ctl.settled_count(), 1);
    assert_eq!(ctl.state(handles[999], node), TransitionState::Completed);
    assert_eq!(ctl.state(handles[0], node), TransitionState::Idle);

    // A second name settles alongside, not on top of, the anonymous one.
    ctl.configure_timeline("fade", Timeline::default());
    let fade = ctl
        .start_transition(&scene, &TransitionConfig::named("fade"), &rects)
        .unwrap();
    ctl.interrupt(&scene, &rects, "fade").unwrap();
    assert_eq!(ctl.settled_count(), 2);
    assert_eq!(ctl.state(fade, node), TransitionState::Interrupted);
    assert_eq!(ctl.state(handles[999], node), TransitionState::Completed);
}
