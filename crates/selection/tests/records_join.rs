use core_types::{AttrValue, Datum};
use dom::{Document, NodeTree, outline};
use selection::{KeyFn, Scene, Selection, ValueSource};
use test_support::{diff_lines, fixture_path, load_records};

fn bar_width(d: Option<&Datum>, _: usize) -> AttrValue {
    let value = d.and_then(|d| d.field("value")).and_then(Datum::as_number);
    AttrValue::Number(value.unwrap_or(0.0) * 10.0)
}

fn bar_label(d: Option<&Datum>, _: usize) -> AttrValue {
    match d.and_then(|d| d.field("label")) {
        Some(label) => AttrValue::from(label.to_string()),
        None => AttrValue::from(""),
    }
}

fn render(scene: &mut Scene<Document>, chart: &Selection, records: &[Datum]) {
    let bars = scene.select_all_within(chart, "rect").unwrap();
    let join = scene.join(&bars, records, &KeyFn::Field("id")).unwrap();
    scene.remove(&join.exit).unwrap();
    let entered = scene.append(&join.enter, "rect").unwrap();
    let all = entered.merge(&join.update);
    scene
        .set_attribute(&all, "width", ValueSource::by_datum(&bar_width))
        .unwrap();
    scene.set_text(&all, ValueSource::by_datum(&bar_label)).unwrap();
}

#[test]
fn records_render_and_rekey_by_field() {
    let records = load_records(&fixture_path(env!("CARGO_MANIFEST_DIR"), "records.json"));
    assert_eq!(records.len(), 5);

    let mut doc = Document::new();
    let svg = doc.append_element(doc.root(), "svg").unwrap();
    let mut scene = Scene::new(doc);
    let chart = Selection::from_nodes(scene.tree().root(), [svg]);

    render(&mut scene, &chart, &records);
    let first_pass = scene.select_all("rect").nodes().collect::<Vec<_>>();
    assert_eq!(first_pass.len(), 5);

    // Drop "pears", move "limes" first, change a value.
    let mut next = records.clone();
    next.remove(1);
    let limes = next.pop().unwrap();
    next.insert(0, limes);
    next[1] = Datum::record([
        ("id", Datum::text("apples")),
        ("value", Datum::from(1)),
        ("label", Datum::text("Apples")),
    ]);
    render(&mut scene, &chart, &next);

    let expected = [
        "<svg>",
        "  <rect width=\"10\">",
        "    \"Apples\"",
        "  <rect width=\"30\">",
        "    \"Plums\"",
        "  <rect width=\"0\">",
        "    \"Figs\"",
        "  <rect width=\"210\">",
        "    \"Limes\"",
    ]
    .map(String::from)
    .to_vec();
    // Updates rewrite in place; tree order is not data order.
    let actual = outline(scene.tree(), svg);
    assert_eq!(expected, actual, "\n{}", diff_lines(&expected, &actual));

    // Surviving nodes keep their identity across passes.
    let survivors = scene.select_all("rect").nodes().collect::<Vec<_>>();
    assert_eq!(survivors, vec![first_pass[0], first_pass[2], first_pass[3], first_pass[4]]);
    assert!(!scene.is_live(first_pass[1]));
}
