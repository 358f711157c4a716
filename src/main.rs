use mimalloc::MiMalloc;
use weaver::{
    AttrValue, Datum, KeyFn, Millis, Runtime, RuntimeConfig, Selection, TransitionConfig,
    NodeTree, ValueSource, WeaverResult, outline,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const FRAME: Millis = 100;

fn frames() -> [Vec<(&'static str, f64)>; 3] {
    [
        vec![("apples", 12.0), ("pears", 7.0), ("plums", 3.0)],
        vec![("pears", 9.0), ("plums", 5.0), ("figs", 4.0)],
        vec![("figs", 1.0), ("limes", 8.0)],
    ]
}

fn records(frame: &[(&str, f64)]) -> Vec<Datum> {
    frame
        .iter()
        .map(|(id, value)| Datum::record([("id", Datum::text(id)), ("value", Datum::from(*value))]))
        .collect()
}

fn width(d: Option<&Datum>, _: usize) -> AttrValue {
    let value = d.and_then(|d| d.field("value")).and_then(Datum::as_number);
    AttrValue::Number(value.unwrap_or(0.0) * 10.0)
}

fn row(_: Option<&Datum>, i: usize) -> AttrValue {
    AttrValue::Number(i as f64 * 20.0)
}

fn label(d: Option<&Datum>, _: usize) -> AttrValue {
    match d.and_then(|d| d.field("id")) {
        Some(id) => AttrValue::from(id.to_string()),
        None => AttrValue::from(""),
    }
}

fn update(rt: &mut Runtime, chart: &Selection, frame: &[(&str, f64)]) -> WeaverResult<()> {
    let bars = rt.selection_select_all("rect", chart)?;
    let join = rt.data_key_fn(frame, records, &KeyFn::Field("id"), &bars)?;

    let entered = rt.enter_and_append("rect", &join)?;
    rt.set_attr("width", 0, &entered)?;
    rt.set_text(ValueSource::by_datum(&label), &entered)?;

    let grow = rt.add_transition(&entered.merge(&join.update), &TransitionConfig::named("grow"))?;
    rt.transition_attr(grow, "width", ValueSource::by_datum(&width))?;
    rt.transition_attr(grow, "y", ValueSource::by_datum(&row))?;

    let exit = rt.exit(&join);
    if !exit.is_empty() {
        let fade = rt.add_transition(&exit, &TransitionConfig::anonymous(FRAME * 2, 0))?;
        rt.transition_attr(fade, "width", 0)?;
        rt.transition_remove(fade);
    }
    Ok(())
}

fn print_tree(rt: &Runtime, now: Millis) {
    println!("t={now}ms");
    for line in outline(rt.tree(), rt.tree().root()) {
        println!("  {line}");
    }
}

fn main() -> WeaverResult<()> {
    let mut rt = Runtime::with_document(RuntimeConfig::default());
    rt.configure_timeline(
        "grow",
        weaver::Timeline {
            duration: FRAME * 3,
            delay: 0,
            ease: weaver::Ease::CubicInOut,
        },
    );

    let root = rt.tree().root();
    let chart = rt.append("svg", &Selection::from_nodes(root, [root]))?;

    let mut now = 0;
    for frame in frames() {
        update(&mut rt, &chart, &frame)?;
        for _ in 0..4 {
            for event in rt.tick(now)? {
                println!("  {event:?}");
            }
            now += FRAME;
        }
        print_tree(&rt, now - FRAME);
    }
    Ok(())
}
