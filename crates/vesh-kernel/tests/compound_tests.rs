//! Compound evaluation: outer products, indexing, variables, maps, ranges.

use std::collections::HashMap;

use vesh_kernel::ast::build::*;
use vesh_kernel::ast::{Compound, Source, Span};
use vesh_kernel::{CompileError, ErrorKind, EvalConfig, Evaler, Exception, Value};

fn evaler() -> Evaler {
    Evaler::new(EvalConfig::transient())
}

fn strs(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::from(*s)).collect()
}

fn words(items: &[&str]) -> Vec<Compound> {
    items.iter().map(|s| word(s)).collect()
}

async fn values(evaler: &Evaler, c: Compound) -> Vec<Value> {
    evaler.eval_values(Source::new("test", ""), &c).await.unwrap()
}

async fn exception(evaler: &Evaler, c: Compound) -> Exception {
    let err = evaler.eval_values(Source::new("test", ""), &c).await.unwrap_err();
    err.downcast_ref::<Exception>()
        .unwrap_or_else(|| panic!("not an exception: {err:#}"))
        .clone()
}

// ============================================================================
// Outer product
// ============================================================================

#[tokio::test]
async fn two_by_three_is_row_major() {
    let c = compound(vec![
        braced(words(&["a1", "a2"])).into(),
        braced(words(&["b1", "b2", "b3"])).into(),
    ]);
    assert_eq!(
        values(&evaler(), c).await,
        strs(&["a1b1", "a1b2", "a1b3", "a2b1", "a2b2", "a2b3"])
    );
}

#[tokio::test]
async fn three_parts_vary_leftmost_slowest() {
    let c = compound(vec![
        braced(words(&["x", "y"])).into(),
        bareword("-").into(),
        braced(words(&["1", "2"])).into(),
    ]);
    assert_eq!(values(&evaler(), c).await, strs(&["x-1", "x-2", "y-1", "y-2"]));
}

#[tokio::test]
async fn braced_siblings_do_not_multiply() {
    let c = compound(vec![braced(vec![
        compound(vec![braced(words(&["a", "b"])).into()]),
        word("c"),
    ])
    .into()]);
    assert_eq!(values(&evaler(), c).await, strs(&["a", "b", "c"]));
}

#[tokio::test]
async fn empty_compound_is_one_empty_string() {
    assert_eq!(values(&evaler(), compound(vec![])).await, strs(&[""]));
}

#[tokio::test]
async fn unsupported_concat_names_both_kinds() {
    let c = compound(vec![list(words(&["a"])).into(), bareword("x").into()]);
    let exc = exception(&evaler(), c).await;
    assert_eq!(exc.kind, ErrorKind::UnsupportedConcat { lhs: "list", rhs: "string" });
    assert_eq!(exc.to_string(), "unsupported concat: list and string");
}

// ============================================================================
// Ranges
// ============================================================================

#[tokio::test]
async fn numeric_range() {
    let c = compound(vec![range(word("1"), word("3")).into()]);
    assert_eq!(values(&evaler(), c).await, strs(&["1", "2", "3"]));
}

#[tokio::test]
async fn descending_char_range_with_prefix() {
    let c = compound(vec![bareword("x").into(), range(word("c"), word("a")).into()]);
    assert_eq!(values(&evaler(), c).await, strs(&["xc", "xb", "xa"]));
}

#[tokio::test]
async fn mixed_range_is_bad() {
    let c = compound(vec![range(word("a"), word("10")).into()]);
    assert_eq!(exception(&evaler(), c).await.kind, ErrorKind::BadRange);
}

// ============================================================================
// Indexing
// ============================================================================

#[tokio::test]
async fn list_and_map_indexing() {
    let ev = evaler();
    let c = compound(vec![index(list(words(&["a", "b", "c"])), vec![words(&["0", "2"])])]);
    assert_eq!(values(&ev, c).await, strs(&["a", "c"]));

    let m = map(vec![pair(word("k"), Some(word("v")))]);
    let c = compound(vec![index(m, vec![words(&["k"])])]);
    assert_eq!(values(&ev, c).await, strs(&["v"]));
}

#[tokio::test]
async fn chained_indexing() {
    let nested = list(vec![compound(vec![list(words(&["x", "y"])).into()])]);
    let c = compound(vec![index(nested, vec![words(&["0"]), words(&["1"])])]);
    assert_eq!(values(&evaler(), c).await, strs(&["y"]));
}

#[tokio::test]
async fn bool_is_not_indexable() {
    let c = compound(vec![index(variable("true"), vec![words(&["0"])])]);
    let exc = exception(&evaler(), c).await;
    assert_eq!(exc.kind, ErrorKind::NotIndexable("bool"));
    assert_eq!(exc.to_string(), "a bool not indexable");
}

// ============================================================================
// Variables
// ============================================================================

#[tokio::test]
async fn explosion_splices_into_the_product() {
    let ev = evaler();
    ev.set_global("xs", Value::list(strs(&["a", "b"]))).unwrap();
    let c = compound(vec![bareword("pre-").into(), variable("@xs").into()]);
    assert_eq!(values(&ev, c).await, strs(&["pre-a", "pre-b"]));

    let plain = compound(vec![variable("xs").into()]);
    assert_eq!(values(&ev, plain).await, vec![Value::list(strs(&["a", "b"]))]);
}

#[tokio::test]
async fn exploding_a_bool_fails() {
    let ev = evaler();
    ev.set_global("b", Value::Bool(true)).unwrap();
    let exc = exception(&ev, var("@b")).await;
    assert_eq!(
        exc.kind,
        ErrorKind::CannotExplode {
            name: "b".into(),
            kind: "bool"
        }
    );
}

#[tokio::test]
async fn environment_namespace() {
    let expected = std::env::var("PATH").unwrap_or_default();
    assert_eq!(values(&evaler(), var("E:PATH")).await, vec![Value::from(expected)]);
}

#[tokio::test]
async fn unknown_variable_is_reported_with_position() {
    let mut c = var("nope");
    c.indexings[0].head.span = Span::new(4, 9);
    let err = evaler()
        .eval_values(Source::new("test", "put $nope"), &c)
        .await
        .unwrap_err();
    let err = err.downcast_ref::<CompileError>().unwrap();
    assert_eq!(err.span, Span::new(4, 9));
    assert_eq!(err.to_string(), "test:1:5: compile error: variable $nope not found");
}

// ============================================================================
// Maps
// ============================================================================

#[tokio::test]
async fn pairs_without_value_are_true() {
    let c = compound(vec![map(vec![pair(word("a"), Some(word("1"))), pair(word("flag"), None)]).into()]);
    let expected = Value::map(HashMap::from([
        (Value::from("a"), Value::from("1")),
        (Value::from("flag"), Value::Bool(true)),
    ]));
    assert_eq!(values(&evaler(), c).await, vec![expected]);
}

#[tokio::test]
async fn pairs_zip_and_later_keys_win() {
    let c = compound(vec![map(vec![
        pair(
            compound(vec![braced(words(&["a", "b"])).into()]),
            Some(compound(vec![braced(words(&["1", "2"])).into()])),
        ),
        pair(word("a"), Some(word("3"))),
    ])
    .into()]);
    let expected = Value::map(HashMap::from([
        (Value::from("a"), Value::from("3")),
        (Value::from("b"), Value::from("2")),
    ]));
    assert_eq!(values(&evaler(), c).await, vec![expected]);
}

#[tokio::test]
async fn pair_count_mismatch_reports_counts_and_span() {
    let mut p = pair(
        compound(vec![braced(words(&["a", "b"])).into()]),
        Some(compound(vec![braced(words(&["1", "2", "3"])).into()])),
    );
    p.span = Span::new(3, 17);
    let exc = exception(&evaler(), compound(vec![map(vec![p]).into()])).await;
    assert_eq!(exc.kind, ErrorKind::MapCountMismatch { keys: 2, values: 3 });
    assert_eq!(exc.span, Some(Span::new(3, 17)));
    assert_eq!(exc.to_string(), "2 keys but 3 values");
}

// ============================================================================
// Exception capture
// ============================================================================

#[tokio::test]
async fn exception_capture_yields_one_value() {
    let ev = evaler();
    let failing = compound(vec![exception_capture(chunk(vec![form(word("fail"), words(&["boom"]))])).into()]);
    let out = values(&ev, failing).await;
    assert_eq!(out.len(), 1);
    let Value::Exception(exc) = &out[0] else {
        panic!("expected an exception value, got {:?}", out[0])
    };
    assert_eq!(exc.kind, ErrorKind::Failure("boom".into()));

    let fine = compound(vec![exception_capture(chunk(vec![form(word("nop"), vec![])])).into()]);
    assert_eq!(values(&ev, fine).await, vec![Value::Ok]);
}

#[tokio::test]
async fn output_capture_failure_propagates() {
    let c = compound(vec![output_capture(chunk(vec![
        form(word("put"), words(&["a"])),
        form(word("fail"), words(&["late"])),
    ]))
    .into()]);
    assert_eq!(exception(&evaler(), c).await.kind, ErrorKind::Failure("late".into()));
}
