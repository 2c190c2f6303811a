use std::sync::Arc;

use bgcore::prelude::*;
use num_bigint::BigInt;

fn source(bytes: &[u8]) -> Arc<dyn ByteSource> {
    Arc::new(InMemorySource::new(bytes.to_vec()))
}

fn run(grammar: &Arc<Token>, bytes: &[u8]) -> ParseResult {
    parse(grammar, source(bytes), Encoding::default()).unwrap()
}

fn numeric(result: &ParseResult, name: &str) -> Option<BigInt> {
    result
        .environment()
        .graph()
        .find(name)
        .map(|found| found.value().as_numeric().unwrap())
}

#[test]
fn sequence_short_circuits() {
    // The right-hand token is a dangling reference: evaluating it is a fatal error.
    let grammar = seq("", [
        def_where("magic", con(1), eq_num(con(0))),
        token_ref("nowhere"),
    ]);

    let result = run(&grammar, &[1]);
    assert!(result.is_failure());
    assert_eq!(result.environment().offset(), 0);

    let err = parse(&grammar, source(&[0]), Encoding::default()).unwrap_err();
    assert!(err.to_string().contains("nowhere"));
    assert!(matches!(err, BgError::UnknownTokenReference(name) if name == "nowhere"));
}

#[test]
fn choice_takes_first_success_in_order() {
    let grammar = cho("", [def("a", con(1)), def("b", con(2))]);
    let result = run(&grammar, &[1, 2]);

    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 1);
    assert!(numeric(&result, "a").is_some());
    assert!(numeric(&result, "b").is_none());
}

#[test]
fn failed_alternative_leaves_nothing_behind() {
    let grammar = cho("", [
        seq("first", [
            def("x", con(1)),
            def_where("y", con(1), eq_num(con(9))),
        ]),
        def("z", con(2)),
    ]);
    let result = run(&grammar, &[1, 2]);

    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 2);
    assert!(numeric(&result, "x").is_none());
    assert_eq!(numeric(&result, "z"), Some(BigInt::from(0x0102)));
    assert_eq!(result.environment().graph().value_count(), 1);
}

#[test]
fn choice_failure_returns_original_environment() {
    let grammar = cho("", [
        def_where("a", con(1), eq_num(con(7))),
        def_where("b", con(1), eq_num(con(8))),
    ]);
    let result = run(&grammar, &[1]);
    assert!(result.is_failure());
    assert!(result.environment().graph().is_empty());
}

#[test]
fn parsing_is_deterministic() {
    let grammar = seq("file", [
        def("count", con(1)),
        rep_n("items", def("item", con(2)), name_ref("count")),
        rep("tail", def("rest", con(1))),
    ]);
    let bytes = [2u8, 0, 1, 0, 2, 9, 9];

    let first = run(&grammar, &bytes);
    let second = run(&grammar, &bytes);
    assert!(first.succeeded());
    assert_eq!(first.environment().offset(), 7);
    assert_eq!(first.environment().graph(), second.environment().graph());
}

#[test]
fn repetition_never_fails() {
    let grammar = rep("", def_where("zero", con(1), eq_num(con(0))));

    let result = run(&grammar, &[1]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 0);

    let result = run(&grammar, &[]);
    assert!(result.succeeded());
    assert_eq!(result.environment().graph().value_count(), 0);
}

#[test]
fn repetition_stops_when_nothing_is_consumed() {
    let grammar = rep("", def("empty", con(0)));
    let result = run(&grammar, &[1, 2]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 0);
    assert_eq!(result.environment().graph().value_count(), 1);
}

#[test]
fn counted_repetition() {
    let grammar = rep_n("", def("x", con(1)), con(3));
    let result = run(&grammar, &[1, 2, 3, 4]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 3);

    let too_many = rep_n("", def("x", con(1)), con(5));
    let result = run(&too_many, &[1, 2, 3, 4]);
    assert!(result.is_failure());
    assert_eq!(result.environment().offset(), 0);

    let negative = rep_n("", def("x", con(1)), con(-1));
    assert!(run(&negative, &[1]).is_failure());
}

#[test]
fn iteration_counter_is_visible() {
    let grammar = rep("", def_where("x", con(1), eq_num(current_iteration(0))));
    let result = run(&grammar, &[0, 1, 2, 5]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 3);
}

#[test]
fn while_checks_before_each_iteration() {
    use bgcore::expr::ComparisonOp;

    let below_two = compare_values(ComparisonOp::LtNum, current_offset(), con(2));
    let grammar = rep_while("", def("x", con(1)), below_two);
    let result = run(&grammar, &[1, 2, 3]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 2);

    // Unlike `rep`, an inner failure fails the whole token.
    let grammar = rep_while("", def("x", con(1)), always());
    let result = run(&grammar, &[1, 2]);
    assert!(result.is_failure());
    assert_eq!(result.environment().offset(), 0);
}

#[test]
fn precondition_and_postcondition() {
    use bgcore::expr::ComparisonOp;

    let at_one = compare_values(ComparisonOp::EqNum, current_offset(), con(1));
    let grammar = pre("", def("x", con(1)), at_one.clone());
    let result = run(&grammar, &[7]);
    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 0);

    let grammar = seq("", [nod(con(1)), pre("", def("x", con(1)), at_one)]);
    let result = run(&grammar, &[7, 8]);
    assert_eq!(numeric(&result, "x"), Some(BigInt::from(8)));

    let grammar = post("", def("x", con(1)), eq_num(con(3)));
    assert!(run(&grammar, &[3]).succeeded());
    let result = run(&grammar, &[4]);
    assert!(result.is_failure());
    assert!(result.environment().graph().is_empty());
}

#[test]
fn skipping_bytes() {
    let grammar = seq("", [nod(con(2)), def("x", con(1))]);
    let result = run(&grammar, &[9, 9, 7]);
    assert_eq!(numeric(&result, "x"), Some(BigInt::from(7)));
    assert_eq!(result.environment().graph().value_count(), 1);

    assert!(run(&nod(con(4)), &[1, 2]).is_failure());
}

#[test]
fn short_input_is_a_failure_not_an_error() {
    let grammar = def("x", con(4));
    let result = run(&grammar, &[1, 2]);
    assert!(result.is_failure());

    let grammar = def("x", name_ref("missing"));
    assert!(run(&grammar, &[1]).is_failure());
}

#[test]
fn encoding_overrides_are_inherited() {
    let little = Encoding::default().with_byte_order(ByteOrder::LittleEndian);
    let grammar = seq("", [
        def("big", con(2)),
        encoded(&seq("le", [def("little", con(2))]), little),
    ]);
    let result = run(&grammar, &[1, 0, 1, 0]);

    assert_eq!(numeric(&result, "big"), Some(BigInt::from(256)));
    assert_eq!(numeric(&result, "le.little"), Some(BigInt::from(1)));
    let little_value = result.environment().graph().find("little").unwrap();
    assert_eq!(little_value.value().encoding(), little);
}

#[test]
fn names_follow_the_grammar() {
    let grammar = seq("header", [
        def("length", con(1)),
        seq("body", [def("length", con(1))]),
    ]);
    let result = run(&grammar, &[1, 2]);
    let graph = result.environment().graph();

    assert_eq!(graph.find("header.length").unwrap().offset(), 0);
    assert_eq!(graph.find("body.length").unwrap().offset(), 1);
    assert_eq!(graph.get_all("length").len(), 2);
    assert_eq!(graph.items().len(), 1);
}

#[test]
fn recursion_through_token_references() {
    // A tree: a flag byte, then either a leaf byte or two subtrees.
    let tree = cho("tree", [
        seq("leaf", [
            def_where("flag", con(1), eq_num(con(0))),
            def("value", con(1)),
        ]),
        seq("node", [
            def_where("flag", con(1), eq_num(con(1))),
            token_ref("tree"),
            token_ref("tree"),
        ]),
    ]);
    let result = run(&tree, &[1, 0, 5, 1, 0, 6, 0, 7]);

    assert!(result.succeeded());
    assert_eq!(result.environment().offset(), 8);
    let values: Vec<_> = result
        .environment()
        .graph()
        .get_all("value")
        .iter()
        .map(|v| v.value().as_numeric().unwrap())
        .collect();
    assert_eq!(values, vec![BigInt::from(5), BigInt::from(6), BigInt::from(7)]);
}
