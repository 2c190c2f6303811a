use std::sync::Arc;

use bgcore::{expr::ValueList, prelude::*};
use num_bigint::BigInt;

fn source(bytes: &[u8]) -> Arc<dyn ByteSource> {
    Arc::new(InMemorySource::new(bytes.to_vec()))
}

fn numbers(values: &ValueList) -> Vec<Option<BigInt>> {
    values.iter().map(|v| v.as_ref().map(|v| v.as_numeric().unwrap())).collect()
}

#[test]
fn length_prefixed_text() {
    let grammar = seq("", [
        def("length", con(1)),
        def("text", name_ref("length")),
    ]);
    let result = parse(&grammar, source(b"\x07Gertjan"), Encoding::default()).unwrap();

    assert!(result.succeeded());
    let env = result.environment();
    assert_eq!(env.offset(), 8);
    let length = env.graph().find("length").unwrap();
    assert_eq!(length.value().as_numeric().unwrap(), BigInt::from(7));
    assert_eq!(length.offset(), 0);
    let text = env.graph().find("text").unwrap();
    assert_eq!(text.value().as_text().unwrap(), "Gertjan");
    assert_eq!(text.offset(), 1);
}

#[test]
fn failed_predicate_keeps_the_input_state() {
    let grammar = def_where("v", con(1), eq_num(con(1)));
    let result = parse(&grammar, source(&[2]), Encoding::default()).unwrap();

    assert!(result.is_failure());
    assert_eq!(result.environment().offset(), 0);
    assert!(result.environment().graph().is_empty());
}

#[test]
fn modulo_has_no_result_for_non_positive_modulus() {
    let env = Environment::new(source(&[]));
    let eval = |expr: bgcore::expr::ValueExpression| {
        numbers(&expr.eval(&env, Encoding::default()).unwrap())
    };

    assert_eq!(eval(modulo(con(1), con(0))), vec![None]);
    assert_eq!(eval(modulo(con(1), con(-1))), vec![None]);
    let signed = Encoding::default().with_sign(Sign::Signed);
    let out = modulo(con(-1), con(3)).eval(&env, signed).unwrap();
    assert_eq!(numbers(&out), vec![Some(BigInt::from(2))]);
}

#[test]
fn byte_order_changes_numeric_view() {
    let little = Encoding::default().with_byte_order(ByteOrder::LittleEndian);
    assert_eq!(Value::from_bytes(vec![1u8, 0], little).as_numeric().unwrap(), BigInt::from(1));
    assert_eq!(
        Value::from_bytes(vec![1u8, 0], Encoding::default()).as_numeric().unwrap(),
        BigInt::from(256)
    );

    // Same through a grammar, with the encoding given to the parse.
    let grammar = def("n", con(2));
    let result = parse(&grammar, source(&[1, 0]), little).unwrap();
    let n = result.environment().graph().find("n").unwrap();
    assert_eq!(n.value().as_numeric().unwrap(), BigInt::from(1));
}

#[test]
fn repetition_stops_at_first_failing_iteration() {
    let record = seq("record", [
        def("key", con(1)),
        def_where("value", con(1), lt_num(con(5))),
    ]);
    let grammar = rep("records", record);
    let result = parse(&grammar, source(&[1, 1, 2, 2, 3, 9, 4, 4]), Encoding::default()).unwrap();

    assert!(result.succeeded());
    let env = result.environment();
    assert_eq!(env.offset(), 4);
    assert_eq!(env.graph().value_count(), 4);
    let keys: Vec<_> = env
        .graph()
        .get_all("key")
        .iter()
        .map(|v| v.value().as_numeric().unwrap())
        .collect();
    assert_eq!(keys, vec![BigInt::from(1), BigInt::from(2)]);
    assert_eq!(env.graph().find("records.record.value").unwrap().offset(), 3);
}
