use crate::*;

fn parse(s: &str) -> std::result::Result<NumericInput, BTableError> {
    s.parse::<NumericInput>()
}

// -------------------- Parsing --------------------

#[test]
fn integer_literals_parse_as_integers() {
    assert_eq!(parse("42").unwrap(), NumericInput::Integer(42));
    assert_eq!(parse("-7").unwrap(), NumericInput::Integer(-7));
    assert_eq!(parse(" 42 ").unwrap(), NumericInput::Integer(42));
    assert_eq!(parse("\t0\n").unwrap(), NumericInput::Integer(0));
}

#[test]
fn decimal_literals_parse_as_floats() {
    assert_eq!(parse("1.5").unwrap(), NumericInput::Float(1.5));
    assert_eq!(parse("1e3").unwrap(), NumericInput::Float(1000.0));
    assert_eq!(parse("inf").unwrap(), NumericInput::Float(f64::INFINITY));
}

#[test]
fn negative_zero_keeps_its_sign() {
    match parse("-0.0").unwrap() {
        NumericInput::Float(v) => {
            assert_eq!(v, 0.0);
            assert!(v.is_sign_negative());
        }
        other => panic!("expected a float, got {:?}", other),
    }
}

#[test]
fn nan_parses_as_float() {
    match parse("NaN").unwrap() {
        NumericInput::Float(v) => assert!(v.is_nan()),
        other => panic!("expected a float, got {:?}", other),
    }
}

#[test]
fn integer_beyond_i64_falls_back_to_float() {
    assert_eq!(
        parse("9223372036854775808").unwrap(),
        NumericInput::Float(9223372036854775808.0)
    );
    assert_eq!(parse("9223372036854775807").unwrap(), NumericInput::Integer(i64::MAX));
}

#[test]
fn non_numbers_are_invalid_value_type() {
    for s in ["", "   ", "abc", "1,5", "0x10"] {
        assert!(
            matches!(parse(s), Err(BTableError::InvalidValueType(_))),
            "{:?} should not parse",
            s
        );
    }
}

// -------------------- Widening --------------------

#[test]
fn integers_widen_to_f64() {
    assert_eq!(NumericInput::from(3u8).to_f64(), 3.0);
    assert_eq!(NumericInput::from(-3i32).to_f64(), -3.0);
    assert_eq!(f64::from(NumericInput::Integer(1 << 53)), 9007199254740992.0);
}

#[test]
fn display_matches_the_parsed_form() {
    assert_eq!(NumericInput::Integer(42).to_string(), "42");
    assert_eq!(NumericInput::Float(1.5).to_string(), "1.5");
}
