use crate::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[test]
fn round_trip_is_exact() {
    let samples = [
        0.0,
        -0.0,
        1.0,
        250.0,
        3.14,
        -42.5,
        0.1 + 0.2,
        1e-7,
        123_456_789.123_456_78,
        1e21,
        f64::MIN_POSITIVE,
        f64::MAX,
        f64::MIN,
    ];
    for x in samples {
        let token = encode(x);
        assert_eq!(decode(&token).expect("decode"), x, "token {token}");
    }
}

#[test]
fn tokens_are_tagged_and_not_the_plaintext() {
    let token = encode(250.0);
    assert!(token.starts_with(TOKEN_TAG));
    assert_eq!(token, "FHE-MjUw");
    assert!(token.parse::<f64>().is_err());
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(encode(99.5), encode(99.5));
    assert_ne!(encode(99.5), encode(99.25));
}

#[test]
fn untagged_legacy_tokens_parse_directly() {
    assert_eq!(decode("3.14").unwrap(), 3.14);
    assert_eq!(decode("  42 ").unwrap(), 42.0);
    assert_eq!(decode("-7").unwrap(), -7.0);
}

#[test]
fn malformed_tokens_are_format_errors() {
    assert_eq!(decode("FHE-***"), Err(CodecError::Base64));
    assert!(matches!(decode("not a number"), Err(CodecError::NotANumber(_))));
    assert!(matches!(decode(""), Err(CodecError::NotANumber(_))));
    // "abc" in base64
    assert!(matches!(decode("FHE-YWJj"), Err(CodecError::NotANumber(_))));
    // invalid utf-8 payload
    assert_eq!(decode("FHE-//79"), Err(CodecError::Utf8));
}

#[test]
fn non_finite_values_do_not_decode() {
    assert!(matches!(decode(&encode(f64::NAN)), Err(CodecError::NonFinite(_))));
    assert!(matches!(decode(&encode(f64::INFINITY)), Err(CodecError::NonFinite(_))));
    assert!(matches!(decode("inf"), Err(CodecError::NonFinite(_))));
}

#[test]
fn transforms_scale_the_decoded_value() {
    let raised = decode(&apply(&encode(100.0), Operation::Increase10Pct).unwrap()).unwrap();
    assert!(close(raised, 110.0), "{raised}");

    let lowered = decode(&apply(&encode(100.0), Operation::Decrease10Pct).unwrap()).unwrap();
    assert!(close(lowered, 90.0), "{lowered}");

    let doubled = decode(&apply(&encode(50.0), Operation::Double).unwrap()).unwrap();
    assert_eq!(doubled, 100.0);

    let same = decode(&apply(&encode(77.7), Operation::Identity).unwrap()).unwrap();
    assert_eq!(same, 77.7);
}

#[test]
fn products_are_not_rounded() {
    // 250 * 1.1 is not exactly representable; the engine must keep the raw product.
    let raised = decode(&apply(&encode(250.0), Operation::Increase10Pct).unwrap()).unwrap();
    assert_eq!(raised, 250.0 * 1.10);
}

#[test]
fn transformed_tokens_stay_tagged() {
    let token = apply("100", Operation::Double).unwrap();
    assert!(token.starts_with(TOKEN_TAG));
    assert_eq!(decode(&token).unwrap(), 200.0);
}

#[test]
fn operation_names_parse_and_unknown_fall_back_to_identity() {
    assert_eq!(Operation::from("increase10%"), Operation::Increase10Pct);
    assert_eq!(Operation::from("decrease10%"), Operation::Decrease10Pct);
    assert_eq!(Operation::from("double"), Operation::Double);
    assert_eq!(Operation::from("triple"), Operation::Identity);
    assert_eq!(Operation::from(""), Operation::Identity);

    let engine = TransformEngine::<TaggedCodec>::default();
    let token = encode(64.0);
    let out = engine.apply_named(&token, "halve").unwrap();
    assert_eq!(decode(&out).unwrap(), 64.0);
}

#[test]
fn transform_propagates_format_errors() {
    let engine = TransformEngine::new(TaggedCodec);
    assert_eq!(
        engine.apply("FHE-%%", Operation::Double),
        Err(CodecError::Base64)
    );
}

// ========================= Properties =========================

mod properties {
    use super::*;
    use proptest::prelude::*;

    const WIRE_NAMES: [&str; 3] = ["increase10%", "decrease10%", "double"];

    fn finite() -> impl Strategy<Value = f64> {
        any::<f64>().prop_filter("finite", |x| x.is_finite())
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop_oneof![
            Just(Operation::Increase10Pct),
            Just(Operation::Decrease10Pct),
            Just(Operation::Double),
            Just(Operation::Identity),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        /// Property: every finite value survives a round trip bit for bit
        #[test]
        fn prop_round_trip_is_exact(x in finite()) {
            let decoded = decode(&encode(x)).unwrap();
            prop_assert_eq!(decoded.to_bits(), x.to_bits());
        }

        /// Property: a transform is exactly the plain product of the value and
        /// the operation factor
        #[test]
        fn prop_transform_is_plain_product(x in -1e300f64..1e300, op in operation()) {
            let out = apply(&encode(x), op).unwrap();
            prop_assert_eq!(decode(&out).unwrap(), x * op.factor());
        }

        /// Property: any name outside the wire names is identity
        #[test]
        fn prop_unknown_names_are_identity(
            name in "\\PC{0,16}".prop_filter("not a wire name", |n| !WIRE_NAMES.contains(&n.as_str()))
        ) {
            prop_assert_eq!(Operation::from(name.as_str()), Operation::Identity);
        }
    }
}
