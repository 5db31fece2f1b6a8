//! Unit tests for the constant-value engine.

use super::const_value::{ConstValue, FloatPrecision};

#[test]
fn test_integer_addition() {
    let a = ConstValue::signed_int(2);
    let b = ConstValue::signed_int(3);

    assert_eq!(a.add(&b), Some(ConstValue::signed_int(5)));
}

#[test]
fn test_integer_wraps_at_width() {
    let a = ConstValue::int(127, 1, true);
    let b = ConstValue::int(1, 1, true);

    assert_eq!(a.add(&b).unwrap().as_i128(), Some(-128));
}

#[test]
fn test_unsigned_wraps_to_max() {
    let zero = ConstValue::int(0, 4, false);
    let one = ConstValue::int(1, 4, false);

    assert_eq!(zero.sub(&one).unwrap().as_i128(), Some(u32::MAX as i128));
}

#[test]
fn test_mixed_widths_promote() {
    let a = ConstValue::int(1, 4, true);
    let b = ConstValue::int(1, 8, true);

    match a.add(&b).unwrap() {
        ConstValue::Integer { bytes, signed, .. } => {
            assert_eq!(bytes, 8);
            assert!(signed);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_integer_plus_float_is_float() {
    let a = ConstValue::float(3.0, FloatPrecision::Float);
    let b = ConstValue::signed_int(4);

    assert_eq!(a.add(&b), Some(ConstValue::float(7.0, FloatPrecision::Float)));
}

#[test]
fn test_division_truncates_toward_zero() {
    let a = ConstValue::signed_int(-7);
    let b = ConstValue::signed_int(2);

    assert_eq!(a.div(&b).unwrap().as_i64(), Some(-3));
    assert_eq!(a.rem(&b).unwrap().as_i64(), Some(-1));
}

#[test]
fn test_division_by_zero_does_not_fold() {
    let a = ConstValue::signed_int(1);

    assert_eq!(a.div(&ConstValue::signed_int(0)), None);
    assert_eq!(
        ConstValue::float(1.0, FloatPrecision::Double).div(&ConstValue::float(0.0, FloatPrecision::Double)),
        None
    );
}

#[test]
fn test_integer_power() {
    let two = ConstValue::signed_int(2);

    assert_eq!(two.pow(&ConstValue::signed_int(10)).unwrap().as_i64(), Some(1024));
    assert_eq!(two.pow(&ConstValue::signed_int(-1)).unwrap().as_i64(), Some(0));
    assert_eq!(
        ConstValue::signed_int(-1).pow(&ConstValue::signed_int(-3)).unwrap().as_i64(),
        Some(-1)
    );
}

#[test]
fn test_real_power_with_wide_integer_exponent() {
    let exponent = ConstValue::int(4294967296, 8, true);
    let two = ConstValue::float(2.0, FloatPrecision::Double);
    let half = ConstValue::float(0.5, FloatPrecision::Double);

    assert_eq!(
        two.pow(&ConstValue::signed_int(-2)),
        Some(ConstValue::float(0.25, FloatPrecision::Double))
    );
    assert!(two.pow(&exponent).unwrap().as_f64().unwrap().is_infinite());
    assert_eq!(half.pow(&exponent).unwrap().as_f64(), Some(0.0));
    assert_eq!(two.pow(&exponent.neg().unwrap()).unwrap().as_f64(), Some(0.0));
    assert_eq!(
        ConstValue::float(-1.0, FloatPrecision::Double)
            .pow(&ConstValue::int(4294967297, 8, true))
            .unwrap()
            .as_f64(),
        Some(-1.0)
    );
}

#[test]
fn test_complex_power() {
    let complex = |re: f64, im: f64| {
        ConstValue::complex(
            ConstValue::float(re, FloatPrecision::Double),
            ConstValue::float(im, FloatPrecision::Double),
        )
    };
    let i = complex(0.0, 1.0);

    assert_eq!(i.pow(&ConstValue::signed_int(4)), Some(complex(1.0, 0.0)));
    assert_eq!(i.pow(&ConstValue::signed_int(-1)), Some(complex(0.0, -1.0)));
    assert_eq!(
        complex(1.0, 0.0).pow(&ConstValue::int(i64::MAX as i128, 8, true)),
        Some(complex(1.0, 0.0))
    );
    assert_eq!(complex(1.0, 0.0).pow(&ConstValue::signed_int(50000000)), Some(complex(1.0, 0.0)));
    assert_eq!(complex(0.0, 0.0).pow(&ConstValue::signed_int(-1)), None);
}

#[test]
fn test_complex_multiplication() {
    let i = ConstValue::complex(
        ConstValue::float(0.0, FloatPrecision::Float),
        ConstValue::float(1.0, FloatPrecision::Float),
    );
    let minus_one = ConstValue::complex(
        ConstValue::float(-1.0, FloatPrecision::Float),
        ConstValue::float(0.0, FloatPrecision::Float),
    );

    assert_eq!(i.mul(&i), Some(minus_one));
}

#[test]
fn test_comparisons_yield_truth_values() {
    let a = ConstValue::signed_int(1);
    let b = ConstValue::float(1.5, FloatPrecision::Double);

    assert_eq!(a.lower_than(&b), Some(ConstValue::truth(true)));
    assert_eq!(a.greater_or_equal(&b), Some(ConstValue::truth(false)));
    assert_eq!(a.equal(&a), Some(ConstValue::truth(true)));
}

#[test]
fn test_string_comparison_pads_with_blanks() {
    let a = ConstValue::string("abc", 1);
    let b = ConstValue::string("abc  ", 1);

    assert_eq!(a.equal(&b), Some(ConstValue::truth(true)));
    assert_eq!(a.lower_than(&ConstValue::string("abd", 1)), Some(ConstValue::truth(true)));
}

#[test]
fn test_concat() {
    let a = ConstValue::string("foo", 1);
    let b = ConstValue::string("bar", 1);

    assert_eq!(a.concat(&b).unwrap().string_value(), Some("foobar".to_string()));
}

#[test]
fn test_array_broadcast() {
    let array = ConstValue::array(vec![ConstValue::signed_int(1), ConstValue::signed_int(2)]);
    let result = array.mul(&ConstValue::signed_int(10)).unwrap();

    assert_eq!(
        result,
        ConstValue::array(vec![ConstValue::signed_int(10), ConstValue::signed_int(20)])
    );
}

#[test]
fn test_array_shape_mismatch_does_not_fold() {
    let a = ConstValue::array(vec![ConstValue::signed_int(1)]);
    let b = ConstValue::array(vec![ConstValue::signed_int(1), ConstValue::signed_int(2)]);

    assert_eq!(a.add(&b), None);
}

#[test]
fn test_casts() {
    let f = ConstValue::float(-2.75, FloatPrecision::Double);

    assert_eq!(f.cast_to_integer(4, true).unwrap().as_i64(), Some(-2));
    assert_eq!(
        ConstValue::signed_int(3).cast_to_float(FloatPrecision::Float),
        Some(ConstValue::float(3.0, FloatPrecision::Float))
    );
    assert!(ConstValue::signed_int(3)
        .cast_to_complex(FloatPrecision::Double)
        .unwrap()
        .is_complex());
    assert_eq!(ConstValue::string("x", 1).cast_to_integer(4, true), None);
}

#[test]
fn test_shifts_and_bitwise() {
    let a = ConstValue::signed_int(6);

    assert_eq!(a.shl(&ConstValue::signed_int(2)).unwrap().as_i64(), Some(24));
    assert_eq!(a.shr(&ConstValue::signed_int(1)).unwrap().as_i64(), Some(3));
    assert_eq!(a.bit_and(&ConstValue::signed_int(3)).unwrap().as_i64(), Some(2));
    assert_eq!(a.shl(&ConstValue::signed_int(40)), None);
}

#[test]
fn test_aggregate_access() {
    let s = ConstValue::structure(vec![ConstValue::signed_int(1), ConstValue::string("a", 1)]);

    assert_eq!(s.num_elements(), 2);
    assert_eq!(s.element(0), Some(&ConstValue::signed_int(1)));
    assert_eq!(s.element(2), None);
}

#[test]
fn test_float_precision_rounding() {
    let third = ConstValue::float(1.0 / 3.0, FloatPrecision::Float);

    assert_eq!(third.as_f64(), Some((1.0f32 / 3.0f32) as f64));
}

mod properties {
    use proptest::prelude::*;

    use super::ConstValue;

    proptest! {
        #[test]
        fn addition_folds_like_wrapping_i32(a in any::<i32>(), b in any::<i32>()) {
            let folded = ConstValue::signed_int(a as i64).add(&ConstValue::signed_int(b as i64)).unwrap();
            prop_assert_eq!(folded.as_i64(), Some(a.wrapping_add(b) as i64));
        }

        #[test]
        fn folding_is_deterministic(a in any::<i16>(), b in 1i16..) {
            let x = ConstValue::signed_int(a as i64);
            let y = ConstValue::signed_int(b as i64);
            prop_assert_eq!(x.div(&y), x.div(&y));
        }
    }
}
