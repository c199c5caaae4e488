use dihedra_codec::{wrap_angle, Quantizer, ValueRange};
use proptest::prelude::*;
use std::f64::consts::{PI, TAU};

// Property 1: dequantized values stay within half a step of the input
proptest! {
    #[test]
    fn prop_round_trip_within_half_step(
        values in prop::collection::vec(-PI..PI, 1..500),
        bits in 2u32..=8
    ) {
        let q = Quantizer::new(bits).unwrap();
        let range = ValueRange::of(&values).unwrap();
        let restored = q.dequantize(&q.quantize(&values, &range), &range);

        prop_assert_eq!(values.len(), restored.len());
        let tolerance = q.max_error(&range) + 1e-12;
        for (i, (v, r)) in values.iter().zip(&restored).enumerate() {
            prop_assert!(
                (v - r).abs() <= tolerance,
                "index {}: {} restored as {} (tolerance {})",
                i, v, r, tolerance
            );
        }
    }
}

// Property 2: codes never leave the symmetric code interval
proptest! {
    #[test]
    fn prop_codes_within_bound(
        values in prop::collection::vec(-10.0f64..10.0, 1..200),
        bits in 2u32..=8,
        lo in -5.0f64..0.0,
        width in 0.0f64..5.0
    ) {
        let q = Quantizer::new(bits).unwrap();
        let range = ValueRange::new(lo, lo + width).unwrap();
        for code in q.quantize(&values, &range) {
            prop_assert!(code.abs() <= q.bound());
        }
    }
}

// Property 3: wrapped angles land in [-pi, pi] and differ by whole turns
proptest! {
    #[test]
    fn prop_wrap_angle_range(angle in -100.0f64..100.0) {
        let w = wrap_angle(angle);
        prop_assert!((-PI..=PI).contains(&w));
        let turns = (angle - w) / TAU;
        prop_assert!((turns - turns.round()).abs() < 1e-9);
    }
}
