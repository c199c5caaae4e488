//! Uniform scalar quantization of delta angles
//!
//! An observed `[min, max]` range is mapped affinely onto the symmetric code
//! range `[-bound, bound]` with `bound = 2^(bits - 1) - 1`, rounding to the
//! nearest code. Dequantization applies the inverse affine map to the codes,
//! so the round-trip error of any in-range value is at most half a step.

use dihedra_core::{Error, Result};
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Widest code supported: codes are stored as `i8`
pub const MAX_CODE_BITS: u32 = i8::BITS;

/// Closed interval of observed values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Create a range, rejecting reversed or non-finite bounds
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(Error::InvalidData(format!("invalid value range [{}, {}]", min, max)));
        }
        Ok(Self { min, max })
    }

    /// Smallest range containing every value
    pub fn of(values: &[f64]) -> Result<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!("cannot quantize non-finite value {}", bad)));
        }
        match values.iter().copied().minmax() {
            MinMaxResult::NoElements => Err(Error::InvalidData("no values to range over".to_string())),
            MinMaxResult::OneElement(v) => Self::new(v, v),
            MinMaxResult::MinMax(min, max) => Self::new(min, max),
        }
    }

    /// Width of the range
    #[inline]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// A range of zero width cannot be mapped onto the code interval
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.span() <= 0.0
    }
}

/// Fixed-width signed quantizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    bits: u32,
    bound: i8,
}

impl Quantizer {
    /// Quantizer for `bits`-bit codes.
    ///
    /// Fails with [`Error::Range`] unless `2 <= bits <= 8`: one bit leaves a
    /// zero bound and more than eight do not fit the `i8` code storage.
    pub fn new(bits: u32) -> Result<Self> {
        if !(2..=MAX_CODE_BITS).contains(&bits) {
            return Err(Error::Range(format!(
                "bit depth {} outside supported range 2..={}",
                bits, MAX_CODE_BITS
            )));
        }
        let bound = ((1i16 << (bits - 1)) - 1) as i8;
        Ok(Self { bits, bound })
    }

    /// Code width in bits
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Largest code magnitude
    #[inline]
    pub fn bound(&self) -> i8 {
        self.bound
    }

    /// Distance between neighboring reconstruction levels
    #[inline]
    pub fn step(&self, range: &ValueRange) -> f64 {
        range.span() / (2.0 * self.bound as f64)
    }

    /// Worst-case round-trip error for values inside `range`
    #[inline]
    pub fn max_error(&self, range: &ValueRange) -> f64 {
        0.5 * self.step(range)
    }

    /// Map values onto codes.
    ///
    /// Values outside `range` clamp to the nearest bound. A degenerate range
    /// maps everything to code 0.
    pub fn quantize(&self, values: &[f64], range: &ValueRange) -> Vec<i8> {
        if range.is_degenerate() {
            if values.iter().any(|&v| v != range.min) {
                warn!("values outside degenerate range [{}, {}] collapse to code 0", range.min, range.max);
            }
            return vec![0; values.len()];
        }
        let lo = -(self.bound as f64);
        let hi = self.bound as f64;
        let scale = (hi - lo) / range.span();
        values
            .iter()
            .map(|&v| (lo + scale * (v - range.min) + 0.5).floor().clamp(lo, hi) as i8)
            .collect()
    }

    /// Map codes back onto values with the inverse affine map
    pub fn dequantize(&self, codes: &[i8], range: &ValueRange) -> Vec<f64> {
        if range.is_degenerate() {
            return vec![range.min; codes.len()];
        }
        let lo = -(self.bound as f64);
        let step = self.step(range);
        codes
            .iter()
            .map(|&c| range.min + step * (c as f64 - lo))
            .collect()
    }
}
