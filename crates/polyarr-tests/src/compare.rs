//! Element-wise comparison of backend results

use polyarr_core::{Array, DType, HostArray};
use thiserror::Error;

/// Default relative tolerance for floating point results
pub const DEFAULT_RTOL: f64 = 1e-5;

/// Default absolute tolerance for floating point results
pub const DEFAULT_ATOL: f64 = 1e-6;

/// `|actual - expected| <= atol + rtol * |expected|`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
        }
    }
}

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance { rtol: 0.0, atol: 0.0 };

    /// Integer and bool results are always compared exactly.
    pub fn for_dtype(self, dtype: DType) -> Tolerance {
        if dtype.is_float() {
            self
        } else {
            Tolerance::EXACT
        }
    }

    pub fn threshold(&self, expected: f64) -> f64 {
        self.atol + self.rtol * expected.abs()
    }

    pub fn close(&self, actual: f64, expected: f64) -> bool {
        if actual.is_nan() || expected.is_nan() {
            return actual.is_nan() && expected.is_nan();
        }
        if actual == expected {
            return true;
        }
        if actual.is_infinite() && expected.is_infinite() {
            return false;
        }
        // with rtol > 0 an infinite expectation has an infinite threshold,
        // so any finite overflow toward it is accepted
        (actual - expected).abs() <= self.threshold(expected)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Mismatch {
    #[error("shape {got:?}, expected {expected:?}")]
    Shape { expected: Vec<usize>, got: Vec<usize> },

    #[error("dtype {got}, expected {expected}")]
    DType { expected: DType, got: DType },

    #[error("value {actual} at flat index {position}, expected {expected} (threshold {threshold})")]
    Value {
        position: usize,
        expected: f64,
        actual: f64,
        threshold: f64,
    },
}

/// Compare shape and dtype, then values when `test_values` is set.
pub fn compare_arrays(
    expected: &HostArray,
    actual: &HostArray,
    tolerance: Tolerance,
    test_values: bool,
) -> Result<(), Mismatch> {
    if expected.shape() != actual.shape() {
        return Err(Mismatch::Shape {
            expected: expected.shape().to_vec(),
            got: actual.shape().to_vec(),
        });
    }
    if expected.dtype() != actual.dtype() {
        return Err(Mismatch::DType {
            expected: expected.dtype(),
            got: actual.dtype(),
        });
    }
    if !test_values {
        return Ok(());
    }

    let tolerance = tolerance.for_dtype(expected.dtype());
    for (position, (&e, &a)) in expected.data().iter().zip(actual.data()).enumerate() {
        if !tolerance.close(a, e) {
            return Err(Mismatch::Value {
                position,
                expected: e,
                actual: a,
                threshold: tolerance.threshold(e),
            });
        }
    }
    Ok(())
}
