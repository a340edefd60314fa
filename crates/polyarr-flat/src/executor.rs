//! How a flat backend produces its buffers
//!
//! Every creation kernel is expressed as "element `i` of the row-major
//! output is `f(i)`"; the executor decides how those calls are scheduled.

use polyarr_core::DType;
use rayon::prelude::*;

/// Below this many elements the rayon executor stays on the calling thread.
const PAR_MIN_LEN: usize = 4096;

pub trait Executor: Send + Sync + 'static {
    /// Backend name reported for this executor
    const NAME: &'static str;

    fn supports_dtype(_dtype: DType) -> bool {
        true
    }

    /// Whether exchange capsules can be imported
    fn supports_dlpack() -> bool {
        true
    }

    fn generate<F>(len: usize, f: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64 + Send + Sync;
}

/// Single-threaded, in index order
pub struct Sequential;

impl Executor for Sequential {
    const NAME: &'static str = "flat";

    fn generate<F>(len: usize, f: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        (0..len).map(f).collect()
    }
}

/// Chunked over the rayon global pool
///
/// Storage only carries unsigned integers at 8 and 64 bits, and there is no
/// capsule import.
pub struct Rayon;

impl Executor for Rayon {
    const NAME: &'static str = "parallel";

    fn supports_dtype(dtype: DType) -> bool {
        !matches!(dtype, DType::UInt16 | DType::UInt32)
    }

    fn supports_dlpack() -> bool {
        false
    }

    fn generate<F>(len: usize, f: F) -> Vec<f64>
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        (0..len)
            .into_par_iter()
            .with_min_len(PAR_MIN_LEN)
            .map(f)
            .collect()
    }
}
