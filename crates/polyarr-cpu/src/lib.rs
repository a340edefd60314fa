//! CPU Backend for polyarr
//!
//! Uses ndarray for storage. This is the reference every other backend is
//! compared against.

mod array;
mod creation;

pub use array::CpuArray;

use polyarr_core::Backend;

/// CPU backend using ndarray
pub struct CpuBackend;

impl Backend for CpuBackend {
    fn name() -> &'static str {
        "cpu"
    }

    fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
