//! Flat-buffer backends for polyarr
//!
//! Arrays are a single row-major `Vec<f64>`; every kernel is written as index
//! arithmetic over that buffer. Two backends share the code and differ only
//! in their [`Executor`]: [`FlatBackend`] runs sequentially,
//! [`ParallelBackend`] fills buffers on the rayon pool.

mod array;
mod creation;
pub mod executor;

pub use array::FlatArray;
pub use executor::{Executor, Rayon, Sequential};

use polyarr_core::{Backend, DType};
use std::marker::PhantomData;

/// Flat backend parameterised by its executor
pub struct Flat<E>(PhantomData<E>);

pub type FlatBackend = Flat<Sequential>;
pub type ParallelBackend = Flat<Rayon>;

impl<E: Executor> Backend for Flat<E> {
    fn name() -> &'static str {
        E::NAME
    }

    fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn supports_dtype(dtype: DType) -> bool {
        E::supports_dtype(dtype)
    }
}
