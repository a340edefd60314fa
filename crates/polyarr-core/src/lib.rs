//! polyarr core - backend traits and common types
//!
//! This crate defines the trait interface every backend implements, the
//! dtype domain shared by all of them, and a by-name dispatcher so the same
//! creation call can be replayed against any backend.

pub mod array;
pub mod backend;
pub mod device;
pub mod dispatch;
pub mod dlpack;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod signature;

pub use array::{Array, ArrayMeta, HostArray, Variable};
pub use backend::Backend;
pub use device::Device;
pub use dispatch::{dispatch, Call, Output, Value};
pub use dlpack::DlPack;
pub use dtype::{DType, Scalar};
pub use error::{PolyarrError, Result};
pub use ops::{CreationOps, Indexing};
