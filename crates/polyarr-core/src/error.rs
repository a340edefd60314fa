//! Error types for polyarr

use crate::{DType, Device};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolyarrError {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown dtype: {0}")]
    UnknownDType(String),

    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Backend {backend} does not support dtype {dtype}")]
    UnsupportedDType { backend: &'static str, dtype: DType },

    #[error("Backend {backend} does not support device {device}")]
    UnsupportedDevice {
        backend: &'static str,
        device: Device,
    },

    #[error("out buffer has shape {got_shape:?} and dtype {got_dtype}, result needs {expected_shape:?} and {expected_dtype}")]
    OutMismatch {
        expected_shape: Vec<usize>,
        expected_dtype: DType,
        got_shape: Vec<usize>,
        got_dtype: DType,
    },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { function: String, name: String },

    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument { function: String, name: String },

    #[error("{function}() missing required argument '{name}'")]
    MissingArgument { function: String, name: String },

    #[error("{function}() takes {max} positional arguments but {given} were given")]
    TooManyPositional {
        function: String,
        max: usize,
        given: usize,
    },

    #[error("{function}() argument '{name}' must be {expected}")]
    ArgumentType {
        function: String,
        name: String,
        expected: &'static str,
    },

    #[error("{0}() cannot be called as a method")]
    NotAMethod(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

pub type Result<T> = std::result::Result<T, PolyarrError>;
