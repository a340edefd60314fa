//! Operation traits that backends implement

use crate::array::{Array, HostArray};
use crate::dlpack::DlPack;
use crate::{DType, Device, PolyarrError, Result, Scalar};

/// Output layout of `meshgrid`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indexing {
    /// Cartesian: the first two output axes are swapped
    #[default]
    Xy,
    /// Matrix: output axis `i` follows input `i`
    Ij,
}

impl std::str::FromStr for Indexing {
    type Err = PolyarrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "xy" => Ok(Indexing::Xy),
            "ij" => Ok(Indexing::Ij),
            other => Err(PolyarrError::InvalidArgument(format!(
                "indexing must be 'xy' or 'ij', got '{other}'"
            ))),
        }
    }
}

impl Indexing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Indexing::Xy => "xy",
            Indexing::Ij => "ij",
        }
    }
}

/// Array creation operations
///
/// `dtype: None` picks the operation's default (float64, or the dtype of the
/// fill/range values where they decide it). `device: None` on the `_like`
/// functions keeps the source array's device.
pub trait CreationOps: Sized {
    type Array: Array;

    /// Convert a host array, optionally casting
    fn asarray(obj: &HostArray, dtype: Option<DType>, device: Option<Device>) -> Result<Self::Array>;

    /// Convert a host array into this backend's native type
    fn native_array(x: &HostArray, dtype: Option<DType>, device: Option<Device>) -> Result<Self::Array> {
        Self::asarray(x, dtype, device)
    }

    /// Create array of zeros
    fn zeros(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<Self::Array>;

    /// Create array of ones
    fn ones(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<Self::Array>;

    /// Create array with unspecified contents
    fn empty(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<Self::Array>;

    /// Create array filled with value
    fn full(shape: &[usize], fill_value: Scalar, dtype: Option<DType>, device: Device) -> Result<Self::Array>;

    fn zeros_like(x: &Self::Array, dtype: Option<DType>, device: Option<Device>) -> Result<Self::Array> {
        Self::zeros(x.shape(), Some(dtype.unwrap_or(x.dtype())), device.unwrap_or(x.device()))
    }

    fn ones_like(x: &Self::Array, dtype: Option<DType>, device: Option<Device>) -> Result<Self::Array> {
        Self::ones(x.shape(), Some(dtype.unwrap_or(x.dtype())), device.unwrap_or(x.device()))
    }

    fn empty_like(x: &Self::Array, dtype: Option<DType>, device: Option<Device>) -> Result<Self::Array> {
        Self::empty(x.shape(), Some(dtype.unwrap_or(x.dtype())), device.unwrap_or(x.device()))
    }

    fn full_like(
        x: &Self::Array,
        fill_value: Scalar,
        dtype: Option<DType>,
        device: Option<Device>,
    ) -> Result<Self::Array> {
        Self::full(
            x.shape(),
            fill_value,
            Some(dtype.unwrap_or(x.dtype())),
            device.unwrap_or(x.device()),
        )
    }

    /// Values from `[start, stop)` spaced by `step`; `stop: None` means `[0, start)`
    fn arange(
        start: Scalar,
        stop: Option<Scalar>,
        step: Scalar,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<Self::Array>;

    /// Create array of evenly spaced values
    fn linspace(
        start: f64,
        stop: f64,
        num: usize,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<Self::Array>;

    /// `base` raised to evenly spaced exponents
    #[allow(clippy::too_many_arguments)]
    fn logspace(
        start: f64,
        stop: f64,
        num: usize,
        base: f64,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<Self::Array>;

    /// Ones on the `k`-th diagonal, zeros elsewhere
    fn eye(
        n_rows: usize,
        n_cols: Option<usize>,
        k: i64,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<Self::Array>;

    /// Coordinate grids from 1-D inputs
    fn meshgrid(arrays: &[Self::Array], indexing: Indexing) -> Result<Vec<Self::Array>>;

    /// Zero everything above the `k`-th diagonal of the last two axes
    fn tril(x: &Self::Array, k: i64) -> Result<Self::Array>;

    /// Zero everything below the `k`-th diagonal of the last two axes
    fn triu(x: &Self::Array, k: i64) -> Result<Self::Array>;

    /// Import an exchange capsule
    fn from_dlpack(capsule: &DlPack) -> Result<Self::Array>;
}

/// Resolved endpoints of an `arange` call: `(start, stop, step, len)`.
pub fn arange_bounds(start: Scalar, stop: Option<Scalar>, step: Scalar) -> Result<(f64, f64, f64, usize)> {
    let (start, stop) = match stop {
        Some(stop) => (start.as_f64(), stop.as_f64()),
        None => (0.0, start.as_f64()),
    };
    let step = step.as_f64();
    if step == 0.0 {
        return Err(PolyarrError::InvalidArgument(
            "Step cannot be zero".to_string(),
        ));
    }
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
        return Err(PolyarrError::InvalidArgument(
            "arange bounds must be finite".to_string(),
        ));
    }
    let len = ((stop - start) / step).ceil().max(0.0) as usize;
    Ok((start, stop, step, len))
}

/// Dtype `arange` produces when none is requested.
pub fn arange_dtype(start: Scalar, stop: Option<Scalar>, step: Scalar) -> DType {
    let all_int = start.is_int() && stop.map_or(true, |s| s.is_int()) && step.is_int();
    if all_int {
        DType::Int64
    } else {
        DType::Float64
    }
}

/// Spacing between `linspace` samples.
pub fn linspace_step(start: f64, stop: f64, num: usize, endpoint: bool) -> f64 {
    let div = if endpoint { num.saturating_sub(1) } else { num };
    if div == 0 {
        0.0
    } else {
        (stop - start) / div as f64
    }
}

/// Output shape of `meshgrid` for the given input lengths.
pub fn meshgrid_shape(lengths: &[usize], indexing: Indexing) -> Vec<usize> {
    let mut shape = lengths.to_vec();
    if indexing == Indexing::Xy && shape.len() >= 2 {
        shape.swap(0, 1);
    }
    shape
}

/// Require rank >= 2 for `tril`/`triu`; returns `(rows, cols)` of the last two axes.
pub fn matrix_dims(shape: &[usize], op: &str) -> Result<(usize, usize)> {
    match shape {
        [.., rows, cols] => Ok((*rows, *cols)),
        _ => Err(PolyarrError::InvalidShape(format!(
            "{op} requires at least 2 dimensions, got shape {shape:?}"
        ))),
    }
}
