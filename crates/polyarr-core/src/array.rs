//! Abstract array type that backends implement

use crate::dlpack::DlPack;
use crate::dtype::DType;
use crate::{Device, PolyarrError, Result};
use serde::{Deserialize, Serialize};

/// Metadata about an array (backend-agnostic)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayMeta {
    pub shape: Vec<usize>,
    pub dtype: DType,
    pub device: Device,
    pub strides: Vec<usize>,
    pub is_contiguous: bool,
}

impl ArrayMeta {
    pub fn new(shape: Vec<usize>, dtype: DType, device: Device) -> Self {
        let strides = Self::compute_strides(&shape, dtype.size());
        Self {
            shape,
            dtype,
            device,
            strides,
            is_contiguous: true,
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn nbytes(&self) -> usize {
        self.size() * self.dtype.size()
    }

    fn compute_strides(shape: &[usize], item_size: usize) -> Vec<usize> {
        row_major_strides(shape)
            .into_iter()
            .map(|s| s * item_size)
            .collect()
    }
}

/// Row-major strides in elements.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Core array trait that all backends implement
///
/// Element values travel as `f64` already projected into the array's dtype
/// (see [`DType::cast`]), so every backend agrees on the representation used
/// for comparison.
pub trait Array: Clone + std::fmt::Debug {
    /// Get array metadata
    fn meta(&self) -> &ArrayMeta;

    /// Get shape
    fn shape(&self) -> &[usize] {
        &self.meta().shape
    }

    /// Get number of dimensions
    fn ndim(&self) -> usize {
        self.meta().ndim()
    }

    /// Get total number of elements
    fn size(&self) -> usize {
        self.meta().size()
    }

    /// Get data type
    fn dtype(&self) -> DType {
        self.meta().dtype
    }

    fn device(&self) -> Device {
        self.meta().device
    }

    /// Elements in row-major order
    fn as_f64_slice(&self) -> Vec<f64>;

    /// Build an array from row-major data; values are cast into `dtype`.
    fn from_parts(data: Vec<f64>, shape: Vec<usize>, dtype: DType, device: Device) -> Result<Self>
    where
        Self: Sized;

    /// Create a float64 array on the default device
    fn from_f64_vec(data: Vec<f64>, shape: Vec<usize>) -> Result<Self>
    where
        Self: Sized,
    {
        Self::from_parts(data, shape, DType::Float64, Device::default())
    }

    /// Get element at flat index
    fn get_flat(&self, index: usize) -> f64;

    /// Set element at flat index, casting into the array's dtype
    fn set_flat(&mut self, index: usize, value: f64);

    /// Overwrite every element in place from row-major data
    fn assign(&mut self, data: &[f64]) -> Result<()> {
        check_len(data, self.shape())?;
        for (i, &v) in data.iter().enumerate() {
            self.set_flat(i, v);
        }
        Ok(())
    }

    /// Copy into the neutral host representation
    fn to_host(&self) -> HostArray {
        HostArray {
            meta: self.meta().clone(),
            data: self.as_f64_slice(),
        }
    }

    /// Export as an exchange capsule
    fn to_dlpack(&self) -> DlPack {
        DlPack::contiguous(
            self.shape().to_vec(),
            self.dtype(),
            self.device(),
            self.as_f64_slice(),
        )
    }
}

/// Check that `data` fills `shape` exactly.
pub fn check_len(data: &[f64], shape: &[usize]) -> Result<()> {
    let expected_size: usize = shape.iter().product();
    if data.len() != expected_size {
        return Err(PolyarrError::InvalidShape(format!(
            "Data length {} doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected_size
        )));
    }
    Ok(())
}

/// Backend-neutral array: plain row-major storage plus metadata.
///
/// This is what test inputs are drawn as and what every backend's results
/// are converted to before comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    meta: ArrayMeta,
    data: Vec<f64>,
}

impl HostArray {
    pub fn new(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Result<Self> {
        Self::from_parts(data, shape, dtype, Device::default())
    }

    pub fn scalar(value: f64, dtype: DType) -> Self {
        Self {
            meta: ArrayMeta::new(Vec::new(), dtype, Device::default()),
            data: vec![dtype.cast(value)],
        }
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Same values re-projected into another dtype.
    pub fn astype(&self, dtype: DType) -> HostArray {
        HostArray {
            meta: ArrayMeta::new(self.meta.shape.clone(), dtype, self.meta.device),
            data: self.data.iter().map(|&v| dtype.cast(v)).collect(),
        }
    }

    pub fn to_device(&self, device: Device) -> HostArray {
        let mut out = self.clone();
        out.meta.device = device;
        out
    }
}

impl Array for HostArray {
    fn meta(&self) -> &ArrayMeta {
        &self.meta
    }

    fn as_f64_slice(&self) -> Vec<f64> {
        self.data.clone()
    }

    fn from_parts(data: Vec<f64>, shape: Vec<usize>, dtype: DType, device: Device) -> Result<Self> {
        check_len(&data, &shape)?;
        Ok(Self {
            meta: ArrayMeta::new(shape, dtype, device),
            data: data.into_iter().map(|v| dtype.cast(v)).collect(),
        })
    }

    fn get_flat(&self, index: usize) -> f64 {
        self.data.get(index).copied().unwrap_or(f64::NAN)
    }

    fn set_flat(&mut self, index: usize, value: f64) {
        let dtype = self.meta.dtype;
        if let Some(elem) = self.data.get_mut(index) {
            *elem = dtype.cast(value);
        }
    }
}

/// An array wrapped as a differentiable variable.
///
/// Creation functions never propagate gradients; they consume variables by
/// detaching them.
#[derive(Debug, Clone)]
pub struct Variable<A> {
    value: A,
    requires_grad: bool,
}

impl<A: Array> Variable<A> {
    pub fn new(value: A) -> Self {
        Self {
            value,
            requires_grad: true,
        }
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    pub fn value(&self) -> &A {
        &self.value
    }

    pub fn detach(self) -> A {
        self.value
    }
}
