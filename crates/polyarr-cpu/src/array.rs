//! CPU Array implementation using ndarray

use ndarray::{ArrayD, IxDyn};
use polyarr_core::array::check_len;
use polyarr_core::{Array, ArrayMeta, DType, Device, PolyarrError, Result};

/// CPU-backed N-dimensional array
#[derive(Debug, Clone)]
pub struct CpuArray {
    data: ArrayD<f64>,
    meta: ArrayMeta,
}

impl CpuArray {
    /// Wrap an ndarray whose values are already in `dtype`'s domain
    pub(crate) fn from_ndarray(data: ArrayD<f64>, dtype: DType, device: Device) -> Self {
        let shape = data.shape().to_vec();
        let meta = ArrayMeta::new(shape, dtype, device);
        Self { data, meta }
    }

    /// Get underlying ndarray reference
    pub fn as_ndarray(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Consume and return ndarray
    pub fn into_ndarray(self) -> ArrayD<f64> {
        self.data
    }

    /// Same metadata, new values
    pub(crate) fn with_data(&self, data: ArrayD<f64>) -> Self {
        Self::from_ndarray(data, self.dtype(), self.device())
    }
}

impl Array for CpuArray {
    fn meta(&self) -> &ArrayMeta {
        &self.meta
    }

    fn as_f64_slice(&self) -> Vec<f64> {
        self.data.iter().cloned().collect()
    }

    fn from_parts(data: Vec<f64>, shape: Vec<usize>, dtype: DType, device: Device) -> Result<Self> {
        check_len(&data, &shape)?;
        let data = data.into_iter().map(|v| dtype.cast(v)).collect();
        let arr = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| PolyarrError::InvalidShape(e.to_string()))?;
        Ok(Self::from_ndarray(arr, dtype, device))
    }

    fn get_flat(&self, index: usize) -> f64 {
        self.data.iter().nth(index).cloned().unwrap_or(f64::NAN)
    }

    fn set_flat(&mut self, index: usize, value: f64) {
        let dtype = self.meta.dtype;
        if let Some(elem) = self.data.iter_mut().nth(index) {
            *elem = dtype.cast(value);
        }
    }

    fn assign(&mut self, data: &[f64]) -> Result<()> {
        check_len(data, self.shape())?;
        let dtype = self.meta.dtype;
        self.data
            .iter_mut()
            .zip(data)
            .for_each(|(elem, &v)| *elem = dtype.cast(v));
        Ok(())
    }
}

// Implement PartialEq for testing
impl PartialEq for CpuArray {
    fn eq(&self, other: &Self) -> bool {
        self.meta == other.meta && self.as_f64_slice() == other.as_f64_slice()
    }
}
