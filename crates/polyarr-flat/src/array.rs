//! Flat row-major array

use polyarr_core::array::check_len;
use polyarr_core::{Array, ArrayMeta, DType, Device, Result};

/// Contiguous row-major buffer plus metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FlatArray {
    data: Vec<f64>,
    meta: ArrayMeta,
}

impl FlatArray {
    /// Wrap a buffer whose values are already in `dtype`'s domain
    pub(crate) fn from_raw(data: Vec<f64>, shape: Vec<usize>, dtype: DType, device: Device) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Self {
            data,
            meta: ArrayMeta::new(shape, dtype, device),
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Array for FlatArray {
    fn meta(&self) -> &ArrayMeta {
        &self.meta
    }

    fn as_f64_slice(&self) -> Vec<f64> {
        self.data.clone()
    }

    fn from_parts(data: Vec<f64>, shape: Vec<usize>, dtype: DType, device: Device) -> Result<Self> {
        check_len(&data, &shape)?;
        let data = data.into_iter().map(|v| dtype.cast(v)).collect();
        Ok(Self::from_raw(data, shape, dtype, device))
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

    fn assign(&mut self, data: &[f64]) -> Result<()> {
        check_len(data, self.shape())?;
        let dtype = self.meta.dtype;
        for (elem, &v) in self.data.iter_mut().zip(data) {
            *elem = dtype.cast(v);
        }
        Ok(())
    }
}
