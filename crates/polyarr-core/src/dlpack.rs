//! Zero-copy exchange capsule between backends
//!
//! A capsule shares its buffer through an `Arc`; the importer walks it using
//! the capsule's element strides, so non-contiguous producers are fine.

use crate::array::row_major_strides;
use crate::{DType, Device, PolyarrError, Result};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DlPack {
    shape: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    dtype: DType,
    device: Device,
    data: Arc<[f64]>,
}

impl DlPack {
    /// Capsule over a row-major buffer
    pub fn contiguous(shape: Vec<usize>, dtype: DType, device: Device, data: Vec<f64>) -> Self {
        let strides = row_major_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
            dtype,
            device,
            data: data.into(),
        }
    }

    /// Capsule with explicit layout; every addressed element must lie in `data`.
    pub fn strided(
        shape: Vec<usize>,
        strides: Vec<usize>,
        offset: usize,
        dtype: DType,
        device: Device,
        data: Arc<[f64]>,
    ) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(PolyarrError::InvalidShape(format!(
                "shape {shape:?} and strides {strides:?} differ in rank"
            )));
        }
        if shape.iter().all(|&d| d > 0) {
            let last = offset
                + shape
                    .iter()
                    .zip(&strides)
                    .map(|(&d, &s)| (d - 1) * s)
                    .sum::<usize>();
            if last >= data.len() {
                return Err(PolyarrError::InvalidShape(format!(
                    "layout reaches element {last} of a {}-element buffer",
                    data.len()
                )));
            }
        }
        Ok(Self {
            shape,
            strides,
            offset,
            dtype,
            device,
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && self.strides == row_major_strides(&self.shape)
    }

    /// Gather the addressed elements in row-major order.
    pub fn to_row_major(&self) -> Vec<f64> {
        if self.is_contiguous() {
            return self.data[..self.shape.iter().product::<usize>()].to_vec();
        }
        let size: usize = self.shape.iter().product();
        let mut out = Vec::with_capacity(size);
        let mut index = vec![0usize; self.shape.len()];
        for _ in 0..size {
            let pos = self.offset
                + index
                    .iter()
                    .zip(&self.strides)
                    .map(|(&i, &s)| i * s)
                    .sum::<usize>();
            out.push(self.data[pos]);
            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < self.shape[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_roundtrip() {
        let cap = DlPack::contiguous(vec![2, 2], DType::Int32, Device::default(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(cap.is_contiguous());
        assert_eq!(cap.to_row_major(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_transposed_layout() {
        // [[1, 2, 3], [4, 5, 6]] viewed column-major as its transpose
        let data: Arc<[f64]> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0].into();
        let cap = DlPack::strided(vec![3, 2], vec![1, 3], 0, DType::Float64, Device::default(), data)
            .unwrap();
        assert!(!cap.is_contiguous());
        assert_eq!(cap.to_row_major(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_layout_out_of_bounds() {
        let data: Arc<[f64]> = vec![0.0; 4].into();
        let result = DlPack::strided(vec![2, 2], vec![2, 2], 0, DType::Float64, Device::default(), data);
        assert!(result.is_err());
    }
}
