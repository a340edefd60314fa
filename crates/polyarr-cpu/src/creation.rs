//! Array creation operations for CPU backend

use crate::{CpuArray, CpuBackend};
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use polyarr_core::ops::{
    arange_bounds, arange_dtype, linspace_step, matrix_dims, meshgrid_shape, CreationOps, Indexing,
};
use polyarr_core::{Array, Backend, DType, Device, DlPack, HostArray, PolyarrError, Result, Scalar};

impl CpuBackend {
    fn filled(shape: &[usize], value: f64, dtype: DType, device: Device) -> Result<CpuArray> {
        Self::check(dtype, device)?;
        let data = ArrayD::from_elem(IxDyn(shape), dtype.cast(value));
        Ok(CpuArray::from_ndarray(data, dtype, device))
    }

    fn spaced(start: f64, stop: f64, num: usize, endpoint: bool) -> Array1<f64> {
        let step = linspace_step(start, stop, num, endpoint);
        Array1::from_shape_fn(num, |i| {
            if endpoint && num > 1 && i == num - 1 {
                stop
            } else {
                start + (i as f64) * step
            }
        })
    }

    /// Keep elements where `keep(col - row)` holds on the last two axes.
    fn triangle(x: &CpuArray, op: &str, keep: impl Fn(i64) -> bool) -> Result<CpuArray> {
        let ndim = x.ndim();
        matrix_dims(x.shape(), op)?;
        let mut data = x.as_ndarray().clone();
        for (idx, elem) in data.indexed_iter_mut() {
            let offset = idx[ndim - 1] as i64 - idx[ndim - 2] as i64;
            if !keep(offset) {
                *elem = 0.0;
            }
        }
        Ok(x.with_data(data))
    }
}

impl CreationOps for CpuBackend {
    type Array = CpuArray;

    fn asarray(obj: &HostArray, dtype: Option<DType>, device: Option<Device>) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or(obj.dtype());
        let device = device.unwrap_or(obj.device());
        Self::check(dtype, device)?;
        CpuArray::from_parts(obj.data().to_vec(), obj.shape().to_vec(), dtype, device)
    }

    fn zeros(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<CpuArray> {
        Self::filled(shape, 0.0, dtype.unwrap_or_default(), device)
    }

    fn ones(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<CpuArray> {
        Self::filled(shape, 1.0, dtype.unwrap_or_default(), device)
    }

    fn empty(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<CpuArray> {
        Self::filled(shape, 0.0, dtype.unwrap_or_default(), device)
    }

    fn full(shape: &[usize], fill_value: Scalar, dtype: Option<DType>, device: Device) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or(fill_value.default_dtype());
        Self::filled(shape, fill_value.as_f64(), dtype, device)
    }

    fn arange(
        start: Scalar,
        stop: Option<Scalar>,
        step: Scalar,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or(arange_dtype(start, stop, step));
        Self::check(dtype, device)?;
        let (start, _, step, len) = arange_bounds(start, stop, step)?;
        let values = Array1::from_shape_fn(len, |i| dtype.cast(start + (i as f64) * step));
        Ok(CpuArray::from_ndarray(values.into_dyn(), dtype, device))
    }

    fn linspace(
        start: f64,
        stop: f64,
        num: usize,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or_default();
        Self::check(dtype, device)?;
        let values = Self::spaced(start, stop, num, endpoint).mapv(|v| dtype.cast(v));
        Ok(CpuArray::from_ndarray(values.into_dyn(), dtype, device))
    }

    fn logspace(
        start: f64,
        stop: f64,
        num: usize,
        base: f64,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or_default();
        Self::check(dtype, device)?;
        let values = Self::spaced(start, stop, num, endpoint).mapv(|v| dtype.cast(base.powf(v)));
        Ok(CpuArray::from_ndarray(values.into_dyn(), dtype, device))
    }

    fn eye(
        n_rows: usize,
        n_cols: Option<usize>,
        k: i64,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<CpuArray> {
        let dtype = dtype.unwrap_or_default();
        Self::check(dtype, device)?;
        let n_cols = n_cols.unwrap_or(n_rows);
        let arr = Array2::<f64>::from_shape_fn((n_rows, n_cols), |(r, c)| {
            if c as i64 - r as i64 == k {
                1.0
            } else {
                0.0
            }
        });
        Ok(CpuArray::from_ndarray(arr.into_dyn(), dtype, device))
    }

    fn meshgrid(arrays: &[CpuArray], indexing: Indexing) -> Result<Vec<CpuArray>> {
        let inputs: Vec<Vec<f64>> = arrays.iter().map(|a| a.as_f64_slice()).collect();
        let lengths: Vec<usize> = inputs.iter().map(Vec::len).collect();
        let shape = meshgrid_shape(&lengths, indexing);
        let swap = indexing == Indexing::Xy && arrays.len() >= 2;

        let mut outputs = Vec::with_capacity(arrays.len());
        for (i, (values, source)) in inputs.iter().zip(arrays).enumerate() {
            let axis = match (swap, i) {
                (true, 0) => 1,
                (true, 1) => 0,
                _ => i,
            };
            let grid = ArrayD::from_shape_fn(IxDyn(&shape), |idx| values[idx[axis]]);
            outputs.push(CpuArray::from_ndarray(grid, source.dtype(), source.device()));
        }
        Ok(outputs)
    }

    fn tril(x: &CpuArray, k: i64) -> Result<CpuArray> {
        Self::triangle(x, "tril", |offset| offset <= k)
    }

    fn triu(x: &CpuArray, k: i64) -> Result<CpuArray> {
        Self::triangle(x, "triu", |offset| offset >= k)
    }

    fn from_dlpack(capsule: &DlPack) -> Result<CpuArray> {
        Self::check(capsule.dtype(), capsule.device())?;
        let data = ArrayD::from_shape_vec(IxDyn(capsule.shape()), capsule.to_row_major())
            .map_err(|e| PolyarrError::InvalidShape(e.to_string()))?;
        Ok(CpuArray::from_ndarray(data, capsule.dtype(), capsule.device()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const CPU: Device = Device::Cpu(0);

    fn matrix(rows: usize, cols: usize) -> CpuArray {
        let data = (1..=rows * cols).map(|v| v as f64).collect();
        CpuArray::from_parts(data, vec![rows, cols], DType::Int32, CPU).unwrap()
    }

    #[test]
    fn test_zeros() {
        let arr = CpuBackend::zeros(&[3, 4], Some(DType::Int32), CPU).unwrap();
        assert_eq!(arr.shape(), &[3, 4]);
        assert_eq!(arr.dtype(), DType::Int32);
        assert!(arr.as_f64_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_ones_default_dtype() {
        let arr = CpuBackend::ones(&[2, 3], None, CPU).unwrap();
        assert_eq!(arr.dtype(), DType::Float64);
        assert!(arr.as_f64_slice().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_full() {
        let arr = CpuBackend::full(&[2, 2], Scalar::Float(5.5), None, CPU).unwrap();
        assert_eq!(arr.dtype(), DType::Float64);
        assert!(arr.as_f64_slice().iter().all(|&x| x == 5.5));

        let arr = CpuBackend::full(&[2], Scalar::Int(3), None, CPU).unwrap();
        assert_eq!(arr.dtype(), DType::Int64);
    }

    #[test]
    fn test_like_keeps_shape_and_dtype() {
        let x = matrix(2, 3);
        let z = CpuBackend::zeros_like(&x, None, None).unwrap();
        assert_eq!(z.shape(), &[2, 3]);
        assert_eq!(z.dtype(), DType::Int32);
        let f = CpuBackend::full_like(&x, Scalar::Int(-2), Some(DType::Float32), None).unwrap();
        assert_eq!(f.dtype(), DType::Float32);
        assert!(f.as_f64_slice().iter().all(|&v| v == -2.0));
    }

    #[test]
    fn test_arange() {
        let arr = CpuBackend::arange(Scalar::Int(0), Some(Scalar::Int(5)), Scalar::Int(2), Some(DType::Int32), CPU)
            .unwrap();
        assert_eq!(arr.as_f64_slice(), vec![0.0, 2.0, 4.0]);
        assert_eq!(arr.dtype(), DType::Int32);
    }

    #[test]
    fn test_arange_stop_none() {
        let arr = CpuBackend::arange(Scalar::Int(4), None, Scalar::Int(1), None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(arr.dtype(), DType::Int64);
    }

    #[test]
    fn test_arange_negative_step() {
        let arr = CpuBackend::arange(Scalar::Int(5), Some(Scalar::Int(0)), Scalar::Int(-2), None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn test_arange_zero_step() {
        let result = CpuBackend::arange(Scalar::Int(0), Some(Scalar::Int(5)), Scalar::Int(0), None, CPU);
        assert!(result.is_err());
    }

    #[test]
    fn test_linspace() {
        let arr = CpuBackend::linspace(0.0, 1.0, 5, true, None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let arr = CpuBackend::linspace(2.0, 9.0, 1, true, None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![2.0]);

        let arr = CpuBackend::linspace(0.0, 1.0, 4, false, None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_logspace() {
        let arr = CpuBackend::logspace(0.0, 3.0, 4, 10.0, true, None, CPU).unwrap();
        let data = arr.as_f64_slice();
        for (got, want) in data.iter().zip([1.0, 10.0, 100.0, 1000.0]) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_eye_offsets() {
        let arr = CpuBackend::eye(3, Some(4), 1, Some(DType::Int8), CPU).unwrap();
        assert_eq!(arr.shape(), &[3, 4]);
        assert_eq!(
            arr.as_f64_slice(),
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );

        let arr = CpuBackend::eye(2, None, -1, None, CPU).unwrap();
        assert_eq!(arr.as_f64_slice(), vec![0.0, 0.0, 1.0, 0.0]);

        let arr = CpuBackend::eye(0, Some(3), 0, None, CPU).unwrap();
        assert_eq!(arr.shape(), &[0, 3]);
    }

    #[test]
    fn test_meshgrid_xy_and_ij() {
        let x = CpuArray::from_parts(vec![1.0, 2.0, 3.0], vec![3], DType::Int32, CPU).unwrap();
        let y = CpuArray::from_parts(vec![4.0, 5.0], vec![2], DType::Int32, CPU).unwrap();

        let xy = CpuBackend::meshgrid(&[x.clone(), y.clone()], Indexing::Xy).unwrap();
        assert_eq!(xy[0].shape(), &[2, 3]);
        assert_eq!(xy[0].as_f64_slice(), vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_eq!(xy[1].as_f64_slice(), vec![4.0, 4.0, 4.0, 5.0, 5.0, 5.0]);

        let ij = CpuBackend::meshgrid(&[x, y], Indexing::Ij).unwrap();
        assert_eq!(ij[0].shape(), &[3, 2]);
        assert_eq!(ij[0].as_f64_slice(), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        assert_eq!(ij[1].as_f64_slice(), vec![4.0, 5.0, 4.0, 5.0, 4.0, 5.0]);
    }

    #[test]
    fn test_tril_triu() {
        let m = matrix(3, 3);
        let lower = CpuBackend::tril(&m, 0).unwrap();
        assert_eq!(lower.as_f64_slice(), vec![1.0, 0.0, 0.0, 4.0, 5.0, 0.0, 7.0, 8.0, 9.0]);
        let upper = CpuBackend::triu(&m, 1).unwrap();
        assert_eq!(upper.as_f64_slice(), vec![0.0, 2.0, 3.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0]);
        assert_eq!(lower.dtype(), DType::Int32);
    }

    #[test]
    fn test_tril_batched() {
        let data = (1..=8).map(|v| v as f64).collect();
        let x = CpuArray::from_parts(data, vec![2, 2, 2], DType::Float32, CPU).unwrap();
        let lower = CpuBackend::tril(&x, -1).unwrap();
        assert_eq!(lower.as_f64_slice(), vec![0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 7.0, 0.0]);
    }

    #[test]
    fn test_tril_requires_matrix() {
        let v = CpuArray::from_f64_vec(vec![1.0, 2.0], vec![2]).unwrap();
        assert!(CpuBackend::tril(&v, 0).is_err());
    }

    #[test]
    fn test_from_dlpack_strided() {
        let data: Arc<[f64]> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0].into();
        let capsule = DlPack::strided(vec![3, 2], vec![1, 3], 0, DType::Int64, CPU, data).unwrap();
        let arr = CpuBackend::from_dlpack(&capsule).unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr.as_f64_slice(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_unsupported_device() {
        let result = CpuBackend::zeros(&[2], None, Device::Cpu(1));
        assert!(matches!(result, Err(PolyarrError::UnsupportedDevice { .. })));
    }
}
