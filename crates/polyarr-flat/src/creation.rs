//! Array creation operations for the flat backends

use crate::{Executor, Flat, FlatArray};
use polyarr_core::array::row_major_strides;
use polyarr_core::ops::{
    arange_bounds, arange_dtype, linspace_step, matrix_dims, meshgrid_shape, CreationOps, Indexing,
};
use polyarr_core::{Array, Backend, DType, Device, DlPack, HostArray, PolyarrError, Result, Scalar};

impl<E: Executor> Flat<E> {
    fn build<F>(shape: &[usize], dtype: DType, device: Device, f: F) -> Result<FlatArray>
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        Self::check(dtype, device)?;
        let len = shape.iter().product();
        let data = E::generate(len, |i| dtype.cast(f(i)));
        Ok(FlatArray::from_raw(data, shape.to_vec(), dtype, device))
    }

    fn spaced_value(start: f64, stop: f64, num: usize, endpoint: bool, i: usize) -> f64 {
        if endpoint && num > 1 && i == num - 1 {
            stop
        } else {
            start + (i as f64) * linspace_step(start, stop, num, endpoint)
        }
    }

    fn triangle(x: &FlatArray, op: &str, keep: impl Fn(i64) -> bool + Send + Sync) -> Result<FlatArray> {
        let (rows, cols) = matrix_dims(x.shape(), op)?;
        let src = x.as_slice();
        Self::build(x.shape(), x.dtype(), x.device(), |i| {
            let c = i % cols;
            let r = (i / cols) % rows;
            if keep(c as i64 - r as i64) {
                src[i]
            } else {
                0.0
            }
        })
    }
}

impl<E: Executor> CreationOps for Flat<E> {
    type Array = FlatArray;

    fn asarray(obj: &HostArray, dtype: Option<DType>, device: Option<Device>) -> Result<FlatArray> {
        let src = obj.data();
        Self::build(
            obj.shape(),
            dtype.unwrap_or(obj.dtype()),
            device.unwrap_or(obj.device()),
            |i| src[i],
        )
    }

    fn zeros(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<FlatArray> {
        Self::build(shape, dtype.unwrap_or_default(), device, |_| 0.0)
    }

    fn ones(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<FlatArray> {
        Self::build(shape, dtype.unwrap_or_default(), device, |_| 1.0)
    }

    fn empty(shape: &[usize], dtype: Option<DType>, device: Device) -> Result<FlatArray> {
        let dtype = dtype.unwrap_or_default();
        Self::check(dtype, device)?;
        let len = shape.iter().product();
        Ok(FlatArray::from_raw(vec![0.0; len], shape.to_vec(), dtype, device))
    }

    fn full(shape: &[usize], fill_value: Scalar, dtype: Option<DType>, device: Device) -> Result<FlatArray> {
        let dtype = dtype.unwrap_or(fill_value.default_dtype());
        let value = fill_value.as_f64();
        Self::build(shape, dtype, device, |_| value)
    }

    fn arange(
        start: Scalar,
        stop: Option<Scalar>,
        step: Scalar,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<FlatArray> {
        let dtype = dtype.unwrap_or(arange_dtype(start, stop, step));
        let (start, _, step, len) = arange_bounds(start, stop, step)?;
        Self::build(&[len], dtype, device, |i| start + (i as f64) * step)
    }

    fn linspace(
        start: f64,
        stop: f64,
        num: usize,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<FlatArray> {
        Self::build(&[num], dtype.unwrap_or_default(), device, |i| {
            Self::spaced_value(start, stop, num, endpoint, i)
        })
    }

    fn logspace(
        start: f64,
        stop: f64,
        num: usize,
        base: f64,
        endpoint: bool,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<FlatArray> {
        Self::build(&[num], dtype.unwrap_or_default(), device, |i| {
            base.powf(Self::spaced_value(start, stop, num, endpoint, i))
        })
    }

    fn eye(
        n_rows: usize,
        n_cols: Option<usize>,
        k: i64,
        dtype: Option<DType>,
        device: Device,
    ) -> Result<FlatArray> {
        let n_cols = n_cols.unwrap_or(n_rows);
        Self::build(&[n_rows, n_cols], dtype.unwrap_or_default(), device, |i| {
            let (r, c) = (i / n_cols, i % n_cols);
            if c as i64 - r as i64 == k {
                1.0
            } else {
                0.0
            }
        })
    }

    fn meshgrid(arrays: &[FlatArray], indexing: Indexing) -> Result<Vec<FlatArray>> {
        let lengths: Vec<usize> = arrays.iter().map(Array::size).collect();
        let shape = meshgrid_shape(&lengths, indexing);
        let strides = row_major_strides(&shape);
        let swap = indexing == Indexing::Xy && arrays.len() >= 2;

        arrays
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let axis = match (swap, i) {
                    (true, 0) => 1,
                    (true, 1) => 0,
                    _ => i,
                };
                let (stride, extent) = (strides[axis], shape[axis]);
                let src = source.as_slice();
                Self::build(&shape, source.dtype(), source.device(), |j| {
                    src[(j / stride) % extent]
                })
            })
            .collect()
    }

    fn tril(x: &FlatArray, k: i64) -> Result<FlatArray> {
        Self::triangle(x, "tril", move |offset| offset <= k)
    }

    fn triu(x: &FlatArray, k: i64) -> Result<FlatArray> {
        Self::triangle(x, "triu", move |offset| offset >= k)
    }

    fn from_dlpack(capsule: &DlPack) -> Result<FlatArray> {
        if !E::supports_dlpack() {
            return Err(PolyarrError::NotImplemented(format!(
                "from_dlpack on the {} backend",
                E::NAME
            )));
        }
        let src = capsule.to_row_major();
        Self::build(capsule.shape(), capsule.dtype(), capsule.device(), |i| src[i])
    }
}
