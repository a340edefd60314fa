//! Input generators for the conformance procedures
//!
//! Where two draws must agree (paired arrays sharing a dtype, meshgrid
//! inputs sharing a length) the first draw is threaded into the dependent
//! strategies with `prop_flat_map` rather than sampled twice.

use crate::harness::ExecutionFlags;
use polyarr_core::signature::signature;
use polyarr_core::{DType, HostArray, Scalar};
use proptest::prelude::*;
use proptest::sample::select;

/// Magnitude bound for float32/float64 element draws
pub const FLOAT_BOUND: f64 = 1.0e6;

/// Constraints for [`dtype_and_values`]
#[derive(Debug, Clone, Copy)]
pub struct DtypeAndValues {
    pub domain: &'static [DType],
    pub n_arrays: usize,
    pub min_num_dims: usize,
    pub max_num_dims: usize,
    pub min_dim_size: usize,
    pub max_dim_size: usize,
    pub shared_dtype: bool,
    pub allow_inf: bool,
}

impl Default for DtypeAndValues {
    fn default() -> Self {
        Self {
            domain: DType::NUMERIC,
            n_arrays: 1,
            min_num_dims: 0,
            max_num_dims: 5,
            min_dim_size: 1,
            max_dim_size: 10,
            shared_dtype: false,
            allow_inf: true,
        }
    }
}

/// Constraints for [`get_shape`]
#[derive(Debug, Clone, Copy)]
pub struct GetShape {
    pub allow_none: bool,
    pub min_num_dims: usize,
    pub max_num_dims: usize,
    pub min_dim_size: usize,
    pub max_dim_size: usize,
}

impl Default for GetShape {
    fn default() -> Self {
        Self {
            allow_none: false,
            min_num_dims: 1,
            max_num_dims: 5,
            min_dim_size: 1,
            max_dim_size: 10,
        }
    }
}

/// Which execution flags a procedure varies
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagSpace {
    pub as_variable: bool,
    pub with_out: bool,
    pub native_array: bool,
    pub instance_method: bool,
    /// Fixed positional-count range; `None` uses the function's arity
    pub positional: Option<(usize, usize)>,
}

fn dims(min_num_dims: usize, max_num_dims: usize, min_dim_size: usize, max_dim_size: usize) -> BoxedStrategy<Vec<usize>> {
    prop::collection::vec(min_dim_size..=max_dim_size, min_num_dims..=max_num_dims).boxed()
}

/// A single element value inside `dtype`'s range.
pub fn element(dtype: DType, allow_inf: bool) -> BoxedStrategy<f64> {
    let (lo, hi) = dtype.value_range();
    if !dtype.is_float() {
        return (lo as i64..=hi as i64).prop_map(|v| v as f64).boxed();
    }
    let bound = hi.min(FLOAT_BOUND);
    let finite = (-bound..=bound).boxed();
    if allow_inf {
        prop_oneof![
            8 => finite,
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ]
        .boxed()
    } else {
        finite
    }
}

/// An array of `dtype` with the given shape.
pub fn array_of(dtype: DType, shape: Vec<usize>, allow_inf: bool) -> BoxedStrategy<HostArray> {
    let size: usize = shape.iter().product();
    prop::collection::vec(element(dtype, allow_inf), size)
        .prop_filter_map("values must fill the shape", move |data| {
            HostArray::new(data, shape.clone(), dtype).ok()
        })
        .boxed()
}

/// Dtype(s) and array(s) drawn together.
///
/// All arrays of one draw share a shape; with `shared_dtype` they also share
/// a dtype.
pub fn dtype_and_values(cfg: DtypeAndValues) -> BoxedStrategy<(Vec<DType>, Vec<HostArray>)> {
    let n = cfg.n_arrays;
    let dtypes = if cfg.shared_dtype {
        select(cfg.domain).prop_map(move |d| vec![d; n]).boxed()
    } else {
        prop::collection::vec(select(cfg.domain), n).boxed()
    };
    let shape = dims(cfg.min_num_dims, cfg.max_num_dims, cfg.min_dim_size, cfg.max_dim_size);

    (dtypes, shape)
        .prop_flat_map(move |(dtypes, shape)| {
            let arrays: Vec<_> = dtypes
                .iter()
                .map(|&d| array_of(d, shape.clone(), cfg.allow_inf))
                .collect();
            (Just(dtypes), arrays)
        })
        .boxed()
}

/// A shape, or `None` when allowed.
pub fn get_shape(cfg: GetShape) -> BoxedStrategy<Option<Vec<usize>>> {
    let shape = dims(cfg.min_num_dims, cfg.max_num_dims, cfg.min_dim_size, cfg.max_dim_size);
    if cfg.allow_none {
        prop_oneof![1 => Just(None), 4 => shape.prop_map(Some)].boxed()
    } else {
        shape.prop_map(Some).boxed()
    }
}

/// How many of `fn_name`'s parameters to pass positionally.
pub fn num_positional_args(fn_name: &str) -> BoxedStrategy<usize> {
    let arity = signature(fn_name).map_or(0, |s| s.positional_arity());
    (0..=arity).boxed()
}

fn flag(enabled: bool) -> BoxedStrategy<bool> {
    if enabled {
        any::<bool>().boxed()
    } else {
        Just(false).boxed()
    }
}

/// Calling-convention flags; a flag the function cannot honour stays false.
pub fn execution_flags(fn_name: &str, space: FlagSpace) -> BoxedStrategy<ExecutionFlags> {
    let (supports_out, supports_instance) =
        signature(fn_name).map_or((false, false), |s| (s.supports_out, s.supports_instance));
    let positional = match space.positional {
        Some((lo, hi)) => (lo..=hi).boxed(),
        None => num_positional_args(fn_name),
    };
    (
        flag(space.as_variable),
        flag(space.with_out && supports_out),
        positional,
        flag(space.native_array),
        flag(space.instance_method && supports_instance),
    )
        .prop_map(
            |(as_variable, with_out, num_positional_args, native_array, instance_method)| ExecutionFlags {
                as_variable,
                with_out,
                num_positional_args,
                native_array,
                container: false,
                instance_method,
            },
        )
        .boxed()
}

/// An integer or a float fill value within `[lo, hi]`.
pub fn fill_value(lo: i64, hi: i64) -> BoxedStrategy<Scalar> {
    prop_oneof![
        (lo..=hi).prop_map(Scalar::Int),
        (lo as f64..=hi as f64).prop_map(Scalar::Float),
    ]
    .boxed()
}

/// A fill value `dtype` can hold exactly: integer dtypes only draw integer
/// fills, float dtypes draw either kind.
pub fn fill_for_dtype(dtype: DType, lo: i64, hi: i64) -> BoxedStrategy<Scalar> {
    if dtype.is_int() {
        (lo..=hi).prop_map(Scalar::Int).boxed()
    } else {
        fill_value(lo, hi)
    }
}

/// Non-zero `arange` step in `[lo, hi]`.
pub fn nonzero_step(lo: i64, hi: i64) -> BoxedStrategy<i64> {
    (lo..=hi).prop_filter("step must be non-zero", |s| *s != 0).boxed()
}

/// 1-D meshgrid inputs: one dtype and one length drawn first, then
/// `min_arrays..=max_arrays` arrays built from them.
pub fn meshgrid_inputs(
    domain: &'static [DType],
    max_len: usize,
    min_arrays: usize,
    max_arrays: usize,
) -> BoxedStrategy<(DType, Vec<HostArray>)> {
    (select(domain), 1..=max_len, min_arrays..=max_arrays)
        .prop_flat_map(|(dtype, len, count)| {
            let arrays = prop::collection::vec(array_of(dtype, vec![len], false), count);
            (Just(dtype), arrays)
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyarr_core::Array;

    proptest! {
        #[test]
        fn prop_dtype_and_values_respects_bounds(
            (dtypes, arrays) in dtype_and_values(DtypeAndValues {
                n_arrays: 3,
                min_num_dims: 2,
                max_num_dims: 4,
                min_dim_size: 1,
                max_dim_size: 3,
                ..Default::default()
            })
        ) {
            prop_assert_eq!(dtypes.len(), 3);
            prop_assert_eq!(arrays.len(), 3);
            let shape = arrays[0].shape().to_vec();
            prop_assert!((2..=4).contains(&shape.len()));
            prop_assert!(shape.iter().all(|d| (1..=3).contains(d)));
            for (dtype, arr) in dtypes.iter().zip(&arrays) {
                prop_assert_eq!(arr.shape(), &shape[..]);
                prop_assert_eq!(arr.dtype(), *dtype);
            }
        }

        #[test]
        fn prop_shared_dtype_is_shared(
            (dtypes, _) in dtype_and_values(DtypeAndValues {
                n_arrays: 4,
                shared_dtype: true,
                max_dim_size: 2,
                ..Default::default()
            })
        ) {
            prop_assert!(dtypes.windows(2).all(|w| w[0] == w[1]));
        }

        #[test]
        fn prop_finite_floats_stay_in_range(
            (dtype, v) in select(DType::FLOAT).prop_flat_map(|d| (Just(d), element(d, false)))
        ) {
            let (lo, hi) = dtype.value_range();
            prop_assert!(v.is_finite());
            prop_assert!(lo <= v && v <= hi);
            prop_assert!(v.abs() <= FLOAT_BOUND);
        }

        #[test]
        fn prop_int_elements_fit_dtype(
            (dtype, v) in select(DType::INT).prop_flat_map(|d| (Just(d), element(d, false)))
        ) {
            prop_assert_eq!(dtype.cast(v), v);
        }

        #[test]
        fn prop_shape_bounds(shape in get_shape(GetShape { min_num_dims: 1, max_num_dims: 5, min_dim_size: 1, max_dim_size: 10, allow_none: false })) {
            let shape = shape.unwrap_or_default();
            prop_assert!((1..=5).contains(&shape.len()));
            prop_assert!(shape.iter().all(|d| (1..=10).contains(d)));
        }

        #[test]
        fn prop_positional_args_within_arity(n in num_positional_args("eye")) {
            prop_assert!(n <= 5);
        }

        #[test]
        fn prop_int_dtypes_get_int_fills(
            (dtype, fill) in select(DType::NUMERIC).prop_flat_map(|d| (Just(d), fill_for_dtype(d, 0, 5)))
        ) {
            if dtype.is_int() {
                prop_assert!(matches!(fill, Scalar::Int(_)));
            }
            prop_assert!((0.0..=5.0).contains(&fill.as_f64()));
        }

        #[test]
        fn prop_step_never_zero(step in nonzero_step(-5, 5)) {
            prop_assert_ne!(step, 0);
            prop_assert!((-5..=5).contains(&step));
        }

        #[test]
        fn prop_unsupported_flags_stay_off(flags in execution_flags("zeros", FlagSpace {
            with_out: true,
            instance_method: true,
            ..Default::default()
        })) {
            prop_assert!(!flags.instance_method);
            prop_assert!(!flags.as_variable);
            prop_assert!(flags.num_positional_args <= 3);
        }

        #[test]
        fn prop_meshgrid_inputs_share_dtype_and_length(
            (dtype, arrays) in meshgrid_inputs(DType::NUMERIC, 5, 1, 3)
        ) {
            prop_assert!((1..=3).contains(&arrays.len()));
            let len = arrays[0].size();
            prop_assert!(arrays.iter().all(|a| a.dtype() == dtype && a.shape() == [len]));
        }
    }

    #[test]
    fn test_allow_none_shape_strategy_builds() {
        let _ = get_shape(GetShape {
            allow_none: true,
            ..Default::default()
        });
    }
}
