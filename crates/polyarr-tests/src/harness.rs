//! Run one creation call against a backend and check it against the reference
//!
//! A [`FunctionCase`] names the function and its keyword arguments; the
//! [`ExecutionFlags`] decide how the call is shaped for the backend under
//! test (positional prefix, native arrays, variables, method style, `out`).
//! The reference backend always sees the plain keyword-only form.

use crate::compare::{compare_arrays, Mismatch, Tolerance};
use crate::config::{BackendId, HarnessConfig};
use crate::exclusions::find_exclusion;
use polyarr_core::signature::{signature, ParamKind, Signature};
use polyarr_core::{
    dispatch, Array, Backend, Call, DType, Device, HostArray, Output, PolyarrError, Scalar, Value, Variable,
};
use polyarr_cpu::CpuBackend;
use polyarr_flat::{FlatBackend, ParallelBackend};
use proptest::test_runner::TestCaseError;
use thiserror::Error;

/// A backend-neutral argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Shape(Vec<usize>),
    DType(DType),
    Device(Device),
    Array(HostArray),
    /// Expanded positionally into a variadic parameter
    Arrays(Vec<HostArray>),
}

impl From<Scalar> for Arg {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(v) => Arg::Int(v),
            Scalar::Float(v) => Arg::Float(v),
        }
    }
}

impl From<Option<Vec<usize>>> for Arg {
    fn from(shape: Option<Vec<usize>>) -> Self {
        shape.map_or(Arg::None, Arg::Shape)
    }
}

impl From<Option<i64>> for Arg {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Arg::None, Arg::Int)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

impl From<DType> for Arg {
    fn from(d: DType) -> Self {
        Arg::DType(d)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<HostArray> for Arg {
    fn from(a: HostArray) -> Self {
        Arg::Array(a)
    }
}

/// How a call is presented to the backend under test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionFlags {
    pub as_variable: bool,
    pub with_out: bool,
    pub num_positional_args: usize,
    pub native_array: bool,
    /// Never set for creation functions
    pub container: bool,
    pub instance_method: bool,
}

/// One fully drawn test case
#[derive(Debug, Clone)]
pub struct FunctionCase {
    pub fn_name: &'static str,
    pub input_dtypes: Vec<DType>,
    pub flags: ExecutionFlags,
    pub kwargs: Vec<(&'static str, Arg)>,
    pub tolerance: Tolerance,
    pub test_values: bool,
}

impl FunctionCase {
    pub fn new(fn_name: &'static str) -> Self {
        Self {
            fn_name,
            input_dtypes: Vec::new(),
            flags: ExecutionFlags::default(),
            kwargs: Vec::new(),
            tolerance: Tolerance::default(),
            test_values: true,
        }
    }

    pub fn dtypes(mut self, dtypes: &[DType]) -> Self {
        self.input_dtypes = dtypes.to_vec();
        self
    }

    pub fn flags(mut self, flags: ExecutionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn kwarg(mut self, name: &'static str, value: impl Into<Arg>) -> Self {
        self.kwargs.push((name, value.into()));
        self
    }

    pub fn tolerance(mut self, rtol: f64, atol: f64) -> Self {
        self.tolerance = Tolerance { rtol, atol };
        self
    }

    pub fn test_values(mut self, test_values: bool) -> Self {
        self.test_values = test_values;
        self
    }

    /// Input dtypes plus any explicit `dtype` argument
    pub fn all_dtypes(&self) -> Vec<DType> {
        let mut dtypes = self.input_dtypes.clone();
        for (_, arg) in &self.kwargs {
            if let Arg::DType(d) = arg {
                if !dtypes.contains(d) {
                    dtypes.push(*d);
                }
            }
        }
        dtypes
    }
}

#[derive(Error, Debug)]
pub enum ConformanceError {
    #[error("reference backend failed on {function}: {source}")]
    Reference {
        function: String,
        #[source]
        source: PolyarrError,
    },

    #[error("{backend} failed on {function}: {source}")]
    Backend {
        backend: BackendId,
        function: String,
        #[source]
        source: PolyarrError,
    },

    #[error("{backend}.{function} returned {got} outputs, reference returned {expected}")]
    OutputCount {
        backend: BackendId,
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("{backend}.{function} output {output}{via}: {detail}")]
    Mismatch {
        backend: BackendId,
        function: String,
        output: usize,
        via: &'static str,
        detail: Mismatch,
    },

    #[error("{function} has no parameter '{name}'")]
    UnknownParameter { function: String, name: String },

    #[error("no creation function named '{0}'")]
    UnknownFunction(String),
}

/// Where each argument of a call goes.
#[derive(Debug, Default)]
struct Layout<'a> {
    receiver: Option<&'a Arg>,
    positional: Vec<&'a Arg>,
    keywords: Vec<(&'static str, &'a Arg)>,
}

/// Order arguments by parameter position and place the first
/// `num_positional` contiguous ones positionally. A variadic argument is
/// always expanded positionally and closes the positional prefix.
fn layout<'a>(
    sig: &Signature,
    kwargs: &'a [(&'static str, Arg)],
    num_positional: usize,
    instance: bool,
) -> Result<Layout<'a>, ConformanceError> {
    let mut ordered = Vec::with_capacity(kwargs.len());
    for (name, arg) in kwargs {
        let idx = sig
            .index_of(name)
            .ok_or_else(|| ConformanceError::UnknownParameter {
                function: sig.name.to_string(),
                name: name.to_string(),
            })?;
        ordered.push((idx, *name, arg));
    }
    ordered.sort_by_key(|(idx, _, _)| *idx);

    let mut out = Layout::default();
    let mut placed = 0;
    let mut closed = false;
    for (idx, name, arg) in ordered {
        if sig.params[idx].kind == ParamKind::Variadic {
            out.positional.push(arg);
            closed = true;
        } else if instance && idx == 0 {
            out.receiver = Some(arg);
            placed = 1;
        } else if !closed && idx == placed && placed < num_positional {
            out.positional.push(arg);
            placed += 1;
        } else {
            out.keywords.push((name, arg));
        }
    }
    Ok(out)
}

/// The case's arguments plus the configured device where the function takes one.
fn with_device(case: &FunctionCase, sig: &Signature, device: Device) -> Vec<(&'static str, Arg)> {
    let mut kwargs = case.kwargs.clone();
    if sig.index_of("device").is_some() && !kwargs.iter().any(|(n, _)| *n == "device") {
        kwargs.push(("device", Arg::Device(device)));
    }
    kwargs
}

fn array_value<B: Backend>(host: &HostArray, native: bool, variable: bool) -> Result<Value<B::Array>, PolyarrError> {
    if variable {
        Ok(Value::Variable(Variable::new(B::asarray(host, None, None)?)))
    } else if native {
        Ok(Value::Native(B::asarray(host, None, None)?))
    } else {
        Ok(Value::Host(host.clone()))
    }
}

fn to_value<B: Backend>(arg: &Arg, flags: &ExecutionFlags) -> Result<Value<B::Array>, PolyarrError> {
    Ok(match arg {
        Arg::None => Value::None,
        Arg::Bool(b) => Value::Bool(*b),
        Arg::Int(v) => Value::Int(*v),
        Arg::Float(v) => Value::Float(*v),
        Arg::Str(s) => Value::Str(s.clone()),
        Arg::Shape(s) => Value::Shape(s.clone()),
        Arg::DType(d) => Value::DType(*d),
        Arg::Device(d) => Value::Device(*d),
        Arg::Array(h) => array_value::<B>(h, flags.native_array, flags.as_variable)?,
        Arg::Arrays(hs) => Value::List(
            hs.iter()
                .map(|h| array_value::<B>(h, flags.native_array, flags.as_variable))
                .collect::<Result<_, _>>()?,
        ),
    })
}

/// Assemble a call from a layout; arrays are presented according to `flags`.
fn build_call<B: Backend>(
    name: &str,
    layout: &Layout<'_>,
    flags: &ExecutionFlags,
) -> Result<Call<B::Array>, PolyarrError> {
    let mut call = Call::new(name);
    if let Some(receiver) = layout.receiver {
        // a method receiver is always an array of the backend's own type
        let value = match receiver {
            Arg::Array(h) => array_value::<B>(h, true, flags.as_variable)?,
            other => to_value::<B>(other, flags)?,
        };
        call = call.method_on(value);
    }
    for arg in &layout.positional {
        match arg {
            Arg::Arrays(hs) => {
                for h in hs {
                    call = call.arg(array_value::<B>(h, flags.native_array, flags.as_variable)?);
                }
            }
            other => call = call.arg(to_value::<B>(other, flags)?),
        }
    }
    for (name, arg) in &layout.keywords {
        call = call.kwarg(*name, to_value::<B>(arg, flags)?);
    }
    Ok(call)
}

fn lookup(case: &FunctionCase) -> Result<&'static Signature, ConformanceError> {
    signature(case.fn_name).ok_or_else(|| ConformanceError::UnknownFunction(case.fn_name.to_string()))
}

/// Keyword-only, host-array call on the reference backend.
fn run_reference(case: &FunctionCase, device: Device) -> Result<Vec<HostArray>, ConformanceError> {
    let sig = lookup(case)?;
    let kwargs = with_device(case, sig, device);
    let plain = ExecutionFlags::default();
    let layout = layout(sig, &kwargs, 0, false)?;
    let to_err = |source: PolyarrError| ConformanceError::Reference {
        function: case.fn_name.to_string(),
        source,
    };
    let call = build_call::<CpuBackend>(case.fn_name, &layout, &plain).map_err(to_err)?;
    Ok(dispatch::<CpuBackend>(call).map_err(to_err)?.to_host())
}

/// Call shaped by `case.flags` on backend `B`, optionally writing into `out`.
fn run_shaped<B: Backend>(
    case: &FunctionCase,
    device: Device,
    out: Option<&HostArray>,
) -> Result<Output<B::Array>, PolyarrError> {
    let sig = signature(case.fn_name).ok_or_else(|| PolyarrError::UnknownFunction(case.fn_name.to_string()))?;
    let kwargs = with_device(case, sig, device);
    let flags = &case.flags;
    let instance = flags.instance_method && sig.supports_instance;
    let layout = layout(sig, &kwargs, flags.num_positional_args, instance).map_err(|e| {
        PolyarrError::InvalidArgument(e.to_string())
    })?;
    let mut call = build_call::<B>(case.fn_name, &layout, flags)?;
    if let Some(like) = out {
        call = call.out(B::empty(like.shape(), Some(like.dtype()), device)?);
    }
    dispatch::<B>(call)
}

fn compare_outputs(
    case: &FunctionCase,
    backend: BackendId,
    expected: &[HostArray],
    actual: &[HostArray],
    via: &'static str,
) -> Result<(), ConformanceError> {
    if expected.len() != actual.len() {
        return Err(ConformanceError::OutputCount {
            backend,
            function: case.fn_name.to_string(),
            expected: expected.len(),
            got: actual.len(),
        });
    }
    for (output, (e, a)) in expected.iter().zip(actual).enumerate() {
        compare_arrays(e, a, case.tolerance, case.test_values).map_err(|detail| ConformanceError::Mismatch {
            backend,
            function: case.fn_name.to_string(),
            output,
            via,
            detail,
        })?;
    }
    Ok(())
}

fn run_target<B: Backend>(
    case: &FunctionCase,
    backend: BackendId,
    device: Device,
    reference: &[HostArray],
) -> Result<(), ConformanceError> {
    let to_err = |source: PolyarrError| ConformanceError::Backend {
        backend,
        function: case.fn_name.to_string(),
        source,
    };

    let result = run_shaped::<B>(case, device, None).map_err(to_err)?;
    compare_outputs(case, backend, reference, &result.to_host(), "")?;

    if case.flags.with_out {
        if let [like] = reference {
            let written = run_shaped::<B>(case, device, Some(like)).map_err(to_err)?;
            compare_outputs(case, backend, reference, &written.to_host(), " (via out)")?;
        }
    }
    Ok(())
}

/// Execute `case` on `backend` and compare every output with the reference.
pub fn test_function(case: &FunctionCase, backend: BackendId, device: Device) -> Result<(), ConformanceError> {
    let reference = run_reference(case, device)?;
    log::trace!(
        "{}: reference produced {} output(s), checking {}",
        case.fn_name,
        reference.len(),
        backend
    );
    match backend {
        BackendId::Cpu => run_target::<CpuBackend>(case, backend, device, &reference),
        BackendId::Flat => run_target::<FlatBackend>(case, backend, device, &reference),
        BackendId::Parallel => run_target::<ParallelBackend>(case, backend, device, &reference),
    }
}

/// Results of `case` on `backend`, shaped by the case's flags.
pub fn invoke(case: &FunctionCase, backend: BackendId, device: Device) -> Result<Vec<HostArray>, ConformanceError> {
    let to_err = |source: PolyarrError| ConformanceError::Backend {
        backend,
        function: case.fn_name.to_string(),
        source,
    };
    let output = match backend {
        BackendId::Cpu => run_shaped::<CpuBackend>(case, device, None).map_err(to_err)?.to_host(),
        BackendId::Flat => run_shaped::<FlatBackend>(case, device, None).map_err(to_err)?.to_host(),
        BackendId::Parallel => run_shaped::<ParallelBackend>(case, device, None).map_err(to_err)?.to_host(),
    };
    Ok(output)
}

/// Run `case` on every configured backend not excluded for it.
pub fn check_backends(case: &FunctionCase) -> Result<(), TestCaseError> {
    let config = HarnessConfig::global().map_err(|e| TestCaseError::fail(e.to_string()))?;
    let dtypes = case.all_dtypes();
    for &backend in &config.backends {
        if let Some(exclusion) = find_exclusion(backend, case.fn_name, &dtypes) {
            log::debug!("skip {}.{} {:?}: {}", backend, case.fn_name, dtypes, exclusion.reason);
            continue;
        }
        test_function(case, backend, config.device).map_err(|e| TestCaseError::fail(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyarr_core::CreationOps;
    use polyarr_cpu::CpuArray;

    const CPU: Device = Device::Cpu(0);

    fn host(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> HostArray {
        HostArray::new(data, shape, dtype).unwrap()
    }

    fn all_backends(case: &FunctionCase) {
        for backend in BackendId::ALL {
            test_function(case, backend, CPU).unwrap_or_else(|e| panic!("{backend}: {e}"));
        }
    }

    #[test]
    fn test_layout_places_contiguous_prefix() {
        let sig = signature("eye").unwrap();
        let kwargs = vec![
            ("k", Arg::Int(1)),
            ("n_rows", Arg::Int(3)),
            ("dtype", Arg::DType(DType::Int8)),
        ];
        let l = layout(sig, &kwargs, 3, false).unwrap();
        // n_cols is absent, so k cannot be positional
        assert_eq!(l.positional, vec![&Arg::Int(3)]);
        assert_eq!(l.keywords.len(), 2);
        assert_eq!(l.keywords[0].0, "k");
    }

    #[test]
    fn test_layout_receiver_takes_first_parameter() {
        let sig = signature("tril").unwrap();
        let x = Arg::Array(host(vec![1.0; 4], vec![2, 2], DType::Int32));
        let kwargs = vec![("x", x.clone()), ("k", Arg::Int(0))];
        let l = layout(sig, &kwargs, 2, true).unwrap();
        assert_eq!(l.receiver, Some(&x));
        assert_eq!(l.positional, vec![&Arg::Int(0)]);
        assert!(l.keywords.is_empty());
    }

    #[test]
    fn test_layout_variadic_expands_positionally() {
        let sig = signature("meshgrid").unwrap();
        let arrays = Arg::Arrays(vec![host(vec![1.0], vec![1], DType::Int8)]);
        let kwargs = vec![("indexing", Arg::from("ij")), ("arrays", arrays)];
        let l = layout(sig, &kwargs, 5, false).unwrap();
        assert_eq!(l.positional.len(), 1);
        assert_eq!(l.keywords, vec![("indexing", &Arg::from("ij"))]);
    }

    #[test]
    fn test_layout_unknown_parameter() {
        let sig = signature("zeros").unwrap();
        let kwargs = vec![("fill_value", Arg::Int(1))];
        assert!(matches!(
            layout(sig, &kwargs, 0, false),
            Err(ConformanceError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_zeros_int32_on_every_backend() {
        let case = FunctionCase::new("zeros")
            .dtypes(&[DType::Int32])
            .kwarg("shape", Some(vec![3, 4]))
            .kwarg("dtype", DType::Int32);
        all_backends(&case);
        for backend in BackendId::ALL {
            let out = invoke(&case, backend, CPU).unwrap();
            assert_eq!(out[0].shape(), &[3, 4]);
            assert_eq!(out[0].dtype(), DType::Int32);
            assert!(out[0].data().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_arange_positional_with_out() {
        let case = FunctionCase::new("arange")
            .dtypes(&[DType::Int32])
            .flags(ExecutionFlags {
                with_out: true,
                num_positional_args: 3,
                ..Default::default()
            })
            .kwarg("start", 0i64)
            .kwarg("stop", 5i64)
            .kwarg("step", 2i64)
            .kwarg("dtype", DType::Int32);
        all_backends(&case);
        for backend in BackendId::ALL {
            assert_eq!(invoke(&case, backend, CPU).unwrap()[0].data(), &[0.0, 2.0, 4.0]);
        }
    }

    #[test]
    fn test_instance_method_with_variable() {
        let x = host((1..=6).map(f64::from).collect(), vec![2, 3], DType::Float32);
        let case = FunctionCase::new("triu")
            .dtypes(&[DType::Float32])
            .flags(ExecutionFlags {
                as_variable: true,
                instance_method: true,
                num_positional_args: 2,
                ..Default::default()
            })
            .kwarg("x", x)
            .kwarg("k", 1i64);
        all_backends(&case);
        let out = invoke(&case, BackendId::Flat, CPU).unwrap();
        assert_eq!(out[0].data(), &[0.0, 2.0, 3.0, 0.0, 0.0, 6.0]);
    }

    #[test]
    fn test_meshgrid_all_positional() {
        let a = host(vec![1.0, 2.0, 3.0], vec![3], DType::Int16);
        let b = host(vec![4.0, 5.0, 6.0], vec![3], DType::Int16);
        let case = FunctionCase::new("meshgrid")
            .dtypes(&[DType::Int16])
            .flags(ExecutionFlags {
                native_array: true,
                ..Default::default()
            })
            .kwarg("arrays", Arg::Arrays(vec![a, b]))
            .kwarg("indexing", "xy");
        all_backends(&case);
        assert_eq!(invoke(&case, BackendId::Parallel, CPU).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_function() {
        let case = FunctionCase::new("cumsum");
        assert!(matches!(
            test_function(&case, BackendId::Flat, CPU),
            Err(ConformanceError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_backend_error_is_surfaced() {
        let case = FunctionCase::new("zeros")
            .kwarg("shape", Some(vec![2]))
            .kwarg("dtype", DType::UInt16);
        let err = test_function(&case, BackendId::Parallel, CPU).unwrap_err();
        assert!(matches!(
            err,
            ConformanceError::Backend {
                source: PolyarrError::UnsupportedDType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_check_backends_honours_exclusions() {
        let capsule_source = host(vec![1.0, 2.0], vec![2], DType::UInt16);
        let case = FunctionCase::new("from_dlpack")
            .dtypes(&[DType::UInt16])
            .kwarg("x", capsule_source);
        assert!(check_backends(&case).is_ok());
    }

    #[test]
    fn test_like_and_dlpack_take_every_array_flag() {
        let x = host(vec![1.0, -2.0, 3.0, 4.0], vec![2, 2], DType::Int32);
        let flags = ExecutionFlags {
            as_variable: true,
            with_out: true,
            native_array: true,
            instance_method: true,
            num_positional_args: 1,
            ..Default::default()
        };
        for name in ["from_dlpack", "ones_like", "zeros_like"] {
            let case = FunctionCase::new(name)
                .dtypes(&[DType::Int32])
                .flags(flags)
                .kwarg("x", x.clone());
            check_backends(&case).unwrap_or_else(|e| panic!("{name}: {e}"));
        }
    }

    #[test]
    fn test_scalar_endpoints_reach_every_backend() {
        // endpoint values drawn from uint16 are plain floats to linspace
        let case = FunctionCase::new("linspace")
            .kwarg("start", 3.0)
            .kwarg("stop", 65535.0)
            .kwarg("num", 4i64)
            .kwarg("axis", Arg::None);
        assert!(case.all_dtypes().is_empty());
        assert!(find_exclusion(BackendId::Parallel, "linspace", &case.all_dtypes()).is_none());
        all_backends(&case);
        assert_eq!(invoke(&case, BackendId::Parallel, CPU).unwrap()[0].dtype(), DType::Float64);
    }

    #[test]
    fn test_dispatch_rejects_mismatched_out() {
        let out = CpuBackend::zeros(&[2, 2], Some(DType::Float64), CPU).unwrap();
        let call = Call::<CpuArray>::new("ones")
            .kwarg("shape", Value::Shape(vec![3]))
            .out(out);
        assert!(matches!(
            dispatch::<CpuBackend>(call),
            Err(PolyarrError::OutMismatch { .. })
        ));
    }

    #[test]
    fn test_dispatch_writes_into_out() {
        let out = FlatBackend::zeros(&[3], Some(DType::Int64), CPU).unwrap();
        let call = Call::new("arange")
            .arg(Value::Int(3))
            .kwarg("dtype", Value::Str("int64".to_string()))
            .out(out);
        let result = dispatch::<FlatBackend>(call).unwrap().into_arrays();
        assert_eq!(result[0].as_f64_slice(), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_dispatch_method_on_non_method() {
        let receiver = Value::Shape(vec![2]);
        let call = Call::<CpuArray>::new("zeros").method_on(receiver);
        assert_eq!(
            dispatch::<CpuBackend>(call).unwrap_err(),
            PolyarrError::NotAMethod("zeros".to_string())
        );
    }

    #[test]
    fn test_dispatch_shape_from_list() {
        let call = Call::<CpuArray>::new("full")
            .arg(Value::List(vec![Value::Int(2), Value::Int(2)]))
            .arg(Value::Float(1.5));
        let out = dispatch::<CpuBackend>(call).unwrap().into_arrays();
        assert_eq!(out[0].shape(), &[2, 2]);
        assert_eq!(out[0].dtype(), DType::Float64);
    }

    #[test]
    fn test_dispatch_rejects_wrong_argument_type() {
        let call = Call::<CpuArray>::new("eye").kwarg("n_rows", Value::Str("three".to_string()));
        assert!(matches!(
            dispatch::<CpuBackend>(call),
            Err(PolyarrError::ArgumentType { .. })
        ));
    }

    #[test]
    fn test_dispatch_from_strided_capsule() {
        use polyarr_core::DlPack;
        // column-major 2x2 view of [1, 2, 3, 4]
        let capsule =
            DlPack::strided(vec![2, 2], vec![1, 2], 0, DType::Int32, CPU, vec![1.0, 2.0, 3.0, 4.0].into()).unwrap();
        let call = Call::new("from_dlpack").arg(Value::Capsule(capsule));
        let out = dispatch::<FlatBackend>(call).unwrap().to_host();
        assert_eq!(out[0].data(), &[1.0, 3.0, 2.0, 4.0]);
    }
}
