//! Call a creation function by name
//!
//! A [`Call`] carries loosely typed arguments the way a scripting front end
//! would hand them over; [`dispatch`] binds them to the function's
//! [`Signature`](crate::signature::Signature), converts them, and runs the
//! operation on a concrete backend.

use crate::array::{Array, HostArray, Variable};
use crate::dlpack::DlPack;
use crate::ops::Indexing;
use crate::signature::{signature, BoundArgs};
use crate::{Backend, DType, Device, PolyarrError, Result, Scalar};

/// A dynamically typed argument
#[derive(Debug, Clone)]
pub enum Value<A> {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Shape(Vec<usize>),
    DType(DType),
    Device(Device),
    /// Backend-neutral array, converted on entry
    Host(HostArray),
    /// Array already in the backend's own type
    Native(A),
    Variable(Variable<A>),
    Capsule(DlPack),
    List(Vec<Value<A>>),
}

impl<A> From<Scalar> for Value<A> {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(v) => Value::Int(v),
            Scalar::Float(v) => Value::Float(v),
        }
    }
}

impl<A> From<Option<Scalar>> for Value<A> {
    fn from(s: Option<Scalar>) -> Self {
        s.map_or(Value::None, Value::from)
    }
}

impl<A> Value<A> {
    fn kind(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Shape(_) => "shape",
            Value::DType(_) => "dtype",
            Value::Device(_) => "device",
            Value::Host(_) => "host array",
            Value::Native(_) => "native array",
            Value::Variable(_) => "variable",
            Value::Capsule(_) => "dlpack capsule",
            Value::List(_) => "list",
        }
    }
}

/// A pending invocation of a named function
#[derive(Debug, Clone)]
pub struct Call<A> {
    pub name: String,
    /// Set for method-style calls; bound as the first parameter
    pub receiver: Option<Value<A>>,
    pub args: Vec<Value<A>>,
    pub kwargs: Vec<(String, Value<A>)>,
    pub out: Option<A>,
}

impl<A> Call<A> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            receiver: None,
            args: Vec::new(),
            kwargs: Vec::new(),
            out: None,
        }
    }

    pub fn arg(mut self, value: Value<A>) -> Self {
        self.args.push(value);
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: Value<A>) -> Self {
        self.kwargs.push((name.into(), value));
        self
    }

    pub fn method_on(mut self, receiver: Value<A>) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn out(mut self, out: A) -> Self {
        self.out = Some(out);
        self
    }
}

/// What a creation function returns
#[derive(Debug, Clone)]
pub enum Output<A> {
    Array(A),
    Arrays(Vec<A>),
}

impl<A: Array> Output<A> {
    pub fn into_arrays(self) -> Vec<A> {
        match self {
            Output::Array(a) => vec![a],
            Output::Arrays(v) => v,
        }
    }

    pub fn to_host(&self) -> Vec<HostArray> {
        match self {
            Output::Array(a) => vec![a.to_host()],
            Output::Arrays(v) => v.iter().map(Array::to_host).collect(),
        }
    }
}

/// Bind and execute `call` on backend `B`.
pub fn dispatch<B: Backend>(call: Call<B::Array>) -> Result<Output<B::Array>> {
    let sig = signature(&call.name).ok_or_else(|| PolyarrError::UnknownFunction(call.name.clone()))?;

    let mut args = call.args;
    if let Some(receiver) = call.receiver {
        if !sig.supports_instance {
            return Err(PolyarrError::NotAMethod(call.name));
        }
        args.insert(0, receiver);
    }
    if call.out.is_some() && !sig.supports_out {
        return Err(PolyarrError::UnexpectedKeyword {
            function: call.name,
            name: "out".to_string(),
        });
    }

    log::trace!(
        "dispatch {}() on {} with {} positional, {} keyword{}",
        sig.name,
        B::name(),
        args.len(),
        call.kwargs.len(),
        if call.out.is_some() { ", out" } else { "" }
    );

    let bound = sig.bind(args, call.kwargs)?;
    let result = execute::<B>(Args { bound })?;

    match call.out {
        Some(out) => write_out(out, result),
        None => Ok(result),
    }
}

/// Copy a single-array result into a caller-supplied buffer.
fn write_out<A: Array>(mut out: A, result: Output<A>) -> Result<Output<A>> {
    let result = match result {
        Output::Array(a) => a,
        Output::Arrays(_) => {
            return Err(PolyarrError::InvalidArgument(
                "out is only valid for single-array results".to_string(),
            ))
        }
    };
    if out.shape() != result.shape() || out.dtype() != result.dtype() {
        return Err(PolyarrError::OutMismatch {
            expected_shape: result.shape().to_vec(),
            expected_dtype: result.dtype(),
            got_shape: out.shape().to_vec(),
            got_dtype: out.dtype(),
        });
    }
    out.assign(&result.as_f64_slice())?;
    Ok(Output::Array(out))
}

/// Typed accessors over bound arguments
struct Args<A> {
    bound: BoundArgs<Value<A>>,
}

impl<A: Array> Args<A> {
    fn type_error(&self, name: &str, expected: &'static str) -> PolyarrError {
        PolyarrError::ArgumentType {
            function: self.bound.function().to_string(),
            name: name.to_string(),
            expected,
        }
    }

    fn take(&mut self, name: &str) -> Option<Value<A>> {
        match self.bound.take(name) {
            Some(Value::None) | None => None,
            Some(v) => Some(v),
        }
    }

    fn required(&mut self, name: &str) -> Result<Value<A>> {
        self.take(name)
            .ok_or_else(|| self.type_error(name, "not None"))
    }

    fn shape(&mut self, name: &str) -> Result<Vec<usize>> {
        match self.required(name)? {
            Value::Shape(s) => Ok(s),
            Value::Int(n) if n >= 0 => Ok(vec![n as usize]),
            Value::List(items) => items
                .into_iter()
                .map(|v| match v {
                    Value::Int(n) if n >= 0 => Ok(n as usize),
                    _ => Err(self.type_error(name, "a sequence of non-negative ints")),
                })
                .collect(),
            _ => Err(self.type_error(name, "a shape")),
        }
    }

    fn scalar(&mut self, name: &str) -> Result<Scalar> {
        self.opt_scalar(name)?
            .ok_or_else(|| self.type_error(name, "a number"))
    }

    fn opt_scalar(&mut self, name: &str) -> Result<Option<Scalar>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Int(v)) => Ok(Some(Scalar::Int(v))),
            Some(Value::Float(v)) => Ok(Some(Scalar::Float(v))),
            Some(Value::Bool(b)) => Ok(Some(Scalar::Int(b as i64))),
            Some(_) => Err(self.type_error(name, "a number")),
        }
    }

    fn f64_or(&mut self, name: &str, default: f64) -> Result<f64> {
        Ok(self.opt_scalar(name)?.map_or(default, |s| s.as_f64()))
    }

    fn opt_usize(&mut self, name: &str) -> Result<Option<usize>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Int(v)) if v >= 0 => Ok(Some(v as usize)),
            Some(_) => Err(self.type_error(name, "a non-negative int")),
        }
    }

    fn usize(&mut self, name: &str) -> Result<usize> {
        self.opt_usize(name)?
            .ok_or_else(|| self.type_error(name, "a non-negative int"))
    }

    fn i64_or(&mut self, name: &str, default: i64) -> Result<i64> {
        match self.take(name) {
            None => Ok(default),
            Some(Value::Int(v)) => Ok(v),
            Some(_) => Err(self.type_error(name, "an int")),
        }
    }

    fn bool_or(&mut self, name: &str, default: bool) -> Result<bool> {
        match self.take(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(b),
            Some(_) => Err(self.type_error(name, "a bool")),
        }
    }

    fn dtype(&mut self, name: &str) -> Result<Option<DType>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::DType(d)) => Ok(Some(d)),
            Some(Value::Str(s)) => s.parse().map(Some),
            Some(_) => Err(self.type_error(name, "a dtype")),
        }
    }

    fn device(&mut self, name: &str) -> Result<Option<Device>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Device(d)) => Ok(Some(d)),
            Some(Value::Str(s)) => s.parse().map(Some),
            Some(_) => Err(self.type_error(name, "a device")),
        }
    }

    /// Only `None` and `0` are meaningful for scalar endpoints.
    fn axis(&mut self, name: &str) -> Result<()> {
        match self.take(name) {
            None | Some(Value::Int(0)) | Some(Value::Int(-1)) => Ok(()),
            Some(_) => Err(self.type_error(name, "None or 0 for scalar endpoints")),
        }
    }

    fn indexing(&mut self, name: &str) -> Result<Indexing> {
        match self.take(name) {
            None => Ok(Indexing::default()),
            Some(Value::Str(s)) => s.parse(),
            Some(_) => Err(self.type_error(name, "'xy' or 'ij'")),
        }
    }

    /// A host-side view of an array argument.
    fn host(&mut self, name: &str) -> Result<HostArray> {
        let value = self.required(name)?;
        self.value_to_host(name, value)
    }

    fn value_to_host(&self, name: &str, value: Value<A>) -> Result<HostArray> {
        match value {
            Value::Host(h) => Ok(h),
            Value::Native(a) => Ok(a.to_host()),
            Value::Variable(v) => Ok(v.detach().to_host()),
            Value::Capsule(c) => HostArray::from_parts(
                c.to_row_major(),
                c.shape().to_vec(),
                c.dtype(),
                c.device(),
            ),
            Value::Int(v) => Ok(HostArray::scalar(v as f64, DType::Int64)),
            Value::Float(v) => Ok(HostArray::scalar(v, DType::Float64)),
            other => {
                log::debug!("{name}: cannot convert {} to an array", other.kind());
                Err(self.type_error(name, "an array"))
            }
        }
    }
}

/// Convert an array-like value into backend `B`'s native type.
fn to_native<B: Backend>(value: Value<B::Array>, args: &Args<B::Array>, name: &str) -> Result<B::Array> {
    match value {
        Value::Native(a) => Ok(a),
        Value::Variable(v) => Ok(v.detach()),
        Value::Capsule(c) => B::from_dlpack(&c),
        other => {
            let host = args.value_to_host(name, other)?;
            B::asarray(&host, None, None)
        }
    }
}

fn execute<B: Backend>(mut a: Args<B::Array>) -> Result<Output<B::Array>> {
    let function = a.bound.function();
    let array = match function {
        "native_array" => {
            let x = a.host("x")?;
            B::native_array(&x, a.dtype("dtype")?, a.device("device")?)?
        }
        "asarray" => {
            let obj = a.host("object_in")?;
            B::asarray(&obj, a.dtype("dtype")?, a.device("device")?)?
        }
        "zeros" | "ones" | "empty" => {
            let shape = a.shape("shape")?;
            let dtype = a.dtype("dtype")?;
            let device = a.device("device")?.unwrap_or_default();
            match function {
                "zeros" => B::zeros(&shape, dtype, device)?,
                "ones" => B::ones(&shape, dtype, device)?,
                _ => B::empty(&shape, dtype, device)?,
            }
        }
        "full" => {
            let shape = a.shape("shape")?;
            let fill = a.scalar("fill_value")?;
            let dtype = a.dtype("dtype")?;
            B::full(&shape, fill, dtype, a.device("device")?.unwrap_or_default())?
        }
        "zeros_like" | "ones_like" | "empty_like" => {
            let x = a.required("x")?;
            let x = to_native::<B>(x, &a, "x")?;
            let dtype = a.dtype("dtype")?;
            let device = a.device("device")?;
            match function {
                "zeros_like" => B::zeros_like(&x, dtype, device)?,
                "ones_like" => B::ones_like(&x, dtype, device)?,
                _ => B::empty_like(&x, dtype, device)?,
            }
        }
        "full_like" => {
            let x = a.required("x")?;
            let x = to_native::<B>(x, &a, "x")?;
            let fill = a.scalar("fill_value")?;
            B::full_like(&x, fill, a.dtype("dtype")?, a.device("device")?)?
        }
        "arange" => {
            let start = a.scalar("start")?;
            let stop = a.opt_scalar("stop")?;
            let step = a.opt_scalar("step")?.unwrap_or(Scalar::Int(1));
            let dtype = a.dtype("dtype")?;
            B::arange(start, stop, step, dtype, a.device("device")?.unwrap_or_default())?
        }
        "linspace" | "logspace" => {
            let start = a.scalar("start")?.as_f64();
            let stop = a.scalar("stop")?.as_f64();
            let num = a.usize("num")?;
            let base = if function == "logspace" {
                Some(a.f64_or("base", 10.0)?)
            } else {
                None
            };
            a.axis("axis")?;
            let endpoint = a.bool_or("endpoint", true)?;
            let dtype = a.dtype("dtype")?;
            let device = a.device("device")?.unwrap_or_default();
            match base {
                Some(base) => B::logspace(start, stop, num, base, endpoint, dtype, device)?,
                None => B::linspace(start, stop, num, endpoint, dtype, device)?,
            }
        }
        "eye" => {
            let n_rows = a.usize("n_rows")?;
            let n_cols = a.opt_usize("n_cols")?;
            let k = a.i64_or("k", 0)?;
            let dtype = a.dtype("dtype")?;
            B::eye(n_rows, n_cols, k, dtype, a.device("device")?.unwrap_or_default())?
        }
        "meshgrid" => {
            let indexing = a.indexing("indexing")?;
            let values = a.bound.take_rest();
            let mut arrays = Vec::with_capacity(values.len());
            for value in values {
                arrays.push(to_native::<B>(value, &a, "arrays")?);
            }
            return Ok(Output::Arrays(B::meshgrid(&arrays, indexing)?));
        }
        "tril" | "triu" => {
            let x = a.required("x")?;
            let x = to_native::<B>(x, &a, "x")?;
            let k = a.i64_or("k", 0)?;
            if function == "tril" {
                B::tril(&x, k)?
            } else {
                B::triu(&x, k)?
            }
        }
        "from_dlpack" => match a.required("x")? {
            Value::Capsule(c) => B::from_dlpack(&c)?,
            Value::Native(x) => B::from_dlpack(&x.to_dlpack())?,
            Value::Variable(v) => B::from_dlpack(&v.detach().to_dlpack())?,
            Value::Host(h) => B::from_dlpack(&h.to_dlpack())?,
            _ => return Err(a.type_error("x", "an array or dlpack capsule")),
        },
        other => return Err(PolyarrError::UnknownFunction(other.to_string())),
    };
    Ok(Output::Array(array))
}
