//! Data types supported by polyarr

use serde::{Deserialize, Serialize};

/// Supported data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
}

/// Largest integer magnitude an `f64` holds exactly.
pub const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

impl DType {
    /// Every numeric type (everything except `bool`).
    pub const NUMERIC: &'static [DType] = &[
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
        DType::Float16,
        DType::Float32,
        DType::Float64,
    ];

    /// Signed and unsigned integer types.
    pub const INT: &'static [DType] = &[
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
    ];

    pub const FLOAT: &'static [DType] = &[DType::Float16, DType::Float32, DType::Float64];

    /// Size in bytes
    pub fn size(&self) -> usize {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 | DType::Float16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    /// String representation (NumPy compatible)
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float16 => "float16",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Parse a NumPy-style name, long (`int32`) or short (`i32`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bool" | "bool_" => Some(DType::Bool),
            "int8" | "i8" => Some(DType::Int8),
            "int16" | "i16" => Some(DType::Int16),
            "int32" | "i32" => Some(DType::Int32),
            "int64" | "i64" => Some(DType::Int64),
            "uint8" | "u8" => Some(DType::UInt8),
            "uint16" | "u16" => Some(DType::UInt16),
            "uint32" | "u32" => Some(DType::UInt32),
            "uint64" | "u64" => Some(DType::UInt64),
            "float16" | "f16" => Some(DType::Float16),
            "float32" | "f32" => Some(DType::Float32),
            "float64" | "f64" => Some(DType::Float64),
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        DType::INT.contains(self)
    }

    pub fn is_float(&self) -> bool {
        DType::FLOAT.contains(self)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64
        )
    }

    /// Inclusive range of values representable by this type.
    ///
    /// 64-bit integers are clamped to the span an `f64` stores exactly.
    pub fn value_range(&self) -> (f64, f64) {
        match self {
            DType::Bool => (0.0, 1.0),
            DType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DType::Int64 => (-MAX_EXACT_INT, MAX_EXACT_INT),
            DType::UInt8 => (0.0, u8::MAX as f64),
            DType::UInt16 => (0.0, u16::MAX as f64),
            DType::UInt32 => (0.0, u32::MAX as f64),
            DType::UInt64 => (0.0, MAX_EXACT_INT),
            DType::Float16 => (f64::from(half::f16::MIN), f64::from(half::f16::MAX)),
            DType::Float32 => (f32::MIN as f64, f32::MAX as f64),
            DType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Project a value into this type's domain.
    ///
    /// Integers truncate toward zero and saturate at the type bounds, NaN
    /// becomes zero. Floats round through their storage width.
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            DType::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            DType::Int8 => value as i8 as f64,
            DType::Int16 => value as i16 as f64,
            DType::Int32 => value as i32 as f64,
            DType::Int64 => value as i64 as f64,
            DType::UInt8 => value as u8 as f64,
            DType::UInt16 => value as u16 as f64,
            DType::UInt32 => value as u32 as f64,
            DType::UInt64 => value as u64 as f64,
            DType::Float16 => half::f16::from_f64(value).to_f64(),
            DType::Float32 => value as f32 as f64,
            DType::Float64 => value,
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DType {
    type Err = crate::PolyarrError;

    fn from_str(s: &str) -> crate::Result<Self> {
        DType::parse(s).ok_or_else(|| crate::PolyarrError::UnknownDType(s.to_string()))
    }
}

impl Default for DType {
    fn default() -> Self {
        DType::Float64
    }
}

/// A Python-style number: either an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Scalar::Int(_))
    }

    /// Dtype a creation function picks when none is given.
    pub fn default_dtype(&self) -> DType {
        match self {
            Scalar::Int(_) => DType::Int64,
            Scalar::Float(_) => DType::Float64,
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v:?}"),
        }
    }
}
