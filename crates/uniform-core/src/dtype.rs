//! Element type tags
//!
//! [`DataType`] is the closed set of element kinds a tensor can hold. The
//! byte width of every element derives from the tag alone, and [`Element`]
//! links each tag to the Rust type used to read and write its storage.

use crate::error::{Error, Result};
use half::{bf16, f16};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expand `$body` once with `$t` bound to the storage type of `$dtype`.
///
/// `Bool` is stored as one `u8` per element.
macro_rules! with_element_type {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            $crate::dtype::DataType::Bool | $crate::dtype::DataType::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::dtype::DataType::Int8 => {
                type $t = i8;
                $body
            }
            $crate::dtype::DataType::Int16 => {
                type $t = i16;
                $body
            }
            $crate::dtype::DataType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::dtype::DataType::Int64 => {
                type $t = i64;
                $body
            }
            $crate::dtype::DataType::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::dtype::DataType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::dtype::DataType::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::dtype::DataType::Float16 => {
                type $t = half::f16;
                $body
            }
            $crate::dtype::DataType::BFloat16 => {
                type $t = half::bf16;
                $body
            }
            $crate::dtype::DataType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::dtype::DataType::Float64 => {
                type $t = f64;
                $body
            }
        }
    };
}
pub(crate) use with_element_type;

/// Tensor element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
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
    BFloat16,
    Float32,
    Float64,
}

impl DataType {
    /// All element types, in declaration order
    pub const ALL: [DataType; 13] = [
        DataType::Bool,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::UInt8,
        DataType::UInt16,
        DataType::UInt32,
        DataType::UInt64,
        DataType::Float16,
        DataType::BFloat16,
        DataType::Float32,
        DataType::Float64,
    ];

    /// Size of one element in bytes
    pub const fn element_size(self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 | DataType::BFloat16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 8,
        }
    }

    /// Whether this is a floating-point type
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            DataType::Float16 | DataType::BFloat16 | DataType::Float32 | DataType::Float64
        )
    }

    /// Whether this is a signed integer type
    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Lower-case type name (`float32`, `bfloat16`, ...)
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float16 => "float16",
            DataType::BFloat16 => "bfloat16",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    /// Encode `value` as one element of this type into the front of `out`.
    ///
    /// Returns the written prefix of `out` (exactly `element_size` bytes).
    /// Integer and bool targets reject fractional or out-of-range values;
    /// float targets reject finite values that would overflow to infinity.
    pub fn write_scalar(self, value: f64, out: &mut [u8]) -> Result<&[u8]> {
        let size = self.element_size();
        if out.len() < size {
            return Err(Error::BufferSizeMismatch {
                expected: size,
                actual: out.len(),
            });
        }

        let bytes = &mut out[..size];
        match self {
            DataType::Bool => {
                let flag = if value == 0.0 {
                    0u8
                } else if value == 1.0 {
                    1u8
                } else {
                    return Err(Error::ScalarConversion { value, dtype: self });
                };
                bytes[0] = flag;
            }
            _ => with_element_type!(self, T => {
                let element = <T as Element>::from_f64_checked(value)
                    .ok_or(Error::ScalarConversion { value, dtype: self })?;
                bytes.copy_from_slice(bytemuck::bytes_of(&element));
            }),
        }
        Ok(&out[..size])
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust type backing one tensor element
///
/// Implemented for the primitive integers, `f32`, `f64`, and the `half`
/// crate's `f16`/`bf16`. Sealed: the set matches [`DataType`] exactly.
pub trait Element: bytemuck::Pod + PartialEq + fmt::Debug + Send + Sync + 'static + sealed::Sealed {
    /// Tag stored in tensors built from this type
    const DTYPE: DataType;

    /// Widen to `f64` (lossy only for 64-bit integers beyond 2^53)
    fn to_f64(self) -> f64;

    /// Narrow from `f64` with `as`-cast semantics (saturating, rounding)
    fn from_f64_lossy(value: f64) -> Self;

    /// Narrow from `f64`, refusing values the type cannot hold
    fn from_f64_checked(value: f64) -> Option<Self>;

    /// Bit-identical or value-equal
    fn same(self, other: Self) -> bool {
        self == other || bytemuck::bytes_of(&self) == bytemuck::bytes_of(&other)
    }
}

macro_rules! impl_int_element {
    ($($t:ty => $dtype:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const DTYPE: DataType = DataType::$dtype;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_f64_lossy(value: f64) -> Self {
                value as $t
            }

            fn from_f64_checked(value: f64) -> Option<Self> {
                // `MAX as f64` rounds up for 64-bit types, so the upper bound is exclusive there
                if !value.is_finite() || value.fract() != 0.0 {
                    return None;
                }
                if value < <$t>::MIN as f64 || value >= (<$t>::MAX as f64) + 1.0 {
                    return None;
                }
                Some(value as $t)
            }
        }
    )*};
}

impl_int_element!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
);

impl sealed::Sealed for f32 {}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float32;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    fn from_f64_checked(value: f64) -> Option<Self> {
        let narrowed = value as f32;
        (narrowed.is_finite() || !value.is_finite()).then_some(narrowed)
    }
}

impl sealed::Sealed for f64 {}

impl Element for f64 {
    const DTYPE: DataType = DataType::Float64;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    fn from_f64_checked(value: f64) -> Option<Self> {
        Some(value)
    }
}

macro_rules! impl_half_element {
    ($($t:ty => $dtype:ident),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Element for $t {
            const DTYPE: DataType = DataType::$dtype;

            fn to_f64(self) -> f64 {
                <$t>::to_f64(self)
            }

            fn from_f64_lossy(value: f64) -> Self {
                <$t>::from_f64(value)
            }

            fn from_f64_checked(value: f64) -> Option<Self> {
                let narrowed = <$t>::from_f64(value);
                (narrowed.is_finite() || !value.is_finite()).then_some(narrowed)
            }
        }
    )*};
}

impl_half_element!(f16 => Float16, bf16 => BFloat16);
