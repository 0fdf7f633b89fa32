//! Floating point element types shared by CPU and GPU kernels

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Numeric precision selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    F64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }

    /// Size of one element in bytes
    pub fn size_of(self) -> usize {
        match self {
            DType::F32 => std::mem::size_of::<f32>(),
            DType::F64 => std::mem::size_of::<f64>(),
        }
    }

    /// Relative tolerance used when comparing candidate outputs
    pub fn tolerance(self) -> f64 {
        match self {
            DType::F32 => 1e-4,
            DType::F64 => 1e-6,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type a kernel can be instantiated for.
///
/// Implemented for `f32` and `f64`. The WGSL helpers let the GPU templates
/// be specialised with the same type the CPU path uses.
pub trait Element:
    Copy
    + Send
    + Sync
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + bytemuck::Pod
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + 'static
{
    const DTYPE: DType;
    const ZERO: Self;

    fn from_f64(value: f64) -> Self;
    fn to_f64(self) -> f64;
    fn sin(self) -> Self;
    fn sqrt(self) -> Self;

    /// WGSL scalar type name
    fn wgsl_type() -> &'static str;

    /// WGSL literal of this type
    fn wgsl_literal(value: f64) -> String;
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr, $suffix:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;
            const ZERO: Self = 0.0;

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $ty
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn sin(self) -> Self {
                <$ty>::sin(self)
            }

            #[inline]
            fn sqrt(self) -> Self {
                <$ty>::sqrt(self)
            }

            fn wgsl_type() -> &'static str {
                $dtype.name()
            }

            fn wgsl_literal(value: f64) -> String {
                format!("{:?}{}", value, $suffix)
            }
        }
    };
}

impl_element!(f32, DType::F32, "");
impl_element!(f64, DType::F64, "lf");
