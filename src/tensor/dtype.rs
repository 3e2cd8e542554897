//! Runtime element-type tags and the `Element` trait

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Element type tag carried by every tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    U8,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    /// Size of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::I16 => 2,
            DType::I32 | DType::F32 => 4,
            DType::I64 | DType::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    pub fn is_signed(&self) -> bool {
        !matches!(self, DType::U8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::U8 => "uint8",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::F32 => "float32",
            DType::F64 => "float64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for types that can be stored in a tensor.
///
/// Transcendental functions return `None` for integral types, and `neg`
/// returns `None` for unsigned ones. Callers turn `None` into an
/// `UnsupportedOperation` error.
pub trait Element:
    Copy
    + Send
    + Sync
    + 'static
    + fmt::Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    const DTYPE: DType;

    fn zero() -> Self;

    fn one() -> Self;

    fn to_f64(self) -> f64;

    fn from_f64(v: f64) -> Self;

    fn from_usize(v: usize) -> Self {
        Self::from_f64(v as f64)
    }

    fn neg(self) -> Option<Self>;

    /// Sum, or `None` on integer overflow
    fn checked_add(self, rhs: Self) -> Option<Self>;

    fn checked_sub(self, rhs: Self) -> Option<Self>;

    fn checked_mul(self, rhs: Self) -> Option<Self>;

    /// Quotient, or `None` on integer division by zero or overflow
    fn checked_div(self, rhs: Self) -> Option<Self>;

    fn sin(self) -> Option<Self>;

    fn cos(self) -> Option<Self>;

    fn powf(self, exponent: f64) -> Option<Self>;

    /// Text form used by tensor rendering
    fn format(self, precision: usize) -> String;
}

macro_rules! float_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn neg(self) -> Option<Self> {
                Some(-self)
            }

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                Some(self + rhs)
            }

            #[inline]
            fn checked_sub(self, rhs: Self) -> Option<Self> {
                Some(self - rhs)
            }

            #[inline]
            fn checked_mul(self, rhs: Self) -> Option<Self> {
                Some(self * rhs)
            }

            #[inline]
            fn checked_div(self, rhs: Self) -> Option<Self> {
                Some(self / rhs)
            }

            #[inline]
            fn sin(self) -> Option<Self> {
                Some(<$t>::sin(self))
            }

            #[inline]
            fn cos(self) -> Option<Self> {
                Some(<$t>::cos(self))
            }

            #[inline]
            fn powf(self, exponent: f64) -> Option<Self> {
                Some((self as f64).powf(exponent) as $t)
            }

            fn format(self, precision: usize) -> String {
                format!("{:.*}", precision, self)
            }
        }
    };
}

macro_rules! int_element {
    ($t:ty, $dtype:expr, signed) => {
        int_element!(@impl $t, $dtype, |v: $t| v.checked_neg());
    };
    ($t:ty, $dtype:expr, unsigned) => {
        int_element!(@impl $t, $dtype, |_v: $t| None);
    };
    (@impl $t:ty, $dtype:expr, $neg:expr) => {
        impl Element for $t {
            const DTYPE: DType = $dtype;

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn neg(self) -> Option<Self> {
                ($neg)(self)
            }

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$t>::checked_add(self, rhs)
            }

            #[inline]
            fn checked_sub(self, rhs: Self) -> Option<Self> {
                <$t>::checked_sub(self, rhs)
            }

            #[inline]
            fn checked_mul(self, rhs: Self) -> Option<Self> {
                <$t>::checked_mul(self, rhs)
            }

            #[inline]
            fn checked_div(self, rhs: Self) -> Option<Self> {
                <$t>::checked_div(self, rhs)
            }

            fn sin(self) -> Option<Self> {
                None
            }

            fn cos(self) -> Option<Self> {
                None
            }

            fn powf(self, _exponent: f64) -> Option<Self> {
                None
            }

            fn format(self, _precision: usize) -> String {
                self.to_string()
            }
        }
    };
}

float_element!(f32, DType::F32);
float_element!(f64, DType::F64);
int_element!(u8, DType::U8, unsigned);
int_element!(i8, DType::I8, signed);
int_element!(i16, DType::I16, signed);
int_element!(i32, DType::I32, signed);
int_element!(i64, DType::I64, signed);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_properties() {
        assert_eq!(DType::F64.size(), 8);
        assert_eq!(DType::I16.size(), 2);
        assert!(DType::F32.is_float());
        assert!(!DType::I32.is_float());
        assert!(!DType::U8.is_signed());
        assert_eq!(<i8 as Element>::DTYPE, DType::I8);
    }

    #[test]
    fn test_integral_transcendentals_are_unsupported() {
        assert_eq!(3i32.sin(), None);
        assert_eq!(3i64.powf(2.0), None);
        assert_eq!(Element::neg(3u8), None);
        assert_eq!(Element::neg(3i16), Some(-3));
        assert_eq!(Element::neg(i8::MIN), None);
    }

    #[test]
    fn test_integer_overflow_is_detected() {
        assert_eq!(Element::checked_add(255u8, 1), None);
        assert_eq!(Element::checked_add(254u8, 1), Some(255));
        assert_eq!(Element::checked_sub(0u8, 1), None);
        assert_eq!(Element::checked_mul(i16::MAX, 2), None);
        assert_eq!(Element::checked_div(i32::MIN, -1), None);
        assert_eq!(Element::checked_div(7i64, 0), None);
        assert_eq!(Element::checked_add(f32::MAX, f32::MAX), Some(f32::INFINITY));
    }

    #[test]
    fn test_float_formatting() {
        assert_eq!(1.5f32.format(2), "1.50");
        assert_eq!(7i32.format(2), "7");
        assert!((Element::cos(0.0f64).unwrap() - 1.0).abs() < 1e-12);
    }
}
