use core::fmt::Debug;
use core::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Arithmetic type that convolution and integral sums are carried in.
pub trait Accum:
    Copy
    + Send
    + Sync
    + Default
    + Debug
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + 'static
{
    const ZERO: Self;
    const ONE: Self;

    /// Divides `total` by `weight`; integers round as `(total + weight / 2) / weight`.
    ///
    /// A zero weight yields zero.
    fn normalize(total: Self, weight: Self) -> Self;

    fn from_i32(v: i32) -> Self;

    fn to_f64(self) -> f64;

    /// Addition that wraps on integer overflow; plain addition for floats.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// Subtraction that wraps on integer overflow; plain subtraction for floats.
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_accum_int {
    ($($t:ty),*) => {$(
        impl Accum for $t {
            const ZERO: Self = 0;
            const ONE: Self = 1;

            #[inline]
            fn normalize(total: Self, weight: Self) -> Self {
                if weight == 0 {
                    return 0;
                }
                (total + weight / 2) / weight
            }

            #[inline]
            fn from_i32(v: i32) -> Self {
                v as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                <$t>::wrapping_sub(self, rhs)
            }
        }
    )*};
}

macro_rules! impl_accum_float {
    ($($t:ty),*) => {$(
        impl Accum for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;

            #[inline]
            fn normalize(total: Self, weight: Self) -> Self {
                if weight == 0.0 {
                    return 0.0;
                }
                total / weight
            }

            #[inline]
            fn from_i32(v: i32) -> Self {
                v as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn wrapping_add(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn wrapping_sub(self, rhs: Self) -> Self {
                self - rhs
            }
        }
    )*};
}

impl_accum_int!(i32, i64);
impl_accum_float!(f32, f64);

/// Image sample type with the accumulator convolution runs in.
pub trait Pixel: Copy + Send + Sync + Default + Debug + PartialEq + 'static {
    type Acc: Accum;

    fn to_acc(self) -> Self::Acc;

    /// Converts back, saturating integers at the sample range.
    fn from_acc(acc: Self::Acc) -> Self;
}

macro_rules! impl_pixel_narrow {
    ($($t:ty => $acc:ty),*) => {$(
        impl Pixel for $t {
            type Acc = $acc;

            #[inline]
            fn to_acc(self) -> $acc {
                self as $acc
            }

            #[inline]
            fn from_acc(acc: $acc) -> Self {
                acc.clamp(<$t>::MIN as $acc, <$t>::MAX as $acc) as $t
            }
        }
    )*};
}

macro_rules! impl_pixel_same {
    ($($t:ty),*) => {$(
        impl Pixel for $t {
            type Acc = $t;

            #[inline]
            fn to_acc(self) -> $t {
                self
            }

            #[inline]
            fn from_acc(acc: $t) -> Self {
                acc
            }
        }
    )*};
}

impl_pixel_narrow!(u8 => i32, u16 => i32, i16 => i32);
impl_pixel_same!(i32, i64, f32, f64);

/// Sample type that can be fed to the integral-image transform.
///
/// Integer sums wrap on overflow, so any block sum whose true value fits in
/// `Sum` is still exact.
pub trait IntegralPixel: Copy + Send + Sync + 'static {
    /// Widened type the cumulative sums are stored in.
    type Sum: Accum;

    fn to_sum(self) -> Self::Sum;
}

macro_rules! impl_integral {
    ($($t:ty => $sum:ty),*) => {$(
        impl IntegralPixel for $t {
            type Sum = $sum;

            #[inline]
            fn to_sum(self) -> $sum {
                self as $sum
            }
        }
    )*};
}

impl_integral!(
    u8 => i32,
    i16 => i64,
    u16 => i64,
    i32 => i64,
    i64 => i64,
    f32 => f64,
    f64 => f64
);
