//! Contains the arithmetic trait the error diffusion engine is generic over.

use num_traits::Zero;
use std::ops::{AddAssign, Mul, Shr, Sub};

/// The arithmetic an error diffusion carry value must support.
///
/// Implemented by `i32` for the per-channel engines and by
/// [`Fixed3`](crate::Fixed3) for the 3-vector palette engine.
pub trait ErrorTerm:
    Zero
    + Copy
    + Sub<Output = Self>
    + Mul<i32, Output = Self>
    + Shr<u32, Output = Self>
    + AddAssign
    + 'static
{
}

impl<T> ErrorTerm for T where
    T: Zero
        + Copy
        + Sub<Output = Self>
        + Mul<i32, Output = Self>
        + Shr<u32, Output = Self>
        + AddAssign
        + 'static
{
}
