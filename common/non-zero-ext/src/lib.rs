//! Extra methods for non-zero integers.

#![warn(missing_docs)]

use std::num::{NonZeroU64, NonZeroUsize};

/// Extra methods for non-zero integers.
pub trait NonZeroExt: Sized
{
    /// The number 1.
    const ONE: Self;

    /// Divide, rounding towards positive infinity.
    ///
    /// The quotient of two non-zero unsigned integers
    /// rounded up is never zero.
    fn ceil_div(self, rhs: Self) -> Self;
}

macro_rules! impl_non_zero_ext
{
    { $($non_zero:ty),* } => {
        $(
            impl NonZeroExt for $non_zero
            {
                const ONE: Self = unsafe { Self::new_unchecked(1) };

                fn ceil_div(self, rhs: Self) -> Self
                {
                    let quotient = self.get().div_ceil(rhs.get());
                    // SAFETY: self is at least 1, so the quotient is too.
                    unsafe { Self::new_unchecked(quotient) }
                }
            }
        )*
    };
}

impl_non_zero_ext!(NonZeroU64, NonZeroUsize);

#[cfg(test)]
mod tests
{
    use {super::*, proptest::proptest};

    fn nz(n: usize) -> NonZeroUsize
    {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn ceil_div_rounds_up_at_block_boundaries()
    {
        assert_eq!(nz(16).ceil_div(nz(16)), nz(1));
        assert_eq!(nz(17).ceil_div(nz(16)), nz(2));
        assert_eq!(nz(1).ceil_div(nz(16)), nz(1));
        assert_eq!(nz(1200).ceil_div(nz(16)), nz(75));
    }

    #[test]
    fn ceil_div_does_not_overflow()
    {
        assert_eq!(nz(usize::MAX).ceil_div(nz(2)), nz(usize::MAX / 2 + 1));
        assert_eq!(NonZeroU64::MAX.ceil_div(NonZeroU64::ONE), NonZeroU64::MAX);
    }

    proptest!
    {
        #[test]
        fn ceil_div_covers_dividend(lhs in 1usize .., rhs in 1usize .. 4096)
        {
            let quotient = nz(lhs).ceil_div(nz(rhs)).get();
            assert!(quotient as u128 * rhs as u128 >= lhs as u128);
            assert!((quotient as u128 - 1) * (rhs as u128) < lhs as u128);
        }
    }
}
