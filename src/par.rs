//! Conditionally parallel iteration, gated on the `parallel` feature.
//!
//! The macros expand to rayon parallel iterators when the feature is enabled and
//! to plain sequential iterators otherwise, so call sites stay identical. Callers
//! using the parallel expansion must have `rayon::prelude::*` in scope.

/// Conditionally parallel iterator over a range.
macro_rules! maybe_par_range {
    ($range:expr) => {{
        #[cfg(feature = "parallel")]
        {
            ($range).into_par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $range
        }
    }};
}

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

pub(crate) use maybe_par_iter;
pub(crate) use maybe_par_range;
