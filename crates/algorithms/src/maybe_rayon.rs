//! Switch between rayon and plain iterators.
//!
//! With the `parallel` feature (default) this re-exports rayon's prelude so
//! per-row raster loops run on the thread pool. Without it, `into_par_iter()`
//! falls back to `into_iter()` and the same loop bodies run sequentially.
//! Either way the collected rows keep their order, so outputs are identical.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
