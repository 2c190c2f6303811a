//! Constant-stack evaluation of naturally recursive steps.
//!
//! A recursive step is expressed as a value: either the final result
//! ([`Trampoline::Done`]) or a closure producing the next step
//! ([`Trampoline::More`]). [`Trampoline::run`] drives the steps in a plain loop,
//! so the host call stack never grows with the number of steps.
//!
//! ```
//! use bgdata::trampoline::Trampoline;
//!
//! fn count_down<'a>(n: u64, acc: u64) -> Trampoline<'a, u64> {
//!     if n == 0 {
//!         Trampoline::Done(acc)
//!     } else {
//!         Trampoline::more(move || count_down(n - 1, acc + 1))
//!     }
//! }
//!
//! assert_eq!(count_down(1_000_000, 0).run(), 1_000_000);
//! ```

/// One step of a trampolined computation.
pub enum Trampoline<'a, T> {
    /// The computation has finished.
    Done(T),
    /// The computation needs at least one more step.
    More(Box<dyn FnOnce() -> Trampoline<'a, T> + 'a>),
}

impl<'a, T> Trampoline<'a, T> {
    /// Wrap the next step of the computation.
    #[inline]
    pub fn more(step: impl FnOnce() -> Trampoline<'a, T> + 'a) -> Self {
        Trampoline::More(Box::new(step))
    }

    /// Returns true if no further step is required.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Trampoline::Done(_))
    }

    /// Request steps until a result is produced.
    pub fn run(self) -> T {
        let mut current = self;
        loop {
            match current {
                Trampoline::Done(result) => return result,
                Trampoline::More(step) => current = step(),
            }
        }
    }
}
