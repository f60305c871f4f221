//! A single-assignment, lazily computed value.
//! See [`Deferred`] for more details.

use std::cell::Cell;
use std::convert::Infallible;

use once_cell::unsync::OnceCell;

type Init<'a, T, E> = Box<dyn FnMut() -> Result<T, E> + 'a>;

/// A value which is computed the first time it is forced and cached afterwards.
///
/// The computation is only ever *completed* once. If it succeeds, its result is stored
/// and the computation is dropped. If it returns an error (or panics), nothing is stored
/// and the next force runs the computation again.
///
/// Forcing a cell from inside its own computation panics.
pub struct Deferred<'a, T, E = Infallible> {
    value: OnceCell<T>,
    init: Cell<Option<Init<'a, T, E>>>,
}

/// Puts the computation back into its slot unless it has been discarded.
/// This keeps the cell retryable when the computation fails or unwinds.
struct Restore<'c, F> {
    slot: &'c Cell<Option<F>>,
    init: Option<F>,
}
impl<F> Drop for Restore<'_, F> {
    fn drop(&mut self) {
        if let Some(f) = self.init.take() {
            self.slot.set(Some(f));
        }
    }
}

impl<'a, T, E> Deferred<'a, T, E> {
    /// Creates a cell from a computation which may fail.
    pub fn fallible(f: impl FnMut() -> Result<T, E> + 'a) -> Self {
        Deferred { value: OnceCell::new(), init: Cell::new(Some(Box::new(f))) }
    }
    /// Creates a cell which already holds its value.
    pub fn of(t: T) -> Self {
        Deferred { value: OnceCell::with_value(t), init: Cell::new(None) }
    }

    /// Forces the cell, running the computation if it has not yet succeeded.
    pub fn try_force(&self) -> Result<&T, E> {
        if let Some(t) = self.value.get() {
            return Ok(t);
        }

        let mut guard = Restore { slot: &self.init, init: self.init.take() };
        let Some(f) = guard.init.as_mut() else {
            panic!("deferred value was forced while it was being computed")
        };

        log::trace!("running deferred computation");
        match f() {
            Ok(t) => {
                // Successful, so the computation is never needed again.
                guard.init = None;
                Ok(self.value.get_or_init(|| t))
            },
            Err(e) => {
                log::debug!("deferred computation failed, cell left unforced");
                Err(e)
            },
        }
    }

    /// Gets the value if the cell has been forced.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.get_mut()
    }
    pub fn is_forced(&self) -> bool {
        self.value.get().is_some()
    }
    pub fn into_inner(self) -> Option<T> {
        self.value.into_inner()
    }
    /// Removes the value from a forced cell.
    pub(crate) fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<'a, T> Deferred<'a, T> {
    /// Creates a cell from a computation which cannot fail.
    pub fn new(mut f: impl FnMut() -> T + 'a) -> Self {
        Deferred::fallible(move || Ok(f()))
    }

    pub fn force(&self) -> &T {
        match self.try_force() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl<T, E> From<T> for Deferred<'_, T, E> {
    fn from(value: T) -> Self {
        Deferred::of(value)
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for Deferred<'_, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("value", &self.value)
            .field("init", &"..")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    use once_cell::unsync::OnceCell;

    use super::Deferred;

    /// Creates a cell returning `t` and a counter of how many times its computation ran.
    fn counted<T: Clone + 'static>(t: T) -> (Rc<Cell<usize>>, Deferred<'static, T>) {
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);

        let cell = Deferred::new(move || {
            runs2.set(runs2.get() + 1);
            t.clone()
        });
        (runs, cell)
    }

    #[test]
    fn runs_once() {
        let (runs, cell) = counted(String::from("memo"));
        assert_eq!(runs.get(), 0);
        assert!(!cell.is_forced());

        let first: *const String = cell.force();
        for _ in 0..10 {
            assert!(std::ptr::eq(cell.force(), first));
        }
        assert_eq!(runs.get(), 1);
        assert!(cell.is_forced());
        assert_eq!(cell.into_inner().as_deref(), Some("memo"));
    }

    #[test]
    fn known() {
        let cell: Deferred<usize> = Deferred::of(7);
        assert!(cell.is_forced());
        assert_eq!(cell.get(), Some(&7));
        assert_eq!(*cell.force(), 7);

        let mut cell: Deferred<usize> = 9.into();
        *cell.get_mut().unwrap() += 1;
        assert_eq!(*cell.force(), 10);
    }

    #[test]
    fn retries_after_error() {
        let attempts = Cell::new(0);
        let cell: Deferred<usize, &str> = Deferred::fallible(|| {
            attempts.set(attempts.get() + 1);
            match attempts.get() {
                1 => Err("not yet"),
                n => Ok(n * 10),
            }
        });

        assert_eq!(cell.try_force(), Err("not yet"));
        assert!(!cell.is_forced());
        assert_eq!(cell.try_force(), Ok(&20));
        assert_eq!(cell.try_force(), Ok(&20));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn retries_after_panic() {
        let attempts = Cell::new(0);
        let cell = Deferred::new(|| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                panic!("first attempt");
            }
            "ok"
        });

        let r = catch_unwind(AssertUnwindSafe(|| *cell.force()));
        assert!(r.is_err());
        assert!(!cell.is_forced());

        assert_eq!(*cell.force(), "ok");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    #[should_panic(expected = "while it was being computed")]
    fn reentrant_force() {
        let slot: Rc<OnceCell<Deferred<'static, usize>>> = Rc::new(OnceCell::new());
        let inner = Rc::clone(&slot);

        let _ = slot.set(Deferred::new(move || match inner.get() {
            Some(cell) => *cell.force() + 1,
            None => 0,
        }));
        if let Some(cell) = slot.get() {
            cell.force();
        }
    }
}
