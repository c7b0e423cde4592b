//! Minimal single-threaded reactive runtime.
//!
//! [`Ref<T>`] is a shared, version-tracked cell. [`effect`] registers a body
//! that runs once immediately and again whenever any `Ref` it read during its
//! most recent run changes. Reads from earlier runs that were not repeated no
//! longer count. [`BatchScope`] (or [`batch`]) defers those re-runs until
//! the outermost scope exits, running each affected effect exactly once.
//!
//! # Invariants
//!
//! 1. `set(v)` where `v == current` is a no-op.
//! 2. An effect is never re-entered while it is running.
//! 3. Dropping an [`Effect`] handle disposes it; it will not run again.
//! 4. Deferred effects run in the order they were first scheduled.
//!
//! Everything here is `!Send`: state lives in `Rc`/`RefCell` and thread-locals.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    /// Effects currently running, innermost last. `None` marks an untracked scope.
    static OBSERVERS: RefCell<Vec<Option<Rc<EffectInner>>>> = const { RefCell::new(Vec::new()) };
    static BATCH: RefCell<BatchContext> = const {
        RefCell::new(BatchContext { depth: 0, pending: Vec::new() })
    };
}

struct BatchContext {
    depth: u32,
    pending: Vec<Rc<EffectInner>>,
}

struct RefInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    /// Subscribed effects, each with the run in which it last read this cell
    subscribers: RefCell<Vec<(Weak<EffectInner>, u64)>>,
}

/// Shared observable cell. Clones are handles to the same value.
pub struct Ref<T> {
    inner: Rc<RefInner<T>>,
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Ref<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Clone of the current value. Registers a dependency for the running effect.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value. Registers a dependency for the running effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    /// Clone of the current value without registering a dependency
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Replace the value, notifying dependents if it changed
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.changed();
    }

    /// Modify the value in place, notifying dependents if it changed
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            let old = current.clone();
            f(&mut current);
            *current != old
        };
        if changed {
            self.changed();
        }
    }

    /// Increments by one on every value-changing mutation
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether both handles point at the same cell
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn track(&self) {
        let Some(observer) = OBSERVERS.with(|o| o.borrow().last().cloned().flatten()) else {
            return;
        };
        let run = observer.runs.get();
        let mut subscribers = self.inner.subscribers.borrow_mut();
        match subscribers
            .iter_mut()
            .find(|(w, _)| std::ptr::eq(w.as_ptr(), Rc::as_ptr(&observer)))
        {
            Some(entry) => entry.1 = run,
            None => subscribers.push((Rc::downgrade(&observer), run)),
        }
    }

    fn changed(&self) {
        self.inner.version.set(self.inner.version.get() + 1);

        let live: Vec<Rc<EffectInner>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            // drop dead effects and effects whose latest run skipped this cell
            subscribers.retain(|(w, run)| w.upgrade().map_or(false, |e| e.runs.get() == *run));
            subscribers.iter().filter_map(|(w, _)| w.upgrade()).collect()
        };

        for effect in live {
            schedule(effect);
        }
    }
}

struct EffectInner {
    body: RefCell<Box<dyn FnMut()>>,
    running: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<u64>,
}

impl EffectInner {
    fn run(self: &Rc<Self>) {
        if self.running.get() || self.disposed.get() {
            return;
        }
        let _guard = RunGuard::enter(self);
        self.runs.set(self.runs.get() + 1);
        let mut body = self.body.borrow_mut();
        (*body)();
    }
}

/// Pops the observer stack and clears the running flag, even on unwind
struct RunGuard {
    effect: Rc<EffectInner>,
}

impl RunGuard {
    fn enter(effect: &Rc<EffectInner>) -> Self {
        effect.running.set(true);
        OBSERVERS.with(|o| o.borrow_mut().push(Some(Rc::clone(effect))));
        Self {
            effect: Rc::clone(effect),
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        OBSERVERS.with(|o| o.borrow_mut().pop());
        self.effect.running.set(false);
    }
}

/// Handle to a registered effect. Dropping it disposes the effect.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Run the body now, regardless of whether anything changed
    pub fn run(&self) {
        self.inner.run();
    }

    /// How many times the body has run, including the initial run
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    pub fn dispose(self) {}
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.inner.disposed.set(true);
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("runs", &self.inner.runs.get())
            .finish_non_exhaustive()
    }
}

/// Register `body` as an effect and run it once immediately
pub fn effect(body: impl FnMut() + 'static) -> Effect {
    let inner = Rc::new(EffectInner {
        body: RefCell::new(Box::new(body)),
        running: Cell::new(false),
        disposed: Cell::new(false),
        runs: Cell::new(0),
    });
    inner.run();
    Effect { inner }
}

/// Run `f` without registering dependencies for the enclosing effect
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    OBSERVERS.with(|o| o.borrow_mut().push(None));
    let result = f();
    OBSERVERS.with(|o| o.borrow_mut().pop());
    result
}

fn schedule(effect: Rc<EffectInner>) {
    let deferred = BATCH.with(|batch| {
        let mut batch = batch.borrow_mut();
        if batch.depth == 0 {
            return false;
        }
        if !batch.pending.iter().any(|p| Rc::ptr_eq(p, &effect)) {
            batch.pending.push(Rc::clone(&effect));
        }
        true
    });
    if !deferred {
        effect.run();
    }
}

/// RAII scope deferring effect re-runs. Only the outermost scope flushes.
pub struct BatchScope {
    _private: (),
}

impl BatchScope {
    pub fn new() -> Self {
        BATCH.with(|batch| batch.borrow_mut().depth += 1);
        Self { _private: () }
    }
}

impl Default for BatchScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        let pending = BATCH.with(|batch| {
            let mut batch = batch.borrow_mut();
            batch.depth -= 1;
            if batch.depth > 0 {
                return Vec::new();
            }
            std::mem::take(&mut batch.pending)
        });
        if std::thread::panicking() {
            return;
        }
        for effect in pending {
            effect.run();
        }
    }
}

/// Run `f` inside a [`BatchScope`]
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let _scope = BatchScope::new();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_get_set() {
        let cell = Ref::new(1);
        assert_eq!(cell.get(), 1);
        cell.set(2);
        assert_eq!(cell.get(), 2);
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let cell = Ref::new("a".to_string());
        cell.set("a".to_string());
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn test_update_in_place() {
        let cell = Ref::new(vec![1]);
        cell.update(|v| v.push(2));
        assert_eq!(cell.get(), vec![1, 2]);
        assert_eq!(cell.version(), 1);

        cell.update(|_| {});
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Ref::new(0);
        let b = a.clone();
        b.set(5);
        assert_eq!(a.get(), 5);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Ref::new(5)));
    }

    #[test]
    fn test_effect_runs_immediately_and_on_change() {
        let source = Ref::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = source.clone();
        let log = Rc::clone(&seen);
        let fx = effect(move || log.borrow_mut().push(s.get()));

        source.set(2);
        source.set(3);

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(fx.run_count(), 3);
    }

    #[test]
    fn test_effect_can_write_other_ref() {
        let source = Ref::new(2);
        let doubled = Ref::new(0);

        let (s, d) = (source.clone(), doubled.clone());
        let _fx = effect(move || d.set(s.get() * 2));

        assert_eq!(doubled.get(), 4);
        source.set(10);
        assert_eq!(doubled.get(), 20);
    }

    #[test]
    fn test_dropped_effect_stops() {
        let source = Ref::new(0);
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (source.clone(), Rc::clone(&runs));
        let fx = effect(move || {
            s.get();
            r.set(r.get() + 1);
        });
        fx.dispose();

        source.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_batch_runs_effect_once() {
        let a = Ref::new(0);
        let b = Ref::new(0);
        let sums = Rc::new(RefCell::new(Vec::new()));

        let (ra, rb, log) = (a.clone(), b.clone(), Rc::clone(&sums));
        let fx = effect(move || log.borrow_mut().push(ra.get() + rb.get()));

        batch(|| {
            a.set(1);
            b.set(2);
            a.set(3);
        });

        assert_eq!(*sums.borrow(), vec![0, 5]);
        assert_eq!(fx.run_count(), 2);
    }

    #[test]
    fn test_nested_batch_flushes_at_outermost() {
        let a = Ref::new(0);
        let runs = Rc::new(Cell::new(0));

        let (ra, r) = (a.clone(), Rc::clone(&runs));
        let _fx = effect(move || {
            ra.get();
            r.set(r.get() + 1);
        });

        {
            let _outer = BatchScope::new();
            {
                let _inner = BatchScope::new();
                a.set(1);
            }
            assert_eq!(runs.get(), 1);
            a.set(2);
        }
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_untracked_read_does_not_subscribe() {
        let tracked = Ref::new(0);
        let ignored = Ref::new(0);
        let runs = Rc::new(Cell::new(0));

        let (t, i, r) = (tracked.clone(), ignored.clone(), Rc::clone(&runs));
        let _fx = effect(move || {
            t.get();
            untracked(|| i.get());
            r.set(r.get() + 1);
        });

        ignored.set(1);
        assert_eq!(runs.get(), 1);
        tracked.set(1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_branch_no_longer_read_stops_triggering() {
        let use_a = Ref::new(true);
        let a = Ref::new(0);
        let b = Ref::new(0);
        let runs = Rc::new(Cell::new(0));

        let (flag, ra, rb, r) = (use_a.clone(), a.clone(), b.clone(), Rc::clone(&runs));
        let _fx = effect(move || {
            if flag.get() {
                ra.get();
            } else {
                rb.get();
            }
            r.set(r.get() + 1);
        });

        use_a.set(false);
        assert_eq!(runs.get(), 2);

        a.set(1);
        assert_eq!(runs.get(), 2);
        b.set(1);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_get_untracked_does_not_subscribe() {
        let source = Ref::new(1);
        let runs = Rc::new(Cell::new(0));

        let (s, r) = (source.clone(), Rc::clone(&runs));
        let _fx = effect(move || {
            assert_eq!(s.get_untracked(), s.get_untracked());
            r.set(r.get() + 1);
        });

        source.set(2);
        assert_eq!(runs.get(), 1);
        assert_eq!(source.get_untracked(), 2);
    }

    #[test]
    fn test_effect_is_not_reentered() {
        let source = Ref::new(0);
        let s = source.clone();
        let fx = effect(move || {
            let v = s.get();
            if v < 5 {
                s.set(v + 1);
            }
        });

        assert_eq!(source.get(), 1);
        assert_eq!(fx.run_count(), 1);
    }
}
