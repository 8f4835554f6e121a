//! Mutual exclusion.

/// Exclusive access to a value of type `T`.
///
/// Access is closure-scoped: the guard never escapes, so a lock cannot be
/// held across a blocking wait by accident. Nested `lock` calls on the same
/// instance deadlock (host) or panic (polling); neither is supported.
pub trait Lock<T>: Send + Sync {
    /// Wrap `value`.
    fn new(value: T) -> Self
    where
        Self: Sized;

    /// Run `f` with exclusive access, blocking until available.
    fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;

    /// Run `f` only if the lock is free right now.
    fn try_lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>;

    /// Consume the lock and return the value.
    fn into_inner(self) -> T
    where
        Self: Sized;
}
