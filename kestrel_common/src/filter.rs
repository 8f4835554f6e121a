//! Sample filter interface.
//!
//! A filter consumes one input sample and produces one output sample. Filter
//! design lives with the application; the hub only needs this contract.

/// One-in/one-out sample filter.
pub trait Filter<T>: Send {
    /// Feed one sample, return the filtered value.
    fn apply(&mut self, input: T) -> T;

    /// Forget internal history.
    fn reset(&mut self) {}
}

/// Filter that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl<T> Filter<T> for Passthrough {
    fn apply(&mut self, input: T) -> T {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_is_identity() {
        let mut f = Passthrough;
        assert_eq!(Filter::<f32>::apply(&mut f, 1.5), 1.5);
        Filter::<f32>::reset(&mut f);
        assert_eq!(Filter::<i32>::apply(&mut f, -3), -3);
    }
}
