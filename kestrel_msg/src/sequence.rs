//! Sequence numbering.
//!
//! Sequence ids start at 1; 0 means "nothing issued yet". On overflow the
//! counter wraps from `u32::MAX` back to 1, skipping 0, so a wrapped id never
//! looks like the initial state. Consumers compare ids for equality only.

/// Per-channel or per-client sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceCounter {
    value: u32,
}

impl SequenceCounter {
    /// Counter with nothing issued.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Counter resuming from `value`.
    pub const fn from_raw(value: u32) -> Self {
        Self { value }
    }

    /// Last issued id (0 if none).
    pub const fn current(&self) -> u32 {
        self.value
    }

    /// Id the next `advance` will return.
    pub const fn peek_next(&self) -> u32 {
        match self.value {
            u32::MAX => 1,
            v => v + 1,
        }
    }

    /// Issue the next id.
    pub fn advance(&mut self) -> u32 {
        self.value = self.peek_next();
        self.value
    }

    /// Whether any id has been issued.
    pub const fn has_issued(&self) -> bool {
        self.value != 0
    }
}
