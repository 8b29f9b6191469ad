use std::fmt;

/// Tracks scanner recursion depth so that deeply nested arrays and objects
/// fail with a [`crate::Error::Syntax`] instead of overflowing the call stack.
///
/// ```
/// use json_nav::Document;
///
/// // A hundred levels of nesting is well within the default limit.
/// let nested: String = "[".repeat(100) + &"]".repeat(100);
/// assert!(Document::parse(&nested).is_ok());
/// ```
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct LimitTracker {
    current: usize,
    /// High water mark reached over the lifetime of this tracker.
    pub high: usize,
    /// Configured recursion limit.
    pub limit: usize,
}

impl Default for LimitTracker {
    fn default() -> Self {
        Self {
            current: 0,
            high: 0,
            limit: 512, // deep enough for realistic documents, shallow enough to not blow the stack
        }
    }
}

impl LimitTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            current: 0,
            high: 0,
            limit,
        }
    }

    pub fn limited(&self) -> bool {
        self.current > self.limit
    }

    pub fn consume(&mut self) {
        self.current += 1;
        if self.current > self.high {
            self.high = self.current;
        }
    }

    pub fn release(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

impl fmt::Debug for LimitTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recursion limit: {}, high: {}", self.limit, self.high)
    }
}
