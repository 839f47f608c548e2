pub const STACK_DEPTH: usize = 16;

/// Fixed-capacity call stack.
///
/// Holds the address of each CALL instruction still awaiting its RET.
/// Running out of room, or popping an empty stack, is reported as `None`
/// and the executor turns it into a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    entries: [u16; STACK_DEPTH],
    len: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self {
            entries: [0; STACK_DEPTH],
            len: 0,
        }
    }

    /// Returns `None` if the stack is already full.
    #[must_use]
    pub fn push(&mut self, addr: u16) -> Option<()> {
        let slot = self.entries.get_mut(self.len)?;
        *slot = addr;
        self.len += 1;
        Some(())
    }

    pub fn pop(&mut self) -> Option<u16> {
        self.len = self.len.checked_sub(1)?;
        Some(self.entries[self.len])
    }

    /// Live entries, oldest first.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries[..self.len]
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_order() {
        let mut stack = CallStack::new();
        stack.push(0x200).unwrap();
        stack.push(0x300).unwrap();
        assert_eq!(stack.as_slice(), &[0x200, 0x300]);
        assert_eq!(stack.pop(), Some(0x300));
        assert_eq!(stack.pop(), Some(0x200));
        assert!(stack.as_slice().is_empty());
    }

    #[test]
    fn empty_pop_is_none() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), None);
        assert!(stack.as_slice().is_empty());
    }

    #[test]
    fn seventeenth_push_is_refused() {
        let mut stack = CallStack::new();
        for addr in 0..STACK_DEPTH as u16 {
            assert!(stack.push(addr).is_some());
        }
        assert!(stack.push(0xFFF).is_none());
        assert_eq!(stack.as_slice().len(), STACK_DEPTH);
        assert_eq!(stack.pop(), Some(15));
    }
}
