/// The VM operand stack.
///
/// Pops return `None` on underflow; the runtime turns that into a fault
/// instead of panicking, since hand-assembled code can be unbalanced.
#[derive(Debug)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(256),
        }
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Removes the top `n` values, returned in push order.
    pub fn pop_n(&mut self, n: usize) -> Option<Vec<T>> {
        let start = self.items.len().checked_sub(n)?;
        Some(self.items.split_off(start))
    }

    /// Drops everything above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.items.truncate(depth);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.peek(), Some(&2));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_n_keeps_push_order() {
        let mut stack = Stack::new();
        for i in 0..5 {
            stack.push(i);
        }
        assert_eq!(stack.pop_n(3), Some(vec![2, 3, 4]));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop_n(3), None);
        assert_eq!(stack.pop_n(0), Some(vec![]));
    }

    #[test]
    fn test_truncate() {
        let mut stack = Stack::new();
        stack.push('a');
        stack.push('b');
        stack.push('c');
        stack.truncate(1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some(&'a'));
        stack.truncate(4);
        assert_eq!(stack.len(), 1);
    }
}
