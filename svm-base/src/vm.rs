//! Virtual Machine context implementation.
//!
//! All storage is preallocated with fixed capacity. Nothing here grows: a
//! push onto a full stack is refused and reported to the caller.

/// Operand stack capacity.
pub const STACK_MAX: usize = 1024;
/// Return stack capacity.
pub const RET_STACK_MAX: usize = 256;
/// Number of memory cells.
pub const MEM_SIZE: usize = 1024;

/// Bounded LIFO over an inline array.
///
/// ```
/// # use svm_base::vm::FixedStack;
/// let mut stack = FixedStack::<i32, 2>::new();
/// assert_eq!(stack.top(), None);
///
/// assert_eq!(stack.push(1), Ok(()));
/// assert_eq!(stack.push(2), Ok(()));
/// assert_eq!(stack.push(3), Err(3)); // full
///
/// assert_eq!(stack.pop(), Some(2));
/// assert_eq!(stack.top(), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct FixedStack<T, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> FixedStack<T, N> {
    pub fn new() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }

    /// Pushes value. Gives the value back if the stack is full.
    pub fn push(&mut self, v: T) -> Result<(), T> {
        let Some(slot) = self.items.get_mut(self.len) else {
            return Err(v);
        };
        *slot = v;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        let idx = self.len.checked_sub(1)?;
        self.len = idx;
        Some(self.items[idx])
    }

    /// Current top, [`None`] on empty stack.
    pub fn top(&self) -> Option<T> {
        self.len.checked_sub(1).map(|idx| self.items[idx])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Iterates from top to bottom.
    pub fn iter_top_down(&self) -> impl Iterator<Item = &T> + '_ {
        self.items[..self.len].iter().rev()
    }

    /// Live part of the stack, bottom first.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }
}

impl<T: Copy + Default, const N: usize> Default for FixedStack<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat word-addressed memory.
#[derive(Clone, Debug)]
pub struct Memory {
    cells: [i32; MEM_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Self {
            cells: [0; MEM_SIZE],
        }
    }

    /// Reads cell. Negative or too big index gives [`None`].
    pub fn get(&self, index: i32) -> Option<i32> {
        usize::try_from(index)
            .ok()
            .and_then(|idx| self.cells.get(idx))
            .copied()
    }

    pub fn get_mut(&mut self, index: i32) -> Option<&mut i32> {
        usize::try_from(index)
            .ok()
            .and_then(|idx| self.cells.get_mut(idx))
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells = [0; MEM_SIZE];
    }
}
impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Represents full Virtual Machine context.
#[derive(Clone, Debug)]
pub struct VMContext {
    pub stack: FixedStack<i32, STACK_MAX>,
    pub ret_stack: FixedStack<u32, RET_STACK_MAX>,
    pub memory: Memory,
    /// Byte offset of the next instruction.
    pub pc: usize,
    pub running: bool,
}

impl Default for VMContext {
    fn default() -> Self {
        Self::new()
    }
}
impl VMContext {
    /// Allocate new context: zeroed memory, empty stacks, `pc = 0`, not running.
    pub fn new() -> Self {
        Self {
            stack: FixedStack::new(),
            ret_stack: FixedStack::new(),
            memory: Memory::new(),
            pc: 0,
            running: false,
        }
    }

    /// Brings context back to the freshly allocated state.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.ret_stack.clear();
        self.memory.clear();
        self.pc = 0;
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_bounds() {
        let mut stack = FixedStack::<i32, STACK_MAX>::new();
        for v in 0..STACK_MAX as i32 {
            assert_eq!(stack.push(v), Ok(()));
        }

        assert_eq!(stack.len(), STACK_MAX);
        assert_eq!(stack.push(-1), Err(-1));
        assert_eq!(stack.top(), Some(STACK_MAX as i32 - 1));

        while stack.pop().is_some() {}

        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.top(), None);
    }

    #[test]
    fn stack_order() {
        let mut stack = FixedStack::<u32, 4>::new();
        for v in [10, 20, 30] {
            stack.push(v).unwrap();
        }

        assert_eq!(stack.iter_top_down().copied().collect::<Vec<_>>(), [30, 20, 10]);
        assert_eq!(stack.as_slice(), &[10, 20, 30]);
        assert_eq!(stack.capacity(), 4);
    }

    #[test]
    #[rustfmt::skip]
    fn memory_bounds() {
        let mut mem = Memory::new();
        let cases = [
            (0,                      true),
            (MEM_SIZE as i32 - 1,    true),
            (MEM_SIZE as i32,        false),
            (-1,                     false),
            (i32::MIN,               false),
            (i32::MAX,               false),
        ];

        for (idx, valid) in cases {
            assert_eq!(mem.get(idx).is_some(), valid, "index {idx}");
            assert_eq!(mem.get_mut(idx).is_some(), valid, "index {idx}");
        }

        *mem.get_mut(7).unwrap() = 42;
        assert_eq!(mem.get(7), Some(42));
        assert!(mem.cells().iter().filter(|c| **c != 0).count() == 1);
    }

    #[test]
    fn context_reset() {
        let mut ctx = VMContext::new();
        ctx.stack.push(1).unwrap();
        ctx.ret_stack.push(5).unwrap();
        *ctx.memory.get_mut(3).unwrap() = 9;
        ctx.pc = 17;
        ctx.running = true;

        ctx.reset();

        assert!(ctx.stack.is_empty());
        assert!(ctx.ret_stack.is_empty());
        assert_eq!(ctx.memory.get(3), Some(0));
        assert_eq!(ctx.pc, 0);
        assert!(!ctx.running);
    }
}
