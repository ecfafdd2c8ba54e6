use log::*;

use crate::{Handle, MemoryFault};

/// The handle of whichever array is currently being executed.
pub const PROGRAM_HANDLE: Handle = 0;
/// The largest array Allocation will make, in words (4 GiB).
pub const MAX_ARRAY_WORDS: u32 = 1 << 30;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Slot {
    Live(Box<[u32]>),
    Vacant,
}

/// Every array the machine knows about, addressed by handle.
///
/// Abandoned handles go on a stack and are handed out again (most recently
/// abandoned first) before any new handle gets minted.
#[derive(Clone, Debug)]
pub struct Arena {
    slots: Vec<Slot>,
    vacant: Vec<Handle>,
}

impl Arena {
    /// Make an arena whose program array (handle 0) holds `program`.
    pub fn new(program: Vec<u32>) -> Arena {
        return Arena {
            slots: vec![Slot::Live(program.into_boxed_slice())],
            vacant: Vec::new(),
        };
    }

    /// Hand out a zeroed array of `size` words. If it can't be had, nothing
    /// changes and the free stack is left as it was.
    pub fn allocate(&mut self, size: u32) -> Result<Handle, MemoryFault> {
        if size > MAX_ARRAY_WORDS {
            return Err(MemoryFault::Exhausted);
        }
        let mut array = Vec::new();
        array
            .try_reserve_exact(size as usize)
            .map_err(|_| MemoryFault::Exhausted)?;
        array.resize(size as usize, 0u32);
        let array = array.into_boxed_slice();
        let handle = match self.vacant.pop() {
            Some(handle) => {
                self.slots[handle as usize] = Slot::Live(array);
                handle
            }
            None => {
                let handle =
                    Handle::try_from(self.slots.len()).map_err(|_| MemoryFault::Exhausted)?;
                self.slots.push(Slot::Live(array));
                handle
            }
        };
        debug!("Allocated array {handle} ({size} words)");
        Ok(handle)
    }

    pub fn free(&mut self, handle: Handle) -> Result<(), MemoryFault> {
        if handle == PROGRAM_HANDLE {
            // The program array has to outlive the program.
            return Err(MemoryFault::InvalidHandle { handle });
        }
        self.get(handle)?;
        self.slots[handle as usize] = Slot::Vacant;
        self.vacant.push(handle);
        debug!("Abandoned array {handle}");
        Ok(())
    }

    pub fn read_word(&self, handle: Handle, offset: u32) -> Result<u32, MemoryFault> {
        let array = self.get(handle)?;
        array
            .get(offset as usize)
            .copied()
            .ok_or(MemoryFault::OutOfBounds {
                handle,
                offset,
                len: array.len(),
            })
    }

    pub fn write_word(&mut self, handle: Handle, offset: u32, value: u32) -> Result<(), MemoryFault> {
        let array = self.get_mut(handle)?;
        let len = array.len();
        match array.get_mut(offset as usize) {
            Some(word) => {
                *word = value;
                Ok(())
            }
            None => Err(MemoryFault::OutOfBounds {
                handle,
                offset,
                len,
            }),
        }
    }

    /// Replace the program array with a copy of the array at `handle`.
    ///
    /// Loading handle 0 is a no-op. The source array stays where it is; the
    /// program gets its own copy so later writes to the source can't reach
    /// it.
    pub fn load_as_program(&mut self, handle: Handle) -> Result<(), MemoryFault> {
        if handle == PROGRAM_HANDLE {
            return Ok(());
        }
        let copy = self.get(handle)?.to_vec().into_boxed_slice();
        debug!("Loading array {handle} ({} words) as the program", copy.len());
        self.slots[PROGRAM_HANDLE as usize] = Slot::Live(copy);
        Ok(())
    }

    pub fn program(&self) -> &[u32] {
        match &self.slots[PROGRAM_HANDLE as usize] {
            Slot::Live(array) => array,
            Slot::Vacant => unreachable!("the program array can't be abandoned"),
        }
    }

    /// Whether `handle` currently names a live array.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_ok()
    }

    /// How many arrays are live, the program included.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    fn get(&self, handle: Handle) -> Result<&[u32], MemoryFault> {
        match self.slots.get(handle as usize) {
            Some(Slot::Live(array)) => Ok(array),
            Some(Slot::Vacant) => Err(MemoryFault::UseAfterFree { handle }),
            None => Err(MemoryFault::InvalidHandle { handle }),
        }
    }

    fn get_mut(&mut self, handle: Handle) -> Result<&mut [u32], MemoryFault> {
        match self.slots.get_mut(handle as usize) {
            Some(Slot::Live(array)) => Ok(array),
            Some(Slot::Vacant) => Err(MemoryFault::UseAfterFree { handle }),
            None => Err(MemoryFault::InvalidHandle { handle }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandoned_handles_come_back_last_in_first_out() {
        let mut arena = Arena::new(vec![]);
        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(1).unwrap();
        let c = arena.allocate(1).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
        arena.free(a).unwrap();
        arena.free(c).unwrap();
        assert_eq!(arena.allocate(7).unwrap(), c);
        assert_eq!(arena.allocate(7).unwrap(), a);
        assert_eq!(arena.allocate(7).unwrap(), 4);
    }

    #[test]
    fn reused_handles_are_zeroed_and_resized() {
        let mut arena = Arena::new(vec![]);
        let handle = arena.allocate(3).unwrap();
        arena.write_word(handle, 2, 0xDEADBEEF).unwrap();
        arena.free(handle).unwrap();
        let again = arena.allocate(5).unwrap();
        assert_eq!(again, handle);
        assert_eq!(arena.read_word(again, 2), Ok(0));
        assert_eq!(arena.read_word(again, 4), Ok(0));
        assert!(arena.read_word(again, 5).is_err());
    }

    #[test]
    fn failed_allocations_change_nothing() {
        let mut arena = Arena::new(vec![]);
        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(1).unwrap();
        arena.free(a).unwrap();
        assert_eq!(arena.allocate(u32::MAX), Err(MemoryFault::Exhausted));
        assert_eq!(
            arena.allocate(MAX_ARRAY_WORDS + 1),
            Err(MemoryFault::Exhausted)
        );
        assert_eq!(arena.live_count(), 2);
        assert!(!arena.is_live(a));
        assert_eq!(arena.allocate(1).unwrap(), a);
        assert_eq!(arena.allocate(1).unwrap(), b + 1);
    }

    #[test]
    fn empty_arrays_are_legal_but_hold_nothing() {
        let mut arena = Arena::new(vec![]);
        let handle = arena.allocate(0).unwrap();
        assert!(arena.is_live(handle));
        assert_eq!(
            arena.read_word(handle, 0),
            Err(MemoryFault::OutOfBounds {
                handle,
                offset: 0,
                len: 0
            })
        );
    }

    #[test]
    fn bad_handles_are_told_apart() {
        let mut arena = Arena::new(vec![1, 2, 3]);
        assert_eq!(
            arena.free(9),
            Err(MemoryFault::InvalidHandle { handle: 9 })
        );
        let handle = arena.allocate(1).unwrap();
        arena.free(handle).unwrap();
        assert_eq!(
            arena.free(handle),
            Err(MemoryFault::UseAfterFree { handle })
        );
        assert_eq!(
            arena.write_word(handle, 0, 1),
            Err(MemoryFault::UseAfterFree { handle })
        );
        assert_eq!(
            arena.free(PROGRAM_HANDLE),
            Err(MemoryFault::InvalidHandle { handle: 0 })
        );
        assert_eq!(arena.program(), &[1, 2, 3]);
    }

    #[test]
    fn loading_copies_instead_of_aliasing() {
        let mut arena = Arena::new(vec![7]);
        let handle = arena.allocate(2).unwrap();
        arena.write_word(handle, 0, 11).unwrap();
        arena.load_as_program(handle).unwrap();
        arena.write_word(handle, 0, 99).unwrap();
        assert_eq!(arena.program(), &[11, 0]);
        assert_eq!(arena.read_word(handle, 0), Ok(99));
        assert_eq!(arena.live_count(), 2);
    }

    #[test]
    fn loading_a_dead_array_leaves_the_program_alone() {
        let mut arena = Arena::new(vec![7]);
        let handle = arena.allocate(2).unwrap();
        arena.free(handle).unwrap();
        assert_eq!(
            arena.load_as_program(handle),
            Err(MemoryFault::UseAfterFree { handle })
        );
        assert_eq!(arena.program(), &[7]);
    }
}
