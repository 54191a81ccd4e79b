//! # Intrusive Per-CPU Free List
//!
//! Free pages carry their own bookkeeping: the first word of every free page
//! holds the physical address of the next free page on the same list. No
//! memory outside the managed pages is used to track them.
//!
//! ```text
//!  head ──► ┌──────────┬──────────────┐     ┌──────────┬──────────────┐
//!           │ next  ───┼─ junk ...    │ ──► │ next=NIL │ junk ...     │
//!           └──────────┴──────────────┘     └──────────┴──────────────┘
//!           ^ page base                     ^ page base
//! ```
//!
//! The storage of a page is a [`PageFrame`] union: raw bytes while allocated,
//! a [`FreeLink`] while free. Only [`FreeList::push`], [`FreeList::pop`] and
//! the scrubbing in the allocator switch between the two views.

use crate::phys_mapper::PhysMapper;
use core::ptr;
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};

#[allow(clippy::cast_possible_truncation)]
const PAGE_BYTES: usize = Size4K::SIZE as usize;

/// End-of-list marker. Never page aligned, so it cannot name a page.
const NIL: u64 = u64::MAX;

/// The link word stored at the start of a free page.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct FreeLink {
    next: u64,
}

impl FreeLink {
    const fn to(next: Option<PhysicalPage<Size4K>>) -> Self {
        match next {
            Some(page) => Self {
                next: page.base().as_u64(),
            },
            None => Self { next: NIL },
        }
    }

    const fn next(self) -> Option<PhysicalPage<Size4K>> {
        if self.next == NIL {
            None
        } else {
            PhysicalPage::from_aligned(PhysicalAddress::new(self.next))
        }
    }
}

/// One page of physical memory, viewed either as raw bytes or as a free-list node.
#[repr(C, align(4096))]
pub(crate) union PageFrame {
    #[cfg_attr(not(test), allow(dead_code))]
    bytes: [u8; PAGE_BYTES],
    link: FreeLink,
}

const _: () = assert!(size_of::<PageFrame>() == PAGE_BYTES);

impl PageFrame {
    /// Overwrites every byte of the page with `byte`.
    #[inline]
    pub(crate) fn fill(&mut self, byte: u8) {
        // SAFETY: `self` is a valid, exclusively borrowed PageFrame and every bit
        // pattern is a valid `[u8; PAGE_BYTES]`.
        unsafe { ptr::write_bytes(ptr::from_mut(self), byte, 1) }
    }

    #[inline]
    fn set_link(&mut self, next: Option<PhysicalPage<Size4K>>) {
        self.link = FreeLink::to(next);
    }

    /// Reads the link word.
    ///
    /// # Safety
    /// The frame must currently be linked into a free list.
    #[inline]
    unsafe fn link(&self) -> FreeLink {
        unsafe { self.link }
    }

    #[cfg(test)]
    fn bytes(&self) -> &[u8; PAGE_BYTES] {
        // SAFETY: every bit pattern is valid for a byte array.
        unsafe { &self.bytes }
    }
}

/// LIFO list of free pages owned by one CPU.
///
/// # Invariants
/// - Every page reachable from `head` is free, lies in the managed range and
///   appears exactly once.
/// - `len` equals the number of pages reachable from `head`.
///
/// A `FreeList` is only ever touched while its owning lock is held.
#[derive(Debug)]
pub(crate) struct FreeList {
    head: Option<PhysicalPage<Size4K>>,
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Forgets every page on the list without touching page memory.
    pub(crate) const fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Links `page` in as the new head.
    ///
    /// # Safety
    /// - `page` must be mapped by `mapper` and owned by the caller (allocated,
    ///   on no list).
    pub(crate) unsafe fn push<M: PhysMapper>(&mut self, mapper: &M, page: PhysicalPage<Size4K>) {
        let frame = unsafe { mapper.phys_to_mut::<PageFrame>(page.base()) };
        frame.set_link(self.head);
        self.head = Some(page);
        self.len += 1;
    }

    /// Unlinks and returns the head, if any.
    ///
    /// # Safety
    /// - Every page on the list must be mapped by `mapper`.
    pub(crate) unsafe fn pop<M: PhysMapper>(&mut self, mapper: &M) -> Option<PhysicalPage<Size4K>> {
        let page = self.head?;
        let frame = unsafe { mapper.phys_to_mut::<PageFrame>(page.base()) };
        self.head = unsafe { frame.link() }.next();
        self.len -= 1;
        Some(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::UnsafeCell;

    /// Physical address of the first fake RAM page.
    const BASE: u64 = 0x4000;

    struct Ram {
        frames: Vec<UnsafeCell<PageFrame>>,
    }

    impl Ram {
        fn new(pages: usize) -> Self {
            let frames = (0..pages)
                .map(|_| {
                    UnsafeCell::new(PageFrame {
                        bytes: [0; PAGE_BYTES],
                    })
                })
                .collect();
            Self { frames }
        }

        fn page(idx: u64) -> PhysicalPage<Size4K> {
            PhysicalPage::from_aligned(PhysicalAddress::new(BASE + idx * Size4K::SIZE)).unwrap()
        }

        fn frame(&self, page: PhysicalPage<Size4K>) -> &PageFrame {
            unsafe { &*self.phys_to_ptr::<PageFrame>(page.base()) }
        }
    }

    impl PhysMapper for Ram {
        fn phys_to_ptr<T>(&self, pa: PhysicalAddress) -> *mut T {
            let idx = usize::try_from((pa.as_u64() - BASE) / Size4K::SIZE).unwrap();
            self.frames[idx].get().cast()
        }
    }

    #[test]
    fn push_pop_is_lifo() {
        let ram = Ram::new(4);
        let mut list = FreeList::new();
        assert_eq!(list.len(), 0);

        unsafe {
            for i in 0..4 {
                list.push(&ram, Ram::page(i));
            }
        }
        assert_eq!(list.len(), 4);

        for i in (0..4).rev() {
            assert_eq!(unsafe { list.pop(&ram) }, Some(Ram::page(i)));
        }
        assert_eq!(list.len(), 0);
        assert_eq!(unsafe { list.pop(&ram) }, None);
    }

    #[test]
    fn link_lives_in_first_word_of_page() {
        let ram = Ram::new(2);
        let mut list = FreeList::new();
        unsafe {
            list.push(&ram, Ram::page(0));
            list.push(&ram, Ram::page(1));
        }

        let bytes = ram.frame(Ram::page(1)).bytes();
        let next = u64::from_ne_bytes(bytes[..8].try_into().unwrap());
        assert_eq!(next, Ram::page(0).base().as_u64());

        let tail = ram.frame(Ram::page(0)).bytes();
        assert_eq!(u64::from_ne_bytes(tail[..8].try_into().unwrap()), NIL);
    }

    #[test]
    fn fill_covers_whole_page() {
        let ram = Ram::new(1);
        let frame = unsafe { ram.phys_to_mut::<PageFrame>(Ram::page(0).base()) };
        frame.fill(0xAB);
        assert!(ram.frame(Ram::page(0)).bytes().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn clear_forgets_pages() {
        let ram = Ram::new(2);
        let mut list = FreeList::new();
        unsafe {
            list.push(&ram, Ram::page(0));
            list.push(&ram, Ram::page(1));
        }
        list.clear();
        assert_eq!(list.len(), 0);
    }
}
