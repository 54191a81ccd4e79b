//! # Per-CPU Page Allocator
//!
//! ```text
//! allocate()
//!   │
//!   ├─► pop from the current CPU's list ──────────────┐
//!   │     empty                                       │
//!   ├─► steal: lists[0], lists[1], ... (not our own)  ├─► fill ALLOC_JUNK ─► Some(page)
//!   │     one lock at a time, first non-empty wins ───┘
//!   │     all empty
//!   └─► None
//!
//! release(pa)
//!   └─► validate ─► fill FREE_JUNK ─► push on the current CPU's list
//! ```
//!
//! Every list is guarded by its own `"kmem"` spin lock and every critical
//! section runs with local interrupts deferred, because an interrupt handler
//! that allocated on a CPU already holding its own list lock would spin
//! forever. No path ever holds two list locks.

use crate::error::ReleaseError;
use crate::free_list::{FreeList, PageFrame};
use crate::layout::MemoryLayout;
use crate::phys_mapper::PhysMapper;
use crate::platform::Platform;
use kernel_info::memory::{ALLOC_JUNK, FREE_JUNK};
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};
use kernel_sync::{IrqGuard, SpinLock, SpinLockGuard};
use log::{error, info, trace, warn};

/// Debug name of every free-list lock.
const LOCK_NAME: &str = "kmem";

/// Physical page allocator with one free list per CPU.
///
/// - `M` makes physical pages addressable (see [`PhysMapper`]).
/// - `P` answers "which CPU am I on" and defers interrupts (see [`Platform`]).
/// - `CPUS` is the number of free lists.
///
/// The allocator is constructed explicitly (it can live in a `static`) and
/// seeded once with [`initialize`](Self::initialize).
pub struct PageAllocator<M, P, const CPUS: usize> {
    lists: [SpinLock<FreeList>; CPUS],
    layout: MemoryLayout,
    mapper: M,
    platform: P,
}

impl<M, P, const CPUS: usize> PageAllocator<M, P, CPUS>
where
    M: PhysMapper,
    P: Platform,
{
    /// Creates an allocator with every list empty.
    ///
    /// Nothing is handed out until [`initialize`](Self::initialize) has run.
    #[must_use]
    pub const fn new(layout: MemoryLayout, mapper: M, platform: P) -> Self {
        Self {
            lists: [const { SpinLock::named(LOCK_NAME, FreeList::new()) }; CPUS],
            layout,
            mapper,
            platform,
        }
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Empties every list, then releases each page of the managed range.
    ///
    /// Must run exactly once, on the boot CPU, before anything allocates.
    /// Since [`release`](Self::release) always targets the current CPU, the
    /// boot CPU's list receives every page; the other CPUs start empty and
    /// obtain pages by stealing.
    ///
    /// # Panics
    /// If the platform reports a CPU index outside `0..CPUS`.
    pub fn initialize(&self) {
        for list in &self.lists {
            list.lock_irq(&self.platform).clear();
        }

        let boot_cpu = {
            let _irq = IrqGuard::new(&self.platform);
            self.cpu_index()
        };
        match self.layout.first_page() {
            Some(first) => info!(
                "seeding {} pages from {} to {} on cpu {boot_cpu}",
                self.layout.page_count(),
                first.base(),
                self.layout.phys_top()
            ),
            None => warn!(
                "no whole page between {} and {}; allocator starts exhausted",
                self.layout.kernel_end(),
                self.layout.phys_top()
            ),
        }

        for page in self.layout.pages() {
            self.release(page.base());
        }
    }

    /// Hands out one page, or `None` if every list is empty.
    ///
    /// The returned page is filled with [`ALLOC_JUNK`].
    ///
    /// # Panics
    /// If the platform reports a CPU index outside `0..CPUS`.
    #[must_use]
    pub fn allocate(&self) -> Option<PhysicalPage<Size4K>> {
        let (cpu, local) = self.pop_local();
        let Some(page) = local.or_else(|| self.steal(cpu)) else {
            warn!("out of physical pages (cpu {cpu})");
            return None;
        };

        // SAFETY: the page was just unlinked, so it is exclusively ours.
        unsafe { self.frame(page) }.fill(ALLOC_JUNK);
        Some(page)
    }

    /// Returns a page to the current CPU's list.
    ///
    /// `pa` must come from [`allocate`](Self::allocate) (or be part of the
    /// managed range while [`initialize`](Self::initialize) runs). Releasing
    /// the same page twice is not detected and corrupts the lists.
    ///
    /// # Panics
    /// If `pa` is misaligned or outside the managed range; see
    /// [`check_release`](Self::check_release). No list is modified in that case.
    pub fn release(&self, pa: PhysicalAddress) {
        let page = match self.check_release(pa) {
            Ok(page) => page,
            Err(e) => {
                error!("kfree: {e}");
                panic!("kfree: {e}");
            }
        };

        // Fill with junk to catch dangling refs.
        // SAFETY: the caller owns the page until it is linked below.
        unsafe { self.frame(page) }.fill(FREE_JUNK);

        let _irq = IrqGuard::new(&self.platform);
        let mut list = self.current_list();
        // SAFETY: the page is in the managed range and on no list.
        unsafe { list.push(&self.mapper, page) };
    }

    /// Validates an address for [`release`](Self::release) without releasing it.
    ///
    /// # Errors
    /// - [`ReleaseError::Misaligned`] if `pa` is not page aligned.
    /// - [`ReleaseError::BelowKernelEnd`] if `pa` lies inside the kernel image.
    /// - [`ReleaseError::AbovePhysTop`] if the page does not end at or below
    ///   the top of RAM. With an unaligned top this rejects the partial last page.
    pub fn check_release(&self, pa: PhysicalAddress) -> Result<PhysicalPage<Size4K>, ReleaseError> {
        let Some(page) = PhysicalPage::from_aligned(pa) else {
            return Err(ReleaseError::Misaligned(pa));
        };
        if pa < self.layout.kernel_end() {
            return Err(ReleaseError::BelowKernelEnd {
                pa,
                kernel_end: self.layout.kernel_end(),
            });
        }
        let fits = pa
            .checked_add(Size4K::SIZE)
            .is_some_and(|end| end <= self.layout.phys_top());
        if !fits {
            return Err(ReleaseError::AbovePhysTop {
                pa,
                phys_top: self.layout.phys_top(),
            });
        }
        Ok(page)
    }

    /// Number of pages currently on `cpu`'s list.
    ///
    /// # Panics
    /// If `cpu >= CPUS`.
    #[must_use]
    pub fn free_pages(&self, cpu: usize) -> usize {
        self.lists[cpu].lock_irq(&self.platform).len()
    }

    /// Sum of [`free_pages`](Self::free_pages) over all CPUs.
    ///
    /// Lists are visited one at a time, so under concurrent use the result is
    /// not a snapshot.
    #[must_use]
    pub fn total_free_pages(&self) -> usize {
        self.lists
            .iter()
            .map(|list| list.lock_irq(&self.platform).len())
            .sum()
    }

    fn pop_local(&self) -> (usize, Option<PhysicalPage<Size4K>>) {
        let _irq = IrqGuard::new(&self.platform);
        let cpu = self.cpu_index();
        let mut list = self.lists[cpu].lock();
        // SAFETY: every listed page is in the managed range, which the mapper covers.
        (cpu, unsafe { list.pop(&self.mapper) })
    }

    /// Takes the head of the first non-empty list other than `thief`'s,
    /// scanning in ascending CPU order.
    fn steal(&self, thief: usize) -> Option<PhysicalPage<Size4K>> {
        for (victim, list) in self.lists.iter().enumerate() {
            if victim == thief {
                continue;
            }
            let mut list = list.lock_irq(&self.platform);
            // SAFETY: as in `pop_local`.
            let Some(page) = (unsafe { list.pop(&self.mapper) }) else {
                continue;
            };
            drop(list);
            trace!("cpu {thief} stole {page} from cpu {victim}");
            return Some(page);
        }
        None
    }

    /// The current CPU's list, locked. Interrupts must already be deferred.
    fn current_list(&self) -> SpinLockGuard<'_, FreeList> {
        let cpu = self.cpu_index();
        self.lists[cpu].lock()
    }

    fn cpu_index(&self) -> usize {
        let cpu = self.platform.current_cpu();
        assert!(
            cpu < CPUS,
            "cpu index {cpu} out of range for {CPUS} free lists"
        );
        cpu
    }

    /// # Safety
    /// The caller must own `page` exclusively for the lifetime of the reference.
    #[allow(clippy::mut_from_ref)]
    unsafe fn frame(&self, page: PhysicalPage<Size4K>) -> &mut PageFrame {
        unsafe { self.mapper.phys_to_mut::<PageFrame>(page.base()) }
    }
}
