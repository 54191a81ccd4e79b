//! # Managed Range

use kernel_info::memory::PHYS_TOP;
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};

/// The physical span owned by the page allocator: from the end of the kernel
/// image up to the top of physical memory.
///
/// Only whole pages are managed. The start is rounded up to the next page
/// boundary and a trailing partial page below `phys_top` is never used. An
/// empty or inverted range is valid and simply contains no pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    kernel_end: PhysicalAddress,
    phys_top: PhysicalAddress,
}

impl MemoryLayout {
    #[must_use]
    pub const fn new(kernel_end: PhysicalAddress, phys_top: PhysicalAddress) -> Self {
        Self {
            kernel_end,
            phys_top,
        }
    }

    /// Layout ending at the configured [`PHYS_TOP`].
    #[must_use]
    pub const fn from_constants(kernel_end: PhysicalAddress) -> Self {
        Self::new(kernel_end, PHYS_TOP)
    }

    /// First address after the kernel image.
    #[inline]
    #[must_use]
    pub const fn kernel_end(&self) -> PhysicalAddress {
        self.kernel_end
    }

    /// First address past usable RAM.
    #[inline]
    #[must_use]
    pub const fn phys_top(&self) -> PhysicalAddress {
        self.phys_top
    }

    /// Whether `pa` lies in `[kernel_end, phys_top)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, pa: PhysicalAddress) -> bool {
        self.kernel_end <= pa && pa < self.phys_top
    }

    /// The lowest whole page inside the range, if there is one.
    #[must_use]
    pub fn first_page(&self) -> Option<PhysicalPage<Size4K>> {
        let base = self.kernel_end.align_up::<Size4K>()?;
        let end = base.checked_add(Size4K::SIZE)?;
        (end <= self.phys_top).then_some(base.page::<Size4K>())
    }

    /// Number of whole pages inside the range.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.first_page().map_or(0, |first| {
            (self.phys_top.as_u64() - first.base().as_u64()) >> Size4K::SHIFT
        })
    }

    /// Every whole page of the range in ascending address order.
    #[must_use]
    pub fn pages(&self) -> ManagedPages {
        ManagedPages {
            next: self.first_page(),
            phys_top: self.phys_top,
        }
    }
}

/// Iterator over the pages of a [`MemoryLayout`].
#[derive(Debug, Clone)]
pub struct ManagedPages {
    next: Option<PhysicalPage<Size4K>>,
    phys_top: PhysicalAddress,
}

impl Iterator for ManagedPages {
    type Item = PhysicalPage<Size4K>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.next?;
        let end = page.base().checked_add(Size4K::SIZE)?;
        if end > self.phys_top {
            self.next = None;
            return None;
        }
        self.next = page.checked_next();
        Some(page)
    }
}
