use kernel_memory_addresses::PhysicalAddress;

/// Why an address may not be returned to the page allocator.
///
/// Every variant is a caller bug. [`PageAllocator::release`](crate::PageAllocator::release)
/// treats them as fatal; [`PageAllocator::check_release`](crate::PageAllocator::check_release)
/// reports them without halting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReleaseError {
    #[error("{0} is not page aligned")]
    Misaligned(PhysicalAddress),
    #[error("{pa} lies below the end of the kernel image at {kernel_end}")]
    BelowKernelEnd {
        pa: PhysicalAddress,
        kernel_end: PhysicalAddress,
    },
    #[error("page at {pa} does not fit below the top of physical memory at {phys_top}")]
    AbovePhysTop {
        pa: PhysicalAddress,
        phys_top: PhysicalAddress,
    },
}

impl ReleaseError {
    /// The rejected address.
    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        match *self {
            Self::Misaligned(pa)
            | Self::BelowKernelEnd { pa, .. }
            | Self::AbovePhysTop { pa, .. } => pa,
        }
    }
}
