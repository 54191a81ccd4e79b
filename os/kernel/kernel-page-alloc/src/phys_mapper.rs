//! # Physical Memory Access
//!
//! The allocator reads and writes the pages it manages (the free-list link
//! lives inside each free page, and pages are scrubbed on every transition), so
//! it needs a way to turn a physical address into a pointer it can use. The
//! strategy depends on how the kernel maps physical memory:
//!
//! - [`HhdmPhysMapper`]: every physical address is visible at `HHDM_BASE + pa`.
//! - [`IdentityPhysMapper`]: physical memory is identity mapped (`va == pa`).
//!
//! Tests provide their own mapper backed by an ordinary buffer.

use kernel_info::memory::HHDM_BASE;
use kernel_memory_addresses::PhysicalAddress;

/// Converts physical addresses to pointers in the current address space.
pub trait PhysMapper {
    /// Where `pa` is visible in the current address space.
    ///
    /// Computing the pointer is always safe; dereferencing it is not.
    fn phys_to_ptr<T>(&self, pa: PhysicalAddress) -> *mut T;

    /// Convert a physical address to a usable mutable reference.
    ///
    /// # Safety
    /// - `pa` must be mapped, writable and valid for a `T`.
    /// - The caller must have exclusive access to the referenced memory for `'a`.
    #[inline]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        // SAFETY: forwarded to the caller.
        unsafe { &mut *self.phys_to_ptr::<T>(pa) }
    }
}

/// [`PhysMapper`] for kernels with a higher-half direct map (HHDM).
///
/// # Safety
/// - The HHDM mapping must be present and cover the managed physical range.
#[derive(Debug, Default, Clone, Copy)]
pub struct HhdmPhysMapper;

impl PhysMapper for HhdmPhysMapper {
    #[inline]
    fn phys_to_ptr<T>(&self, pa: PhysicalAddress) -> *mut T {
        (HHDM_BASE + pa.as_u64()) as *mut T
    }
}

/// [`PhysMapper`] for kernels running with physical memory identity mapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityPhysMapper;

impl PhysMapper for IdentityPhysMapper {
    #[inline]
    fn phys_to_ptr<T>(&self, pa: PhysicalAddress) -> *mut T {
        pa.as_u64() as *mut T
    }
}
