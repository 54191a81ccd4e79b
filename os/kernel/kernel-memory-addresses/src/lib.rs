//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for physical addresses and page bases used by the
//! physical page allocator.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | Any byte address in physical memory. |
//! | [`PhysicalPage<S>`] | The page-aligned base of a physical page of size `S`. |
//!
//! A [`PhysicalPage`] can only be built from an address that is already aligned
//! ([`PhysicalPage::from_aligned`]) or by rounding ([`PhysicalPage::containing`]),
//! so code holding one never has to re-check alignment.
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x8020_1234);
//! assert!(!pa.is_aligned::<Size4K>());
//! assert!(PhysicalPage::<Size4K>::from_aligned(pa).is_none());
//!
//! let page = PhysicalPage::<Size4K>::containing(pa);
//! assert_eq!(page.base().as_u64(), 0x8020_1000);
//! assert_eq!(pa.align_up::<Size4K>(), Some(PhysicalAddress::new(0x8020_2000)));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_size;
mod physical_address;
mod physical_page;

pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;

/// Align `x` down to the nearest multiple of `a`.
///
/// `a` must be a non-zero power of two.
///
/// ```rust
/// # use kernel_memory_addresses::align_down;
/// assert_eq!(align_down(0, 4096), 0);
/// assert_eq!(align_down(4095, 4096), 0);
/// assert_eq!(align_down(8191, 4096), 4096);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`, or `None` if that overflows.
///
/// `a` must be a non-zero power of two.
///
/// ```rust
/// # use kernel_memory_addresses::align_up;
/// assert_eq!(align_up(0, 4096), Some(0));
/// assert_eq!(align_up(1, 4096), Some(4096));
/// assert_eq!(align_up(4096, 4096), Some(4096));
/// assert_eq!(align_up(u64::MAX, 4096), None);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> Option<u64> {
    match x.checked_add(a - 1) {
        Some(v) => Some(v & !(a - 1)),
        None => None,
    }
}
