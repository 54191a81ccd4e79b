//! # Kernel Physical Page Allocator
//!
//! Hands out and takes back 4 KiB pages of physical memory between the end of
//! the kernel image and the top of RAM. The bookkeeping is split per CPU so
//! that CPUs rarely contend for the same lock.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  PageAllocator                      │
//! │    • allocate / release / free-page counts          │
//! │    • one "kmem" SpinLock<FreeList> per CPU          │
//! │    • steals from other CPUs when the local list     │
//! │      runs dry                                       │
//! └───────┬─────────────────┬───────────────────┬───────┘
//!         │                 │                   │
//! ┌───────▼───────┐ ┌───────▼───────┐ ┌─────────▼───────┐
//! │   Platform    │ │  PhysMapper   │ │  MemoryLayout   │
//! │ • current CPU │ │ • pa -> ptr   │ │ • kernel_end .. │
//! │ • defer IRQs  │ │ • HHDM or id  │ │   phys_top      │
//! └───────────────┘ └───────────────┘ └─────────────────┘
//! ```
//!
//! ## Physical Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │  Firmware, low memory           │
//! PHYS_LOAD   ├─────────────────────────────────┤
//!             │  Kernel image                   │
//! kernel_end  ├─────────────────────────────────┤  <- rounded up to 4 KiB
//!             │  Managed pages                  │
//!             │  (free lists live in here)      │
//! PHYS_TOP    └─────────────────────────────────┘
//! ```
//!
//! ## Page Contents
//!
//! Pages are scrubbed on every transition so stale data is easy to spot:
//! released pages are filled with [`FREE_JUNK`](kernel_info::memory::FREE_JUNK)
//! (except for the free-list link in the first word) and allocated pages are
//! filled with [`ALLOC_JUNK`](kernel_info::memory::ALLOC_JUNK).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_page_alloc::{IdentityPhysMapper, MemoryLayout, PageAllocator, Platform};
//! use kernel_sync::InterruptControl;
//!
//! struct Uniprocessor;
//!
//! impl InterruptControl for Uniprocessor {
//!     fn interrupts_enabled(&self) -> bool { false }
//!     fn disable_interrupts(&self) {}
//!     fn enable_interrupts(&self) {}
//! }
//!
//! impl Platform for Uniprocessor {
//!     fn current_cpu(&self) -> usize { 0 }
//! }
//!
//! static PAGES: PageAllocator<IdentityPhysMapper, Uniprocessor, 1> = PageAllocator::new(
//!     MemoryLayout::from_constants(PhysicalAddress::new(0x0020_0000)),
//!     IdentityPhysMapper,
//!     Uniprocessor,
//! );
//!
//! PAGES.initialize();
//! if let Some(page) = PAGES.allocate() {
//!     PAGES.release(page.base());
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod error;
mod free_list;
mod layout;
mod page_alloc;
mod phys_mapper;
mod platform;

pub use error::ReleaseError;
pub use layout::{ManagedPages, MemoryLayout};
pub use page_alloc::PageAllocator;
pub use phys_mapper::{HhdmPhysMapper, IdentityPhysMapper, PhysMapper};
#[cfg(target_arch = "x86_64")]
pub use platform::X86Platform;
pub use platform::Platform;

/// The allocator as the kernel instantiates it: physical memory reached
/// through the HHDM and one free list per configured CPU.
pub type KernelPageAllocator<P> =
    PageAllocator<HhdmPhysMapper, P, { kernel_info::memory::MAX_CPUS }>;
