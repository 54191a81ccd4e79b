//! # Kernel Memory Configuration
//!
//! Build-time layout constants shared by the physical page allocator and the
//! kernel that hosts it. Everything here is `const` and checked with
//! compile-time assertions, so a bad configuration fails the build instead of
//! corrupting the free lists at runtime.
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//! kernel end  ├─────────────────────────────────┤ (linker symbol, runtime)
//!             │    Available RAM                │
//!             │  (Managed by the page allocator)│
//! PHYS_TOP    └─────────────────────────────────┘ 0x0800_0000 (128 MiB)
//! ```
//!
//! The end of the kernel image is only known after linking and is therefore
//! not a constant here; the boot code hands it to the allocator at runtime.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
