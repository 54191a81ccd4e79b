//! # Kernel synchronization primitives
//!
//! A named spin lock and interrupt deferral, the two collaborators every
//! per-CPU critical section in the page allocator is built from:
//!
//! - [`SpinLock`]: test-and-test-and-set lock carrying a debug name.
//! - [`InterruptControl`] / [`IrqGuard`]: save-and-disable local interrupt
//!   delivery, restore the saved state on drop. Guards nest.
//! - [`SpinLock::lock_irq`]: both at once, released in the right order.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
pub mod hw;
pub mod irq;
mod spin_lock;

pub use irq::{InterruptControl, IrqGuard, IrqSpinLockGuard};
pub use spin_lock::{SpinLock, SpinLockGuard};
