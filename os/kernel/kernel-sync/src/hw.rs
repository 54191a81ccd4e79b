//! x86-64 interrupt control via `pushfq`, `cli` and `sti`.
//!
//! # Safety & Privilege
//!
//! These instructions must run at CPL0 (or in a hypervisor context where
//! `cli`/`sti` are legal). Executing them from user space faults.

use crate::InterruptControl;

/// Bit 9 of `RFLAGS`.
const RFLAGS_IF: u64 = 1 << 9;

/// Interrupt control for the executing x86-64 CPU.
#[derive(Debug, Default, Clone, Copy)]
pub struct X86Interrupts;

impl InterruptControl for X86Interrupts {
    #[inline]
    fn interrupts_enabled(&self) -> bool {
        rflags() & RFLAGS_IF != 0
    }

    #[inline]
    fn disable_interrupts(&self) {
        unsafe { core::arch::asm!("cli", options(nostack, preserves_flags)) }
    }

    #[inline]
    fn enable_interrupts(&self) {
        unsafe { core::arch::asm!("sti", options(nostack, preserves_flags)) }
    }
}

/// Returns the current `RFLAGS` value (via `pushfq/pop`).
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(preserves_flags)) }
    r
}
