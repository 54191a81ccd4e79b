//! # Execution Context

use kernel_sync::InterruptControl;

/// What the allocator needs to know about the CPU it is running on.
///
/// [`current_cpu`](Self::current_cpu) is only called with interrupts deferred,
/// so the answer cannot change under the caller through preemption.
pub trait Platform: InterruptControl {
    /// Index of the executing CPU, in `0..CPUS`.
    fn current_cpu(&self) -> usize;
}

/// [`Platform`] for x86-64 kernels: `RFLAGS.IF` for interrupt deferral and a
/// kernel-supplied function for the CPU index (typically a read of the
/// per-CPU block through `GS`).
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct X86Platform {
    cpu_index: fn() -> usize,
}

#[cfg(target_arch = "x86_64")]
impl X86Platform {
    #[must_use]
    pub const fn new(cpu_index: fn() -> usize) -> Self {
        Self { cpu_index }
    }
}

#[cfg(target_arch = "x86_64")]
impl InterruptControl for X86Platform {
    #[inline]
    fn interrupts_enabled(&self) -> bool {
        kernel_sync::hw::X86Interrupts.interrupts_enabled()
    }

    #[inline]
    fn disable_interrupts(&self) {
        kernel_sync::hw::X86Interrupts.disable_interrupts();
    }

    #[inline]
    fn enable_interrupts(&self) {
        kernel_sync::hw::X86Interrupts.enable_interrupts();
    }
}

#[cfg(target_arch = "x86_64")]
impl Platform for X86Platform {
    #[inline]
    fn current_cpu(&self) -> usize {
        (self.cpu_index)()
    }
}
