use crate::{SpinLock, SpinLockGuard};
use core::ops::{Deref, DerefMut};

/// Local interrupt delivery control for the executing CPU.
///
/// The kernel implements this with privileged instructions
/// (see [`X86Interrupts`](crate::hw::X86Interrupts)); host tests implement it
/// with a thread-local flag.
pub trait InterruptControl {
    /// Whether interrupt delivery is currently enabled on this CPU.
    fn interrupts_enabled(&self) -> bool;

    /// Stops interrupt delivery on this CPU.
    fn disable_interrupts(&self);

    /// Resumes interrupt delivery on this CPU.
    fn enable_interrupts(&self);
}

/// RAII guard that defers interrupts on creation and restores them on drop.
///
/// `IrqGuard::new()` snapshots whether interrupts are enabled. If they were,
/// it disables them. On drop, it re-enables **only** if they were previously
/// enabled, so an inner guard never turns interrupts back on underneath an
/// outer one:
///
/// ```text
/// let a = IrqGuard::new(&cpu);   // enabled -> disabled, remembers `true`
/// let b = IrqGuard::new(&cpu);   // already disabled, remembers `false`
/// drop(b);                       // stays disabled
/// drop(a);                       // enabled again
/// ```
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct IrqGuard<'a, I: InterruptControl + ?Sized> {
    ctl: &'a I,
    /// Whether interrupts were enabled when the guard was created.
    were_enabled: bool,
}

impl<'a, I: InterruptControl + ?Sized> IrqGuard<'a, I> {
    /// Disables interrupts if they are currently enabled and remembers the state.
    #[inline]
    pub fn new(ctl: &'a I) -> Self {
        let enabled = ctl.interrupts_enabled();
        if enabled {
            ctl.disable_interrupts();
        }
        Self {
            ctl,
            were_enabled: enabled,
        }
    }
}

impl<I: InterruptControl + ?Sized> Drop for IrqGuard<'_, I> {
    /// Restores interrupts only if they were previously enabled.
    fn drop(&mut self) {
        if self.were_enabled {
            self.ctl.enable_interrupts();
        }
    }
}

/// A [`SpinLockGuard`] taken with interrupts deferred.
///
/// Created by [`SpinLock::lock_irq`]. Interrupts are disabled before the lock
/// is acquired, and on drop the lock is released before interrupts are
/// restored, so an interrupt handler can never observe this CPU holding the
/// lock and spin on it.
pub struct IrqSpinLockGuard<'a, T, I: InterruptControl + ?Sized> {
    // Field order is drop order: unlock first, then restore interrupts.
    guard: SpinLockGuard<'a, T>,
    _irq: IrqGuard<'a, I>,
}

impl<T> SpinLock<T> {
    /// Acquires the lock with interrupts deferred for the guard's lifetime.
    #[inline]
    pub fn lock_irq<'a, I: InterruptControl + ?Sized>(
        &'a self,
        ctl: &'a I,
    ) -> IrqSpinLockGuard<'a, T, I> {
        let irq = IrqGuard::new(ctl);
        let guard = self.lock();
        IrqSpinLockGuard { guard, _irq: irq }
    }
}

impl<T, I: InterruptControl + ?Sized> Deref for IrqSpinLockGuard<'_, T, I> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, I: InterruptControl + ?Sized> DerefMut for IrqSpinLockGuard<'_, T, I> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
