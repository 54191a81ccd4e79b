#![allow(dead_code)]

use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K};
use kernel_page_alloc::{MemoryLayout, PhysMapper, Platform};
use kernel_sync::InterruptControl;
use std::cell::{Cell, UnsafeCell};

pub const PAGE: u64 = Size4K::SIZE;

/// Physical address of the first simulated RAM page.
pub const BASE: u64 = 0x0010_0000;

#[repr(C, align(4096))]
struct Frame(UnsafeCell<[u8; 4096]>);

/// A few 4 KiB-aligned frames standing in for physical memory at [`BASE`].
///
/// The allocator gets a `&TestRam` as its mapper, so the test can still look
/// at page contents from the outside.
pub struct TestRam {
    frames: Vec<Frame>,
}

// SAFETY: the allocator hands each page to exactly one owner at a time, and
// tests only touch pages they own.
unsafe impl Sync for TestRam {}

impl TestRam {
    pub fn with_pages(n: usize) -> Self {
        let frames = (0..n).map(|_| Frame(UnsafeCell::new([0; 4096]))).collect();
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Base address of page `idx`.
    pub fn page(&self, idx: usize) -> PhysicalAddress {
        assert!(idx < self.frames.len());
        PhysicalAddress::new(BASE + idx as u64 * PAGE)
    }

    pub fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(BASE + self.frames.len() as u64 * PAGE)
    }

    /// Layout covering every simulated page.
    pub fn layout(&self) -> MemoryLayout {
        MemoryLayout::new(PhysicalAddress::new(BASE), self.end())
    }

    fn frame(&self, pa: PhysicalAddress) -> &Frame {
        let offset = pa
            .as_u64()
            .checked_sub(BASE)
            .unwrap_or_else(|| panic!("{pa} is below simulated RAM"));
        assert_eq!(offset % PAGE, 0, "{pa} is not a page base");
        let idx = usize::try_from(offset / PAGE).unwrap();
        self.frames
            .get(idx)
            .unwrap_or_else(|| panic!("{pa} is above simulated RAM"))
    }

    /// Copy of the page at `pa`.
    pub fn bytes(&self, pa: PhysicalAddress) -> Vec<u8> {
        // SAFETY: the caller owns the page (or nobody is using the allocator).
        unsafe { (*self.frame(pa).0.get()).to_vec() }
    }

    /// Overwrites the page at `pa` with `byte`.
    pub fn fill(&self, pa: PhysicalAddress, byte: u8) {
        // SAFETY: as in `bytes`.
        unsafe { (*self.frame(pa).0.get()).fill(byte) }
    }
}

impl PhysMapper for &TestRam {
    fn phys_to_ptr<T>(&self, pa: PhysicalAddress) -> *mut T {
        self.frame(pa).0.get().cast()
    }
}

thread_local! {
    static CURRENT_CPU: Cell<usize> = const { Cell::new(0) };
    static INTERRUPTS: Cell<bool> = const { Cell::new(true) };
}

/// Simulated CPUs: every test thread is "a CPU" whose index and interrupt
/// flag are thread-local.
///
/// [`Platform::current_cpu`] fails the test if interrupts are enabled, since
/// the answer would be meaningless if the thread could migrate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestCpus;

impl TestCpus {
    /// Makes the calling thread run as `cpu` from now on.
    pub fn become_cpu(cpu: usize) {
        CURRENT_CPU.set(cpu);
    }

    /// Runs `f` as `cpu`, then switches back.
    pub fn on_cpu<R>(cpu: usize, f: impl FnOnce() -> R) -> R {
        let previous = CURRENT_CPU.replace(cpu);
        let result = f();
        CURRENT_CPU.set(previous);
        result
    }

    /// The calling thread's interrupt flag.
    pub fn interrupts_on() -> bool {
        INTERRUPTS.get()
    }

    pub fn set_interrupts(enabled: bool) {
        INTERRUPTS.set(enabled);
    }
}

impl InterruptControl for TestCpus {
    fn interrupts_enabled(&self) -> bool {
        INTERRUPTS.get()
    }

    fn disable_interrupts(&self) {
        INTERRUPTS.set(false);
    }

    fn enable_interrupts(&self) {
        INTERRUPTS.set(true);
    }
}

impl Platform for TestCpus {
    fn current_cpu(&self) -> usize {
        assert!(
            !INTERRUPTS.get(),
            "current_cpu queried with interrupts enabled"
        );
        CURRENT_CPU.get()
    }
}
