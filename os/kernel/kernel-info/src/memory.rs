//! # Memory Layout

use kernel_memory_addresses::{PageSize, PhysicalAddress, Size4K};

/// Size of the only page granularity the physical allocator hands out.
pub const PAGE_SIZE: u64 = Size4K::SIZE;

/// Number of CPUs the kernel is configured for; one free list is kept per CPU.
pub const MAX_CPUS: usize = 8;

/// Where the kernel image is placed in *physical* memory.
pub const PHYS_LOAD: PhysicalAddress = PhysicalAddress::new(0x0010_0000); // 1 MiB

/// First physical address past usable RAM.
pub const PHYS_TOP: PhysicalAddress = PhysicalAddress::new(0x0800_0000); // 128 MiB

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything mapped at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Byte written over a page when it is returned to a free list.
pub const FREE_JUNK: u8 = 0x01;

/// Byte written over a page when it is handed out.
pub const ALLOC_JUNK: u8 = 0x05;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(MAX_CPUS > 0);
    assert!(PHYS_LOAD.is_aligned::<Size4K>());
    assert!(PHYS_TOP.is_aligned::<Size4K>());
    assert!(PHYS_TOP.as_u64() > PHYS_LOAD.as_u64());
    assert!(FREE_JUNK != ALLOC_JUNK);
};
