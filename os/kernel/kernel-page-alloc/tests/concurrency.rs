mod common;

use common::{TestCpus, TestRam};
use kernel_info::memory::ALLOC_JUNK;
use kernel_memory_addresses::{PhysicalPage, Size4K};
use kernel_page_alloc::PageAllocator;
use std::collections::HashSet;
use std::sync::Barrier;
use std::thread;

const CPUS: usize = 4;

type Alloc<'r> = PageAllocator<&'r TestRam, TestCpus, CPUS>;

fn seeded(ram: &TestRam) -> Alloc<'_> {
    let alloc = PageAllocator::new(ram.layout(), ram, TestCpus);
    TestCpus::on_cpu(0, || alloc.initialize());
    alloc
}

/// At least half the pages are free at any time in `churn_never_shares_a_page`,
/// but a steal scan can still come up empty while pages move between lists.
fn allocate_retrying(alloc: &Alloc<'_>) -> PhysicalPage<Size4K> {
    loop {
        if let Some(page) = alloc.allocate() {
            return page;
        }
        std::hint::spin_loop();
    }
}

#[test]
fn racing_drain_hands_out_each_page_once() {
    let ram = TestRam::with_pages(64);
    let alloc = seeded(&ram);
    let barrier = Barrier::new(CPUS);

    let per_cpu: Vec<Vec<PhysicalPage<Size4K>>> = thread::scope(|s| {
        let handles: Vec<_> = (0..CPUS)
            .map(|cpu| {
                let alloc = &alloc;
                let barrier = &barrier;
                s.spawn(move || {
                    TestCpus::become_cpu(cpu);
                    barrier.wait();
                    std::iter::from_fn(|| alloc.allocate()).collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::new();
    for page in per_cpu.iter().flatten() {
        assert!(seen.insert(*page), "{page} handed out twice");
    }
    assert_eq!(seen.len(), 64);
    assert_eq!(alloc.total_free_pages(), 0);
}

#[test]
fn churn_never_shares_a_page() {
    const ROUNDS: usize = 500;
    const HELD: usize = 4;

    let ram = TestRam::with_pages(32);
    let alloc = seeded(&ram);
    let barrier = Barrier::new(CPUS);

    thread::scope(|s| {
        for cpu in 0..CPUS {
            let (alloc, ram, barrier) = (&alloc, &ram, &barrier);
            s.spawn(move || {
                TestCpus::become_cpu(cpu);
                let tag = u8::try_from(0xA0 + cpu).unwrap();
                barrier.wait();

                for _ in 0..ROUNDS {
                    let mut held = Vec::with_capacity(HELD);
                    for _ in 0..HELD {
                        let page = allocate_retrying(alloc);
                        assert!(ram.bytes(page.base()).iter().all(|&b| b == ALLOC_JUNK));
                        ram.fill(page.base(), tag);
                        held.push(page);
                    }
                    for page in held {
                        assert!(
                            ram.bytes(page.base()).iter().all(|&b| b == tag),
                            "{page} was written by another cpu while held by cpu {cpu}"
                        );
                        alloc.release(page.base());
                    }
                }
            });
        }
    });

    assert_eq!(alloc.total_free_pages(), 32);

    let all: HashSet<_> = std::iter::from_fn(|| alloc.allocate()).collect();
    assert_eq!(all.len(), 32);
}

#[test]
fn pages_migrate_between_cpus_without_loss() {
    let ram = TestRam::with_pages(16);
    let alloc = seeded(&ram);

    // Each cpu takes pages (stealing from cpu 0) and releases them locally.
    thread::scope(|s| {
        for cpu in 1..CPUS {
            let alloc = &alloc;
            s.spawn(move || {
                TestCpus::become_cpu(cpu);
                let taken: Vec<_> = (0..4).filter_map(|_| alloc.allocate()).collect();
                for page in taken {
                    alloc.release(page.base());
                }
            });
        }
    });

    assert_eq!(alloc.total_free_pages(), 16);
    let spread: usize = (1..CPUS).map(|cpu| alloc.free_pages(cpu)).sum();
    assert_eq!(alloc.free_pages(0) + spread, 16);
    assert!(spread > 0);
}
