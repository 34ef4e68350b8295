//! Construction footprints with the counting allocator installed.
//!
//! Kept to a single test: the allocator counter is process-wide and tests in
//! one binary run on parallel threads.

use routerbench::adapter::AdapterRegistry;
use routerbench::config::BenchConfig;
use routerbench::harness::Harness;
use routerbench::memory::{CountingAllocator, MemoryProbe, MemorySource};
use routerbench::scenario::ApiExample;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[test]
fn test_counting_allocator_footprints() {
    // Make sure the allocator has served something.
    let warm = vec![0u8; 64];
    assert!(CountingAllocator::is_installed());
    drop(warm);

    let before = CountingAllocator::live_bytes();
    let block = vec![0u8; 4096];
    assert!(CountingAllocator::live_bytes() >= before + 4096);
    drop(block);

    let probe = MemoryProbe::detect().unwrap();
    assert_eq!(probe.source(), MemorySource::Counting);

    let harness = Harness::with_probe(BenchConfig::default(), Some(probe));
    let example = ApiExample::gplus();
    for adapter in AdapterRegistry::builtin().iter() {
        let (first, a) = harness
            .measure_construction(adapter, &example.table)
            .unwrap();
        let (second, b) = harness
            .measure_construction(adapter, &example.table)
            .unwrap();
        let a = a.bytes.unwrap();
        let b = b.bytes.unwrap();
        assert!(a > 0, "{} retained nothing", adapter.name());
        // Same table twice: same order of magnitude.
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        assert!(hi <= lo * 10, "{}: {a} vs {b}", adapter.name());
        drop(first);
        drop(second);
    }
}
