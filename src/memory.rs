//! # Memory Module
//!
//! Heap accounting for the construction-footprint measurement.
//!
//! A figure is taken before and after `build_bulk`, with a settle step in
//! front of each snapshot, while the built dispatcher is still alive. The
//! difference is what the engine retains for the table.
//!
//! ## Sources
//!
//! Probed in this order by [`MemoryProbe::detect`]:
//!
//! 1. **counting**: [`CountingAllocator`] installed as `#[global_allocator]`.
//!    Exact and synchronous, so settling is a no-op. Only chosen once the
//!    allocator has actually served an allocation.
//! 2. **jemalloc** (feature `jemalloc`): `stats::allocated`, refreshed by
//!    advancing the `epoch`.
//! 3. **rss**: resident set size from `memory-stats`. Page-granular and
//!    noisy; small tables often report zero.
//!
//! Without any of them the probe is [`MeasurementError::Unavailable`] and the
//! footprint is reported without a figure.

use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout, System};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// System allocator wrapper that tracks live heap bytes.
///
/// ```ignore
/// #[global_allocator]
/// static GLOBAL: routerbench::memory::CountingAllocator = routerbench::memory::CountingAllocator;
/// ```
pub struct CountingAllocator;

impl CountingAllocator {
    /// Bytes currently allocated through this allocator
    #[inline]
    #[must_use]
    pub fn live_bytes() -> usize {
        LIVE_BYTES.load(Ordering::SeqCst)
    }

    /// True once the allocator has served at least one allocation
    #[inline]
    #[must_use]
    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::Relaxed)
    }

    #[inline]
    fn mark_installed() {
        if !INSTALLED.load(Ordering::Relaxed) {
            INSTALLED.store(true, Ordering::Relaxed);
        }
    }
}

#[allow(unsafe_code)]
unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            LIVE_BYTES.fetch_add(layout.size(), Ordering::SeqCst);
            Self::mark_installed();
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            LIVE_BYTES.fetch_add(layout.size(), Ordering::SeqCst);
            Self::mark_installed();
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        LIVE_BYTES.fetch_sub(layout.size(), Ordering::SeqCst);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                LIVE_BYTES.fetch_add(new_size - layout.size(), Ordering::SeqCst);
            } else {
                LIVE_BYTES.fetch_sub(layout.size() - new_size, Ordering::SeqCst);
            }
        }
        new_ptr
    }
}

/// Where a memory figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    /// [`CountingAllocator`] live bytes
    Counting,
    /// jemalloc `stats.allocated`
    Jemalloc,
    /// Process resident set size
    Rss,
}

impl MemorySource {
    /// Lowercase name used in reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemorySource::Counting => "counting",
            MemorySource::Jemalloc => "jemalloc",
            MemorySource::Rss => "rss",
        }
    }
}

impl fmt::Display for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory figure could not be taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    /// No usable source on this platform/build
    Unavailable(&'static str),
    /// The source exists but reading it failed
    Source(String),
}

impl fmt::Display for MeasurementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementError::Unavailable(why) => write!(f, "memory measurement unavailable: {why}"),
            MeasurementError::Source(msg) => write!(f, "memory source failed: {msg}"),
        }
    }
}

impl std::error::Error for MeasurementError {}

/// Reads heap figures from one [`MemorySource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryProbe {
    source: MemorySource,
}

impl MemoryProbe {
    /// First available source, in documented order
    ///
    /// # Errors
    ///
    /// [`MeasurementError::Unavailable`] when nothing can be read.
    pub fn detect() -> Result<Self, MeasurementError> {
        [MemorySource::Counting, MemorySource::Jemalloc, MemorySource::Rss]
            .into_iter()
            .find_map(|source| Self::with_source(source).ok())
            .ok_or(MeasurementError::Unavailable(
                "no counting allocator, jemalloc or RSS reading",
            ))
    }

    /// Probe pinned to `source`
    ///
    /// # Errors
    ///
    /// [`MeasurementError::Unavailable`] if `source` cannot be used here.
    pub fn with_source(source: MemorySource) -> Result<Self, MeasurementError> {
        let available = match source {
            MemorySource::Counting => CountingAllocator::is_installed(),
            MemorySource::Jemalloc => cfg!(feature = "jemalloc"),
            MemorySource::Rss => memory_stats::memory_stats().is_some(),
        };
        if available {
            Ok(Self { source })
        } else {
            Err(MeasurementError::Unavailable(match source {
                MemorySource::Counting => "counting allocator not installed",
                MemorySource::Jemalloc => "built without the jemalloc feature",
                MemorySource::Rss => "RSS not readable on this platform",
            }))
        }
    }

    /// Source this probe reads
    #[must_use]
    pub fn source(&self) -> MemorySource {
        self.source
    }

    /// Bring the source up to date before a snapshot
    ///
    /// # Errors
    ///
    /// [`MeasurementError::Source`] if jemalloc refuses the epoch update.
    pub fn settle(&self) -> Result<(), MeasurementError> {
        match self.source {
            MemorySource::Jemalloc => jemalloc::advance(),
            MemorySource::Counting | MemorySource::Rss => Ok(()),
        }
    }

    /// Current figure in bytes
    ///
    /// # Errors
    ///
    /// [`MeasurementError`] when the source cannot be read.
    pub fn snapshot(&self) -> Result<u64, MeasurementError> {
        match self.source {
            MemorySource::Counting => Ok(CountingAllocator::live_bytes() as u64),
            MemorySource::Jemalloc => jemalloc::allocated(),
            MemorySource::Rss => memory_stats::memory_stats()
                .map(|s| s.physical_mem as u64)
                .ok_or(MeasurementError::Unavailable("RSS not readable on this platform")),
        }
    }

    /// Settle then snapshot
    ///
    /// # Errors
    ///
    /// See [`settle`](Self::settle) and [`snapshot`](Self::snapshot).
    pub fn settled_snapshot(&self) -> Result<u64, MeasurementError> {
        self.settle()?;
        self.snapshot()
    }
}

#[cfg(feature = "jemalloc")]
mod jemalloc {
    use super::MeasurementError;
    use tikv_jemalloc_ctl::{epoch, stats};

    pub(super) fn advance() -> Result<(), MeasurementError> {
        epoch::advance()
            .map(|_| ())
            .map_err(|e| MeasurementError::Source(format!("jemalloc epoch: {e}")))
    }

    pub(super) fn allocated() -> Result<u64, MeasurementError> {
        stats::allocated::read()
            .map(|n| n as u64)
            .map_err(|e| MeasurementError::Source(format!("jemalloc stats.allocated: {e}")))
    }
}

#[cfg(not(feature = "jemalloc"))]
mod jemalloc {
    use super::MeasurementError;

    pub(super) fn advance() -> Result<(), MeasurementError> {
        Err(MeasurementError::Unavailable("built without the jemalloc feature"))
    }

    pub(super) fn allocated() -> Result<u64, MeasurementError> {
        Err(MeasurementError::Unavailable("built without the jemalloc feature"))
    }
}
