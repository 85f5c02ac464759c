//! Working-set sweep: time list walks for doubling working-set sizes.

use crate::list::{ChaseList, Direction};
use anyhow::bail;
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Bytes read before each timed walk to evict the working set.
pub const CLEAR_CACHE_BYTES: usize = 16 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Smallest working set, bytes.
    pub start: usize,
    /// Largest working set, bytes.
    pub end: usize,
    /// Filler words per list element.
    pub pad: usize,
    /// Number of accesses per walk is `access_factor * end / word`.
    pub access_factor: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: 1 << 10,
            end: 1 << 29,
            pad: 0,
            access_factor: 2,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.start == 0 || self.start > self.end {
            bail!(
                "working set range {}..={} bytes is empty",
                self.start,
                self.end
            );
        }
        if self.access_factor == 0 {
            bail!("access factor must be at least 1");
        }
        Ok(())
    }

    /// Working-set sizes, doubling from `start` up to `end` inclusive.
    pub fn sizes(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut size = self.start;
        while size <= self.end {
            out.push(size);
            match size.checked_mul(2) {
                Some(next) => size = next,
                None => break,
            }
        }
        out
    }

    /// Same count for every size so the runs are comparable.
    pub fn accesses(&self) -> usize {
        self.access_factor * self.end / std::mem::size_of::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub size: usize,
    pub accesses: usize,
    pub elapsed: Duration,
}

impl Measurement {
    pub fn accesses_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        self.accesses as f64 / secs
    }

    /// `log2(size)  size  accesses/s`, column widths 4/10/16.
    pub fn line(&self) -> String {
        format!(
            "{:4.0} {:10} {:16.2}",
            (self.size as f64).log2(),
            self.size,
            self.accesses_per_sec()
        )
    }
}

/// Touch a buffer larger than the last-level cache.
pub fn clear_cache() -> u64 {
    let block = vec![1u8; CLEAR_CACHE_BYTES];
    let sum = block.iter().map(|&b| u64::from(b)).sum();
    black_box(sum)
}

/// Time one walk of `accesses` links through `list`.
pub fn measure(
    list: &ChaseList,
    size: usize,
    accesses: usize,
    direction: Direction,
) -> Measurement {
    clear_cache();
    let start = Instant::now();
    let end = list.walk(0, accesses, direction);
    let elapsed = start.elapsed();
    black_box(end);
    Measurement {
        size,
        accesses,
        elapsed,
    }
}

/// Walk the same list forward from `threads` threads at once.
pub fn measure_threaded(
    list: &ChaseList,
    size: usize,
    accesses: usize,
    threads: usize,
) -> Vec<Measurement> {
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(move || measure(list, size, accesses, Direction::Forward)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(m) => m,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
