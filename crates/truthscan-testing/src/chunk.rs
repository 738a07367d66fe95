//! Table Chunk
//!
//! A chunk enumerates one contiguous slice of the input space against its
//! own socketed copy of the circuit. Chunks never share simulation state,
//! so several can run at once on different threads.
//!
//! # Per-combination steps
//!
//! 1. stop, marking the chunk truncated, if cancelled, if the row cap is
//!    reached, or if an earlier chunk already truncated
//! 2. split the combination into per-pin fields and drive the sources
//! 3. settle the circuit; a failure to settle marks the chunk oscillating
//!    and discards its rows
//! 4. record the row, decode it, and keep it unless the filter rejects it

use crate::combination::{split_combination, ChunkRange};
use crate::config::SocketConfig;
use crate::error::{Result, TestError};
use crate::pin_socket::SocketedCircuit;
use crate::truth_state::TruthState;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use truthscan_netlist::Circuit;

/// Cancellation predicate; `false` stops enumeration
pub type KeepGoing<'a> = &'a (dyn Fn() -> bool + Sync);

/// Row filter applied to decoded rows
pub type Include<'a> = &'a (dyn Fn(&TruthState) -> bool + Sync);

/// Receives `(chunk index, percent done)`
pub type ChunkProgress<'a> = &'a (dyn Fn(usize, f64) + Sync);

/// Everything a chunk shares with its siblings during one run
pub struct ChunkContext<'a> {
    pub keep_going: KeepGoing<'a>,
    pub include: Option<Include<'a>>,
    pub max_rows: usize,
    pub progress: ChunkProgress<'a>,
    /// One flag per chunk, set when that chunk truncates
    pub truncated: &'a [AtomicBool],
}

impl ChunkContext<'_> {
    fn earlier_truncated(&self, index: usize) -> bool {
        self.truncated
            .iter()
            .take(index)
            .any(|flag| flag.load(Ordering::Relaxed))
    }
}

pub struct TableChunk {
    index: usize,
    range: ChunkRange,
    socketed: SocketedCircuit,
    input_widths: Vec<u8>,
    output_widths: Vec<u8>,
    results: Vec<TruthState>,
    truncated: bool,
    oscillation: bool,
}

impl TableChunk {
    /// Make a private socketed copy of `circuit` covering `range`
    pub fn new(
        index: usize,
        circuit: &Circuit,
        range: ChunkRange,
        config: &SocketConfig,
    ) -> Result<Self> {
        let socketed = SocketedCircuit::new(circuit, &config.sim)?;
        let input_widths = socketed.input_widths();
        let output_widths = socketed.output_widths();
        Ok(Self {
            index,
            range,
            socketed,
            input_widths,
            output_widths,
            results: Vec::new(),
            truncated: false,
            oscillation: false,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn range(&self) -> &ChunkRange {
        &self.range
    }

    pub fn results(&self) -> &[TruthState] {
        &self.results
    }

    pub fn take_results(&mut self) -> Vec<TruthState> {
        std::mem::take(&mut self.results)
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn oscillation(&self) -> bool {
        self.oscillation
    }

    /// Enumerate the chunk's range
    ///
    /// Oscillation and truncation are recorded on the chunk; only invariant
    /// failures are returned as errors.
    pub fn build(&mut self, ctx: &ChunkContext<'_>) -> Result<()> {
        self.results.clear();
        self.truncated = false;
        self.oscillation = false;

        let start = self.range.start.clone();
        let end = self.range.end();
        let total = self.range.count.to_f64().unwrap_or(f64::MAX);
        let step = report_step(&self.range.count);
        let mut since_report = 0u64;
        let mut value = start.clone();

        debug!(
            "Chunk {} enumerating {} combinations from {}",
            self.index, self.range.count, start
        );
        (ctx.progress)(self.index, 0.0);

        while value < end {
            if !(ctx.keep_going)()
                || self.results.len() >= ctx.max_rows
                || ctx.earlier_truncated(self.index)
            {
                self.truncated = true;
                if let Some(flag) = ctx.truncated.get(self.index) {
                    flag.store(true, Ordering::Relaxed);
                }
                break;
            }

            let fields = split_combination(&value, &self.input_widths);
            for (index, field) in fields.iter().enumerate() {
                let held = self.socketed.drive(index, *field)?;
                if held != *field {
                    return Err(TestError::Invariant(format!(
                        "input '{}' holds {} after driving {}",
                        self.socketed.inputs()[index].name(),
                        held,
                        field
                    )));
                }
            }

            if !self.socketed.state_mut().evaluate() {
                warn!("Chunk {} oscillates at combination {}", self.index, value);
                self.oscillation = true;
                self.results.clear();
                return Ok(());
            }

            let result = (0..self.output_widths.len())
                .map(|j| self.socketed.observe(j))
                .collect::<Result<Vec<_>>>()?;
            let mut row = TruthState::new(fields, result);
            let keep = if row.unpack(&self.output_widths) {
                ctx.include.map_or(true, |include| include(&row))
            } else {
                true
            };
            if keep {
                self.results.push(row);
            }

            value += 1u32;
            since_report += 1;
            if since_report >= step {
                since_report = 0;
                let done = (&value - &start).to_f64().unwrap_or(0.0);
                (ctx.progress)(self.index, (done / total * 100.0).clamp(0.0, 100.0));
            }
        }

        (ctx.progress)(self.index, 100.0);
        debug!(
            "Chunk {} finished: {} rows, truncated={}",
            self.index,
            self.results.len(),
            self.truncated
        );
        Ok(())
    }
}

/// Combinations between progress reports: about 1% of the range, at least 1
fn report_step(count: &BigUint) -> u64 {
    (count / 100u32).to_u64().unwrap_or(u64::MAX).max(1)
}
