//! Circuit Test Socket
//!
//! Builds the truth table of a circuit by driving every combination of its
//! inputs through private compiled copies.
//!
//! # Execution
//!
//! - Small input spaces, or when parallelism is off, run as one chunk on
//!   the calling thread.
//! - Input spaces wider than `parallel_threshold_bits` are split into one
//!   contiguous chunk per worker; chunks run on a dedicated rayon pool, each
//!   with its own circuit copy.
//!
//! Chunk results are concatenated in chunk order, which is ascending
//! combination order because chunks cover ascending contiguous ranges.
//!
//! # Example
//!
//! ```ignore
//! let mut socket = CircuitTestSocket::new(&circuit, true, &SocketConfig::default())?;
//! let table = socket.build_truth_table(&|pct| println!("{pct:.0}%"), &|| true, None, 1000)?;
//! match table.rows() {
//!     Some(rows) => println!("{} rows, truncated: {}", rows.len(), table.truncated),
//!     None => println!("circuit oscillates"),
//! }
//! ```

use crate::chunk::{ChunkContext, Include, KeepGoing, TableChunk};
use crate::combination::{input_bit_count, partition_range, total_combinations, ChunkRange};
use crate::config::SocketConfig;
use crate::error::{Result, TestError};
use crate::filter::PinNames;
use crate::pin_socket::{InputPinSocket, OutputPinSocket, SocketedCircuit};
use crate::truth_state::TruthState;
use num_bigint::BigUint;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{info, warn};
use truthscan_netlist::Circuit;
use truthscan_sim::PackedState;

/// Outcome of a truth-table run
#[derive(Debug, Clone, Default)]
pub struct TruthTable {
    /// `None` when the circuit oscillates somewhere in the scanned range
    pub rows: Option<Vec<TruthState>>,
    /// Enumeration stopped early on the row cap or on cancellation
    pub truncated: bool,
}

impl TruthTable {
    pub fn rows(&self) -> Option<&[TruthState]> {
        self.rows.as_deref()
    }

    pub fn is_oscillation(&self) -> bool {
        self.rows.is_none()
    }

    pub fn len(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CircuitTestSocket {
    socketed: SocketedCircuit,
    input_bit_count: u32,
    chunks: Vec<TableChunk>,
    pool: Option<rayon::ThreadPool>,
}

impl CircuitTestSocket {
    /// A circuit is testable when it has at least one input and one output pin
    pub fn is_testable(circuit: &Circuit) -> bool {
        circuit.input_pins().next().is_some() && circuit.output_pins().next().is_some()
    }

    pub fn new(circuit: &Circuit, parallel: bool, config: &SocketConfig) -> Result<Self> {
        if !Self::is_testable(circuit) {
            return Err(TestError::NotTestable(circuit.name.clone()));
        }

        let socketed = SocketedCircuit::new(circuit, &config.sim)?;
        let input_bit_count = input_bit_count(&socketed.input_widths());
        let total = total_combinations(input_bit_count);

        let (ranges, pool) = if config.splits(parallel, input_bit_count) {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("truthscan-chunk-{i}"))
                .build()
                .map_err(|e| TestError::WorkerPool(e.to_string()))?;
            (partition_range(&total, config.workers), Some(pool))
        } else {
            (vec![ChunkRange::new(BigUint::default(), total)], None)
        };

        let chunks = ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| TableChunk::new(i, circuit, range, config))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Test socket for '{}': {} inputs ({} bits), {} outputs, {} chunk(s)",
            circuit.name,
            socketed.inputs().len(),
            input_bit_count,
            socketed.outputs().len(),
            chunks.len()
        );

        Ok(Self {
            socketed,
            input_bit_count,
            chunks,
            pool,
        })
    }

    pub fn inputs(&self) -> &[InputPinSocket] {
        self.socketed.inputs()
    }

    pub fn outputs(&self) -> &[OutputPinSocket] {
        self.socketed.outputs()
    }

    /// Names a row filter may refer to
    pub fn pin_names(&self) -> PinNames {
        PinNames::new(
            self.inputs().iter().map(|s| s.name().to_string()),
            self.outputs().iter().map(|s| s.name().to_string()),
        )
    }

    pub fn input_bit_count(&self) -> u32 {
        self.input_bit_count
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Ranges assigned to the chunks, in chunk order
    pub fn chunk_ranges(&self) -> Vec<ChunkRange> {
        self.chunks.iter().map(|c| c.range().clone()).collect()
    }

    /// Set the value driven on one input for [`evaluate`](Self::evaluate)
    pub fn set_input(&mut self, index: usize, value: u32) -> Result<u32> {
        self.socketed.drive(index, value)
    }

    pub fn input_value(&self, index: usize) -> Result<u32> {
        let socket = self
            .socketed
            .inputs()
            .get(index)
            .ok_or(TestError::InputIndex(index))?;
        Ok(self.socketed.state().constant_value(socket.function())?)
    }

    pub fn output_state(&self, index: usize) -> Result<PackedState> {
        self.socketed.observe(index)
    }

    /// Settle the socket's own copy with the currently driven inputs
    ///
    /// Returns `false` if the circuit does not converge.
    pub fn evaluate(&mut self) -> bool {
        self.socketed.state_mut().evaluate()
    }

    /// Enumerate the input space
    ///
    /// `progress` receives the average completion of all chunks in percent.
    /// `keep_going` is polled once per combination. Rows are decoded before
    /// `include` sees them; rows that cannot be decoded are always kept.
    /// At most `max_rows` rows are returned.
    pub fn build_truth_table(
        &mut self,
        progress: &(dyn Fn(f64) + Sync),
        keep_going: KeepGoing<'_>,
        include: Option<Include<'_>>,
        max_rows: usize,
    ) -> Result<TruthTable> {
        let chunk_count = self.chunks.len();
        let cells: Vec<AtomicU64> = (0..chunk_count).map(|_| AtomicU64::new(0)).collect();
        let truncated: Vec<AtomicBool> = (0..chunk_count).map(|_| AtomicBool::new(false)).collect();
        let report = |index: usize, pct: f64| {
            if let Some(cell) = cells.get(index) {
                cell.store(pct.to_bits(), Ordering::Relaxed);
            }
            let sum: f64 = cells
                .iter()
                .map(|c| f64::from_bits(c.load(Ordering::Relaxed)))
                .sum();
            progress(sum / chunk_count as f64);
        };
        let ctx = ChunkContext {
            keep_going,
            include,
            max_rows,
            progress: &report,
            truncated: &truncated,
        };

        match &self.pool {
            Some(pool) => {
                let chunks = &mut self.chunks;
                pool.install(|| {
                    chunks
                        .par_iter_mut()
                        .map(|chunk| chunk.build(&ctx))
                        .collect::<Result<Vec<()>>>()
                })?;
            }
            None => {
                for chunk in &mut self.chunks {
                    chunk.build(&ctx)?;
                }
            }
        }

        Ok(self.merge(max_rows))
    }

    fn merge(&mut self, max_rows: usize) -> TruthTable {
        let mut truncated = self.chunks.iter().any(|c| c.truncated());
        if self.chunks.iter().any(|c| c.oscillation()) {
            warn!("Circuit oscillates; truth table discarded");
            for chunk in &mut self.chunks {
                chunk.take_results();
            }
            return TruthTable {
                rows: None,
                truncated,
            };
        }

        let mut rows: Vec<TruthState> = Vec::new();
        for chunk in &mut self.chunks {
            rows.extend(chunk.take_results());
        }
        if rows.len() > max_rows {
            rows.truncate(max_rows);
            truncated = true;
        }
        info!("Truth table complete: {} rows, truncated={}", rows.len(), truncated);
        TruthTable {
            rows: Some(rows),
            truncated,
        }
    }
}
