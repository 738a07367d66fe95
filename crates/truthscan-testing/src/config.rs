//! Test socket configuration

use serde::{Deserialize, Serialize};
use truthscan_sim::SimConfig;

/// Input width above which the input space is split across workers
pub const DEFAULT_PARALLEL_THRESHOLD_BITS: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Parallel enumeration only kicks in above this many input bits
    pub parallel_threshold_bits: u32,
    /// Worker threads, and chunks, for parallel enumeration
    pub workers: usize,
    pub sim: SimConfig,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            parallel_threshold_bits: DEFAULT_PARALLEL_THRESHOLD_BITS,
            workers: num_cpus::get(),
            sim: SimConfig::default(),
        }
    }
}

impl SocketConfig {
    /// Whether an input space of `input_bits` bits is split across workers
    pub fn splits(&self, parallel: bool, input_bits: u32) -> bool {
        parallel && self.workers > 1 && input_bits > self.parallel_threshold_bits
    }
}
