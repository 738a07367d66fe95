//! One sampled row of a truth table

use serde::{Deserialize, Serialize};
use truthscan_sim::PackedState;

/// Inputs driven for one combination and the outputs observed
///
/// `result` keeps every output as its packed four-state code. `output` is
/// the decoded binary form and only exists once [`unpack`](Self::unpack)
/// succeeded, i.e. when no output bit was floating or conflicting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthState {
    input: Vec<u32>,
    result: Vec<PackedState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<Vec<u32>>,
}

impl TruthState {
    pub fn new(input: Vec<u32>, result: Vec<PackedState>) -> Self {
        Self {
            input,
            result,
            output: None,
        }
    }

    pub fn input_count(&self) -> usize {
        self.input.len()
    }

    pub fn output_count(&self) -> usize {
        self.result.len()
    }

    pub fn inputs(&self) -> &[u32] {
        &self.input
    }

    pub fn input(&self, index: usize) -> Option<u32> {
        self.input.get(index).copied()
    }

    pub fn results(&self) -> &[PackedState] {
        &self.result
    }

    pub fn result(&self, index: usize) -> Option<PackedState> {
        self.result.get(index).copied()
    }

    /// Decode every output to a binary value using the pins' widths
    ///
    /// Returns `false`, leaving only the packed codes, if any output bit is
    /// not binary. Once decoded the row is not decoded again.
    pub fn unpack(&mut self, widths: &[u8]) -> bool {
        if self.output.is_some() {
            return true;
        }
        let decoded: Option<Vec<u32>> = self
            .result
            .iter()
            .zip(widths)
            .map(|(packed, width)| packed.decode(*width))
            .collect();
        match decoded {
            Some(values) if values.len() == self.result.len() => {
                self.output = Some(values);
                true
            }
            _ => false,
        }
    }

    pub fn is_unpacked(&self) -> bool {
        self.output.is_some()
    }

    pub fn outputs(&self) -> Option<&[u32]> {
        self.output.as_deref()
    }

    /// Decoded output, `None` if the row could not be decoded
    pub fn output(&self, index: usize) -> Option<u32> {
        self.output.as_ref()?.get(index).copied()
    }

    /// Decimal when decoded, otherwise the `0/1/Z/X` bit string
    pub fn format_output(&self, index: usize, width: u8) -> String {
        match (self.output(index), self.result(index)) {
            (Some(value), _) => value.to_string(),
            (None, Some(packed)) => packed.to_bit_string(width),
            (None, None) => String::new(),
        }
    }
}
