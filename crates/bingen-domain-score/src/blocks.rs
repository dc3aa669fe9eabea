use serde::{Deserialize, Serialize};

/// Number of blocks needed to cover `total_measures`.
pub fn block_count(total_measures: u32, measures_per_block: u32) -> u32 {
    if measures_per_block == 0 {
        return 0;
    }
    total_measures.div_ceil(measures_per_block)
}

/// First measure (1-based) of 1-based `block`.
pub fn block_start_measure(block: u32, measures_per_block: u32) -> u32 {
    block.saturating_sub(1) * measures_per_block + 1
}

/// Walks a dictation piece block by block with a per-block replay budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCursor {
    block: u32,
    total_measures: u32,
    measures_per_block: u32,
    max_repeats: u32,
    repeats_left: u32,
}

impl BlockCursor {
    pub fn new(total_measures: u32, measures_per_block: u32, max_repeats: u32) -> Self {
        Self {
            block: 1,
            total_measures,
            measures_per_block: measures_per_block.max(1),
            max_repeats,
            repeats_left: max_repeats,
        }
    }

    pub fn block(&self) -> u32 {
        self.block
    }

    pub fn block_count(&self) -> u32 {
        block_count(self.total_measures, self.measures_per_block)
    }

    pub fn repeats_left(&self) -> u32 {
        self.repeats_left
    }

    pub fn start_measure(&self) -> u32 {
        block_start_measure(self.block, self.measures_per_block)
    }

    /// Measures in the current block; the last block may be short.
    pub fn measures_in_block(&self) -> u32 {
        self.total_measures
            .saturating_sub(self.start_measure() - 1)
            .min(self.measures_per_block)
    }

    /// Moves by `delta` blocks. Out-of-range moves are ignored; a move refills repeats.
    pub fn step(&mut self, delta: i32) -> bool {
        let next = self.block as i64 + delta as i64;
        if next < 1 || next > self.block_count() as i64 || delta == 0 {
            return false;
        }
        self.block = next as u32;
        self.repeats_left = self.max_repeats;
        true
    }

    /// Spends one replay. Returns whether the tonal reference should precede it
    /// (untouched budget on the first block), or `None` when the budget is spent.
    pub fn take_play(&mut self) -> Option<bool> {
        if self.repeats_left == 0 {
            return None;
        }
        let with_reference = self.block == 1 && self.repeats_left == self.max_repeats;
        self.repeats_left -= 1;
        Some(with_reference)
    }
}
