//! One's-complement addition with end-around carry.

use crate::trace::{bin_wide, bin16, hex16};

const WORD_MASK: u32 = 0xFFFF;

/// A single word added onto the running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addition {
    pub previous: u16,
    pub word: u16,
    /// Unbounded sum before any carry wrap.
    pub raw: u32,
    pub total: u16,
}

impl Addition {
    pub fn wrapped(&self) -> bool {
        self.raw > WORD_MASK
    }
}

/// Add `word` onto `total`, folding a carry out of bit 16 back in as +1.
pub fn add_end_around(total: u16, word: u16) -> Addition {
    let raw = u32::from(total) + u32::from(word);
    // raw <= 0x1FFFE, so the wrapped value is at most 0xFFFF.
    let folded = if raw > WORD_MASK {
        (raw & WORD_MASK) + 1
    } else {
        raw
    };
    Addition {
        previous: total,
        word,
        raw,
        total: folded as u16,
    }
}

/// Result of folding a word sequence onto a seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summation {
    pub seed: u16,
    pub total: u16,
    pub additions: Vec<Addition>,
}

impl Summation {
    pub fn carry_wraps(&self) -> usize {
        self.additions.iter().filter(|a| a.wrapped()).count()
    }

    /// Per-word derivation: running total, next word, raw intermediate, and
    /// a wrap notice when a carry was folded back in.
    pub fn trace_lines(&self) -> Vec<String> {
        if self.additions.is_empty() {
            return if self.seed == 0 {
                vec!["No words to sum.".to_string()]
            } else {
                vec![format!(
                    "No words to sum; total stays at {}.",
                    hex16(self.seed)
                )]
            };
        }

        let mut lines = Vec::with_capacity(self.additions.len() * 5);
        for (i, add) in self.additions.iter().enumerate() {
            lines.push(format!("Add Word {} ({}):", i + 1, hex16(add.word)));
            lines.push(format!("   {} (Sum so far)", bin16(add.previous)));
            lines.push(format!(" + {} (Next Word)", bin16(add.word)));
            lines.push(format!(" = {} (Intermediate)", bin_wide(add.raw)));
            if add.wrapped() {
                lines.push(format!("   [CARRY WRAP] -> {}", bin16(add.total)));
            }
        }
        lines
    }
}

/// Fold `words` onto `seed` in order.
pub fn sum_words(words: &[u16], seed: u16) -> Summation {
    let mut total = seed;
    let additions = words
        .iter()
        .map(|&word| {
            let add = add_end_around(total, word);
            total = add.total;
            add
        })
        .collect();
    Summation {
        seed,
        total,
        additions,
    }
}
