//! Greedy longest-matching-blocks sequence alignment.
//!
//! All four similarity metrics reduce to the same ratio: given two sequences
//! with combined length `T` and a greedy longest-matching-blocks alignment
//! finding total matched length `M`, the similarity is `2*M / T`. Two empty
//! sequences are vacuously identical and score 1.0.
//!
//! The aligner is deliberately junk-free: no element is down-weighted for
//! being common, so the matched mass comes from a deterministic search with
//! fixed tie-breaking (earliest start in `a`, then earliest start in `b`)
//! and the ratio is symmetric under argument swap.

use std::collections::HashMap;
use std::hash::Hash;

/// A maximal matching block between two sequences.
///
/// `a_start`/`b_start` are the block's starting indices in each sequence and
/// `len` its length; `a[a_start..a_start+len] == b[b_start..b_start+len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    /// Start index of the block in the first sequence
    pub a_start: usize,
    /// Start index of the block in the second sequence
    pub b_start: usize,
    /// Number of matching elements
    pub len: usize,
}

/// Pairwise sequence aligner over arbitrary hashable elements.
pub struct SequenceAligner<'a, T: Eq + Hash> {
    a: &'a [T],
    b: &'a [T],

    /// Positions of each element of `b`, in ascending order.
    b_index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceAligner<'a, T> {
    /// Create an aligner for the two sequences.
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b_index: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, element) in b.iter().enumerate() {
            b_index.entry(element).or_default().push(j);
        }

        Self { a, b, b_index }
    }

    /// Find the longest block matching within `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties are broken toward the earliest start in `a`, then the earliest
    /// start in `b`, which keeps recomputation deterministic.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let mut best = MatchBlock {
            a_start: alo,
            b_start: blo,
            len: 0,
        };

        // run_lengths[j] = length of the match ending at a[i], b[j]
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_runs: HashMap<usize, usize> = HashMap::new();

            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }

                    let prev = if j > 0 {
                        run_lengths.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let len = prev + 1;
                    next_runs.insert(j, len);

                    if len > best.len {
                        best = MatchBlock {
                            a_start: i + 1 - len,
                            b_start: j + 1 - len,
                            len,
                        };
                    }
                }
            }

            run_lengths = next_runs;
        }

        best
    }

    /// Compute the full set of greedy matching blocks.
    ///
    /// The longest match splits the problem into the regions before and
    /// after it, which are processed the same way until no match remains.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let mut blocks = Vec::new();
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }

            if alo < block.a_start && blo < block.b_start {
                queue.push((alo, block.a_start, blo, block.b_start));
            }
            if block.a_start + block.len < ahi && block.b_start + block.len < bhi {
                queue.push((block.a_start + block.len, ahi, block.b_start + block.len, bhi));
            }

            blocks.push(block);
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));
        blocks
    }

    /// Similarity ratio `2*M / T` in [0.0, 1.0].
    ///
    /// Defined as 1.0 when both sequences are empty ("nothing vs. nothing"
    /// is vacuously identical, not 0/0).
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }

        let matched: usize = self.matching_blocks().iter().map(|block| block.len).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Similarity ratio between two element slices.
pub fn sequence_ratio<T: Eq + Hash>(a: &[T], b: &[T]) -> f64 {
    SequenceAligner::new(a, b).ratio()
}

/// Similarity ratio between two texts, aligned character by character.
pub fn text_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    sequence_ratio(&a_chars, &b_chars)
}
