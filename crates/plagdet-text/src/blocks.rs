//! Longest-matching-block alignment over arbitrary sequences.
//!
//! Repeatedly takes the longest common contiguous run inside the current
//! window, then recurses into the regions left and right of it. Adjacent
//! blocks are merged. Ties go to the run starting earliest in `a`, then
//! earliest in `b`.

use std::collections::HashMap;
use std::hash::Hash;

/// `a[a..a + size] == b[b..b + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

pub fn matching_blocks<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Block> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut b2j: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in b.iter().enumerate() {
        b2j.entry(item).or_default().push(j);
    }

    let mut queue = vec![(0, a.len(), 0, b.len())];
    let mut found = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let block = find_longest_match(a, &b2j, b.len(), alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        found.push(block);
        if alo < block.a && blo < block.b {
            queue.push((alo, block.a, blo, block.b));
        }
        if block.a + block.size < ahi && block.b + block.size < bhi {
            queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
        }
    }
    found.sort_unstable();

    let mut merged: Vec<Block> = Vec::with_capacity(found.len());
    for block in found {
        match merged.last_mut() {
            Some(last) if last.a + last.size == block.a && last.b + last.size == block.b => {
                last.size += block.size;
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Total number of matched elements across all blocks.
pub fn matched_len<T: Eq + Hash>(a: &[T], b: &[T]) -> usize {
    matching_blocks(a, b).iter().map(|blk| blk.size).sum()
}

fn find_longest_match<T: Eq + Hash>(
    a: &[T],
    b2j: &HashMap<&T, Vec<usize>>,
    b_len: usize,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Block {
    let mut best = Block { a: alo, b: blo, size: 0 };
    // run[j + 1] = length of the run ending at a[i - 1], b[j]
    let mut run = vec![0usize; b_len + 1];
    let mut next = vec![0usize; b_len + 1];
    let mut touched: Vec<usize> = Vec::new();
    let mut next_touched: Vec<usize> = Vec::new();

    for i in alo..ahi {
        if let Some(positions) = b2j.get(&a[i]) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = run[j] + 1;
                next[j + 1] = k;
                next_touched.push(j + 1);
                if k > best.size {
                    best = Block { a: i + 1 - k, b: j + 1 - k, size: k };
                }
            }
        }
        for &t in &touched {
            run[t] = 0;
        }
        touched.clear();
        std::mem::swap(&mut run, &mut next);
        std::mem::swap(&mut touched, &mut next_touched);
    }
    best
}
