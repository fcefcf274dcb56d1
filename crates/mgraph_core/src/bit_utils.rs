use alloc::vec;
use alloc::vec::Vec;

pub struct BitPack;

impl BitPack {
    #[inline(always)]
    pub fn get(storage: &[u64], index: usize) -> bool {
        let word = storage[index / 64];
        let bit = index % 64;
        (word >> bit) & 1 == 1
    }

    #[inline(always)]
    pub fn toggle(storage: &mut [u64], index: usize) {
        storage[index / 64] ^= 1u64 << (index % 64);
    }

    #[inline(always)]
    pub fn set(storage: &mut [u64], index: usize, val: bool) {
        let mask = 1u64 << (index % 64);
        if val {
            storage[index / 64] |= mask;
        } else {
            storage[index / 64] &= !mask;
        }
    }
}

/// Fixed-length bit mask with one flag per node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeMask {
    words: Vec<u64>,
    len: usize,
}

impl NodeMask {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Returns false for indices past the end.
    #[inline(always)]
    pub fn contains(&self, index: usize) -> bool {
        index < self.len && BitPack::get(&self.words, index)
    }

    #[inline(always)]
    pub fn insert(&mut self, index: usize) {
        BitPack::set(&mut self.words, index, true);
    }

    #[inline(always)]
    pub fn toggle(&mut self, index: usize) {
        BitPack::toggle(&mut self.words, index);
    }

    /// Iterates set indices in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut rest = word;
            core::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(word_idx * 64 + bit)
            })
        })
    }
}
