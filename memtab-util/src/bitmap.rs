//! Fixed-length bit sets.
//!
//! A bit set records one flag per index, for example
//! whether a table slot or an allocator block is in use.

use {smallvec::SmallVec, std::fmt};

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-length set of bits stored in 64-bit words.
///
/// Sets of at most 64 bits are stored inline, without heap allocation.
/// Longer sets spill into a heap-allocated word array.
/// The length is chosen at creation and never changes.
#[derive(Clone, Eq, PartialEq)]
pub struct BitSet
{
    // INVARIANT: Bits at positions >= len are always clear.
    words: SmallVec<[u64; 1]>,

    len: usize,
}

impl BitSet
{
    /// Create a bit set of `len` bits, all clear.
    pub fn new(len: usize) -> Self
    {
        let words = SmallVec::from_elem(0, len.div_ceil(WORD_BITS));
        Self{words, len}
    }

    /// The number of bits in the set.
    pub fn len(&self) -> usize
    {
        self.len
    }

    /// Whether the set has no bits at all.
    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// Whether the bit at `index` is set.
    ///
    /// Out-of-range bits are reported as clear.
    pub fn get(&self, index: usize) -> bool
    {
        if index >= self.len {
            return false;
        }
        self.words[index / WORD_BITS] & mask(index) != 0
    }

    /// Set the bit at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn set(&mut self, index: usize)
    {
        self.check_range(index, 1);
        self.words[index / WORD_BITS] |= mask(index);
    }

    /// Clear the bit at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of range.
    pub fn clear(&mut self, index: usize)
    {
        self.check_range(index, 1);
        self.words[index / WORD_BITS] &= !mask(index);
    }

    /// Set `count` bits starting at `start`.
    ///
    /// # Panics
    ///
    /// If the range extends past the end of the set.
    pub fn set_range(&mut self, start: usize, count: usize)
    {
        self.check_range(start, count);
        for index in start .. start + count {
            self.words[index / WORD_BITS] |= mask(index);
        }
    }

    /// Clear `count` bits starting at `start`.
    ///
    /// # Panics
    ///
    /// If the range extends past the end of the set.
    pub fn clear_range(&mut self, start: usize, count: usize)
    {
        self.check_range(start, count);
        for index in start .. start + count {
            self.words[index / WORD_BITS] &= !mask(index);
        }
    }

    /// Whether all `count` bits starting at `start` are set.
    ///
    /// Ranges extending past the end of the set are never fully set.
    pub fn is_range_set(&self, start: usize, count: usize) -> bool
    {
        match start.checked_add(count) {
            Some(end) if end <= self.len =>
                (start .. end).all(|index| self.get(index)),
            _ => false,
        }
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize
    {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// The lowest index whose bit is clear.
    pub fn first_clear(&self) -> Option<usize>
    {
        let (word_index, word) = self.words.iter().enumerate()
            .find(|(_, &word)| word != u64::MAX)?;
        let index = word_index * WORD_BITS + word.trailing_ones() as usize;
        // Only the last word has positions past the end.
        (index < self.len).then_some(index)
    }

    /// The lowest index that starts `count` consecutive clear bits.
    ///
    /// Returns [`None`] if `count` is zero or no such run exists.
    pub fn first_clear_run(&self, count: usize) -> Option<usize>
    {
        if count == 0 || count > self.len {
            return None;
        }

        let mut start = 0;
        for index in 0 .. self.len {
            if self.get(index) {
                start = index + 1;
            } else if index + 1 - start == count {
                return Some(start);
            }
        }

        None
    }

    /// The indices of all set bits, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_
    {
        (0 .. self.len).filter(move |&index| self.get(index))
    }

    fn check_range(&self, start: usize, count: usize)
    {
        let end = start.checked_add(count);
        assert!(
            end.map_or(false, |end| end <= self.len),
            "Bit range {start}+{count} out of range for bit set of {}",
            self.len,
        );
    }
}

fn mask(index: usize) -> u64
{
    1 << (index % WORD_BITS)
}

impl fmt::Debug for BitSet
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "BitSet[")?;
        for index in 0 .. self.len {
            write!(f, "{}", if self.get(index) { '1' } else { '0' })?;
        }
        write!(f, "]")
    }
}
