use {
    crate::BlockAllocator,
    allocator_ext::AlignedBuf,
    log::trace,
    memtab_util::bitmap::BitSet,
    std::{
        alloc::LayoutError,
        num::NonZeroUsize,
        ops::Range,
        sync::atomic::{AtomicU64, Ordering::SeqCst},
    },
    thiserror::Error,
};

/// Alignment of the memory managed by a pool.
///
/// The first block of every pool starts at a multiple of this value.
pub const POOL_ALIGN: usize = 16;

/// Source of unique pool identifiers.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// Block allocator over a fixed arena of memory.
///
/// The arena is divided into equally sized blocks.
/// A bit set records which blocks are in use,
/// and allocation picks the lowest run of free blocks that is long enough.
/// Memory that does not fill a whole block is left unused.
pub struct BlockPool
{
    /// Identifies the pool in the regions it hands out.
    id: u64,

    memory: AlignedBuf<POOL_ALIGN>,

    block_size: NonZeroUsize,

    /// One bit per block; set iff the block belongs to a live run.
    used: BitSet,
}

/// Contiguous run of blocks allocated from a [`BlockPool`].
///
/// Runs cannot be cloned; returning a run to its pool consumes it.
#[derive(Debug)]
pub struct BlockRun
{
    pool: u64,
    first: usize,
    count: NonZeroUsize,
}

/// Returned when a pool cannot be created.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum PoolError
{
    #[error("Block size must be non-zero")]
    ZeroBlockSize,

    #[error("{memory_size} bytes of memory cannot hold a block of {block_size} bytes")]
    NoBlocks{memory_size: usize, block_size: usize},

    #[error("{0}")]
    Layout(#[from] LayoutError),
}

impl BlockPool
{
    /// Create a pool of `memory_size` bytes split into `block_size` blocks.
    ///
    /// The memory is allocated up front and zeroed.
    pub fn new(block_size: usize, memory_size: usize)
        -> Result<Self, PoolError>
    {
        let block_size = NonZeroUsize::new(block_size)
            .ok_or(PoolError::ZeroBlockSize)?;

        let total_blocks = memory_size / block_size.get();
        if total_blocks == 0 {
            let block_size = block_size.get();
            return Err(PoolError::NoBlocks{memory_size, block_size});
        }

        let memory = AlignedBuf::zeroed(total_blocks * block_size.get())?;
        let id = NEXT_POOL_ID.fetch_add(1, SeqCst);

        Ok(Self{id, memory, block_size, used: BitSet::new(total_blocks)})
    }

    /// The number of blocks in the pool.
    pub fn total_blocks(&self) -> usize
    {
        self.used.len()
    }

    /// The number of blocks not in any live run.
    pub fn free_blocks(&self) -> usize
    {
        self.used.len() - self.used.count_ones()
    }

    /// Whether the run was allocated from this pool.
    pub fn owns(&self, run: &BlockRun) -> bool
    {
        run.pool == self.id
    }

    fn byte_range(&self, run: &BlockRun) -> Range<usize>
    {
        assert!(self.owns(run), "Block run belongs to another pool");
        let start = run.first * self.block_size.get();
        start .. start + run.count.get() * self.block_size.get()
    }
}

impl BlockRun
{
    /// Index of the first block in the run.
    pub fn first_block(&self) -> usize
    {
        self.first
    }

    /// The number of blocks in the run.
    pub fn block_count(&self) -> NonZeroUsize
    {
        self.count
    }
}

impl BlockAllocator for BlockPool
{
    type Region = BlockRun;

    fn block_size(&self) -> NonZeroUsize
    {
        self.block_size
    }

    fn allocate(&mut self, blocks: NonZeroUsize) -> Option<BlockRun>
    {
        let Some(first) = self.used.first_clear_run(blocks.get()) else {
            trace!("No run of {blocks} free blocks in pool {}", self.id);
            return None;
        };

        self.used.set_range(first, blocks.get());
        trace!("Allocated blocks {first}+{blocks} from pool {}", self.id);

        Some(BlockRun{pool: self.id, first, count: blocks})
    }

    fn deallocate(&mut self, run: BlockRun) -> Result<(), BlockRun>
    {
        if !self.owns(&run) || !self.used.is_range_set(run.first, run.count.get()) {
            return Err(run);
        }

        self.used.clear_range(run.first, run.count.get());
        trace!("Freed blocks {}+{} in pool {}", run.first, run.count, self.id);

        Ok(())
    }

    fn bytes(&self, run: &BlockRun) -> &[u8]
    {
        let range = self.byte_range(run);
        &self.memory[range]
    }

    fn bytes_mut(&mut self, run: &BlockRun) -> &mut [u8]
    {
        let range = self.byte_range(run);
        &mut self.memory[range]
    }
}

#[cfg(test)]
mod tests
{
    use {
        super::*,
        proptest::{self as p, proptest},
    };

    fn nz(n: usize) -> NonZeroUsize
    {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn pool_counts_whole_blocks()
    {
        let pool = BlockPool::new(16, 4096).unwrap();
        assert_eq!(pool.total_blocks(), 256);
        assert_eq!(pool.free_blocks(), 256);

        // Trailing bytes that do not fill a block are not used.
        let pool = BlockPool::new(16, 40).unwrap();
        assert_eq!(pool.total_blocks(), 2);
    }

    #[test]
    fn invalid_pools_are_rejected()
    {
        assert!(matches!(BlockPool::new(0, 4096), Err(PoolError::ZeroBlockSize)));
        assert!(matches!(
            BlockPool::new(16, 15),
            Err(PoolError::NoBlocks{memory_size: 15, block_size: 16}),
        ));
    }

    #[test]
    fn allocate_and_deallocate_restore_free_blocks()
    {
        let mut pool = BlockPool::new(16, 256).unwrap();

        let run = pool.allocate(nz(3)).unwrap();
        assert_eq!(run.first_block(), 0);
        assert_eq!(run.block_count(), nz(3));
        assert_eq!(pool.free_blocks(), 13);
        assert_eq!(pool.bytes(&run).len(), 48);

        pool.deallocate(run).unwrap();
        assert_eq!(pool.free_blocks(), 16);
    }

    #[test]
    fn allocation_is_first_fit()
    {
        let mut pool = BlockPool::new(8, 64).unwrap();

        let a = pool.allocate(nz(2)).unwrap();
        let b = pool.allocate(nz(2)).unwrap();
        let c = pool.allocate(nz(2)).unwrap();
        assert_eq!((a.first_block(), b.first_block(), c.first_block()), (0, 2, 4));

        // Free blocks are now 2, 3, 6, and 7: no run of three.
        pool.deallocate(b).unwrap();
        assert!(pool.allocate(nz(3)).is_none());

        // The lower hole is preferred.
        let d = pool.allocate(nz(2)).unwrap();
        assert_eq!(d.first_block(), 2);
        let e = pool.allocate(nz(1)).unwrap();
        assert_eq!(e.first_block(), 6);
    }

    #[test]
    fn exhaustion_returns_none()
    {
        let mut pool = BlockPool::new(16, 64).unwrap();
        let _run = pool.allocate(nz(4)).unwrap();
        assert!(pool.allocate(nz(1)).is_none());
        assert_eq!(pool.free_blocks(), 0);
    }

    #[test]
    fn oversized_request_returns_none()
    {
        let mut pool = BlockPool::new(16, 64).unwrap();
        assert!(pool.allocate(nz(5)).is_none());
        assert_eq!(pool.free_blocks(), 4);
    }

    #[test]
    fn foreign_run_is_refused()
    {
        let mut ours = BlockPool::new(16, 64).unwrap();
        let mut theirs = BlockPool::new(16, 64).unwrap();

        let run = theirs.allocate(nz(1)).unwrap();
        assert!(!ours.owns(&run));

        let run = ours.deallocate(run).unwrap_err();
        assert_eq!(theirs.free_blocks(), 3);
        theirs.deallocate(run).unwrap();
        assert_eq!(theirs.free_blocks(), 4);
    }

    #[test]
    fn runs_do_not_share_bytes()
    {
        let mut pool = BlockPool::new(4, 16).unwrap();
        let a = pool.allocate(nz(1)).unwrap();
        let b = pool.allocate(nz(1)).unwrap();

        pool.bytes_mut(&a).copy_from_slice(b"aaaa");
        pool.bytes_mut(&b).copy_from_slice(b"bbbb");

        assert_eq!(pool.bytes(&a), b"aaaa");
        assert_eq!(pool.bytes(&b), b"bbbb");
    }

    #[test]
    fn allocator_through_mutable_reference()
    {
        fn take_one<A>(mut allocator: A) -> Option<A::Region>
            where A: BlockAllocator
        {
            allocator.allocate(nz(1))
        }

        let mut pool = BlockPool::new(16, 64).unwrap();
        let run = take_one(&mut pool).unwrap();
        assert_eq!(pool.free_blocks(), 3);
        pool.deallocate(run).unwrap();
    }

    proptest!
    {
        #[test]
        fn live_runs_never_overlap(
            ops in p::collection::vec((1usize .. 6, p::bool::ANY), 0 .. 64),
        )
        {
            let mut pool = BlockPool::new(8, 256).unwrap();
            let mut live: Vec<BlockRun> = Vec::new();

            for (blocks, free) in ops {
                if free && !live.is_empty() {
                    let run = live.remove(blocks % live.len());
                    pool.deallocate(run).unwrap();
                } else if let Some(run) = pool.allocate(nz(blocks)) {
                    live.push(run);
                }

                let used: usize = live.iter().map(|r| r.block_count().get()).sum();
                assert_eq!(pool.free_blocks(), pool.total_blocks() - used);

                let mut owner = vec![false; pool.total_blocks()];
                for run in &live {
                    for block in run.first_block() .. run.first_block() + run.block_count().get() {
                        assert!(!owner[block], "Block {block} is in two runs");
                        owner[block] = true;
                    }
                }
            }

            for run in live {
                pool.deallocate(run).unwrap();
            }
            assert_eq!(pool.free_blocks(), pool.total_blocks());
        }
    }
}
