//! Block allocators that back memory objects.
//!
//! A block allocator carves memory into blocks of one fixed size
//! and hands out contiguous runs of them, called regions.
//! The [`BlockAllocator`] trait is the contract that consumers,
//! such as object tables, rely on.
//! [`BlockPool`] is a simple first-fit implementation of it.

#![warn(missing_docs)]

pub use self::pool::*;

use std::num::NonZeroUsize;

mod pool;

/// Supplies and reclaims contiguous runs of fixed-size blocks.
///
/// Implementations should not make [`Region`][`Self::Region`] cloneable,
/// so that every region has exactly one owner
/// and can be returned to the allocator at most once.
pub trait BlockAllocator
{
    /// Exclusive ownership of a run of blocks.
    type Region;

    /// The number of bytes in each block.
    fn block_size(&self) -> NonZeroUsize;

    /// Allocate `blocks` contiguous blocks.
    ///
    /// Returns [`None`] if the allocator cannot satisfy the request.
    fn allocate(&mut self, blocks: NonZeroUsize) -> Option<Self::Region>;

    /// Return a region to the allocator.
    ///
    /// If the allocator refuses to reclaim the region,
    /// the region is handed back unchanged and remains allocated.
    fn deallocate(&mut self, region: Self::Region)
        -> Result<(), Self::Region>;

    /// The bytes of a region.
    ///
    /// The slice spans every block of the region.
    fn bytes(&self, region: &Self::Region) -> &[u8];

    /// The bytes of a region, mutably.
    ///
    /// The slice spans every block of the region.
    fn bytes_mut(&mut self, region: &Self::Region) -> &mut [u8];
}

impl<A> BlockAllocator for &mut A
    where A: BlockAllocator + ?Sized
{
    type Region = A::Region;

    fn block_size(&self) -> NonZeroUsize
    {
        (**self).block_size()
    }

    fn allocate(&mut self, blocks: NonZeroUsize) -> Option<Self::Region>
    {
        (**self).allocate(blocks)
    }

    fn deallocate(&mut self, region: Self::Region)
        -> Result<(), Self::Region>
    {
        (**self).deallocate(region)
    }

    fn bytes(&self, region: &Self::Region) -> &[u8]
    {
        (**self).bytes(region)
    }

    fn bytes_mut(&mut self, region: &Self::Region) -> &mut [u8]
    {
        (**self).bytes_mut(region)
    }
}
