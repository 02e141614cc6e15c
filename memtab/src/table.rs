use {
    crate::{
        Error, ObjectId, ReleaseError, Result,
        slot::{ActiveSlot, Handle, Slot},
    },
    log::{debug, trace, warn},
    memtab_blocks::BlockAllocator,
    memtab_util::bitmap::BitSet,
    non_zero_ext::NonZeroExt,
    std::{mem::replace, num::NonZeroUsize},
};

/// The largest number of slots a table can have.
///
/// Identifiers are at most one byte,
/// and the usage bitmap is at most one word.
pub const MAX_CAPACITY: usize = 64;

/// Fixed-capacity table of memory objects.
///
/// Each slot of the table is either free or holds one object.
/// An object owns a run of blocks from the allocator,
/// which it keeps until it is released.
/// The table never grows; when every slot is active,
/// [`acquire`][`Self::acquire`] fails with [`Error::TableFull`].
///
/// The allocator is usually borrowed, as in `ObjectTable<&mut BlockPool>`,
/// so that it outlives the table.
/// When the table is dropped, the regions of
/// objects that were not released are returned to the allocator.
pub struct ObjectTable<A>
    where A: BlockAllocator
{
    allocator: A,

    /// One bit per slot; set iff the slot is active.
    usage: BitSet,

    slots: Box<[Slot<A::Region>]>,
}

impl<A> ObjectTable<A>
    where A: BlockAllocator
{
    /// Create a table with `capacity` slots, all free.
    ///
    /// Fails with [`Error::InvalidArgument`] if `capacity` is zero
    /// or exceeds [`MAX_CAPACITY`].
    pub fn new(allocator: A, capacity: usize) -> Result<Self>
    {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(Error::InvalidArgument);
        }

        let slots = (0 .. capacity).map(|_| Slot::Free).collect();
        Ok(Self{allocator, usage: BitSet::new(capacity), slots})
    }

    /// Create an object that can hold `size` bytes.
    ///
    /// The lowest free slot is used.
    /// The size is rounded up to whole blocks for the allocator,
    /// but the object's capacity is exactly `size`.
    /// The new object is empty and unlocked.
    pub fn acquire(&mut self, size: usize) -> Result<ObjectId>
    {
        let size = NonZeroUsize::new(size).ok_or(Error::InvalidArgument)?;

        let index = self.usage.first_clear().ok_or(Error::TableFull)?;

        let blocks = size.ceil_div(self.allocator.block_size());
        let Some(region) = self.allocator.allocate(blocks) else {
            debug!("Cannot acquire object of {size} bytes: out of space");
            return Err(Error::OutOfSpace);
        };

        // Capacity is at most MAX_CAPACITY, so this fits.
        let id = index as u8;

        self.slots[index] = Slot::Active(ActiveSlot{
            id,
            capacity: size.get(),
            used: 0,
            locked: false,
            blocks,
            region,
        });
        self.usage.set(index);

        debug!("Acquired object #{id} of {size} bytes ({blocks} blocks)");
        Ok(ObjectId::from_raw(id))
    }

    /// Release an object and return its region to the allocator.
    ///
    /// Locked objects cannot be released; unlock them first.
    /// If the allocator refuses the region, the object stays as it was.
    /// On failure, the identifier is handed back in the error.
    pub fn release(&mut self, id: ObjectId)
        -> std::result::Result<(), ReleaseError>
    {
        let index = match self.active(&id) {
            Ok(slot) if slot.locked =>
                return Err(ReleaseError{id, error: Error::Busy}),
            Ok(_) =>
                id.index(),
            Err(error) =>
                return Err(ReleaseError{id, error}),
        };

        let Slot::Active(slot) = replace(&mut self.slots[index], Slot::Free)
            else { unreachable!("Active slot became free") };
        let ActiveSlot{id: raw, capacity, used, locked, blocks, region} = slot;

        match self.allocator.deallocate(region) {
            Ok(()) => {
                self.usage.clear(index);
                debug!("Released object {id}");
                Ok(())
            },
            Err(region) => {
                self.slots[index] = Slot::Active(ActiveSlot{
                    id: raw, capacity, used, locked, blocks, region,
                });
                warn!("Block allocator refused the region of object {id}");
                Err(ReleaseError{id, error: Error::DeallocationFailed})
            },
        }
    }

    /// Replace the content of an object.
    ///
    /// Bytes of earlier content past the end of `data`
    /// are no longer part of the content, but are not zeroed.
    pub fn write(&mut self, id: &ObjectId, data: &[u8]) -> Result<()>
    {
        self.verify_size(id, data.len())?;

        let (slot, allocator) = self.active_mut(id)?;
        allocator.bytes_mut(&slot.region)[.. data.len()]
            .copy_from_slice(data);
        slot.used = data.len();

        trace!("Wrote {} bytes to object {id}", data.len());
        Ok(())
    }

    /// Add bytes to the end of an object's content.
    ///
    /// Fails with [`Error::TooLarge`] if the bytes
    /// do not fit in the remaining capacity.
    /// The content is never truncated.
    pub fn append(&mut self, id: &ObjectId, data: &[u8]) -> Result<()>
    {
        self.verify_size(id, data.len())?;

        let (slot, allocator) = self.active_mut(id)?;
        if data.len() > slot.remaining() {
            return Err(Error::TooLarge);
        }

        let end = slot.used + data.len();
        allocator.bytes_mut(&slot.region)[slot.used .. end]
            .copy_from_slice(data);
        slot.used = end;

        trace!("Appended {} bytes to object {id}", data.len());
        Ok(())
    }

    /// Copy an object's content into `buf`.
    ///
    /// Copies as much as fits, and returns the number of bytes copied.
    /// A buffer longer than the object is fine.
    pub fn read(&self, id: &ObjectId, buf: &mut [u8]) -> Result<usize>
    {
        let slot = self.active(id)?;
        if slot.locked {
            return Err(Error::Busy);
        }

        let len = buf.len().min(slot.used);
        buf[.. len].copy_from_slice(&self.allocator.bytes(&slot.region)[.. len]);

        trace!("Read {len} bytes from object {id}");
        Ok(len)
    }

    /// Check that `size` bytes could be written to an object.
    ///
    /// Fails with [`Error::Busy`] if the object is locked,
    /// or with [`Error::TooLarge`] if `size` exceeds its capacity.
    pub fn verify_size(&self, id: &ObjectId, size: usize) -> Result<()>
    {
        let slot = self.active(id)?;
        if slot.locked {
            return Err(Error::Busy);
        }
        if size > slot.capacity {
            return Err(Error::TooLarge);
        }
        Ok(())
    }

    /// Inspect an unlocked object.
    ///
    /// Fails with [`Error::Busy`] if the object is locked.
    pub fn handle(&self, id: &ObjectId) -> Result<Handle>
    {
        let slot = self.active(id)?;
        if slot.locked {
            return Err(Error::Busy);
        }
        Ok(self.make_handle(slot))
    }

    /// Inspect an unlocked object.
    ///
    /// Returns [`None`] if the identifier is invalid or the object is locked.
    /// Use [`handle`][`Self::handle`] to tell these cases apart.
    pub fn get_handle(&self, id: &ObjectId) -> Option<Handle>
    {
        self.handle(id).ok()
    }

    /// Lock an object.
    ///
    /// Locking a locked object has no effect.
    pub fn lock(&mut self, id: &ObjectId) -> Result<()>
    {
        let (slot, _) = self.active_mut(id)?;
        slot.locked = true;
        trace!("Locked object {id}");
        Ok(())
    }

    /// Unlock an object.
    ///
    /// Unlocking an unlocked object has no effect.
    pub fn unlock(&mut self, id: &ObjectId) -> Result<()>
    {
        let (slot, _) = self.active_mut(id)?;
        slot.locked = false;
        trace!("Unlocked object {id}");
        Ok(())
    }

    /// The number of slots in the table.
    pub fn capacity(&self) -> usize
    {
        self.slots.len()
    }

    /// The block size of the underlying allocator.
    pub fn block_size(&self) -> NonZeroUsize
    {
        self.allocator.block_size()
    }

    /// The number of active objects.
    pub fn active_count(&self) -> usize
    {
        self.usage.count_ones()
    }

    /// Whether every slot is active.
    pub fn is_full(&self) -> bool
    {
        self.usage.first_clear().is_none()
    }

    /// Whether the slot with index `raw` holds an object.
    pub fn is_active(&self, raw: u8) -> bool
    {
        self.usage.get(usize::from(raw))
    }

    /// Inspect every active object, locked or not, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_
    {
        self.usage.iter_ones().map(move |index| match &self.slots[index] {
            Slot::Active(slot) => self.make_handle(slot),
            Slot::Free => unreachable!("Usage bit set for free slot"),
        })
    }

    /// The underlying allocator.
    pub fn allocator(&self) -> &A
    {
        &self.allocator
    }

    /// Look up the active slot for an identifier.
    fn active(&self, id: &ObjectId) -> Result<&ActiveSlot<A::Region>>
    {
        let slot = self.slots.get(id.index()).ok_or(Error::BadHandle)?;
        if !self.usage.get(id.index()) {
            return Err(Error::NotFound);
        }
        match slot {
            Slot::Active(slot) => Ok(slot),
            Slot::Free => unreachable!("Usage bit set for free slot"),
        }
    }

    /// Look up the active slot for an identifier,
    /// along with the allocator that holds its bytes.
    fn active_mut(&mut self, id: &ObjectId)
        -> Result<(&mut ActiveSlot<A::Region>, &mut A)>
    {
        let slot = self.slots.get_mut(id.index()).ok_or(Error::BadHandle)?;
        if !self.usage.get(id.index()) {
            return Err(Error::NotFound);
        }
        match slot {
            Slot::Active(slot) => Ok((slot, &mut self.allocator)),
            Slot::Free => unreachable!("Usage bit set for free slot"),
        }
    }

    fn make_handle<'t>(&'t self, slot: &'t ActiveSlot<A::Region>) -> Handle<'t>
    {
        Handle{
            id: slot.id,
            capacity: slot.capacity,
            locked: slot.locked,
            blocks: slot.blocks,
            contents: &self.allocator.bytes(&slot.region)[.. slot.used],
        }
    }
}

impl<A> Drop for ObjectTable<A>
    where A: BlockAllocator
{
    fn drop(&mut self)
    {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Slot::Active(slot) = replace(slot, Slot::Free)
                else { continue };
            if self.allocator.deallocate(slot.region).is_err() {
                warn!("Block allocator refused the region of object #{index}");
            }
            self.usage.clear(index);
        }
    }
}
