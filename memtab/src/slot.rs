use std::num::NonZeroUsize;

/// State of one table slot.
///
/// The backing region lives inside the active state,
/// so a free slot cannot hold a region
/// and a locked slot cannot be free.
pub (crate) enum Slot<R>
{
    Free,
    Active(ActiveSlot<R>),
}

/// Bookkeeping for an object.
pub (crate) struct ActiveSlot<R>
{
    /// Index of the slot, stored for validating handles.
    pub id: u8,

    /// The size requested at acquisition.
    pub capacity: usize,

    // INVARIANT: used <= capacity.
    pub used: usize,

    pub locked: bool,

    pub blocks: NonZeroUsize,

    pub region: R,
}

impl<R> ActiveSlot<R>
{
    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize
    {
        self.capacity - self.used
    }
}

/// Read-only view of an object.
///
/// Borrows the table, so the object cannot change while a handle exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Handle<'t>
{
    pub (crate) id: u8,
    pub (crate) capacity: usize,
    pub (crate) locked: bool,
    pub (crate) blocks: NonZeroUsize,
    pub (crate) contents: &'t [u8],
}

impl<'t> Handle<'t>
{
    /// The slot index of the object.
    pub fn id(&self) -> u8
    {
        self.id
    }

    /// The size requested when the object was acquired.
    pub fn capacity_bytes(&self) -> usize
    {
        self.capacity
    }

    /// The length of the object's content.
    pub fn used_bytes(&self) -> usize
    {
        self.contents.len()
    }

    /// Whether the object is locked.
    ///
    /// [`ObjectTable::handle`] never returns locked objects,
    /// but [`ObjectTable::iter`] does.
    ///
    /// [`ObjectTable::handle`]: `crate::ObjectTable::handle`
    /// [`ObjectTable::iter`]: `crate::ObjectTable::iter`
    pub fn is_locked(&self) -> bool
    {
        self.locked
    }

    /// The number of blocks backing the object.
    pub fn blocks(&self) -> NonZeroUsize
    {
        self.blocks
    }

    /// The content of the object.
    pub fn contents(&self) -> &'t [u8]
    {
        self.contents
    }
}
