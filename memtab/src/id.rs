use std::fmt;

/// Names an object in an [`ObjectTable`].
///
/// Identifiers are neither [`Clone`] nor [`Copy`].
/// [`ObjectTable::acquire`] creates one and [`ObjectTable::release`]
/// consumes it, so an identifier obtained from the table
/// cannot be used after its object is released.
/// Identifiers made with [`from_raw`][`Self::from_raw`]
/// are still validated on every operation.
///
/// [`ObjectTable`]: `crate::ObjectTable`
/// [`ObjectTable::acquire`]: `crate::ObjectTable::acquire`
/// [`ObjectTable::release`]: `crate::ObjectTable::release`
#[derive(Debug, Eq, Hash, PartialEq)]
pub struct ObjectId(u8);

impl ObjectId
{
    /// Create an identifier from its slot index.
    ///
    /// The index is not checked against any table.
    pub const fn from_raw(raw: u8) -> Self
    {
        Self(raw)
    }

    /// The slot index of the object.
    pub const fn raw(&self) -> u8
    {
        self.0
    }

    pub (crate) fn index(&self) -> usize
    {
        usize::from(self.0)
    }
}

impl fmt::Display for ObjectId
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}
