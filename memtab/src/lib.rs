//! Fixed-capacity table of memory objects.
//!
//! A memory object is a variable-length byte buffer
//! backed by a run of fixed-size blocks from a [block allocator].
//! The [`ObjectTable`] hands out objects under small integer identifiers,
//! bounds every write by the object's capacity,
//! and gates access with an advisory lock flag.
//!
//! Nothing in this crate blocks or synchronizes.
//! Operations on a locked object fail immediately with [`Error::Busy`];
//! callers that need waiting must retry, or guard the table externally.
//!
//! [block allocator]: `memtab_blocks::BlockAllocator`

#![warn(missing_docs)]

pub use self::{error::*, id::*, slot::Handle, table::*};

pub mod config;

mod error;
mod id;
mod slot;
mod table;
