//! Utility items shared by the memtab crates.

#![warn(missing_docs)]

pub mod bitmap;
