//! Extra items for working with allocators.

#![warn(missing_docs)]

use std::{
    alloc::{Layout, LayoutError, alloc_zeroed, dealloc, handle_alloc_error},
    fmt,
    ops::{Deref, DerefMut},
    ptr::NonNull,
    slice,
};

/// Owned, zero-initialized byte buffer
/// whose address is a multiple of `ALIGN`.
///
/// The buffer never grows or shrinks after creation.
pub struct AlignedBuf<const ALIGN: usize>
{
    /// Start of the buffer.
    ///
    /// Dangling (but aligned) if `len` is zero.
    ptr: NonNull<u8>,

    /// The number of bytes in the buffer.
    len: usize,
}

// SAFETY: The buffer is uniquely owned, like a Box<[u8]>.
unsafe impl<const ALIGN: usize> Send for AlignedBuf<ALIGN> { }
unsafe impl<const ALIGN: usize> Sync for AlignedBuf<ALIGN> { }

impl<const ALIGN: usize> AlignedBuf<ALIGN>
{
    /// Allocate a zeroed buffer of `len` bytes.
    ///
    /// Returns an error if `ALIGN` is not a power of two,
    /// or if `len` rounded up to `ALIGN` would overflow.
    pub fn zeroed(len: usize) -> Result<Self, LayoutError>
    {
        let layout = Layout::from_size_align(len, ALIGN)?;

        if len == 0 {
            // SAFETY: Alignments are never zero.
            let ptr = unsafe {
                NonNull::new_unchecked(layout.align() as *mut u8)
            };
            return Ok(Self{ptr, len});
        }

        // SAFETY: len is non-zero.
        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr)
            else { handle_alloc_error(layout) };

        Ok(Self{ptr, len})
    }
}

impl<const ALIGN: usize> Deref for AlignedBuf<ALIGN>
{
    type Target = [u8];

    fn deref(&self) -> &Self::Target
    {
        // SAFETY: ptr points to len initialized bytes owned by self.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<const ALIGN: usize> DerefMut for AlignedBuf<ALIGN>
{
    fn deref_mut(&mut self) -> &mut Self::Target
    {
        // SAFETY: ptr points to len initialized bytes owned by self.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<const ALIGN: usize> Drop for AlignedBuf<ALIGN>
{
    fn drop(&mut self)
    {
        if self.len == 0 {
            return;
        }

        // SAFETY: This matches AlignedBuf::zeroed.
        let layout = unsafe {
            Layout::from_size_align_unchecked(self.len, ALIGN)
        };

        // SAFETY: ptr and layout come from zeroed.
        unsafe { dealloc(self.ptr.as_ptr(), layout) }
    }
}

impl<const ALIGN: usize> fmt::Debug for AlignedBuf<ALIGN>
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_struct("AlignedBuf")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests
{
    use {super::*, proptest::{self as p, proptest}};

    #[test]
    fn can_create_empty_buffer()
    {
        let buf = AlignedBuf::<64>::zeroed(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.as_ptr() as usize % 64, 0);
    }

    #[test]
    fn non_power_of_two_alignment_is_rejected()
    {
        assert!(AlignedBuf::<24>::zeroed(48).is_err());
    }

    #[test]
    fn buffer_is_writable()
    {
        let mut buf = AlignedBuf::<16>::zeroed(32).unwrap();
        buf[..5].copy_from_slice(b"hello");
        assert_eq!(&buf[..6], b"hello\0");
    }

    proptest!
    {
        #[test]
        fn buffers_are_suitably_aligned_and_zeroed(
            sizes in p::collection::vec(
                0usize ..= 20_000,
                p::collection::SizeRange::default(),
            ),
        )
        {
            // Keep every buffer alive so each gets a unique address.
            let bufs: Vec<AlignedBuf<4096>> =
                sizes.iter()
                .map(|&size| AlignedBuf::zeroed(size))
                .map(Result::unwrap)
                .collect();
            for (buf, size) in bufs.iter().zip(sizes) {
                assert_eq!(buf.as_ptr() as usize % 4096, 0);
                assert_eq!(buf.len(), size);
                assert!(buf.iter().all(|&b| b == 0));
            }
        }
    }
}
