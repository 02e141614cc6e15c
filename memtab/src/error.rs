use {crate::ObjectId, std::ffi::c_int, thiserror::Error};

/// Result of an object table operation.
pub type Result<T> =
    std::result::Result<T, Error>;

/// Object table error.
///
/// A failed operation leaves the table as it was.
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum Error
{
    /// A size or capacity argument is zero or out of range.
    #[error("Invalid argument")]
    InvalidArgument,

    /// The identifier lies outside the table.
    #[error("Object identifier is outside the table")]
    BadHandle,

    /// The identifier lies inside the table, but names no active object.
    #[error("No such object")]
    NotFound,

    /// Every slot of the table is active.
    #[error("Object table is full")]
    TableFull,

    /// The block allocator could not supply enough blocks.
    #[error("Block allocator is out of space")]
    OutOfSpace,

    /// The object is locked.
    #[error("Object is locked")]
    Busy,

    /// The content does not fit in the object.
    #[error("Content exceeds object capacity")]
    TooLarge,

    /// The block allocator refused to reclaim the object's region.
    #[error("Block allocator refused to reclaim region")]
    DeallocationFailed,
}

impl Error
{
    /// The `errno` value that C interfaces report for this error.
    ///
    /// C interfaces return the negated value.
    pub fn errno(self) -> c_int
    {
        match self {
            Self::InvalidArgument    => libc::EINVAL,
            Self::BadHandle          => libc::EBADF,
            Self::NotFound           => libc::ENOENT,
            Self::TableFull          => libc::ENFILE,
            Self::OutOfSpace         => libc::ENOSPC,
            Self::Busy               => libc::EBUSY,
            Self::TooLarge           => libc::EFBIG,
            Self::DeallocationFailed => libc::EDEADLK,
        }
    }
}

/// Returned when an object could not be released.
///
/// The identifier is handed back so that the release can be retried.
#[derive(Debug, Error)]
#[error("Cannot release object {id}: {error}")]
pub struct ReleaseError
{
    /// The identifier that was passed to [`release`].
    ///
    /// [`release`]: `crate::ObjectTable::release`
    pub id: ObjectId,

    /// Why the object was not released.
    #[source]
    pub error: Error,
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn errno_values_are_distinct()
    {
        let all = [
            Error::InvalidArgument, Error::BadHandle, Error::NotFound,
            Error::TableFull, Error::OutOfSpace, Error::Busy,
            Error::TooLarge, Error::DeallocationFailed,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1 ..] {
                assert_ne!(a.errno(), b.errno(), "{a:?} and {b:?}");
            }
        }
    }

    #[test]
    fn release_error_mentions_object()
    {
        let err = ReleaseError{id: ObjectId::from_raw(3), error: Error::Busy};
        assert_eq!(err.to_string(), "Cannot release object #3: Object is locked");
    }
}
