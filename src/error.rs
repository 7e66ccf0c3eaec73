//! The crate's internal typed error, converted to the public API's integer sentinel at each
//! boundary (see the module docs on [`crate::fs`]).

use thiserror::Error;

/// Every distinct way a file system operation can fail internally.
#[derive(Debug, Error)]
pub enum FsError {
    /// An operation that requires a mounted file system was called before `mount`.
    #[error("file system is not mounted")]
    NotMounted,
    /// `mount` was called while already mounted.
    #[error("file system is already mounted")]
    AlreadyMounted,
    /// The requested device size falls outside `[MIN_DISK_SIZE, MAX_DISK_SIZE]`.
    #[error("device size out of range")]
    DeviceSizeOutOfRange,
    /// `create_file`/`create_ln` was given a name that already resolves to a file or link.
    #[error("name already exists")]
    NameExists,
    /// A name exceeds `MAX_NAME_LENGTH`.
    #[error("name too long")]
    NameTooLong,
    /// No free inode slot is available.
    #[error("no free inode")]
    NoFreeInode,
    /// No free data block is available.
    #[error("no free data block")]
    NoFreeBlock,
    /// A name did not resolve to any live inode.
    #[error("name not found")]
    NotFound,
    /// An operation was attempted on an inode of the wrong variant (e.g. `remove_file` on a
    /// link, or `remove_ln` on a file).
    #[error("wrong inode variant")]
    WrongVariant,
    /// `open_file` was called on a descriptor that is already open.
    #[error("file is already open")]
    AlreadyOpen,
    /// An operation requiring an open descriptor was given one that is closed.
    #[error("file is not open")]
    AlreadyClosed,
    /// `close_file` was called on a descriptor opened via `open_file_integrity`.
    #[error("file has an open integrity session, use close_file_integrity")]
    IntegritySessionRequired,
    /// A file descriptor is out of range or does not refer to a live inode.
    #[error("invalid file descriptor")]
    InvalidDescriptor,
    /// The resulting seek position would fall outside `[0, MAX_FILE_SIZE]`.
    #[error("seek out of range")]
    InvalidSeek,
    /// `check_file`/`open_file_integrity` found a block whose CRC does not match.
    #[error("file is corrupted")]
    Corrupted,
    /// `check_file` was called on a file with no tracked blocks at all.
    #[error("no integrity information recorded")]
    NoIntegrityInfo,
    /// A link's source resolved to another link; link-to-link chains are not supported.
    #[error("link chains are not supported")]
    LinkChain,
    /// The underlying block device failed.
    #[error("device I/O error: {0}")]
    Io(#[from] std::io::Error),
}
