//! A small, single-volume block-based file system over a simulated block device.
//!
//! The device is an addressable array of fixed-size blocks, exposed through the [`BlockDevice`]
//! trait. On top of it, [`FileSystem`] implements a flat namespace (no directories) of at most
//! [`constants::MAX_FILE_NUM`] named files, each bounded to [`constants::MAX_FILE_SIZE`] bytes,
//! with create/remove, open/close, sequential read/write with a per-file seek pointer, CRC32
//! per-block integrity metadata, and symbolic links between names.

pub mod bitmap;
pub mod config;
pub mod constants;
pub mod crc32;
pub mod device;
pub mod error;
mod fs;
pub mod inode;
pub mod superblock;

pub use config::FsConfig;
pub use device::BlockDevice;
pub use device::FileBlockDevice;
pub use device::MemBlockDevice;
pub use error::FsError;
pub use fs::DescState;
pub use fs::Descriptor;
pub use fs::FileSystem;
pub use fs::Whence;
pub use fs::FS_SEEK_BEGIN;
pub use fs::FS_SEEK_CUR;
pub use fs::FS_SEEK_END;
