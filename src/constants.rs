//! Constants describing the on-disk layout and the limits of the file system.

/// The size in bytes of a single block, and of every buffer handed to a [`crate::BlockDevice`].
pub const BLOCK_SIZE: usize = 2048;

/// The maximum number of files and links the file system can hold at once.
pub const MAX_FILE_NUM: usize = 48;

/// The maximum length in bytes of a file or link name, not counting a trailing nul.
pub const MAX_NAME_LENGTH: usize = 32;

/// The number of direct data blocks referenced by a file inode.
pub const DIRECT_BLOCKS: usize = 5;

/// The maximum size in bytes of a single file (`DIRECT_BLOCKS * BLOCK_SIZE`).
pub const MAX_FILE_SIZE: usize = DIRECT_BLOCKS * BLOCK_SIZE;

/// The maximum number of data blocks the file system can allocate (`MAX_FILE_NUM * DIRECT_BLOCKS`).
pub const MAX_BLOCK_NUM: usize = MAX_FILE_NUM * DIRECT_BLOCKS;

/// The smallest device size `mk_fs` accepts, in bytes.
pub const MIN_DISK_SIZE: u64 = 460 * 1024;

/// The largest device size `mk_fs` accepts, in bytes.
pub const MAX_DISK_SIZE: u64 = 600 * 1024;

/// The superblock's magic number.
pub const MAGIC: u32 = 383464;

/// The number of bytes needed to hold `MAX_FILE_NUM` bits, rounded up.
pub const INODE_BITMAP_BYTES: usize = MAX_FILE_NUM.div_ceil(8);

/// The number of bytes needed to hold `MAX_BLOCK_NUM` bits, rounded up.
pub const BLOCK_BITMAP_BYTES: usize = MAX_BLOCK_NUM.div_ceil(8);

/// The number of inodes stored per inode-table block.
pub const INODES_PER_BLOCK: usize = MAX_FILE_NUM / 2;

/// The on-disk size in bytes of a single inode record.
pub const INODE_RECORD_SIZE: usize = 80;

/// Block index of the superblock.
pub const SUPERBLOCK_BLOCK: u32 = 0;

/// Block index of the first half of the inode table (inodes `0..INODES_PER_BLOCK`).
pub const INODE_TABLE_BLOCK_0: u32 = 1;

/// Block index of the second half of the inode table (inodes `INODES_PER_BLOCK..MAX_FILE_NUM`).
pub const INODE_TABLE_BLOCK_1: u32 = 2;

/// Block index at which the data region begins.
pub const DATA_BLOCK_START: u32 = 3;

const _: () = assert!(INODES_PER_BLOCK * INODE_RECORD_SIZE <= BLOCK_SIZE);
