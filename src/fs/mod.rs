//! The file system core: one `FileSystem<D>` value owning a superblock, an inode table, and a
//! file descriptor table, all driven through a [`BlockDevice`].
//!
//! Every public method here implements one operation of the external interface and returns the
//! spec's C-style integer sentinel (`0`/`-1`/`-2`/`-3`/`bytes`) rather than a `Result`, so the
//! crate's externally observable behavior stays a faithful port of the original contract.
//! Internally, each method builds its result from `Result<_, FsError>`-returning helpers and logs
//! the outcome via the `log` crate at the point where the `FsError` is converted to a sentinel.

mod alloc;
mod block_map;
mod file_ops;
mod integrity;
mod link_ops;
mod name;

use crate::constants::DATA_BLOCK_START;
use crate::constants::INODES_PER_BLOCK;
use crate::constants::INODE_RECORD_SIZE;
use crate::constants::INODE_TABLE_BLOCK_0;
use crate::constants::INODE_TABLE_BLOCK_1;
use crate::constants::MAX_DISK_SIZE;
use crate::constants::MAX_FILE_NUM;
use crate::constants::MIN_DISK_SIZE;
use crate::constants::SUPERBLOCK_BLOCK;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::Inode;
use crate::superblock::Superblock;
use std::array;

/// Whether a file descriptor is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescState {
    /// The slot's file is not open.
    Closed,
    /// The slot's file is open, with a live seek offset.
    Open,
}

/// The in-memory, non-persisted state tracked per inode slot while mounted.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Whether this slot is currently open.
    pub state: DescState,
    /// The current seek offset, in `0..=MAX_FILE_SIZE`.
    pub offset: u32,
    /// Whether this slot was opened via `open_file_integrity` and must be closed with
    /// `close_file_integrity`.
    pub integrity: bool,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            state: DescState::Closed,
            offset: 0,
            integrity: false,
        }
    }
}

/// `whence` argument to [`FileSystem::lseek_file`], mirroring the external `FS_SEEK_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Seek relative to the start of the file.
    Begin,
    /// Seek relative to the current offset.
    Cur,
    /// Seek relative to the end of the file.
    End,
}

/// `FS_SEEK_BEGIN` from the external interface, equal to `Whence::Begin`.
pub const FS_SEEK_BEGIN: i32 = 0;
/// `FS_SEEK_CUR` from the external interface, equal to `Whence::Cur`.
pub const FS_SEEK_CUR: i32 = 1;
/// `FS_SEEK_END` from the external interface, equal to `Whence::End`.
pub const FS_SEEK_END: i32 = 2;

/// The file system: a superblock, an inode table, a file descriptor table, and the device they're
/// all backed by.
pub struct FileSystem<D: BlockDevice> {
    device: D,
    mounted: bool,
    superblock: Superblock,
    inodes: [Inode; MAX_FILE_NUM],
    descriptors: [Descriptor; MAX_FILE_NUM],
}

impl<D: BlockDevice> FileSystem<D> {
    /// Wraps `device` in a fresh, unmounted `FileSystem`.
    pub fn new(device: D) -> Self {
        Self {
            device,
            mounted: false,
            superblock: Superblock::new(0, 0),
            inodes: array::from_fn(|_| Inode::Free),
            descriptors: [Descriptor::default(); MAX_FILE_NUM],
        }
    }

    /// Returns whether the file system is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Returns the number of currently live inodes (files + links). Only meaningful while
    /// mounted.
    pub fn num_inodes(&self) -> u32 {
        self.superblock.num_inodes
    }

    fn require_mounted(&self) -> Result<(), FsError> {
        if self.mounted {
            Ok(())
        } else {
            Err(FsError::NotMounted)
        }
    }

    /// Validates that `fd` is in range and refers to a live inode, returning it as a slot index.
    fn valid_fd(&self, fd: i32) -> Result<usize, FsError> {
        if fd < 0 {
            return Err(FsError::InvalidDescriptor);
        }
        let id = fd as usize;
        if self.live_inode(id).is_none() {
            return Err(FsError::InvalidDescriptor);
        }
        Ok(id)
    }

    /// Formats a fresh, empty file system of `size` bytes onto the device.
    ///
    /// Returns `0` on success, `-1` if `size` falls outside `[MIN_DISK_SIZE, MAX_DISK_SIZE]`.
    pub fn mk_fs(&mut self, size: u64) -> i64 {
        match self.mk_fs_inner(size) {
            Ok(()) => {
                log::debug!("mk_fs({size}): formatted");
                0
            }
            Err(e) => {
                log::warn!("mk_fs({size}): {e}");
                -1
            }
        }
    }

    fn mk_fs_inner(&mut self, size: u64) -> Result<(), FsError> {
        if !(MIN_DISK_SIZE..=MAX_DISK_SIZE).contains(&size) {
            return Err(FsError::DeviceSizeOutOfRange);
        }
        let usable = size.saturating_sub(DATA_BLOCK_START as u64 * crate::constants::BLOCK_SIZE as u64);
        let block_num =
            (usable / crate::constants::BLOCK_SIZE as u64).min(crate::constants::MAX_BLOCK_NUM as u64) as u32;

        let superblock = Superblock::new(size, block_num);
        self.device.bwrite(SUPERBLOCK_BLOCK, &superblock.to_block())?;

        // A free inode's on-disk record is all zero bytes (see `Inode::to_bytes`), so a fresh
        // inode table is just two zeroed blocks.
        let zero_block = [0u8; crate::constants::BLOCK_SIZE];
        self.device.bwrite(INODE_TABLE_BLOCK_0, &zero_block)?;
        self.device.bwrite(INODE_TABLE_BLOCK_1, &zero_block)?;

        for i in 0..block_num {
            self.device.bwrite(DATA_BLOCK_START + i, &zero_block)?;
        }

        Ok(())
    }

    /// Mounts the file system, loading the superblock and inode table into memory.
    ///
    /// Returns `0` on success, `-1` if already mounted.
    pub fn mount(&mut self) -> i64 {
        match self.mount_inner() {
            Ok(()) => {
                let num_inodes = self.superblock.num_inodes;
                log::debug!("mount: ok, {num_inodes} inodes live");
                0
            }
            Err(e) => {
                log::warn!("mount: {e}");
                -1
            }
        }
    }

    fn mount_inner(&mut self) -> Result<(), FsError> {
        if self.mounted {
            return Err(FsError::AlreadyMounted);
        }

        let mut block = [0u8; crate::constants::BLOCK_SIZE];
        self.device.bread(SUPERBLOCK_BLOCK, &mut block)?;
        let superblock = Superblock::from_block(&block);

        self.device.bread(INODE_TABLE_BLOCK_0, &mut block)?;
        Self::read_inode_table(&block, &superblock, 0, &mut self.inodes);
        self.device.bread(INODE_TABLE_BLOCK_1, &mut block)?;
        Self::read_inode_table(&block, &superblock, INODES_PER_BLOCK, &mut self.inodes);

        self.superblock = superblock;
        self.descriptors = [Descriptor::default(); MAX_FILE_NUM];
        self.mounted = true;
        Ok(())
    }

    /// Unmounts the file system, flushing the superblock and inode table back to the device.
    ///
    /// Returns `0` on success, `-1` if not mounted.
    pub fn unmount(&mut self) -> i64 {
        match self.unmount_inner() {
            Ok(()) => {
                log::debug!("unmount: ok");
                0
            }
            Err(e) => {
                log::warn!("unmount: {e}");
                -1
            }
        }
    }

    fn unmount_inner(&mut self) -> Result<(), FsError> {
        self.require_mounted()?;

        self.device.bwrite(SUPERBLOCK_BLOCK, &self.superblock.to_block())?;
        self.device
            .bwrite(INODE_TABLE_BLOCK_0, &Self::inode_table_block(&self.inodes, 0))?;
        self.device.bwrite(
            INODE_TABLE_BLOCK_1,
            &Self::inode_table_block(&self.inodes, INODES_PER_BLOCK),
        )?;

        self.mounted = false;
        Ok(())
    }

    /// Packs `INODES_PER_BLOCK` consecutive inodes starting at `start` into one block buffer.
    fn inode_table_block(inodes: &[Inode; MAX_FILE_NUM], start: usize) -> [u8; crate::constants::BLOCK_SIZE] {
        let mut block = [0u8; crate::constants::BLOCK_SIZE];
        for (i, inode) in inodes[start..start + INODES_PER_BLOCK].iter().enumerate() {
            let record = inode.to_bytes();
            let off = i * INODE_RECORD_SIZE;
            block[off..off + INODE_RECORD_SIZE].copy_from_slice(&record);
        }
        block
    }

    /// Unpacks `INODES_PER_BLOCK` inodes from one block buffer into `inodes[start..]`, gating
    /// liveness on the superblock's inode bitmap rather than the record's own tag byte.
    fn read_inode_table(
        block: &[u8; crate::constants::BLOCK_SIZE],
        superblock: &Superblock,
        start: usize,
        inodes: &mut [Inode; MAX_FILE_NUM],
    ) {
        for i in 0..INODES_PER_BLOCK {
            let off = i * INODE_RECORD_SIZE;
            let record: [u8; INODE_RECORD_SIZE] = block[off..off + INODE_RECORD_SIZE].try_into().unwrap();
            let slot = start + i;
            let live = crate::bitmap::get(&superblock.inode_bitmap, slot);
            inodes[slot] = Inode::from_bytes(&record, live);
        }
    }
}
