//! `ialloc`/`ifree`/`balloc`/`bfree`: the inode and data-block allocators.

use super::FileSystem;
use crate::bitmap;
use crate::constants::BLOCK_SIZE;
use crate::constants::DATA_BLOCK_START;
use crate::constants::MAX_FILE_NUM;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::Inode;

impl<D: BlockDevice> FileSystem<D> {
    /// Allocates a free inode slot, setting its bitmap bit and resetting it to `Inode::Free`.
    ///
    /// Fails with [`FsError::NoFreeInode`] if every slot is taken.
    pub(super) fn ialloc(&mut self) -> Result<usize, FsError> {
        let id = bitmap::find_first_clear(&self.superblock.inode_bitmap, MAX_FILE_NUM)
            .ok_or(FsError::NoFreeInode)?;
        bitmap::set(&mut self.superblock.inode_bitmap, id);
        self.inodes[id] = Inode::Free;
        Ok(id)
    }

    /// Frees inode slot `i`, resetting it to `Inode::Free`. Does not free any of its data
    /// blocks; callers must do that first.
    ///
    /// Fails with [`FsError::InvalidDescriptor`] if `i` is out of range or already free.
    pub(super) fn ifree(&mut self, i: usize) -> Result<(), FsError> {
        if i >= MAX_FILE_NUM || !bitmap::get(&self.superblock.inode_bitmap, i) {
            return Err(FsError::InvalidDescriptor);
        }
        bitmap::clear(&mut self.superblock.inode_bitmap, i);
        self.inodes[i] = Inode::Free;
        Ok(())
    }

    /// Allocates a free data block, zeroing it on disk, and returns its index.
    ///
    /// Fails with [`FsError::NoFreeBlock`] if every block is taken.
    pub(super) fn balloc(&mut self) -> Result<i32, FsError> {
        let block_num = self.superblock.block_num as usize;
        let b = bitmap::find_first_clear(&self.superblock.block_bitmap, block_num)
            .ok_or(FsError::NoFreeBlock)?;
        bitmap::set(&mut self.superblock.block_bitmap, b);
        self.device.bwrite(DATA_BLOCK_START + b as u32, &[0u8; BLOCK_SIZE])?;
        Ok(b as i32)
    }

    /// Frees data block `b`, scrubbing it to zero on disk.
    ///
    /// Fails with [`FsError::InvalidDescriptor`] if `b` is out of range or already free.
    pub(super) fn bfree(&mut self, b: i32) -> Result<(), FsError> {
        let block_num = self.superblock.block_num;
        if b < 0 || b as u32 >= block_num || !bitmap::get(&self.superblock.block_bitmap, b as usize)
        {
            return Err(FsError::InvalidDescriptor);
        }
        bitmap::clear(&mut self.superblock.block_bitmap, b as usize);
        self.device.bwrite(DATA_BLOCK_START + b as u32, &[0u8; BLOCK_SIZE])?;
        Ok(())
    }
}
