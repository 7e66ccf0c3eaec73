//! Per-block CRC32 integrity tracking, layered on top of the plain file operations.

use super::FileSystem;
use crate::constants::BLOCK_SIZE;
use crate::constants::DATA_BLOCK_START;
use crate::crc32;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::Inode;
use crate::inode::NO_BLOCK;

impl<D: BlockDevice> FileSystem<D> {
    /// Recomputes and stores the CRC32 of every allocated direct block of the file named `name`.
    ///
    /// Returns `0` on success, `-1` if `name` does not resolve, `-2` on any other failure (wrong
    /// variant, device I/O, not mounted).
    pub fn include_integrity(&mut self, name: &str) -> i64 {
        match self.include_integrity_inner(name) {
            Ok(()) => {
                log::debug!("include_integrity({name:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("include_integrity({name:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    _ => -2,
                }
            }
        }
    }

    fn include_integrity_inner(&mut self, name: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.name_i(name).ok_or(FsError::NotFound)?;
        self.include_integrity_at(id)
    }

    pub(super) fn include_integrity_at(&mut self, id: usize) -> Result<(), FsError> {
        let direct_block = match &self.inodes[id] {
            Inode::File(f) => f.direct_block,
            _ => return Err(FsError::WrongVariant),
        };

        let mut crcs = [0u32; crate::constants::DIRECT_BLOCKS];
        for (i, &b) in direct_block.iter().enumerate() {
            if b == NO_BLOCK {
                continue;
            }
            let mut block = [0u8; BLOCK_SIZE];
            self.device.bread(DATA_BLOCK_START + b as u32, &mut block)?;
            crcs[i] = crc32::checksum(&block);
        }

        match &mut self.inodes[id] {
            Inode::File(f) => f.crc = crcs,
            _ => unreachable!("variant checked above"),
        }
        Ok(())
    }

    /// Verifies every tracked direct block of the file named `name` against its stored CRC32.
    ///
    /// Returns `0` if every tracked block matches, `-1` if a tracked block's CRC does not match,
    /// `-2` if the file has no blocks with a stored CRC, or if `name` does not resolve, or on any
    /// other failure (wrong variant, device I/O, not mounted).
    pub fn check_file(&mut self, name: &str) -> i64 {
        match self.check_file_inner(name) {
            Ok(()) => {
                log::debug!("check_file({name:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("check_file({name:?}): {e}");
                match e {
                    FsError::Corrupted => -1,
                    _ => -2,
                }
            }
        }
    }

    fn check_file_inner(&mut self, name: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.name_i(name).ok_or(FsError::NotFound)?;
        self.check_file_at(id)
    }

    pub(super) fn check_file_at(&mut self, id: usize) -> Result<(), FsError> {
        let (direct_block, crc) = match &self.inodes[id] {
            Inode::File(f) => (f.direct_block, f.crc),
            _ => return Err(FsError::WrongVariant),
        };

        let mut tracked_any = false;
        for (&b, &expected) in direct_block.iter().zip(crc.iter()) {
            if b == NO_BLOCK || expected == 0 {
                continue;
            }
            tracked_any = true;
            let mut block = [0u8; BLOCK_SIZE];
            self.device.bread(DATA_BLOCK_START + b as u32, &mut block)?;
            if crc32::checksum(&block) != expected {
                return Err(FsError::Corrupted);
            }
        }

        if !tracked_any {
            return Err(FsError::NoIntegrityInfo);
        }
        Ok(())
    }

    /// Opens the file named `name` under an integrity-guarded session: [`check_file`] must pass
    /// before the open succeeds, and the descriptor must later be closed with
    /// [`close_file_integrity`](Self::close_file_integrity), not `close_file`.
    ///
    /// Returns `fd >= 0` on success, `-1` if `name` does not resolve, `-2` if a tracked block is
    /// corrupted, `-3` if the file has no integrity information recorded (or the open itself
    /// fails for another reason).
    ///
    /// [`check_file`]: Self::check_file
    pub fn open_file_integrity(&mut self, name: &str) -> i64 {
        match self.open_file_integrity_inner(name) {
            Ok(id) => {
                log::debug!("open_file_integrity({name:?}): fd={id}");
                id as i64
            }
            Err(e) => {
                log::warn!("open_file_integrity({name:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    FsError::Corrupted => -2,
                    _ => -3,
                }
            }
        }
    }

    fn open_file_integrity_inner(&mut self, name: &str) -> Result<usize, FsError> {
        self.require_mounted()?;
        let id = self.name_i(name).ok_or(FsError::NotFound)?;
        self.check_file_at(id)?;
        self.open_at_for_integrity(id)?;
        Ok(id)
    }

    /// Like `open_at`, but marks the descriptor's `integrity` flag once opened.
    fn open_at_for_integrity(&mut self, id: usize) -> Result<(), FsError> {
        self.open_at(id)?;
        self.descriptors[id].integrity = true;
        Ok(())
    }

    /// Closes a descriptor previously opened with [`open_file_integrity`](Self::open_file_integrity),
    /// refreshing its stored CRCs first.
    ///
    /// Returns `0` on success, `-1` if `fd` was not opened via `open_file_integrity` or any other
    /// failure.
    pub fn close_file_integrity(&mut self, fd: i32) -> i64 {
        match self.close_file_integrity_inner(fd) {
            Ok(()) => {
                log::debug!("close_file_integrity({fd}): ok");
                0
            }
            Err(e) => {
                log::warn!("close_file_integrity({fd}): {e}");
                -1
            }
        }
    }

    fn close_file_integrity_inner(&mut self, fd: i32) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.valid_fd(fd)?;
        if !self.descriptors[id].integrity {
            return Err(FsError::IntegritySessionRequired);
        }
        self.include_integrity_at(id)?;
        self.descriptors[id].integrity = false;
        self.close_at(id)
    }
}
