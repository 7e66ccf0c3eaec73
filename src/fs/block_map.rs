//! `b_map`: translating a byte offset within a file to a data-block id, lazily allocating.

use super::FileSystem;
use crate::constants::BLOCK_SIZE;
use crate::constants::DIRECT_BLOCKS;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::Inode;
use crate::inode::NO_BLOCK;

impl<D: BlockDevice> FileSystem<D> {
    /// Returns the data-block id backing byte `offset` of the file at inode slot `id`,
    /// allocating it first if it isn't backed yet.
    ///
    /// `block = offset / BLOCK_SIZE` is clamped to `[0, DIRECT_BLOCKS - 1]`: `write_file` never
    /// calls this with an offset at or past `MAX_FILE_SIZE` since `n` is clamped first, but
    /// clamping here too means this function can never over-index `direct_block` even if a
    /// caller somehow did.
    pub(super) fn b_map(&mut self, id: usize, offset: u32) -> Result<i32, FsError> {
        if self.live_inode(id).is_none() {
            return Err(FsError::InvalidDescriptor);
        }
        let block = ((offset as usize) / BLOCK_SIZE).min(DIRECT_BLOCKS - 1);

        let existing = match &self.inodes[id] {
            Inode::File(f) => f.direct_block[block],
            _ => return Err(FsError::WrongVariant),
        };
        if existing != NO_BLOCK {
            return Ok(existing);
        }

        let allocated = self.balloc()?;
        match &mut self.inodes[id] {
            Inode::File(f) => f.direct_block[block] = allocated,
            _ => unreachable!("variant checked above"),
        }
        Ok(allocated)
    }
}

#[cfg(test)]
mod test {
    use crate::constants::BLOCK_SIZE;
    use crate::constants::MIN_DISK_SIZE;
    use crate::device::MemBlockDevice;
    use crate::fs::FileSystem;
    use crate::inode::Inode;

    #[test]
    fn lazily_allocates_and_is_idempotent() {
        let mut fs = FileSystem::new(MemBlockDevice::new(256));
        fs.mk_fs(MIN_DISK_SIZE);
        fs.mount();
        assert_eq!(fs.create_file("a.txt"), 0);
        let id = fs.name_i("a.txt").unwrap();

        // block 0 is already allocated eagerly by create_file.
        let first = fs.b_map(id, 0).unwrap();
        assert_eq!(fs.b_map(id, 0).unwrap(), first);

        // block 1 (offset BLOCK_SIZE) is not allocated yet.
        let Inode::File(f) = &fs.inodes[id] else {
            panic!("expected a file inode")
        };
        assert_eq!(f.direct_block[1], -1);

        let second = fs.b_map(id, BLOCK_SIZE as u32).unwrap();
        assert_ne!(second, first);

        let Inode::File(f) = &fs.inodes[id] else {
            panic!("expected a file inode")
        };
        assert_eq!(f.direct_block[1], second);
    }

    #[test]
    fn clamps_offset_at_the_last_direct_block() {
        let mut fs = FileSystem::new(MemBlockDevice::new(256));
        fs.mk_fs(MIN_DISK_SIZE);
        fs.mount();
        fs.create_file("a.txt");
        let id = fs.name_i("a.txt").unwrap();

        let in_range = fs.b_map(id, (4 * BLOCK_SIZE) as u32).unwrap();
        let past_end = fs.b_map(id, (5 * BLOCK_SIZE + 500) as u32).unwrap();
        assert_eq!(in_range, past_end);
    }
}
