//! Name resolution: mapping a name to its inode slot.

use super::FileSystem;
use crate::constants::MAX_FILE_NUM;
use crate::device::BlockDevice;
use crate::inode::Inode;

impl<D: BlockDevice> FileSystem<D> {
    /// Scans every inode slot for one resolving to `name`.
    ///
    /// Gated on the inode bitmap (liveness), not on leftover field contents of a freed slot: a
    /// freed inode's bytes are not guaranteed to have been scrubbed on every code path.
    pub(super) fn name_i(&self, name: &str) -> Option<usize> {
        (0..MAX_FILE_NUM).find(|&i| {
            crate::bitmap::get(&self.superblock.inode_bitmap, i)
                && self.inodes[i].resolved_name() == Some(name)
        })
    }

    /// Returns the inode at `id`, or `None` if `id` is out of range or not live.
    pub(super) fn live_inode(&self, id: usize) -> Option<&Inode> {
        if id >= MAX_FILE_NUM || !crate::bitmap::get(&self.superblock.inode_bitmap, id) {
            return None;
        }
        Some(&self.inodes[id])
    }
}

#[cfg(test)]
mod test {
    use crate::device::MemBlockDevice;
    use crate::fs::FileSystem;
    use crate::constants::MIN_DISK_SIZE;

    #[test]
    fn resolves_by_own_name_only() {
        let device = MemBlockDevice::new(256);
        let mut fs = FileSystem::new(device);
        assert_eq!(fs.mk_fs(MIN_DISK_SIZE), 0);
        assert_eq!(fs.mount(), 0);
        assert_eq!(fs.create_file("a.txt"), 0);
        assert_eq!(fs.create_ln("a.txt", "alias"), 0);

        assert_eq!(fs.name_i("a.txt"), Some(0));
        assert_eq!(fs.name_i("alias"), Some(1));
        // A link's source name must not itself resolve through the link's own name field once
        // it has been aliased; it still resolves to the original file, not the link slot.
        assert_eq!(fs.name_i("missing"), None);
    }
}
