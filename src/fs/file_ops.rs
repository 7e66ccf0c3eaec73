//! The file lifecycle: create, remove, open, close, read, write, seek.
//!
//! A file descriptor is the inode slot index itself (see module docs on [`crate::fs`]); a link's
//! fd is its own slot, but every I/O operation on it delegates to the slot its source resolves to.

use super::DescState;
use super::Descriptor;
use super::FileSystem;
use super::Whence;
use crate::constants::BLOCK_SIZE;
use crate::constants::DATA_BLOCK_START;
use crate::constants::MAX_FILE_SIZE;
use crate::constants::MAX_NAME_LENGTH;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::FileInode;
use crate::inode::Inode;
use crate::inode::NO_BLOCK;

impl<D: BlockDevice> FileSystem<D> {
    /// Creates a fresh, empty file named `name`.
    ///
    /// Returns `0` on success, `-1` if the name already resolves to a file or link, `-2` on any
    /// other failure (name too long, no free inode/block, not mounted).
    pub fn create_file(&mut self, name: &str) -> i64 {
        match self.create_file_inner(name) {
            Ok(()) => {
                log::debug!("create_file({name:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("create_file({name:?}): {e}");
                match e {
                    FsError::NameExists => -1,
                    _ => -2,
                }
            }
        }
    }

    fn create_file_inner(&mut self, name: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        if self.name_i(name).is_some() {
            return Err(FsError::NameExists);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong);
        }
        let id = self.ialloc()?;
        let first_block = match self.balloc() {
            Ok(b) => b,
            Err(e) => {
                // Don't leave a half-allocated inode behind on the failure path.
                let _ = self.ifree(id);
                return Err(e);
            }
        };
        self.inodes[id] = Inode::File(FileInode::new(name, first_block));
        self.superblock.num_inodes += 1;
        Ok(())
    }

    /// Removes the file named `name`, freeing its inode and every data block it holds.
    ///
    /// Returns `0` on success, `-1` if the name does not resolve to a live inode, `-2` on any
    /// other failure (wrong variant, allocator inconsistency, not mounted).
    pub fn remove_file(&mut self, name: &str) -> i64 {
        match self.remove_file_inner(name) {
            Ok(()) => {
                log::debug!("remove_file({name:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("remove_file({name:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    _ => -2,
                }
            }
        }
    }

    fn remove_file_inner(&mut self, name: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.name_i(name).ok_or(FsError::NotFound)?;
        let direct_block = match &self.inodes[id] {
            Inode::File(f) => f.direct_block,
            _ => return Err(FsError::WrongVariant),
        };
        for b in direct_block {
            if b != NO_BLOCK {
                self.bfree(b)?;
            }
        }
        self.ifree(id)?;
        self.superblock.num_inodes -= 1;
        Ok(())
    }

    /// Opens the file or link named `name`, returning its file descriptor.
    ///
    /// Returns `fd >= 0` on success, `-1` if the name does not resolve, `-2` on any other failure
    /// (already open, not mounted, link chain too deep).
    pub fn open_file(&mut self, name: &str) -> i64 {
        match self.open_file_inner(name) {
            Ok(id) => {
                log::debug!("open_file({name:?}): fd={id}");
                id as i64
            }
            Err(e) => {
                log::warn!("open_file({name:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    _ => -2,
                }
            }
        }
    }

    fn open_file_inner(&mut self, name: &str) -> Result<usize, FsError> {
        self.require_mounted()?;
        let id = self.name_i(name).ok_or(FsError::NotFound)?;
        self.open_at(id)?;
        Ok(id)
    }

    pub(super) fn open_at(&mut self, id: usize) -> Result<(), FsError> {
        if self.descriptors[id].state == DescState::Open {
            return Err(FsError::AlreadyOpen);
        }
        if let Inode::Link(l) = &self.inodes[id] {
            let source_name = l.source.clone();
            let source_id = self.resolve_source(&source_name)?;
            self.open_at(source_id)?;
        }
        self.descriptors[id] = Descriptor {
            state: DescState::Open,
            offset: 0,
            integrity: false,
        };
        Ok(())
    }

    /// Closes descriptor `fd`.
    ///
    /// Returns `0` on success, `-1` if not mounted, `fd` is invalid or already closed, or `fd`
    /// holds an open integrity session (use [`close_file_integrity`](Self::close_file_integrity)
    /// instead).
    pub fn close_file(&mut self, fd: i32) -> i64 {
        match self.close_file_inner(fd) {
            Ok(()) => {
                log::debug!("close_file({fd}): ok");
                0
            }
            Err(e) => {
                log::warn!("close_file({fd}): {e}");
                -1
            }
        }
    }

    fn close_file_inner(&mut self, fd: i32) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.valid_fd(fd)?;
        self.close_at(id)
    }

    pub(super) fn close_at(&mut self, id: usize) -> Result<(), FsError> {
        let desc = self.descriptors[id];
        if desc.state != DescState::Open {
            return Err(FsError::AlreadyClosed);
        }
        if desc.integrity {
            return Err(FsError::IntegritySessionRequired);
        }
        if let Inode::Link(l) = &self.inodes[id] {
            let source_name = l.source.clone();
            let source_id = self.resolve_source(&source_name)?;
            self.close_at(source_id)?;
        }
        self.descriptors[id].state = DescState::Closed;
        Ok(())
    }

    /// Reads up to `n` bytes (capped to `buf.len()`) from descriptor `fd` at its current offset
    /// into `buf`, advancing the offset by the number of bytes actually read.
    ///
    /// Returns the number of bytes read (`0` at end of file) on success, `-1` on any failure.
    pub fn read_file(&mut self, fd: i32, buf: &mut [u8], n: usize) -> i64 {
        match self.read_file_inner(fd, buf, n) {
            Ok(read) => {
                log::debug!("read_file({fd}, n={n}): {read} bytes");
                read as i64
            }
            Err(e) => {
                log::warn!("read_file({fd}, n={n}): {e}");
                -1
            }
        }
    }

    fn read_file_inner(&mut self, fd: i32, buf: &mut [u8], n: usize) -> Result<usize, FsError> {
        self.require_mounted()?;
        let id = self.valid_fd(fd)?;
        self.read_at(id, buf, n)
    }

    fn read_at(&mut self, id: usize, buf: &mut [u8], n: usize) -> Result<usize, FsError> {
        if self.descriptors[id].state != DescState::Open {
            return Err(FsError::AlreadyClosed);
        }
        if let Inode::Link(l) = &self.inodes[id] {
            let source_name = l.source.clone();
            let source_id = self.resolve_source(&source_name)?;
            return self.read_at(source_id, buf, n);
        }

        let n = n.min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        let (size, pos) = match &self.inodes[id] {
            Inode::File(f) => (f.size, self.descriptors[id].offset),
            _ => return Err(FsError::WrongVariant),
        };
        if pos == size {
            return Ok(0);
        }
        let n = n.min((size - pos) as usize);

        let mut read = 0;
        let mut cur = pos;
        while read < n {
            let block_off = (cur as usize) % BLOCK_SIZE;
            let block_id = match &self.inodes[id] {
                Inode::File(f) => f.direct_block[(cur as usize) / BLOCK_SIZE],
                _ => unreachable!("variant checked above"),
            };
            let mut block = [0u8; BLOCK_SIZE];
            if block_id != NO_BLOCK {
                self.device.bread(DATA_BLOCK_START + block_id as u32, &mut block)?;
            }
            let to_read = (BLOCK_SIZE - block_off).min(n - read);
            buf[read..read + to_read].copy_from_slice(&block[block_off..block_off + to_read]);
            read += to_read;
            cur += to_read as u32;
        }
        self.descriptors[id].offset += n as u32;
        Ok(n)
    }

    /// Writes up to `n` bytes (capped to `buf.len()` and to the space left before
    /// [`MAX_FILE_SIZE`]) from `buf` to descriptor `fd` at its current offset, allocating data
    /// blocks lazily and advancing the offset and the file's recorded size.
    ///
    /// Returns the number of bytes written on success, `-1` on any failure.
    pub fn write_file(&mut self, fd: i32, buf: &[u8], n: usize) -> i64 {
        match self.write_file_inner(fd, buf, n) {
            Ok(written) => {
                log::debug!("write_file({fd}, n={n}): {written} bytes");
                written as i64
            }
            Err(e) => {
                log::warn!("write_file({fd}, n={n}): {e}");
                -1
            }
        }
    }

    fn write_file_inner(&mut self, fd: i32, buf: &[u8], n: usize) -> Result<usize, FsError> {
        self.require_mounted()?;
        let id = self.valid_fd(fd)?;
        self.write_at(id, buf, n)
    }

    fn write_at(&mut self, id: usize, buf: &[u8], n: usize) -> Result<usize, FsError> {
        if self.descriptors[id].state != DescState::Open {
            return Err(FsError::AlreadyClosed);
        }
        if let Inode::Link(l) = &self.inodes[id] {
            let source_name = l.source.clone();
            let source_id = self.resolve_source(&source_name)?;
            return self.write_at(source_id, buf, n);
        }
        if !matches!(self.inodes[id], Inode::File(_)) {
            return Err(FsError::WrongVariant);
        }

        let n = n.min(buf.len());
        let pos = self.descriptors[id].offset;
        if pos as usize == MAX_FILE_SIZE || n == 0 {
            return Ok(0);
        }
        let n = n.min(MAX_FILE_SIZE - pos as usize);

        let mut written = 0;
        let mut cur = pos;
        while written < n {
            let block_off = (cur as usize) % BLOCK_SIZE;
            let block_id = self.b_map(id, cur)?;
            let to_write = (BLOCK_SIZE - block_off).min(n - written);

            let mut block = [0u8; BLOCK_SIZE];
            self.device.bread(DATA_BLOCK_START + block_id as u32, &mut block)?;
            block[block_off..block_off + to_write]
                .copy_from_slice(&buf[written..written + to_write]);
            self.device.bwrite(DATA_BLOCK_START + block_id as u32, &block)?;

            written += to_write;
            cur += to_write as u32;
        }

        self.descriptors[id].offset += n as u32;
        match &mut self.inodes[id] {
            Inode::File(f) => f.size += n as u32,
            _ => unreachable!("variant checked above"),
        }
        Ok(n)
    }

    /// Repositions descriptor `fd`'s seek offset per `whence`.
    ///
    /// Returns `0` on success, `-1` on any failure, including a resulting position outside
    /// `[0, MAX_FILE_SIZE]`.
    pub fn lseek_file(&mut self, fd: i32, offset: i64, whence: Whence) -> i64 {
        match self.lseek_file_inner(fd, offset, whence) {
            Ok(()) => {
                log::debug!("lseek_file({fd}, {offset}, {whence:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("lseek_file({fd}, {offset}, {whence:?}): {e}");
                -1
            }
        }
    }

    fn lseek_file_inner(&mut self, fd: i32, offset: i64, whence: Whence) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.valid_fd(fd)?;
        self.lseek_at(id, offset, whence)
    }

    fn lseek_at(&mut self, id: usize, offset: i64, whence: Whence) -> Result<(), FsError> {
        if self.descriptors[id].state != DescState::Open {
            return Err(FsError::AlreadyClosed);
        }
        if let Inode::Link(l) = &self.inodes[id] {
            let source_name = l.source.clone();
            let source_id = self.resolve_source(&source_name)?;
            return self.lseek_at(source_id, offset, whence);
        }
        let size = match &self.inodes[id] {
            Inode::File(f) => f.size as i64,
            _ => return Err(FsError::WrongVariant),
        };
        let base = match whence {
            Whence::Begin => 0,
            Whence::Cur => self.descriptors[id].offset as i64,
            Whence::End => size,
        };
        let new_pos = base + offset;
        if new_pos < 0 || new_pos > MAX_FILE_SIZE as i64 {
            return Err(FsError::InvalidSeek);
        }
        self.descriptors[id].offset = new_pos as u32;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::constants::MAX_FILE_SIZE;
    use crate::constants::MAX_NAME_LENGTH;
    use crate::constants::MIN_DISK_SIZE;
    use crate::device::MemBlockDevice;
    use crate::fs::FileSystem;
    use crate::fs::Whence;

    fn mounted_fs() -> FileSystem<MemBlockDevice> {
        let mut fs = FileSystem::new(MemBlockDevice::new(256));
        assert_eq!(fs.mk_fs(MIN_DISK_SIZE), 0);
        assert_eq!(fs.mount(), 0);
        fs
    }

    #[test]
    fn create_exists() {
        let mut fs = mounted_fs();
        assert_eq!(fs.create_file("a.txt"), 0);
        assert_eq!(fs.create_file("a.txt"), -1);
    }

    #[test]
    fn illegal_name_length() {
        let mut fs = mounted_fs();
        let name: String = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(fs.create_file(&name), -2);
    }

    #[test]
    fn fd_allocation() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        assert_eq!(fs.open_file("a.txt"), 0);
        assert_eq!(fs.open_file("a.txt"), -2);
        assert_eq!(fs.open_file("missing"), -1);
    }

    #[test]
    fn close_preconditions() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        let id = fs.name_i("a.txt").unwrap();
        assert_eq!(fs.close_file(id as i32), -1);
        assert_eq!(fs.close_file(100), -1);
    }

    #[test]
    fn round_trip_read_write() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        let fd = fs.open_file("a.txt") as i32;
        let data = b"hello, file system";
        assert_eq!(fs.write_file(fd, data, data.len()), data.len() as i64);
        assert_eq!(fs.lseek_file(fd, 0, Whence::Begin), 0);

        let mut out = [0u8; 19];
        assert_eq!(fs.read_file(fd, &mut out, data.len()), data.len() as i64);
        assert_eq!(&out, data);
    }

    #[test]
    fn write_clamps_to_max_file_size() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        let fd = fs.open_file("a.txt") as i32;
        let data = vec![0xAAu8; 20_480];
        assert_eq!(fs.write_file(fd, &data, data.len()), MAX_FILE_SIZE as i64);
    }

    #[test]
    fn large_write_spans_three_blocks() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        let fd = fs.open_file("a.txt") as i32;
        let data = vec![0x7Bu8; 6144];
        assert_eq!(fs.write_file(fd, &data, data.len()), 6144);

        fs.lseek_file(fd, 0, Whence::Begin);
        let mut out = vec![0u8; 6144];
        assert_eq!(fs.read_file(fd, &mut out, out.len()), 6144);
        assert_eq!(out, data);
    }

    #[test]
    fn bitmap_invariant_after_create_and_remove() {
        let mut fs = mounted_fs();
        let before = fs.num_inodes();
        fs.create_file("a.txt");
        fs.remove_file("a.txt");
        assert_eq!(fs.num_inodes(), before);
        assert_eq!(fs.name_i("a.txt"), None);
    }

    #[test]
    fn persists_across_unmount_mount() {
        let mut fs = mounted_fs();
        fs.create_file("a.txt");
        let fd = fs.open_file("a.txt") as i32;
        let data = b"durable bytes";
        fs.write_file(fd, data, data.len());
        fs.close_file(fd);
        assert_eq!(fs.unmount(), 0);

        assert_eq!(fs.mount(), 0);
        let fd = fs.open_file("a.txt") as i32;
        let mut out = [0u8; 13];
        assert_eq!(fs.read_file(fd, &mut out, out.len()), 13);
        assert_eq!(&out, data);
    }
}
