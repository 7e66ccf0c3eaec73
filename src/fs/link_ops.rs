//! Symbolic links: named aliases forwarding every operation to a source file by name.

use super::FileSystem;
use crate::constants::MAX_NAME_LENGTH;
use crate::device::BlockDevice;
use crate::error::FsError;
use crate::inode::Inode;
use crate::inode::LinkInode;

impl<D: BlockDevice> FileSystem<D> {
    /// Resolves `source_name` to its inode slot, rejecting a source that is itself a link.
    ///
    /// Link chains are bounded to one hop: a link's source is resolved exactly once, and if that
    /// resolves to another link the operation fails rather than following it further.
    pub(super) fn resolve_source(&self, source_name: &str) -> Result<usize, FsError> {
        let id = self.name_i(source_name).ok_or(FsError::NotFound)?;
        if matches!(self.inodes[id], Inode::Link(_)) {
            return Err(FsError::LinkChain);
        }
        Ok(id)
    }

    /// Creates a link named `link` aliasing the existing file `file`.
    ///
    /// Returns `0` on success, `-1` if `file` does not resolve to a live inode, `-2` on any other
    /// failure (`link` already exists, `link` too long, no free inode, not mounted).
    pub fn create_ln(&mut self, file: &str, link: &str) -> i64 {
        match self.create_ln_inner(file, link) {
            Ok(()) => {
                log::debug!("create_ln({file:?}, {link:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("create_ln({file:?}, {link:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    _ => -2,
                }
            }
        }
    }

    fn create_ln_inner(&mut self, file: &str, link: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        if self.name_i(file).is_none() {
            return Err(FsError::NotFound);
        }
        if self.name_i(link).is_some() {
            return Err(FsError::NameExists);
        }
        if link.len() > MAX_NAME_LENGTH {
            return Err(FsError::NameTooLong);
        }
        let id = self.ialloc()?;
        self.inodes[id] = Inode::Link(LinkInode {
            source: file.to_owned(),
            link: link.to_owned(),
        });
        self.superblock.num_inodes += 1;
        Ok(())
    }

    /// Removes the link named `link`.
    ///
    /// Returns `0` on success, `-1` if `link` does not resolve to a live inode, `-2` on any other
    /// failure (resolves to a file, not a link; allocator inconsistency; not mounted).
    pub fn remove_ln(&mut self, link: &str) -> i64 {
        match self.remove_ln_inner(link) {
            Ok(()) => {
                log::debug!("remove_ln({link:?}): ok");
                0
            }
            Err(e) => {
                log::warn!("remove_ln({link:?}): {e}");
                match e {
                    FsError::NotFound => -1,
                    _ => -2,
                }
            }
        }
    }

    fn remove_ln_inner(&mut self, link: &str) -> Result<(), FsError> {
        self.require_mounted()?;
        let id = self.name_i(link).ok_or(FsError::NotFound)?;
        if !matches!(self.inodes[id], Inode::Link(_)) {
            return Err(FsError::WrongVariant);
        }
        self.ifree(id)?;
        self.superblock.num_inodes -= 1;
        Ok(())
    }
}
