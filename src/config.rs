//! A small configuration surface describing how to obtain the backing image for a `FileSystem`.
//!
//! This replaces the pack's command-line argument parsing (the CLI itself is out of scope for
//! this crate) with a plain struct a library caller fills in directly, in the same
//! fields-of-`Option`s style as `mkfs/src/ext2.rs`'s `Ext2Factory`.

use crate::device::FileBlockDevice;
use crate::fs::FileSystem;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Describes how to open or create the file backing a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FsConfig {
    /// Path to the backing image file.
    pub image_path: PathBuf,
    /// The device size to format a fresh image with. Only consulted when `image_path` does not
    /// exist yet; an existing image is trusted to already carry a valid size in its superblock
    /// once mounted.
    pub device_size: Option<u64>,
}

impl FsConfig {
    /// Builds a config pointing at `image_path`, with no explicit device size (only valid if the
    /// image already exists).
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            device_size: None,
        }
    }

    /// Sets the device size to use when creating a fresh image.
    pub fn with_device_size(mut self, device_size: u64) -> Self {
        self.device_size = Some(device_size);
        self
    }

    /// Opens or creates the backing image described by this config and wraps it in a
    /// [`FileSystem`], *without* running `mk_fs`/`mount` — the caller decides which of those to
    /// run depending on whether the image is fresh.
    pub fn open(&self) -> io::Result<FileSystem<FileBlockDevice>> {
        let device = if Path::new(&self.image_path).exists() {
            FileBlockDevice::open(&self.image_path)?
        } else {
            let size = self.device_size.ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "device_size must be set to create a new image",
                )
            })?;
            FileBlockDevice::create(&self.image_path, size)?
        };
        Ok(FileSystem::new(device))
    }
}
