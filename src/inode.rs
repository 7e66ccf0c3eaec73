//! Inodes: the tagged File/Link record describing one name in the flat namespace.

use crate::constants::DIRECT_BLOCKS;
use crate::constants::INODE_RECORD_SIZE;
use crate::constants::MAX_NAME_LENGTH;

/// Sentinel stored in [`FileInode::direct_block`] for "not yet allocated".
pub const NO_BLOCK: i32 = -1;

/// Byte tag distinguishing the two inode variants on disk.
const TAG_FILE: u8 = 0;
const TAG_LINK: u8 = 1;

/// A live inode slot: either a regular file or a symbolic link.
///
/// This is an explicit in-memory sum type, replacing the common C idiom of overlaying both
/// variants' fields on one struct. The on-disk record still shares one 80-byte
/// footprint between the two variants, but disambiguated by an explicit tag byte rather than by
/// relying on a freed slot's leftover field contents.
#[derive(Debug, Clone)]
pub enum Inode {
    /// An unallocated inode slot. Never itself written to disk under this tag; a free slot's
    /// bit in the superblock's inode bitmap is clear, and its on-disk bytes are simply not
    /// consulted until the slot is allocated again.
    Free,
    /// A regular file.
    File(FileInode),
    /// A symbolic link: an alias name forwarding every operation to a source file by name.
    Link(LinkInode),
}

/// The fields of a file inode.
#[derive(Debug, Clone)]
pub struct FileInode {
    /// The file's name.
    pub name: String,
    /// The file's size in bytes, `0..=MAX_FILE_SIZE`.
    pub size: u32,
    /// Up to `DIRECT_BLOCKS` data block indices, or [`NO_BLOCK`] where not yet allocated.
    pub direct_block: [i32; DIRECT_BLOCKS],
    /// Per-block CRC32, or `0` where integrity is not tracked for that block.
    pub crc: [u32; DIRECT_BLOCKS],
}

impl FileInode {
    /// Creates a fresh, empty file inode named `name` with its first direct block already
    /// allocated to `first_block`.
    pub fn new(name: &str, first_block: i32) -> Self {
        let mut direct_block = [NO_BLOCK; DIRECT_BLOCKS];
        direct_block[0] = first_block;
        Self {
            name: name.to_owned(),
            size: 0,
            direct_block,
            crc: [0; DIRECT_BLOCKS],
        }
    }
}

/// The fields of a link inode.
#[derive(Debug, Clone)]
pub struct LinkInode {
    /// The name of the file this link points to.
    pub source: String,
    /// The link's own name (the alias callers resolve).
    pub link: String,
}

impl Inode {
    /// Serializes this inode into an `INODE_RECORD_SIZE`-byte on-disk record.
    ///
    /// `Inode::Free` serializes to all zeros; its tag byte is never consulted on read because
    /// liveness is tracked by the superblock's inode bitmap, not by this record.
    pub fn to_bytes(&self) -> [u8; INODE_RECORD_SIZE] {
        let mut buf = [0u8; INODE_RECORD_SIZE];
        match self {
            Inode::Free => {}
            Inode::File(f) => {
                buf[0] = TAG_FILE;
                write_name(&mut buf[1..1 + MAX_NAME_LENGTH], &f.name);
                let rest = &mut buf[1 + MAX_NAME_LENGTH..];
                rest[0..4].copy_from_slice(&f.size.to_le_bytes());
                for (i, b) in f.direct_block.iter().enumerate() {
                    rest[4 + i * 4..4 + i * 4 + 4].copy_from_slice(&b.to_le_bytes());
                }
                let crc_off = 4 + DIRECT_BLOCKS * 4;
                for (i, c) in f.crc.iter().enumerate() {
                    rest[crc_off + i * 4..crc_off + i * 4 + 4].copy_from_slice(&c.to_le_bytes());
                }
            }
            Inode::Link(l) => {
                buf[0] = TAG_LINK;
                write_name(&mut buf[1..1 + MAX_NAME_LENGTH], &l.source);
                let rest = &mut buf[1 + MAX_NAME_LENGTH..];
                write_name(&mut rest[0..MAX_NAME_LENGTH], &l.link);
            }
        }
        buf
    }

    /// Deserializes an inode from an `INODE_RECORD_SIZE`-byte on-disk record.
    ///
    /// `is_live` comes from the superblock's inode bitmap: a clear bit always yields
    /// `Inode::Free` regardless of the record's tag byte, since a freed slot's bytes are not
    /// guaranteed to have been scrubbed on every code path that matters for correctness.
    pub fn from_bytes(buf: &[u8; INODE_RECORD_SIZE], is_live: bool) -> Self {
        if !is_live {
            return Inode::Free;
        }
        match buf[0] {
            TAG_LINK => {
                let source = read_name(&buf[1..1 + MAX_NAME_LENGTH]);
                let rest = &buf[1 + MAX_NAME_LENGTH..];
                let link = read_name(&rest[0..MAX_NAME_LENGTH]);
                Inode::Link(LinkInode { source, link })
            }
            _ => {
                let name = read_name(&buf[1..1 + MAX_NAME_LENGTH]);
                let rest = &buf[1 + MAX_NAME_LENGTH..];
                let size = u32::from_le_bytes(rest[0..4].try_into().unwrap());
                let mut direct_block = [NO_BLOCK; DIRECT_BLOCKS];
                for (i, b) in direct_block.iter_mut().enumerate() {
                    *b = i32::from_le_bytes(rest[4 + i * 4..4 + i * 4 + 4].try_into().unwrap());
                }
                let crc_off = 4 + DIRECT_BLOCKS * 4;
                let mut crc = [0u32; DIRECT_BLOCKS];
                for (i, c) in crc.iter_mut().enumerate() {
                    *c = u32::from_le_bytes(
                        rest[crc_off + i * 4..crc_off + i * 4 + 4].try_into().unwrap(),
                    );
                }
                Inode::File(FileInode {
                    name,
                    size,
                    direct_block,
                    crc,
                })
            }
        }
    }

    /// Returns the name this inode resolves under, i.e. the file's own name or the link's alias
    /// (never the link's source — `name_i` must never match on a link's source name).
    pub fn resolved_name(&self) -> Option<&str> {
        match self {
            Inode::Free => None,
            Inode::File(f) => Some(&f.name),
            Inode::Link(l) => Some(&l.link),
        }
    }
}

fn write_name(dst: &mut [u8], name: &str) {
    dst.fill(0);
    let bytes = name.as_bytes();
    let len = bytes.len().min(dst.len());
    dst[..len].copy_from_slice(&bytes[..len]);
}

fn read_name(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}
