//! End-to-end tests exercising the documented external behavior of `FileSystem` through
//! `MemBlockDevice`, plus one persistence test through a real `FileBlockDevice`.

use sfs::constants::MAX_DISK_SIZE;
use sfs::constants::MAX_FILE_SIZE;
use sfs::constants::MIN_DISK_SIZE;
use sfs::FileSystem;
use sfs::FsConfig;
use sfs::MemBlockDevice;
use sfs::Whence;

fn mem_fs() -> FileSystem<MemBlockDevice> {
    let _ = env_logger::try_init();
    FileSystem::new(MemBlockDevice::new(256))
}

fn mounted() -> FileSystem<MemBlockDevice> {
    let mut fs = mem_fs();
    assert_eq!(fs.mk_fs(MIN_DISK_SIZE), 0);
    assert_eq!(fs.mount(), 0);
    fs
}

#[test]
fn size_gate() {
    let mut fs = mem_fs();
    assert_eq!(fs.mk_fs(700 * 2048), -1);
    assert_eq!(fs.mk_fs(240 * 2048), 0);
    assert!((MIN_DISK_SIZE..=MAX_DISK_SIZE).contains(&(240 * 2048)));
}

#[test]
fn mount_idempotence_guard() {
    let mut fs = mounted();
    assert_eq!(fs.mount(), -1);
}

#[test]
fn create_exists() {
    let mut fs = mounted();
    assert_eq!(fs.create_file("a.txt"), 0);
    assert_eq!(fs.create_file("a.txt"), -1);
}

#[test]
fn illegal_name_length() {
    let mut fs = mounted();
    let name = "x".repeat(33);
    assert_eq!(fs.create_file(&name), -2);
}

#[test]
fn fd_allocation() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    assert_eq!(fs.open_file("a.txt"), 0);
    assert_eq!(fs.open_file("a.txt"), -2);
    assert_eq!(fs.open_file("missing"), -1);
}

#[test]
fn close_preconditions() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    assert_eq!(fs.close_file(0), -1);
    assert_eq!(fs.close_file(100), -1);
}

#[test]
fn round_trip_read_write() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    let fd = fs.open_file("a.txt") as i32;
    assert!(fd >= 0);

    let buf: Vec<u8> = (0..200u32).map(|i| (i % 256) as u8).collect();
    assert_eq!(fs.write_file(fd, &buf, buf.len()), buf.len() as i64);
    assert_eq!(fs.lseek_file(fd, 0, Whence::Begin), 0);

    let mut out = vec![0u8; buf.len()];
    assert_eq!(fs.read_file(fd, &mut out, buf.len()), buf.len() as i64);
    assert_eq!(out, buf);
}

#[test]
fn write_clamp() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    let fd = fs.open_file("a.txt") as i32;
    let buf = vec![1u8; 20_480];
    assert_eq!(fs.write_file(fd, &buf, buf.len()), MAX_FILE_SIZE as i64);
}

#[test]
fn large_write_across_three_blocks() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    let fd = fs.open_file("a.txt") as i32;
    let buf = vec![9u8; 6144];
    assert_eq!(fs.write_file(fd, &buf, buf.len()), 6144);
}

#[test]
fn integrity_round_trip_with_corruption() {
    use std::io::Read;
    use std::io::Seek;
    use std::io::SeekFrom;
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk.img");
    let config = FsConfig::new(&path).with_device_size(MIN_DISK_SIZE);
    let mut fs = config.open().unwrap();
    assert_eq!(fs.mk_fs(MIN_DISK_SIZE), 0);
    assert_eq!(fs.mount(), 0);

    fs.create_file("a.txt");
    let fd = fs.open_file("a.txt") as i32;
    fs.write_file(fd, b"checked bytes", 13);
    fs.close_file(fd);
    assert_eq!(fs.include_integrity("a.txt"), 0);
    assert_eq!(fs.check_file("a.txt"), 0);
    assert_eq!(fs.unmount(), 0);
    drop(fs);

    // The file's first (and only, here) data block sits at absolute block index
    // `DATA_BLOCK_START`, since it's the first file created on a fresh file system.
    let block_offset = sfs::constants::DATA_BLOCK_START as u64 * sfs::constants::BLOCK_SIZE as u64;
    let mut raw = std::fs::OpenOptions::new().read(true).write(true).open(&path).unwrap();
    raw.seek(SeekFrom::Start(block_offset)).unwrap();
    let mut byte = [0u8; 1];
    raw.read_exact(&mut byte).unwrap();
    raw.seek(SeekFrom::Start(block_offset)).unwrap();
    raw.write_all(&[byte[0] ^ 0xff]).unwrap();
    drop(raw);

    let mut fs = FsConfig::new(&path).open().unwrap();
    assert_eq!(fs.mount(), 0);
    assert_eq!(fs.check_file("a.txt"), -1);
}

#[test]
fn bitmap_invariant_after_create_and_remove() {
    let mut fs = mounted();
    let before = fs.num_inodes();
    assert_eq!(fs.create_file("a.txt"), 0);
    assert_eq!(fs.remove_file("a.txt"), 0);
    assert_eq!(fs.num_inodes(), before);
    assert_eq!(fs.create_file("a.txt"), 0);
}

#[test]
fn persistence_across_unmount_mount() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    let fd = fs.open_file("a.txt") as i32;
    let data = b"persisted across remount";
    fs.write_file(fd, data, data.len());
    fs.close_file(fd);
    assert_eq!(fs.unmount(), 0);

    assert_eq!(fs.mount(), 0);
    let fd = fs.open_file("a.txt") as i32;
    let mut out = [0u8; 25];
    assert_eq!(fs.read_file(fd, &mut out, out.len()), 25);
    assert_eq!(&out, data);
}

#[test]
fn link_delegation() {
    let mut fs = mounted();
    fs.create_file("a.txt");
    assert_eq!(fs.create_ln("a.txt", "alias"), 0);
    assert_eq!(fs.create_ln("a.txt", "alias"), -2);
    assert_eq!(fs.create_ln("missing", "other"), -1);
    assert_eq!(fs.remove_ln("a.txt"), -2);

    let fd = fs.open_file("alias") as i32;
    let data = b"via the alias";
    assert_eq!(fs.write_file(fd, data, data.len()), data.len() as i64);
    assert_eq!(fs.lseek_file(fd, 0, Whence::Begin), 0);
    let mut out = [0u8; 13];
    assert_eq!(fs.read_file(fd, &mut out, out.len()), 13);
    assert_eq!(&out, data);
    assert_eq!(fs.close_file(fd), 0);
}

#[test]
fn config_surface_creates_sized_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("disk.img");
    let config = FsConfig::new(&path).with_device_size(MIN_DISK_SIZE);

    let mut fs = config.open().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), MIN_DISK_SIZE);
    assert_eq!(fs.mk_fs(MIN_DISK_SIZE), 0);
    assert_eq!(fs.mount(), 0);
    assert_eq!(fs.create_file("a.txt"), 0);
    assert_eq!(fs.unmount(), 0);
}
