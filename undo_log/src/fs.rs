//! Blocking file helpers
//! 阻塞文件工具

use std::{
  fs::{self, File, OpenOptions},
  io::{self, Write},
  path::Path,
};

use fs4::fs_std::FileExt;
use undo_ptr::SEG_SIZE;

/// Atomic write: write to temp file, sync, then rename
/// 原子写入：写入临时文件，sync，然后重命名
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
  let tmp = path.with_extension("tmp");
  let r = (|| {
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)
  })();
  if r.is_err() {
    let _ = fs::remove_file(&tmp);
  }
  r
}

/// Persist directory entries (create / rename / unlink)
/// 持久化目录项（创建 / 重命名 / 删除）
pub fn sync_dir(dir: &Path) -> io::Result<()> {
  File::open(dir)?.sync_all()
}

/// Create one zero-filled segment, durable on return. Existing files are
/// grown to full size, never truncated.
/// 创建一个全零段，返回时已落盘。已存在的文件只会补足长度，不会截断
pub fn create_seg(path: &Path) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let file = OpenOptions::new()
    .read(true)
    .write(true)
    .create(true)
    .truncate(false)
    .open(path)?;
  if file.metadata()?.len() < SEG_SIZE {
    file.allocate(SEG_SIZE)?;
    file.set_len(SEG_SIZE)?;
  }
  file.sync_all()
}

/// Flush written pages of one segment
/// 刷新单个段已写入的页
pub fn sync_seg(path: &Path) -> io::Result<()> {
  OpenOptions::new().write(true).open(path)?.sync_data()
}

/// Remove a file, `Ok(false)` when already gone
/// 删除文件，已不存在时返回 `Ok(false)`
pub fn try_rm(path: &Path) -> io::Result<bool> {
  match fs::remove_file(path) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}
