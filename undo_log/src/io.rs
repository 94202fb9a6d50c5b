//! Page access for record I/O
//! 记录读写的页访问

use std::{fs::OpenOptions, os::unix::fs::FileExt, path::PathBuf};

use undo_ptr::{BLCKSZ, LogNo, SEG_SIZE};

use crate::{Result, path::seg_path};

/// Where undo pages live, a buffer pool in a real engine
/// 撤销页所在之处，真实引擎中为缓冲池
pub trait PageIo {
  fn read(&self, log_no: LogNo, tablespace: u32, block: u64, page: &mut [u8]) -> Result<()>;
  fn write(&self, log_no: LogNo, tablespace: u32, block: u64, page: &[u8]) -> Result<()>;
}

/// Reads and writes segment files directly
/// 直接读写段文件
pub struct SegIo {
  dir: PathBuf,
}

impl SegIo {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn locate(&self, log_no: LogNo, tablespace: u32, block: u64) -> (PathBuf, u64) {
    let pos = block * BLCKSZ as u64;
    (
      self.dir.join(seg_path(log_no, pos / SEG_SIZE, tablespace)),
      pos % SEG_SIZE,
    )
  }
}

impl PageIo for SegIo {
  fn read(&self, log_no: LogNo, tablespace: u32, block: u64, page: &mut [u8]) -> Result<()> {
    let (path, pos) = self.locate(log_no, tablespace, block);
    OpenOptions::new()
      .read(true)
      .open(path)?
      .read_exact_at(&mut page[..BLCKSZ], pos)?;
    Ok(())
  }

  fn write(&self, log_no: LogNo, tablespace: u32, block: u64, page: &[u8]) -> Result<()> {
    let (path, pos) = self.locate(log_no, tablespace, block);
    OpenOptions::new()
      .write(true)
      .open(path)?
      .write_all_at(&page[..BLCKSZ], pos)?;
    Ok(())
  }
}
