//! Deterministic file names
//! 确定性文件命名

use std::path::PathBuf;

use undo_ptr::{CKP_NAME_LEN, LogNo};

/// Segment root, one subdirectory per tablespace
/// 段根目录，每个表空间一个子目录
pub const SEG_DIR: &str = "undo";

pub const CKP_DIR: &str = "undo_ckp";

pub const LOCK_FILE: &str = "undo.lock";

const LOG_NO_HEX: usize = 6;
const SEG_HEX: usize = 10;

/// `undo/{tablespace}/{log_no:06X}.{seg:010X}`, relative to the data dir
/// 相对数据目录
pub fn seg_path(log_no: LogNo, seg: u64, tablespace: u32) -> PathBuf {
  PathBuf::from(SEG_DIR)
    .join(tablespace.to_string())
    .join(seg_name(log_no, seg))
}

#[inline]
pub fn seg_name(log_no: LogNo, seg: u64) -> String {
  format!("{log_no:06X}.{seg:010X}")
}

fn is_hex(s: &str, len: usize) -> bool {
  s.len() == len && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

pub fn parse_seg_name(name: &str) -> Option<(LogNo, u64)> {
  let (log_no, seg) = name.split_once('.')?;
  if !is_hex(log_no, LOG_NO_HEX) || !is_hex(seg, SEG_HEX) {
    return None;
  }
  Some((
    LogNo::from_str_radix(log_no, 16).ok()?,
    u64::from_str_radix(seg, 16).ok()?,
  ))
}

/// Checkpoint file name: redo position as 16 hex digits
/// 检查点文件名：16 位十六进制 redo 位置
#[inline]
pub fn ckp_name(redo: u64) -> String {
  format!("{redo:016X}")
}

pub fn parse_ckp_name(name: &str) -> Option<u64> {
  if !is_hex(name, CKP_NAME_LEN) {
    return None;
  }
  u64::from_str_radix(name, 16).ok()
}

/// Older checkpoint file compares smaller
/// 较旧的检查点文件名比较更小
#[inline]
pub fn ckp_precedes(a: &str, b: &str) -> bool {
  a < b
}
