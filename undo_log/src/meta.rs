//! Per-log durable state
//! 单日志持久状态

use undo_ptr::{INVALID_XID, Offset, SEG_SIZE, Xid};

/// Control metadata of one undo log, persisted at checkpoints
/// 单个撤销日志的控制元数据，检查点时落盘
///
/// `discard <= insert <= end`, `end` is a multiple of `SEG_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
  pub tablespace: u32,
  /// Next insertion point (head) / 下一插入点（头）
  pub insert: Offset,
  /// One past the last allocated segment / 最后一个已分配段之后
  pub end: Offset,
  /// Oldest data still needed (tail) / 仍需保留的最旧数据（尾）
  pub discard: Offset,
  /// Start of the last transaction's undo / 最近事务撤销起点
  pub last_xact_start: Offset,
  pub is_first_rec: bool,
  pub xid: Xid,
  /// Length of the last record written / 最后写入记录的长度
  pub prevlen: u16,
}

impl Meta {
  pub fn new(tablespace: u32) -> Self {
    Self {
      tablespace,
      insert: 0,
      end: 0,
      discard: 0,
      last_xact_start: 0,
      is_first_rec: false,
      xid: INVALID_XID,
      prevlen: 0,
    }
  }

  #[inline]
  pub fn is_consistent(&self) -> bool {
    self.discard <= self.insert && self.insert <= self.end && self.end % SEG_SIZE == 0
  }
}
