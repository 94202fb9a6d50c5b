//! Redo records for undo log metadata
//! 撤销日志元数据的 redo 记录
//!
//! Every field is an absolute value, so replaying a record already covered by
//! the checkpoint snapshot leaves the state unchanged.
//! 所有字段均为绝对值，重放已被检查点快照覆盖的记录不改变状态。

use std::{io, sync::Arc};

use bitcode::{Decode, Encode};
use parking_lot::Mutex;
use undo_ptr::{LogNo, Offset, Xid};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum Redo {
  /// New permanent log / 新建永久日志
  Create { log_no: LogNo, tablespace: u32 },
  /// `end` moved forward after segment files were created
  /// 段文件创建后 `end` 前移
  Extend { log_no: LogNo, end: Offset },
  /// Log now serves `xid` / 日志开始服务 `xid`
  Attach { log_no: LogNo, xid: Xid },
  /// `size` raw bytes reserved at `insert`, record data starts at `addr`
  /// 在 `insert` 处预留 `size` 原始字节，记录数据从 `addr` 开始
  Allocate {
    log_no: LogNo,
    xid: Xid,
    insert: Offset,
    addr: Offset,
    size: u64,
  },
  /// Head snapshot after advance / rewind / 前进或回退后的头部快照
  Insert {
    log_no: LogNo,
    insert: Offset,
    prevlen: u16,
    last_xact_start: Offset,
  },
  Discard {
    log_no: LogNo,
    discard: Offset,
    xid: Xid,
  },
  /// Log accepts no more allocation / 日志不再接受分配
  Full { log_no: LogNo },
}

impl Redo {
  pub fn log_no(&self) -> LogNo {
    match *self {
      Self::Create { log_no, .. }
      | Self::Extend { log_no, .. }
      | Self::Attach { log_no, .. }
      | Self::Allocate { log_no, .. }
      | Self::Insert { log_no, .. }
      | Self::Discard { log_no, .. }
      | Self::Full { log_no } => log_no,
    }
  }

  #[inline]
  pub fn encode(&self) -> Vec<u8> {
    bitcode::encode(self)
  }

  #[inline]
  pub fn decode(bin: &[u8]) -> Result<Self> {
    Ok(bitcode::decode(bin)?)
  }
}

/// Write-ahead log the manager reports metadata changes to
/// 管理器上报元数据变更的预写日志
pub trait RedoSink: Send + Sync {
  /// Append one record, return its position
  /// 追加一条记录，返回其位置
  fn append(&self, rec: &Redo) -> io::Result<u64>;
}

/// Discards everything, for callers without a WAL
/// 丢弃一切，用于没有 WAL 的调用方
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRedo;

impl RedoSink for NoRedo {
  #[inline(always)]
  fn append(&self, _: &Redo) -> io::Result<u64> {
    Ok(0)
  }
}

#[derive(Debug)]
struct MemRedoInner {
  pos: u64,
  recs: Vec<(u64, Vec<u8>)>,
}

/// In-memory redo stream. Positions are byte offsets starting at 1, clones
/// share the stream.
/// 内存 redo 流。位置为从 1 开始的字节偏移，克隆共享同一流
#[derive(Debug, Clone)]
pub struct MemRedo(Arc<Mutex<MemRedoInner>>);

impl Default for MemRedo {
  fn default() -> Self {
    Self(Arc::new(Mutex::new(MemRedoInner {
      pos: 1,
      recs: Vec::new(),
    })))
  }
}

impl MemRedo {
  /// Position the next record will get
  /// 下一条记录将获得的位置
  pub fn position(&self) -> u64 {
    self.0.lock().pos
  }

  pub fn len(&self) -> usize {
    self.0.lock().recs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Decoded records at or after `redo`
  /// 位于 `redo` 及之后的记录
  pub fn read_from(&self, redo: u64) -> Result<Vec<(u64, Redo)>> {
    let inner = self.0.lock();
    let start = inner.recs.partition_point(|(pos, _)| *pos < redo);
    inner.recs[start..]
      .iter()
      .map(|(pos, bin)| Ok((*pos, Redo::decode(bin)?)))
      .collect()
  }
}

impl RedoSink for MemRedo {
  fn append(&self, rec: &Redo) -> io::Result<u64> {
    let bin = rec.encode();
    let mut inner = self.0.lock();
    let pos = inner.pos;
    inner.pos += bin.len() as u64;
    inner.recs.push((pos, bin));
    Ok(pos)
  }
}
