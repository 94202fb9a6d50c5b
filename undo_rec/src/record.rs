//! Logical undo record
//! 逻辑撤销记录

use undo_ptr::{DEFAULT_TABLESPACE, MAIN_FORK, UndoRecPtr, Xid};

use crate::{
  Kind, Packer, Result,
  disk::{INFO_BLOCK, INFO_PAYLOAD, INFO_REL, INFO_XACT, fixed_len},
};

/// Relation location; omitted on disk when it equals the default
/// 关系位置；等于默认值时不落盘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rel {
  pub tsid: u32,
  pub fork: u8,
}

impl Default for Rel {
  fn default() -> Self {
    Self {
      tsid: DEFAULT_TABLESPACE,
      fork: MAIN_FORK,
    }
  }
}

impl Rel {
  #[inline]
  pub fn is_default(&self) -> bool {
    *self == Self::default()
  }
}

/// Block the record pertains to, chained to the previous undo of that block
/// 记录所属块，链接到该块上一条撤销
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Block {
  pub blkprev: UndoRecPtr,
  pub block: u32,
  pub offset: u16,
}

/// Transaction linkage / 事务链接
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Xact {
  pub epoch: u32,
  /// Start of the next transaction's undo, may be `UndoRecPtr::PENDING`
  /// 下一事务撤销起点，可为 `UndoRecPtr::PENDING`
  pub next: UndoRecPtr,
}

/// One undo entry in memory. Info bits are derived from which optional fields
/// are set, never stored.
/// 内存中的一条撤销记录。标志位由可选字段推导，不单独存储。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackedRecord {
  pub kind: Kind,
  /// Length of the previous record / 上一条记录长度
  pub prevlen: u16,
  pub relfilenode: u32,
  pub prevxid: Xid,
  pub xid: Xid,
  pub cid: u32,
  pub rel: Rel,
  pub block: Option<Block>,
  pub xact: Option<Xact>,
  pub payload: Vec<u8>,
  pub tuple: Vec<u8>,
  /// Buffer holding the record while it is written or read; never persisted
  /// 写入或读取期间持有记录的缓冲区；不落盘
  pub buffer: Option<u32>,
}

impl UnpackedRecord {
  /// Info bits for the optional parts present
  /// 当前存在的可选部分对应的标志位
  pub fn info(&self) -> u8 {
    let mut info = 0;
    if !self.rel.is_default() {
      info |= INFO_REL;
    }
    if self.block.is_some() {
      info |= INFO_BLOCK;
    }
    if !self.payload.is_empty() || !self.tuple.is_empty() {
      info |= INFO_PAYLOAD;
    }
    if self.xact.is_some() {
      info |= INFO_XACT;
    }
    info
  }

  /// Exact bytes `Packer::insert` will write
  /// `Packer::insert` 将写入的精确字节数
  #[inline]
  pub fn expected_size(&self) -> usize {
    fixed_len(self.info()) + self.payload.len() + self.tuple.len()
  }

  #[inline]
  pub fn packer(&self) -> Result<Packer<'_>> {
    Packer::new(self)
  }
}
