//! Packed undo address
//! 打包的撤销地址

use std::fmt;

use crate::{BLCKSZ, LOG_NO_BITS, LogNo, OFFSET_BITS, OFFSET_MASK, Offset, SEG_SIZE};

/// Log number (high 24 bits) + offset (low 40 bits)
/// 日志号（高 24 位）+ 偏移（低 40 位）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct UndoRecPtr(u64);

impl UndoRecPtr {
  /// No address / 无地址
  pub const INVALID: Self = Self(0);

  /// Next-transaction link not known yet, backpatched later
  /// 下一事务链接未知，稍后回填
  pub const PENDING: Self = Self(u64::MAX);

  /// Pack; caller keeps log_no < 2^24 and offset < 2^40
  /// 打包；调用方保证 log_no < 2^24 且 offset < 2^40
  #[inline]
  pub const fn new(log_no: LogNo, offset: Offset) -> Self {
    debug_assert!((log_no as u64) < (1 << LOG_NO_BITS));
    debug_assert!(offset <= OFFSET_MASK);
    Self(((log_no as u64) << OFFSET_BITS) | (offset & OFFSET_MASK))
  }

  #[inline]
  pub const fn from_u64(v: u64) -> Self {
    Self(v)
  }

  #[inline]
  pub const fn as_u64(self) -> u64 {
    self.0
  }

  #[inline]
  pub const fn log_no(self) -> LogNo {
    (self.0 >> OFFSET_BITS) as LogNo
  }

  #[inline]
  pub const fn offset(self) -> Offset {
    self.0 & OFFSET_MASK
  }

  #[inline]
  pub const fn unpack(self) -> (LogNo, Offset) {
    (self.log_no(), self.offset())
  }

  /// False only for the all-zero sentinel
  /// 仅全零哨兵为 false
  #[inline]
  pub const fn is_valid(self) -> bool {
    self.0 != Self::INVALID.0
  }

  #[inline]
  pub const fn is_pending(self) -> bool {
    self.0 == Self::PENDING.0
  }

  /// Block number holding this address / 所在块号
  #[inline]
  pub const fn block(self) -> u64 {
    page_of(self.offset())
  }

  /// Byte offset inside its page / 页内字节偏移
  #[inline]
  pub const fn page_offset(self) -> usize {
    offset_in_page(self.offset())
  }

  /// Segment index / 段号
  #[inline]
  pub const fn seg(self) -> u64 {
    seg_of(self.offset())
  }

  /// Same log, other offset / 同日志，另一偏移
  #[inline]
  pub const fn with_offset(self, offset: Offset) -> Self {
    Self::new(self.log_no(), offset)
  }
}

impl fmt::Display for UndoRecPtr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:016X}", self.0)
  }
}

impl From<UndoRecPtr> for u64 {
  #[inline]
  fn from(p: UndoRecPtr) -> u64 {
    p.0
  }
}

#[inline]
pub const fn page_of(offset: Offset) -> u64 {
  offset / BLCKSZ as u64
}

#[inline]
pub const fn offset_in_page(offset: Offset) -> usize {
  (offset % BLCKSZ as u64) as usize
}

#[inline]
pub const fn seg_of(offset: Offset) -> u64 {
  offset / SEG_SIZE
}

/// First byte of segment / 段首字节
#[inline]
pub const fn seg_start(seg: u64) -> Offset {
  seg * SEG_SIZE
}

/// Round up to a segment boundary / 向上取整到段边界
#[inline]
pub const fn seg_ceil(offset: Offset) -> Offset {
  offset.div_ceil(SEG_SIZE) * SEG_SIZE
}
