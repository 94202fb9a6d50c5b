//! Sub-structure sizes and info bits
//! 子结构大小与标志位

/// type(1) + info(1) + prevlen(2) + relfilenode(4) + prevxid(4) + xid(4) + cid(4)
pub const HEADER_SIZE: usize = 20;

/// tsid(4) + fork(1)
pub const REL_SIZE: usize = 5;

/// blkprev(8) + block(4) + offset(2)
pub const BLOCK_SIZE: usize = 14;

/// payload_len(2) + tuple_len(2)
pub const PAYLOAD_SIZE: usize = 4;

/// xidepoch(4) + next(8)
pub const XACT_SIZE: usize = 12;

pub const FIXED_MAX: usize = HEADER_SIZE + REL_SIZE + BLOCK_SIZE + PAYLOAD_SIZE + XACT_SIZE;

pub const INFO_REL: u8 = 0x01;
pub const INFO_BLOCK: u8 = 0x02;
pub const INFO_PAYLOAD: u8 = 0x04;
pub const INFO_XACT: u8 = 0x08;
pub const INFO_ALL: u8 = INFO_REL | INFO_BLOCK | INFO_PAYLOAD | INFO_XACT;

/// Header plus the sub-structures selected by `info`
/// 头部加上 `info` 选中的子结构
#[inline]
pub const fn fixed_len(info: u8) -> usize {
  let mut n = HEADER_SIZE;
  if info & INFO_REL != 0 {
    n += REL_SIZE;
  }
  if info & INFO_BLOCK != 0 {
    n += BLOCK_SIZE;
  }
  if info & INFO_PAYLOAD != 0 {
    n += PAYLOAD_SIZE;
  }
  if info & INFO_XACT != 0 {
    n += XACT_SIZE;
  }
  n
}
