//! Record packing across pages
//! 跨页打包记录

use bytes::BufMut;
use undo_ptr::PAGE_HEADER_SIZE;

use crate::{
  Error, Result, UnpackedRecord,
  disk::{FIXED_MAX, INFO_PAYLOAD, INFO_REL, fixed_len},
};

/// Staged fixed part of one record; info bits are fixed at construction
/// 单条记录的定长部分；标志位在构造时确定
pub struct Packer<'a> {
  rec: &'a UnpackedRecord,
  info: u8,
  fixed: [u8; FIXED_MAX],
  fixed_len: usize,
}

impl<'a> Packer<'a> {
  pub fn new(rec: &'a UnpackedRecord) -> Result<Self> {
    if rec.payload.len() > u16::MAX as usize {
      return Err(Error::TooLong("payload", rec.payload.len()));
    }
    if rec.tuple.len() > u16::MAX as usize {
      return Err(Error::TooLong("tuple", rec.tuple.len()));
    }

    let info = rec.info();
    let fixed_len = fixed_len(info);
    let mut fixed = [0u8; FIXED_MAX];
    {
      let mut w = &mut fixed[..fixed_len];
      w.put_u8(rec.kind as u8);
      w.put_u8(info);
      w.put_u16_le(rec.prevlen);
      w.put_u32_le(rec.relfilenode);
      w.put_u32_le(rec.prevxid);
      w.put_u32_le(rec.xid);
      w.put_u32_le(rec.cid);

      if info & INFO_REL != 0 {
        w.put_u32_le(rec.rel.tsid);
        w.put_u8(rec.rel.fork);
      }
      if let Some(b) = rec.block {
        w.put_u64_le(b.blkprev.as_u64());
        w.put_u32_le(b.block);
        w.put_u16_le(b.offset);
      }
      if info & INFO_PAYLOAD != 0 {
        w.put_u16_le(rec.payload.len() as u16);
        w.put_u16_le(rec.tuple.len() as u16);
      }
      if let Some(x) = rec.xact {
        w.put_u32_le(x.epoch);
        w.put_u64_le(x.next.as_u64());
      }
      debug_assert!(w.is_empty());
    }

    Ok(Self {
      rec,
      info,
      fixed,
      fixed_len,
    })
  }

  #[inline]
  pub fn info(&self) -> u8 {
    self.info
  }

  /// Total record bytes / 记录总字节数
  #[inline]
  pub fn size(&self) -> usize {
    self.fixed_len + self.rec.payload.len() + self.rec.tuple.len()
  }

  /// Write as much as fits from `starting_byte` to the end of `page`.
  /// First call: `*written == 0`, start at the insertion point. Later calls:
  /// next page, start at `PAGE_HEADER_SIZE`. Returns true once complete.
  /// 从 `starting_byte` 写到页尾。首次 `*written == 0`；后续传下一页、
  /// 起点 `PAGE_HEADER_SIZE`。写完返回 true。
  pub fn insert(&self, page: &mut [u8], starting_byte: usize, written: &mut usize) -> bool {
    debug_assert!(starting_byte >= PAGE_HEADER_SIZE);
    let size = self.size();
    if *written >= size {
      return true;
    }
    if starting_byte >= page.len() {
      return false;
    }

    let mut dst = &mut page[starting_byte..];
    let mut skip = *written;
    for part in [
      &self.fixed[..self.fixed_len],
      &self.rec.payload[..],
      &self.rec.tuple[..],
    ] {
      if skip >= part.len() {
        skip -= part.len();
        continue;
      }
      let src = &part[skip..];
      skip = 0;
      let n = src.len().min(dst.len());
      dst[..n].copy_from_slice(&src[..n]);
      dst = &mut std::mem::take(&mut dst)[n..];
      *written += n;
      if dst.is_empty() {
        break;
      }
    }

    *written == size
  }
}
