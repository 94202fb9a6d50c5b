//! Record unpacking across pages
//! 跨页解包记录

use bytes::Buf;
use undo_ptr::UndoRecPtr;

use crate::{
  Block, Error, Kind, Rel, Result, UnpackedRecord, Xact,
  disk::{FIXED_MAX, HEADER_SIZE, INFO_ALL, INFO_BLOCK, INFO_PAYLOAD, INFO_REL, INFO_XACT, fixed_len},
};

/// Incremental decoder for one record
/// 单条记录的增量解码器
#[derive(Debug)]
pub struct Unpacker {
  fixed: [u8; FIXED_MAX],
  /// Known once the header is decoded / 头部解码后已知
  fixed_len: Option<usize>,
  /// (payload_len, tuple_len), known once the fixed part is decoded
  /// 定长部分解码后已知
  lens: Option<(usize, usize)>,
  rec: UnpackedRecord,
}

impl Default for Unpacker {
  fn default() -> Self {
    Self {
      fixed: [0; FIXED_MAX],
      fixed_len: None,
      lens: None,
      rec: UnpackedRecord::default(),
    }
  }
}

/// Copy from the front of `src` into `dst`, advance `src`
/// 从 `src` 头部复制到 `dst` 并前移 `src`
#[inline]
fn take(src: &mut &[u8], dst: &mut [u8]) -> usize {
  let n = src.len().min(dst.len());
  dst[..n].copy_from_slice(&src[..n]);
  src.advance(n);
  n
}

impl Unpacker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Decode what `page` holds from `starting_byte`. First call: `*decoded == 0`
  /// at the record start (anywhere in the page). Later calls: next page,
  /// `PAGE_HEADER_SIZE`. Returns true once the record is complete.
  /// 从 `starting_byte` 解码本页内容。首次 `*decoded == 0`；后续传下一页、
  /// 起点 `PAGE_HEADER_SIZE`。记录完整时返回 true。
  pub fn unpack(&mut self, page: &[u8], starting_byte: usize, decoded: &mut usize) -> Result<bool> {
    if starting_byte > page.len() {
      return Err(Error::StartOutOfPage(starting_byte, page.len()));
    }
    let mut src = &page[starting_byte..];

    let fixed_len = match self.fixed_len {
      Some(n) => n,
      None => {
        let n = take(&mut src, &mut self.fixed[*decoded..HEADER_SIZE]);
        *decoded += n;
        if *decoded < HEADER_SIZE {
          return Ok(false);
        }
        let n = self.read_header()?;
        self.fixed_len = Some(n);
        n
      }
    };

    let (payload_len, tuple_len) = match self.lens {
      Some(lens) => lens,
      None => {
        let n = take(&mut src, &mut self.fixed[*decoded..fixed_len]);
        *decoded += n;
        if *decoded < fixed_len {
          return Ok(false);
        }
        let lens = self.read_optional()?;
        self.lens = Some(lens);
        lens
      }
    };

    let payload_end = fixed_len + payload_len;
    if *decoded < payload_end {
      let n = src.len().min(payload_end - *decoded);
      self.rec.payload.extend_from_slice(&src[..n]);
      src.advance(n);
      *decoded += n;
      if *decoded < payload_end {
        return Ok(false);
      }
    }

    let tuple_end = payload_end + tuple_len;
    if *decoded < tuple_end {
      let n = src.len().min(tuple_end - *decoded);
      self.rec.tuple.extend_from_slice(&src[..n]);
      *decoded += n;
      if *decoded < tuple_end {
        return Ok(false);
      }
    }

    Ok(true)
  }

  /// Total record size, once the fixed part is decoded
  /// 定长部分解码后可得的记录总长
  #[inline]
  pub fn size(&self) -> Option<usize> {
    let fixed_len = self.fixed_len?;
    let (p, t) = self.lens?;
    Some(fixed_len + p + t)
  }

  /// Fields decoded so far / 目前已解码字段
  #[inline]
  pub fn record(&self) -> &UnpackedRecord {
    &self.rec
  }

  #[inline]
  pub fn into_record(self) -> UnpackedRecord {
    self.rec
  }

  fn read_header(&mut self) -> Result<usize> {
    let mut r = &self.fixed[..HEADER_SIZE];
    let kind = Kind::try_from(r.get_u8())?;
    let info = r.get_u8();
    if info & !INFO_ALL != 0 {
      return Err(Error::UnknownInfo(info));
    }
    let rec = &mut self.rec;
    rec.kind = kind;
    rec.prevlen = r.get_u16_le();
    rec.relfilenode = r.get_u32_le();
    rec.prevxid = r.get_u32_le();
    rec.xid = r.get_u32_le();
    rec.cid = r.get_u32_le();
    Ok(fixed_len(info))
  }

  fn read_optional(&mut self) -> Result<(usize, usize)> {
    let info = self.fixed[1];
    let fixed_len = fixed_len(info);
    let mut r = &self.fixed[HEADER_SIZE..fixed_len];
    let rec = &mut self.rec;

    rec.rel = if info & INFO_REL != 0 {
      Rel {
        tsid: r.get_u32_le(),
        fork: r.get_u8(),
      }
    } else {
      Rel::default()
    };

    rec.block = (info & INFO_BLOCK != 0).then(|| Block {
      blkprev: UndoRecPtr::from_u64(r.get_u64_le()),
      block: r.get_u32_le(),
      offset: r.get_u16_le(),
    });

    let lens = if info & INFO_PAYLOAD != 0 {
      let p = r.get_u16_le() as usize;
      let t = r.get_u16_le() as usize;
      if p == 0 && t == 0 {
        return Err(Error::EmptyPayload);
      }
      (p, t)
    } else {
      (0, 0)
    };

    rec.xact = (info & INFO_XACT != 0).then(|| Xact {
      epoch: r.get_u32_le(),
      next: UndoRecPtr::from_u64(r.get_u64_le()),
    });

    rec.payload.reserve_exact(lens.0);
    rec.tuple.reserve_exact(lens.1);
    Ok(lens)
  }
}
