//! Checkpoint file layout
//! 检查点文件布局
//!
//! `Head ‖ Row × count ‖ crc32(LE)`, the crc covers everything before it.
//! crc 覆盖其之前的全部内容。

use undo_ptr::{LogNo, Persistence};
use zerocopy::{
  FromBytes, Immutable, IntoBytes, KnownLayout,
  little_endian::{U16, U32, U64},
};

use crate::Meta;

pub const MAGIC: [u8; 8] = *b"UNDO_CKP";
pub const VERSION: u32 = 1;
pub const HEAD_SIZE: usize = size_of::<Head>();
pub const ROW_SIZE: usize = size_of::<Row>();
pub const CRC_SIZE: usize = 4;

const _: () = assert!(HEAD_SIZE == 24);
const _: () = assert!(ROW_SIZE == 52);

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub(crate) struct Head {
  magic: [u8; 8],
  version: U32,
  count: U32,
  next_log_no: U32,
  _rsv: U32,
}

#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub(crate) struct Row {
  log_no: U32,
  persistence: u8,
  full: u8,
  is_first_rec: u8,
  _pad: u8,
  tablespace: U32,
  xid: U32,
  prevlen: U16,
  _pad2: U16,
  insert: U64,
  end: U64,
  discard: U64,
  last_xact_start: U64,
}

/// Decoded row / 解码后的行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
  pub log_no: LogNo,
  pub persistence: Persistence,
  pub full: bool,
  pub meta: Meta,
}

impl Row {
  pub fn new(log_no: LogNo, persistence: Persistence, full: bool, meta: &Meta) -> Self {
    Self {
      log_no: U32::new(log_no),
      persistence: persistence.as_u8(),
      full: full as u8,
      is_first_rec: meta.is_first_rec as u8,
      _pad: 0,
      tablespace: U32::new(meta.tablespace),
      xid: U32::new(meta.xid),
      prevlen: U16::new(meta.prevlen),
      _pad2: U16::ZERO,
      insert: U64::new(meta.insert),
      end: U64::new(meta.end),
      discard: U64::new(meta.discard),
      last_xact_start: U64::new(meta.last_xact_start),
    }
  }

  fn entry(&self) -> Result<Entry, &'static str> {
    let persistence = Persistence::from_u8(self.persistence).ok_or("bad persistence")?;
    if self.full > 1 || self.is_first_rec > 1 {
      return Err("bad flag");
    }
    let meta = Meta {
      tablespace: self.tablespace.get(),
      insert: self.insert.get(),
      end: self.end.get(),
      discard: self.discard.get(),
      last_xact_start: self.last_xact_start.get(),
      is_first_rec: self.is_first_rec == 1,
      xid: self.xid.get(),
      prevlen: self.prevlen.get(),
    };
    if !meta.is_consistent() {
      return Err("discard <= insert <= end violated");
    }
    Ok(Entry {
      log_no: self.log_no.get(),
      persistence,
      full: self.full == 1,
      meta,
    })
  }
}

pub(crate) fn encode(next_log_no: LogNo, rows: &[Row]) -> Vec<u8> {
  let head = Head {
    magic: MAGIC,
    version: U32::new(VERSION),
    count: U32::new(rows.len() as u32),
    next_log_no: U32::new(next_log_no),
    _rsv: U32::ZERO,
  };
  let mut buf = Vec::with_capacity(HEAD_SIZE + rows.len() * ROW_SIZE + CRC_SIZE);
  buf.extend_from_slice(head.as_bytes());
  for row in rows {
    buf.extend_from_slice(row.as_bytes());
  }
  let crc = crc32fast::hash(&buf);
  buf.extend_from_slice(&crc.to_le_bytes());
  buf
}

pub(crate) fn decode(bin: &[u8]) -> Result<(LogNo, Vec<Entry>), &'static str> {
  if bin.len() < HEAD_SIZE + CRC_SIZE {
    return Err("truncated");
  }
  let (body, crc) = bin.split_at(bin.len() - CRC_SIZE);
  let mut crc_le = [0u8; CRC_SIZE];
  crc_le.copy_from_slice(crc);
  if crc32fast::hash(body) != u32::from_le_bytes(crc_le) {
    return Err("crc mismatch");
  }
  let head = Head::read_from_bytes(&body[..HEAD_SIZE]).map_err(|_| "head")?;
  if head.magic != MAGIC {
    return Err("bad magic");
  }
  if head.version.get() != VERSION {
    return Err("unsupported version");
  }
  let count = head.count.get() as usize;
  let rows = &body[HEAD_SIZE..];
  if rows.len() != count * ROW_SIZE {
    return Err("row count mismatch");
  }
  let next_log_no = head.next_log_no.get();
  let mut entries = Vec::with_capacity(count);
  for chunk in rows.chunks_exact(ROW_SIZE) {
    let entry = Row::read_from_bytes(chunk).map_err(|_| "row")?.entry()?;
    if entry.log_no == 0 || entry.log_no >= next_log_no {
      return Err("log number out of range");
    }
    entries.push(entry);
  }
  Ok((next_log_no, entries))
}
