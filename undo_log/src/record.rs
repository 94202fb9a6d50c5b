//! Record insert and chained fetch
//! 记录插入与链式读取

use undo_ptr::{BLCKSZ, PAGE_HEADER_SIZE, Persistence, UndoRecPtr, Xid, offset_in_page, page_of};
use undo_rec::{UnpackedRecord, Unpacker};

use crate::{Error, Result, Session, UndoLogs, io::PageIo};

impl Session<'_> {
  /// Allocate room for `rec`, stamp its `prevlen` and write it page by page
  /// 为 `rec` 分配空间、填写 `prevlen` 并逐页写入
  pub fn insert_record(
    &mut self,
    io: &impl PageIo,
    xid: Xid,
    persistence: Persistence,
    rec: &mut UnpackedRecord,
  ) -> Result<UndoRecPtr> {
    let size = rec.expected_size();
    if size > u16::MAX as usize {
      return Err(Error::RecordTooLarge(size));
    }
    let ptr = self.allocate_record(xid, size as u64, persistence)?;
    let logs = self.logs();
    rec.prevlen = logs.prevlen(ptr.log_no())?;
    let tablespace = logs.tablespace_of(ptr)?;
    let packer = rec.packer()?;

    let mut page = vec![0u8; BLCKSZ];
    let mut written = 0;
    let mut block = page_of(ptr.offset());
    let mut start = offset_in_page(ptr.offset());
    loop {
      io.read(ptr.log_no(), tablespace, block, &mut page)?;
      let done = packer.insert(&mut page, start, &mut written);
      io.write(ptr.log_no(), tablespace, block, &page)?;
      if done {
        break;
      }
      block += 1;
      start = PAGE_HEADER_SIZE;
    }
    logs.set_prevlen(ptr.log_no(), size as u16)?;
    Ok(ptr)
  }
}

impl UndoLogs {
  /// Decode the record at `ptr`
  /// 解码 `ptr` 处的记录
  pub fn read_record(&self, io: &impl PageIo, ptr: UndoRecPtr) -> Result<UnpackedRecord> {
    let log = self.log(ptr.log_no())?;
    let (tablespace, insert) = {
      let st = log.st.lock();
      (st.meta.tablespace, st.meta.insert)
    };
    let corrupt = |reason: String| Error::CorruptRecord {
      ptr,
      reason: reason.into(),
    };
    if ptr.offset() >= insert {
      return Err(corrupt(format!("beyond head {insert:#x}")));
    }

    let mut page = vec![0u8; BLCKSZ];
    let mut un = Unpacker::new();
    let mut decoded = 0;
    let mut block = page_of(ptr.offset());
    let mut start = offset_in_page(ptr.offset());
    loop {
      io.read(ptr.log_no(), tablespace, block, &mut page)?;
      if un
        .unpack(&page, start, &mut decoded)
        .map_err(|e| corrupt(e.to_string()))?
      {
        return Ok(un.into_record());
      }
      block += 1;
      start = PAGE_HEADER_SIZE;
      if block * BLCKSZ as u64 >= insert {
        return Err(corrupt(format!("runs past head {insert:#x}")));
      }
    }
  }

  /// Walk the `blkprev` chain from `ptr` to the first record `hit` accepts,
  /// stopping at an invalid or discarded address
  /// 从 `ptr` 沿 `blkprev` 链查找第一条满足 `hit` 的记录，遇到无效或已丢弃地址即停止
  pub fn fetch_record(
    &self,
    io: &impl PageIo,
    mut ptr: UndoRecPtr,
    mut hit: impl FnMut(&UnpackedRecord) -> bool,
  ) -> Result<Option<(UndoRecPtr, UnpackedRecord)>> {
    loop {
      if !ptr.is_valid() || ptr.is_pending() || self.is_discarded(ptr) {
        return Ok(None);
      }
      let rec = self.read_record(io, ptr)?;
      if hit(&rec) {
        return Ok(Some((ptr, rec)));
      }
      match rec.block {
        Some(b) => ptr = b.blkprev,
        None => return Ok(None),
      }
    }
  }
}
