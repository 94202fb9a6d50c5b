//! Head movement: reserve, advance, rewind
//! 头部移动：预留、前进、回退

use undo_ptr::{INVALID_XID, Offset, UndoRecPtr, Xid, seg_ceil};

use crate::{
  Error, Result, UndoLogs,
  logs::insert_redo,
  redo::Redo,
  slot::Log,
};

impl UndoLogs {
  /// `None` when the log had to be marked full
  /// 日志被标记为满时返回 `None`
  pub(crate) fn reserve(
    &self,
    log: &Log,
    xid: Xid,
    span: &impl Fn(Offset) -> (Offset, u64),
  ) -> Result<Option<UndoRecPtr>> {
    loop {
      let mut st = log.st.lock();
      if st.full {
        return Ok(None);
      }
      let insert = st.meta.insert;
      let (addr, size) = span(insert);
      let head = insert + size;
      if head > self.opt.max_log_size {
        drop(st);
        self.mark_full(log)?;
        return Ok(None);
      }
      if head > st.meta.end {
        drop(st);
        self.extend(log, seg_ceil(head))?;
        continue;
      }

      // WAL first: a failed append leaves the log untouched
      // 先写 WAL：追加失败时日志保持不变
      let prev = st.meta.xid;
      if prev != xid {
        self.emit(log.persistence, Redo::Attach { log_no: log.no, xid })?;
      }
      self.emit(
        log.persistence,
        Redo::Allocate {
          log_no: log.no,
          xid,
          insert,
          addr,
          size,
        },
      )?;
      if st.reserve(xid, addr, size) {
        let mut xids = self.xids.lock();
        if prev != INVALID_XID && xids.get(&(prev, log.persistence)) == Some(&log.no) {
          xids.remove(&(prev, log.persistence));
        }
        xids.insert((xid, log.persistence), log.no);
      }
      st.owner = Some(xid);
      return Ok(Some(UndoRecPtr::new(log.no, addr)));
    }
  }

  pub(crate) fn advance(&self, log: &Log, to: Offset) -> Result<()> {
    if to > self.opt.max_log_size {
      return Err(Error::LogFull(log.no));
    }
    loop {
      let mut st = log.st.lock();
      if to > st.meta.end {
        drop(st);
        self.extend(log, seg_ceil(to))?;
        continue;
      }
      if to > st.meta.insert {
        let mut meta = st.meta;
        meta.insert = to;
        self.emit(log.persistence, insert_redo(log.no, &meta))?;
        st.meta = meta;
      }
      return Ok(());
    }
  }

  pub(crate) fn rewind(&self, log: &Log, to: Offset, prevlen: u16) -> Result<()> {
    let mut st = log.st.lock();
    if to < st.meta.discard || to > st.meta.insert {
      return Err(Error::BadRewind(UndoRecPtr::new(log.no, to)));
    }
    let mut meta = st.meta;
    meta.insert = to;
    meta.prevlen = prevlen;
    self.emit(log.persistence, insert_redo(log.no, &meta))?;
    st.meta = meta;
    st.synced = st.synced.min(to);
    Ok(())
  }

  /// Replay-side allocation; `at` pins the expected head and skips work
  /// already reflected in the checkpoint
  /// 重放侧分配；`at` 固定期望头部，跳过检查点中已体现的部分
  pub(crate) fn reserve_in_recovery(
    &self,
    log: &Log,
    xid: Xid,
    at: Option<Offset>,
    addr: Option<Offset>,
    size: u64,
  ) -> Result<UndoRecPtr> {
    loop {
      let mut st = log.st.lock();
      let start = match at {
        Some(at) if st.meta.insert > at => {
          return Ok(UndoRecPtr::new(log.no, addr.unwrap_or(at)));
        }
        Some(at) => at,
        None => st.meta.insert,
      };
      let head = start
        .checked_add(size)
        .ok_or_else(|| Error::corrupt_redo(format!("log {} allocate overflows", log.no)))?;
      if head > st.meta.end {
        drop(st);
        self.extend(log, seg_ceil(head))?;
        continue;
      }
      let addr = addr.unwrap_or(start);
      st.meta.insert = start;
      st.reserve(xid, addr, size);
      return Ok(UndoRecPtr::new(log.no, addr));
    }
  }
}
