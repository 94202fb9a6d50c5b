//! Per-thread allocation handle
//! 线程级分配句柄

use std::sync::Arc;

use undo_ptr::{LogNo, Offset, Persistence, UndoRecPtr, Xid, usable_span};

use crate::{Error, Result, UndoLogs, slot::Log};

/// Holds at most one log per persistence level; dropping it returns them
/// to the free pool
/// 每个持久级别最多持有一个日志；销毁时归还空闲池
pub struct Session<'a> {
  logs: &'a UndoLogs,
  attached: [Option<Arc<Log>>; 3],
}

impl<'a> Session<'a> {
  pub(crate) fn new(logs: &'a UndoLogs) -> Self {
    Self {
      logs,
      attached: Default::default(),
    }
  }

  /// Reserve `size` raw bytes for `xid`
  /// 为 `xid` 预留 `size` 原始字节
  pub fn allocate(&mut self, xid: Xid, size: u64, persistence: Persistence) -> Result<UndoRecPtr> {
    if size > self.logs.opt.max_log_size {
      return Err(Error::TooLarge(size));
    }
    self.reserve(xid, persistence, |insert| (insert, size))
  }

  /// Reserve room for a record of `len` bytes, page headers skipped; the
  /// address is where record data starts
  /// 为 `len` 字节记录预留空间并跳过页头；返回记录数据起点
  pub fn allocate_record(
    &mut self,
    xid: Xid,
    len: u64,
    persistence: Persistence,
  ) -> Result<UndoRecPtr> {
    self.reserve(xid, persistence, |insert| usable_span(insert, len))
  }

  fn reserve(
    &mut self,
    xid: Xid,
    persistence: Persistence,
    span: impl Fn(Offset) -> (Offset, u64),
  ) -> Result<UndoRecPtr> {
    if self.logs.in_recovery() {
      return Err(Error::InRecovery);
    }
    let idx = persistence.idx();
    loop {
      let (log, fresh) = match &self.attached[idx] {
        Some(log) => (log.clone(), false),
        None => {
          let (log, fresh) = self.logs.attach(persistence)?;
          self.attached[idx] = Some(log.clone());
          (log, fresh)
        }
      };
      if let Some(ptr) = self.logs.reserve(&log, xid, &span)? {
        return Ok(ptr);
      }
      self.attached[idx] = None;
      self.logs.detach(&log);
      if fresh {
        return Err(Error::TooLarge(span(0).1));
      }
    }
  }

  fn owned(&self, ptr: UndoRecPtr) -> Result<&Arc<Log>> {
    self
      .attached
      .iter()
      .flatten()
      .find(|log| log.no == ptr.log_no())
      .ok_or(Error::NotOwner(ptr.log_no()))
  }

  /// Confirm `size` bytes written at `ptr`
  /// 确认已在 `ptr` 写入 `size` 字节
  pub fn advance(&mut self, ptr: UndoRecPtr, size: u64) -> Result<()> {
    let log = self.owned(ptr)?.clone();
    let to = ptr.offset().checked_add(size).ok_or(Error::TooLarge(size))?;
    self.logs.advance(&log, to)
  }

  /// Move the head back to `ptr`, dropping what followed
  /// 将头部回退到 `ptr`，丢弃其后内容
  pub fn rewind(&mut self, ptr: UndoRecPtr, prevlen: u16) -> Result<()> {
    let log = self.owned(ptr)?.clone();
    self.logs.rewind(&log, ptr.offset(), prevlen)
  }

  /// `xid` committed or aborted; its logs become discardable
  /// `xid` 已提交或中止，其日志可被丢弃
  pub fn finish(&mut self, xid: Xid) {
    for log in self.attached.iter().flatten() {
      let mut st = log.st.lock();
      if st.owner == Some(xid) {
        st.owner = None;
      }
    }
    self.logs.xids.lock().retain(|(x, _), _| *x != xid);
  }

  /// Head of the attached log, invalid when none
  /// 所持日志的头部，未持有时无效
  pub fn current_location(&self, persistence: Persistence) -> UndoRecPtr {
    match &self.attached[persistence.idx()] {
      Some(log) => UndoRecPtr::new(log.no, log.st.lock().meta.insert),
      None => UndoRecPtr::INVALID,
    }
  }

  pub fn log_no(&self, persistence: Persistence) -> Option<LogNo> {
    self.attached[persistence.idx()].as_ref().map(|log| log.no)
  }

  #[inline]
  pub fn logs(&self) -> &'a UndoLogs {
    self.logs
  }
}

impl Drop for Session<'_> {
  fn drop(&mut self) {
    for log in self.attached.iter_mut().filter_map(Option::take) {
      self.logs.detach(&log);
    }
  }
}
