//! Tail movement
//! 尾部移动

use undo_ptr::{INVALID_XID, Offset, UndoRecPtr, Xid, seg_of};

use crate::{Error, Result, UndoLogs, redo::Redo, slot::Log};

impl UndoLogs {
  /// Advance the tail of `ptr`'s log to `ptr`; segments entirely below it
  /// are unlinked, a full log drained to its head is retired
  /// 将日志尾部推进到 `ptr`；完全低于它的段被删除，已满且排空的日志退役
  ///
  /// Discarding to an earlier point is a no-op.
  pub fn discard(&self, ptr: UndoRecPtr, xid: Xid) -> Result<()> {
    let log = self.log(ptr.log_no())?;
    self.discard_at(&log, ptr.offset(), xid, true)
  }

  pub(crate) fn discard_at(&self, log: &Log, point: Offset, xid: Xid, check: bool) -> Result<()> {
    let (tablespace, from, retire) = {
      let mut st = log.st.lock();
      if point > st.meta.insert {
        return Err(Error::DiscardPastInsert {
          log_no: log.no,
          discard: point,
          insert: st.meta.insert,
        });
      }
      if check && xid != INVALID_XID && st.owner == Some(xid) {
        return Err(Error::DiscardInProgress { log_no: log.no, xid });
      }
      if point <= st.meta.discard {
        return Ok(());
      }
      self.emit(
        log.persistence,
        Redo::Discard {
          log_no: log.no,
          discard: point,
          xid,
        },
      )?;
      let from = std::mem::replace(&mut st.meta.discard, point);
      (st.meta.tablespace, from, st.take_retire())
    };
    if retire {
      self.retire(log)?;
    } else {
      self.unlink_segs(log.no, tablespace, seg_of(from), seg_of(point))?;
    }
    Ok(())
  }

  /// Below the tail, or in a log already retired
  /// 低于尾部，或所在日志已退役
  pub fn is_discarded(&self, ptr: UndoRecPtr) -> bool {
    if !ptr.is_valid() {
      return true;
    }
    match self.get(ptr.log_no()) {
      Some(log) => ptr.offset() < log.st.lock().meta.discard,
      None => true,
    }
  }
}
