//! Dirty segment tracking
//! 脏段跟踪

use std::{io, sync::Arc};

use undo_ptr::{LogNo, MAX_LOG_SIZE, Persistence, seg_of, seg_start};

use crate::{Error, Result, UndoLogs, fs::sync_seg, path::seg_path, slot::Log};

impl UndoLogs {
  /// Segments written since the last sync, inclusive
  /// 上次同步后写过的段（闭区间）
  pub fn dirty_seg_range(&self, log_no: LogNo) -> Option<(u64, u64)> {
    self.get(log_no)?.st.lock().dirty()
  }

  /// Record that segments up to `seg` are durable
  /// 记录 `seg` 及之前的段已持久
  pub fn set_highest_synced_seg(&self, log_no: LogNo, seg: u64) -> Result<()> {
    let end = seg
      .checked_add(1)
      .filter(|&n| n <= seg_of(MAX_LOG_SIZE))
      .map(seg_start)
      .ok_or(Error::TooLarge(seg))?;
    let log = self.log(log_no)?;
    let mut st = log.st.lock();
    let synced = end.min(st.meta.insert);
    st.synced = st.synced.max(synced);
    Ok(())
  }

  /// Fsync dirty segments of every logged or unlogged log
  /// 对所有永久与非日志化日志的脏段执行 fsync
  pub fn sync(&self) -> Result<()> {
    let logs: Vec<Arc<Log>> = self
      .logs
      .read()
      .values()
      .filter(|log| log.persistence != Persistence::Temp)
      .cloned()
      .collect();
    for log in logs {
      let (range, tablespace, head) = {
        let st = log.st.lock();
        (st.dirty(), st.meta.tablespace, st.meta.insert)
      };
      let Some((lo, hi)) = range else {
        continue;
      };
      for seg in lo..=hi {
        let path = self.dir.join(seg_path(log.no, seg, tablespace));
        match sync_seg(&path) {
          Ok(()) => {}
          // discarded meanwhile
          // 期间已被丢弃
          Err(e) if e.kind() == io::ErrorKind::NotFound => {}
          Err(e) => return Err(e.into()),
        }
      }
      let mut st = log.st.lock();
      st.synced = st.synced.max(head.min(st.meta.insert));
    }
    Ok(())
  }
}
