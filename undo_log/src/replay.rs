//! Redo replay and the end of recovery
//! redo 重放与恢复结束

use std::{
  collections::BTreeMap,
  fs, io,
  sync::{Arc, atomic::Ordering},
};

use undo_ptr::{INVALID_XID, LogNo, Persistence, SEG_SIZE, UndoRecPtr, Xid, seg_of};

use crate::{
  Error, Result, UndoLogs,
  logs::rm_seg,
  path::{SEG_DIR, parse_seg_name},
  redo::Redo,
  slot::Log,
};

impl UndoLogs {
  /// Apply one redo record; safe to repeat
  /// 应用一条 redo 记录；可重复执行
  pub fn redo(&self, rec: &Redo) -> Result<()> {
    if !self.in_recovery() {
      return Err(Error::NotInRecovery);
    }
    if let Redo::Create { log_no, tablespace } = *rec {
      self.create_at(log_no, tablespace);
      return Ok(());
    }
    let Some(log) = self.replay_log(rec.log_no())? else {
      return Ok(());
    };
    match *rec {
      Redo::Create { .. } => Ok(()),
      Redo::Extend { end, .. } => {
        if end % SEG_SIZE != 0 {
          return Err(Error::corrupt_redo(format!("log {} end {end:#x} unaligned", log.no)));
        }
        self.extend(&log, end)
      }
      Redo::Attach { xid, .. } => {
        let mut xids = self.xids.lock();
        xids.retain(|(_, p), no| !(*p == log.persistence && *no == log.no));
        xids.insert((xid, log.persistence), log.no);
        Ok(())
      }
      Redo::Allocate {
        xid,
        insert,
        addr,
        size,
        ..
      } => {
        // already in the snapshot, whoever owns the log now
        // 快照已包含，无论当前由谁持有
        if log.st.lock().meta.insert > insert {
          return Ok(());
        }
        if self.log_no_from_xid(xid, log.persistence) != Some(log.no) {
          return Err(Error::corrupt_redo(format!(
            "allocate in log {} for unattached xid {xid}",
            log.no
          )));
        }
        self
          .reserve_in_recovery(&log, xid, Some(insert), Some(addr), size)
          .map(|_| ())
      }
      Redo::Insert {
        insert,
        prevlen,
        last_xact_start,
        ..
      } => {
        let mut st = log.st.lock();
        if insert > st.meta.end {
          return Err(Error::corrupt_redo(format!(
            "log {} insert {insert:#x} past end {:#x}",
            log.no, st.meta.end
          )));
        }
        // older than a discard the snapshot already holds
        // 早于快照中已有的丢弃点
        if insert < st.meta.discard {
          return Ok(());
        }
        st.meta.insert = insert;
        st.meta.prevlen = prevlen;
        st.meta.last_xact_start = last_xact_start;
        Ok(())
      }
      Redo::Discard { discard, xid, .. } => self.discard_at(&log, discard, xid, false),
      Redo::Full { .. } => self.mark_full(&log),
    }
  }

  /// Log a record refers to; `None` for one retired before the snapshot
  /// 记录引用的日志；快照前已退役时为 `None`
  fn replay_log(&self, log_no: LogNo) -> Result<Option<Arc<Log>>> {
    if let Some(log) = self.get(log_no) {
      return Ok(Some(log));
    }
    if log_no < self.next_log_no.load(Ordering::Relaxed) {
      log::debug!("redo for retired undo log {log_no}");
      return Ok(None);
    }
    Err(Error::corrupt_redo(format!("unknown undo log {log_no}")))
  }

  /// Reserve `size` raw bytes for `xid` during recovery, on the log the
  /// transaction was attached to
  /// 恢复期间为 `xid` 在其关联日志上预留 `size` 原始字节
  pub fn allocate_in_recovery(
    &self,
    xid: Xid,
    size: u64,
    persistence: Persistence,
  ) -> Result<UndoRecPtr> {
    if !self.in_recovery() {
      return Err(Error::NotInRecovery);
    }
    let log_no = self
      .log_no_from_xid(xid, persistence)
      .ok_or(Error::NoLogForXid(xid))?;
    let log = self.log(log_no)?;
    self.reserve_in_recovery(&log, xid, None, None, size)
  }

  /// Leave recovery: reset unlogged logs, refill free pools, sweep orphans
  /// 结束恢复：重置非日志化日志，填充空闲池，清理孤儿段
  pub fn finish_recovery(&self) -> Result<()> {
    if !self.in_recovery() {
      return Ok(());
    }
    let logs: Vec<Arc<Log>> = self.logs.read().values().cloned().collect();
    let mut free: [Vec<LogNo>; 3] = Default::default();
    for log in logs.iter().rev() {
      let retire = {
        let mut st = log.st.lock();
        st.owner = None;
        st.attached = false;
        if log.persistence == Persistence::Unlogged {
          st.meta.discard = st.meta.insert;
          st.meta.xid = INVALID_XID;
          st.meta.is_first_rec = false;
        }
        if !st.full {
          free[log.persistence.idx()].push(log.no);
        }
        st.take_retire()
      };
      if retire {
        self.retire(log)?;
      }
    }
    *self.free.lock() = free;
    self.xids.lock().clear();
    let swept = self.sweep()?;
    self.recovery.store(false, Ordering::Release);
    log::info!(
      "undo recovery done: {} logs, {swept} orphan segments removed",
      self.len()
    );
    Ok(())
  }

  /// Remove segment files outside every live `[discard, end)`
  /// 删除不在任何存活日志 `[discard, end)` 内的段文件
  fn sweep(&self) -> Result<usize> {
    let root = self.dir.join(SEG_DIR);
    let spcs = match fs::read_dir(&root) {
      Ok(rd) => rd,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
      Err(e) => return Err(e.into()),
    };
    let live: BTreeMap<LogNo, (u32, u64, u64)> = self
      .logs
      .read()
      .values()
      .map(|log| {
        let st = log.st.lock();
        (
          log.no,
          (
            st.meta.tablespace,
            seg_of(st.meta.discard),
            seg_of(st.meta.end),
          ),
        )
      })
      .collect();

    let mut swept = 0;
    let mut max_no = None;
    for spc in spcs {
      let spc = spc?;
      if !spc.file_type()?.is_dir() {
        continue;
      }
      let Some(tablespace) = spc.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) else {
        continue;
      };
      for file in fs::read_dir(spc.path())? {
        let file = file?;
        let Some((no, seg)) = file.file_name().to_str().and_then(parse_seg_name) else {
          continue;
        };
        max_no = max_no.max(Some(no));
        let keep = live
          .get(&no)
          .is_some_and(|&(spc, lo, hi)| spc == tablespace && seg >= lo && seg < hi);
        if !keep {
          rm_seg(&file.path())?;
          swept += 1;
        }
      }
    }
    if let Some(no) = max_no {
      let _logs = self.logs.write();
      if no >= self.next_log_no.load(Ordering::Relaxed) {
        self.next_log_no.store(no + 1, Ordering::Relaxed);
      }
    }
    Ok(swept)
  }
}
