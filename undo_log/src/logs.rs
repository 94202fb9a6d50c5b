//! Registry of undo logs
//! 撤销日志注册表

use std::{
  collections::{BTreeMap, HashMap},
  io,
  path::{Path, PathBuf},
  sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
  },
};

use parking_lot::{Mutex, RwLock};
use undo_ptr::{
  INVALID_XID, LogNo, MAX_LOG_NO, Offset, Persistence, UndoRecPtr, Xid, seg_of,
};

use crate::{
  Error, Meta, Result, Session,
  conf::Opt,
  fs::{create_seg, try_rm},
  lock::DirLock,
  path::seg_path,
  redo::{Redo, RedoSink},
  slot::Log,
};

/// Snapshot of one log / 单个日志快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogInfo {
  pub log_no: LogNo,
  pub persistence: Persistence,
  pub full: bool,
  pub meta: Meta,
}

#[derive(Default)]
pub(crate) struct Unlink {
  /// Checkpoint running, queue instead of unlinking
  /// 检查点进行中，排队而非删除
  pub defer: bool,
  pub queue: Vec<PathBuf>,
}

/// Shared undo log manager, one per data directory
/// 共享撤销日志管理器，每个数据目录一个
pub struct UndoLogs {
  pub(crate) dir: PathBuf,
  pub(crate) opt: Opt,
  pub(crate) logs: RwLock<BTreeMap<LogNo, Arc<Log>>>,
  /// Unattached, not full logs per persistence level
  /// 各持久级别未被持有且未满的日志
  pub(crate) free: Mutex<[Vec<LogNo>; 3]>,
  /// Changed only under the `logs` write lock
  /// 仅在 `logs` 写锁下修改
  pub(crate) next_log_no: AtomicU32,
  pub(crate) xids: Mutex<HashMap<(Xid, Persistence), LogNo>>,
  pub(crate) recovery: AtomicBool,
  pub(crate) ckp: Mutex<()>,
  pub(crate) unlink: Mutex<Unlink>,
  pub(crate) sink: Box<dyn RedoSink>,
  _lock: DirLock,
}

impl UndoLogs {
  pub(crate) fn new(
    dir: PathBuf,
    opt: Opt,
    sink: Box<dyn RedoSink>,
    lock: DirLock,
    next_log_no: LogNo,
    logs: BTreeMap<LogNo, Arc<Log>>,
  ) -> Self {
    let xids = logs
      .values()
      .filter_map(|log| {
        let xid = log.st.lock().meta.xid;
        (xid != INVALID_XID).then_some(((xid, log.persistence), log.no))
      })
      .collect();
    Self {
      dir,
      opt,
      logs: RwLock::new(logs),
      free: Mutex::new(Default::default()),
      next_log_no: AtomicU32::new(next_log_no),
      xids: Mutex::new(xids),
      recovery: AtomicBool::new(true),
      ckp: Mutex::new(()),
      unlink: Mutex::new(Unlink::default()),
      sink,
      _lock: lock,
    }
  }

  #[inline]
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  #[inline]
  pub fn in_recovery(&self) -> bool {
    self.recovery.load(Ordering::Acquire)
  }

  /// Per-thread handle for allocation
  /// 线程级分配句柄
  #[inline]
  pub fn session(&self) -> Session<'_> {
    Session::new(self)
  }

  #[inline]
  pub(crate) fn get(&self, log_no: LogNo) -> Option<Arc<Log>> {
    self.logs.read().get(&log_no).cloned()
  }

  pub(crate) fn log(&self, log_no: LogNo) -> Result<Arc<Log>> {
    self.get(log_no).ok_or(Error::UnknownLog(log_no))
  }

  /// Report to the WAL, permanent logs outside recovery only
  /// 上报 WAL，仅限恢复外的永久日志
  pub(crate) fn emit(&self, persistence: Persistence, rec: Redo) -> Result<()> {
    if persistence.is_logged() && !self.in_recovery() {
      self.sink.append(&rec)?;
    }
    Ok(())
  }

  /// Number of logs currently occupying a slot
  /// 当前占用槽位的日志数
  pub fn len(&self) -> usize {
    self.logs.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn meta(&self, log_no: LogNo) -> Option<Meta> {
    self.get(log_no).map(|log| log.st.lock().meta)
  }

  pub fn info(&self, log_no: LogNo) -> Option<LogInfo> {
    self.get(log_no).map(|log| info(&log))
  }

  /// All live logs ordered by number
  /// 按日志号排序的所有存活日志
  pub fn snapshot(&self) -> Vec<LogInfo> {
    self.logs.read().values().map(|log| info(log)).collect()
  }

  /// Next live log after `after`, with its tablespace
  /// `after` 之后的下一个存活日志及其表空间
  pub fn next_active_log(&self, after: Option<LogNo>) -> Option<(LogNo, u32)> {
    let logs = self.logs.read();
    let mut iter = match after {
      Some(no) => logs.range(no.saturating_add(1)..),
      None => logs.range(..),
    };
    iter
      .find(|(_, log)| !log.st.lock().retired)
      .map(|(no, log)| (*no, log.st.lock().meta.tablespace))
  }

  pub fn tablespace_of(&self, ptr: UndoRecPtr) -> Result<u32> {
    Ok(self.log(ptr.log_no())?.st.lock().meta.tablespace)
  }

  /// Log serving `xid` at `persistence`
  /// 为 `xid` 在 `persistence` 级别服务的日志
  pub fn log_no_from_xid(&self, xid: Xid, persistence: Persistence) -> Option<LogNo> {
    self.xids.lock().get(&(xid, persistence)).copied()
  }

  /// Whether the next record of `xid` is its first in the log
  /// `xid` 的下一条记录是否为其在该日志中的首条
  pub fn is_first_rec(&self, xid: Xid, persistence: Persistence) -> bool {
    match self.log_no_from_xid(xid, persistence).and_then(|no| self.get(no)) {
      Some(log) => {
        let st = log.st.lock();
        st.meta.xid != xid || st.meta.is_first_rec
      }
      None => true,
    }
  }

  pub fn prevlen(&self, log_no: LogNo) -> Result<u16> {
    Ok(self.log(log_no)?.st.lock().meta.prevlen)
  }

  pub fn set_prevlen(&self, log_no: LogNo, prevlen: u16) -> Result<()> {
    let log = self.log(log_no)?;
    let mut st = log.st.lock();
    let mut meta = st.meta;
    meta.prevlen = prevlen;
    self.emit(log.persistence, insert_redo(log.no, &meta))?;
    st.meta = meta;
    Ok(())
  }

  pub fn set_last_xact_start(&self, ptr: UndoRecPtr) -> Result<()> {
    let log = self.log(ptr.log_no())?;
    let mut st = log.st.lock();
    let mut meta = st.meta;
    meta.last_xact_start = ptr.offset();
    self.emit(log.persistence, insert_redo(log.no, &meta))?;
    st.meta = meta;
    Ok(())
  }

  pub fn last_xact_start(&self, log_no: LogNo) -> Result<UndoRecPtr> {
    let log = self.log(log_no)?;
    let offset = log.st.lock().meta.last_xact_start;
    Ok(UndoRecPtr::new(log_no, offset))
  }

  /// Head of `log_no` if `xid` was the last writer, else invalid
  /// 若 `xid` 为最后写入者返回 `log_no` 的头部，否则无效
  pub fn next_insert_ptr(&self, log_no: LogNo, xid: Xid) -> UndoRecPtr {
    match self.get(log_no) {
      Some(log) => {
        let st = log.st.lock();
        if st.meta.xid == xid {
          UndoRecPtr::new(log_no, st.meta.insert)
        } else {
          UndoRecPtr::INVALID
        }
      }
      None => UndoRecPtr::INVALID,
    }
  }

  /// Oldest undo still kept, invalid when the log is empty
  /// 仍保留的最旧撤销地址，日志为空时无效
  pub fn first_valid_record(&self, log_no: LogNo) -> UndoRecPtr {
    match self.get(log_no) {
      Some(log) => {
        let st = log.st.lock();
        if st.meta.discard == st.meta.insert {
          UndoRecPtr::INVALID
        } else {
          UndoRecPtr::new(log_no, st.meta.discard)
        }
      }
      None => UndoRecPtr::INVALID,
    }
  }

  /// Take a log for a session: free pool first, then a new one
  /// 为会话取日志：先取空闲池，再新建
  ///
  /// The flag tells whether the log was just created.
  pub(crate) fn attach(&self, persistence: Persistence) -> Result<(Arc<Log>, bool)> {
    loop {
      let Some(no) = self.free.lock()[persistence.idx()].pop() else {
        break;
      };
      if let Some(log) = self.get(no) {
        let mut st = log.st.lock();
        if !st.full && !st.retired && !st.attached {
          st.attached = true;
          drop(st);
          return Ok((log, false));
        }
      }
    }
    let log = self.create(persistence)?;
    log.st.lock().attached = true;
    Ok((log, true))
  }

  fn create(&self, persistence: Persistence) -> Result<Arc<Log>> {
    let mut logs = self.logs.write();
    if logs.len() >= self.opt.max_slots {
      return Err(Error::Exhausted);
    }
    let no = self.next_log_no.load(Ordering::Relaxed);
    if no > MAX_LOG_NO {
      return Err(Error::LogNoExhausted);
    }
    let tablespace = self.opt.tablespace;
    self.emit(persistence, Redo::Create { log_no: no, tablespace })?;
    self.next_log_no.store(no + 1, Ordering::Relaxed);
    let log = Arc::new(Log::new(no, persistence, Meta::new(tablespace), false));
    logs.insert(no, log.clone());
    log::debug!("create undo log {no} {persistence:?}");
    Ok(log)
  }

  /// Recreate a permanent log seen in redo
  /// 重建 redo 中出现的永久日志
  pub(crate) fn create_at(&self, no: LogNo, tablespace: u32) {
    let mut logs = self.logs.write();
    if logs.contains_key(&no) {
      return;
    }
    if no >= self.next_log_no.load(Ordering::Relaxed) {
      self.next_log_no.store(no + 1, Ordering::Relaxed);
    }
    logs.insert(
      no,
      Arc::new(Log::new(
        no,
        Persistence::Permanent,
        Meta::new(tablespace),
        false,
      )),
    );
  }

  /// Return a session's log; full logs stay out of the pool
  /// 归还会话持有的日志；已满日志不回池
  pub(crate) fn detach(&self, log: &Log) {
    let mut st = log.st.lock();
    st.attached = false;
    st.owner = None;
    if !st.full && !st.retired {
      drop(st);
      self.free.lock()[log.persistence.idx()].push(log.no);
    }
  }

  /// Grow `end` to `to` in whole segments; files are created without the log lock
  /// 以整段将 `end` 扩展到 `to`；创建文件时不持有日志锁
  pub(crate) fn extend(&self, log: &Log, to: Offset) -> Result<()> {
    let (from, tablespace) = {
      let st = log.st.lock();
      (st.meta.end, st.meta.tablespace)
    };
    if to <= from {
      return Ok(());
    }
    let mut created: Vec<PathBuf> = Vec::new();
    for seg in seg_of(from)..seg_of(to) {
      let path = self.dir.join(seg_path(log.no, seg, tablespace));
      if let Err(e) = create_seg(&path) {
        for path in &created {
          let _ = try_rm(path);
        }
        log::error!("extend undo log {} to {to:#x}: {e}", log.no);
        return Err(e.into());
      }
      created.push(path);
    }
    let mut st = log.st.lock();
    if st.meta.end < to {
      self.emit(log.persistence, Redo::Extend { log_no: log.no, end: to })?;
      st.meta.end = to;
    }
    Ok(())
  }

  /// Mark a log full so no session picks it again
  /// 标记日志已满，不再被会话选中
  pub(crate) fn mark_full(&self, log: &Log) -> Result<()> {
    let retire = {
      let mut st = log.st.lock();
      if st.full {
        return Ok(());
      }
      self.emit(log.persistence, Redo::Full { log_no: log.no })?;
      st.full = true;
      log::debug!("undo log {} full at {:#x}", log.no, st.meta.insert);
      st.take_retire()
    };
    if retire {
      self.retire(log)?;
    }
    Ok(())
  }

  /// Release the slot of a full, fully discarded log and remove its files
  /// 释放已满且已全部丢弃的日志槽并删除其文件
  pub(crate) fn retire(&self, log: &Log) -> io::Result<()> {
    let (tablespace, from, end) = {
      let st = log.st.lock();
      (st.meta.tablespace, st.meta.discard, st.meta.end)
    };
    self.logs.write().remove(&log.no);
    self.xids.lock().retain(|_, no| *no != log.no);
    log::debug!("retire undo log {}", log.no);
    self.unlink_segs(log.no, tablespace, seg_of(from), seg_of(end))
  }

  /// Unlink segments in `[from, to)`, queued while a checkpoint runs
  /// 删除 `[from, to)` 段，检查点进行中则排队
  pub(crate) fn unlink_segs(
    &self,
    log_no: LogNo,
    tablespace: u32,
    from: u64,
    to: u64,
  ) -> io::Result<()> {
    if from >= to {
      return Ok(());
    }
    let paths = (from..to).map(|seg| self.dir.join(seg_path(log_no, seg, tablespace)));
    let mut unlink = self.unlink.lock();
    if unlink.defer {
      unlink.queue.extend(paths);
      return Ok(());
    }
    drop(unlink);
    rm_segs(paths)
  }
}

pub(crate) fn rm_seg(path: &Path) -> io::Result<()> {
  match try_rm(path) {
    Ok(true) => log::trace!("unlink {path:?}"),
    Ok(false) => log::warn!("segment already gone {path:?}"),
    Err(e) => {
      log::error!("unlink {path:?}: {e}");
      return Err(e);
    }
  }
  Ok(())
}

/// Try every path, report the first failure
/// 尝试所有路径，返回首个错误
pub(crate) fn rm_segs(paths: impl IntoIterator<Item = PathBuf>) -> io::Result<()> {
  let mut first = Ok(());
  for path in paths {
    let r = rm_seg(&path);
    if first.is_ok() {
      first = r;
    }
  }
  first
}

pub(crate) fn insert_redo(log_no: LogNo, meta: &Meta) -> Redo {
  Redo::Insert {
    log_no,
    insert: meta.insert,
    prevlen: meta.prevlen,
    last_xact_start: meta.last_xact_start,
  }
}

fn info(log: &Log) -> LogInfo {
  let st = log.st.lock();
  LogInfo {
    log_no: log.no,
    persistence: log.persistence,
    full: st.full,
    meta: st.meta,
  }
}
