//! Checkpoint write
//! 检查点写入

mod disk;
pub(crate) mod load;

use std::{fs, io, path::PathBuf};

use undo_ptr::Persistence;

use crate::{
  Result, UndoLogs,
  fs::{atomic_write, sync_dir, try_rm},
  logs::rm_segs,
  path::{CKP_DIR, ckp_name, ckp_precedes, parse_ckp_name},
};

/// Segment unlinks are queued while alive
/// 存活期间段删除进入队列
struct DeferUnlink<'a>(&'a UndoLogs);

impl<'a> DeferUnlink<'a> {
  fn new(logs: &'a UndoLogs) -> Self {
    logs.unlink.lock().defer = true;
    Self(logs)
  }

  fn take(&self) -> Vec<PathBuf> {
    let mut unlink = self.0.unlink.lock();
    unlink.defer = false;
    std::mem::take(&mut unlink.queue)
  }

  /// Stop deferring and unlink the queue, first error returned
  /// 停止延迟并删除队列，返回首个错误
  fn finish(self) -> io::Result<()> {
    rm_segs(self.take())
  }
}

impl Drop for DeferUnlink<'_> {
  fn drop(&mut self) {
    let queue = self.take();
    if !queue.is_empty() {
      let _ = rm_segs(queue);
    }
  }
}

impl UndoLogs {
  /// Persist metadata of every permanent and unlogged log as of `redo`,
  /// then drop checkpoint files older than `prior_redo`
  /// 持久化截至 `redo` 的永久与非日志化日志元数据，再删除早于 `prior_redo` 的检查点文件
  pub fn checkpoint(&self, redo: u64, prior_redo: u64) -> Result<()> {
    let _serial = self.ckp.lock();
    let defer = DeferUnlink::new(self);
    self.sync()?;

    let (next_log_no, rows) = {
      let logs = self.logs.read();
      let next_log_no = self.next_log_no.load(std::sync::atomic::Ordering::Relaxed);
      let rows: Vec<disk::Row> = logs
        .values()
        .filter(|log| log.persistence != Persistence::Temp)
        .map(|log| {
          let st = log.st.lock();
          disk::Row::new(log.no, log.persistence, st.full, &st.meta)
        })
        .collect();
      (next_log_no, rows)
    };

    let dir = self.dir.join(CKP_DIR);
    fs::create_dir_all(&dir)?;
    let name = ckp_name(redo);
    atomic_write(&dir.join(&name), &disk::encode(next_log_no, &rows))?;
    sync_dir(&dir)?;

    let prior = ckp_name(prior_redo);
    for e in fs::read_dir(&dir)? {
      let e = e?;
      let Some(old) = e.file_name().to_str().map(str::to_owned) else {
        continue;
      };
      if parse_ckp_name(&old).is_some() && ckp_precedes(&old, &prior) && old != name {
        try_rm(&e.path())?;
      }
    }
    defer.finish()?;
    log::info!("undo checkpoint {name}: {} logs", rows.len());
    Ok(())
  }
}
