#![cfg_attr(docsrs, feature(doc_cfg))]

//! # undo_log - Undo log manager
//! 撤销日志管理器
//!
//! Hands out undo address space to transactions, grows and shrinks logs in
//! whole segment files, and persists per-log metadata at checkpoints.
//! Metadata changes of permanent logs are reported through [`RedoSink`] and
//! replayed with [`UndoLogs::redo`].
//! 为事务分配撤销地址空间，以整段文件增长与收缩日志，并在检查点持久化日志元数据。
//! 永久日志的元数据变更经 [`RedoSink`] 上报，并通过 [`UndoLogs::redo`] 重放。

mod alloc;
mod ckp;
mod conf;
mod discard;
pub mod error;
mod fs;
mod io;
mod lock;
mod logs;
mod meta;
pub mod path;
mod record;
pub mod redo;
mod replay;
mod session;
mod slot;
mod sync;

use std::{collections::BTreeMap, path::Path, sync::Arc};

pub use conf::Conf;
pub use error::{Error, Result};
pub use io::{PageIo, SegIo};
pub use logs::{LogInfo, UndoLogs};
pub use meta::Meta;
pub use redo::{MemRedo, NoRedo, Redo, RedoSink};
pub use session::Session;
pub use undo_ptr::{LogNo, Offset, Persistence, UndoRecPtr, Xid};
pub use undo_rec::UnpackedRecord;

use crate::{conf::Opt, lock::DirLock, path::LOCK_FILE, slot::Log};

/// Open the undo logs under `dir` from the checkpoint at `redo` (the latest
/// one when `None`)
/// 从 `redo` 处的检查点（`None` 时取最新）打开 `dir` 下的撤销日志
///
/// Returns the redo position to replay from; the manager stays in recovery
/// until [`UndoLogs::finish_recovery`].
/// 返回应开始重放的 redo 位置；在 [`UndoLogs::finish_recovery`] 之前处于恢复状态。
pub fn open(
  dir: &Path,
  conf: &[Conf],
  sink: Box<dyn RedoSink>,
  redo: Option<u64>,
) -> Result<(UndoLogs, u64)> {
  std::fs::create_dir_all(dir)?;
  let lock = DirLock::try_new(dir.join(LOCK_FILE))?;
  let opt = Opt::new(conf);
  let loaded = ckp::load::load(dir, redo)?;

  let logs: BTreeMap<LogNo, Arc<Log>> = loaded
    .entries
    .into_iter()
    .map(|e| {
      (
        e.log_no,
        Arc::new(Log::new(e.log_no, e.persistence, e.meta, e.full)),
      )
    })
    .collect();

  Ok((
    UndoLogs::new(
      dir.to_path_buf(),
      opt,
      sink,
      lock,
      loaded.next_log_no,
      logs,
    ),
    loaded.redo,
  ))
}

/// Redo positions of checkpoint files in `dir`, ascending
/// `dir` 中检查点文件的 redo 位置，升序
pub fn checkpoints(dir: &Path) -> Result<Vec<u64>> {
  ckp::load::list(dir)
}
