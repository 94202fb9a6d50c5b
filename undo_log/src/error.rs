//! Error types for undo log operations
//! 撤销日志操作的错误类型

use std::path::PathBuf;

use thiserror::Error;
use undo_ptr::{LogNo, Offset, UndoRecPtr, Xid};

#[derive(Debug, Error)]
pub enum Error {
  #[error("no free undo log slot / 无空闲撤销日志槽")]
  Exhausted,

  #[error("undo log numbers exhausted / 撤销日志号耗尽")]
  LogNoExhausted,

  #[error("{0} bytes never fit in one undo log / 单个撤销日志放不下")]
  TooLarge(u64),

  #[error("record of {0} bytes exceeds 65535 / 记录超长")]
  RecordTooLarge(usize),

  #[error("undo log {0} is full / 撤销日志已满")]
  LogFull(LogNo),

  #[error("unknown undo log {0} / 未知撤销日志")]
  UnknownLog(LogNo),

  #[error("no undo log attached to xid {0} / 事务未关联撤销日志")]
  NoLogForXid(Xid),

  #[error("discard {discard:#x} past insert {insert:#x} in log {log_no}")]
  DiscardPastInsert {
    log_no: LogNo,
    discard: Offset,
    insert: Offset,
  },

  #[error("log {log_no} still owned by in-progress xid {xid} / 日志仍属未完成事务")]
  DiscardInProgress { log_no: LogNo, xid: Xid },

  #[error("log {0} not attached to this session / 日志不属于本会话")]
  NotOwner(LogNo),

  #[error("rewind to {0} outside [discard, insert] / 回退位置越界")]
  BadRewind(UndoRecPtr),

  #[error("corrupt undo record at {ptr}: {reason}")]
  CorruptRecord { ptr: UndoRecPtr, reason: Box<str> },

  #[error("corrupt checkpoint {path:?}: {reason}")]
  CorruptCkp { path: PathBuf, reason: &'static str },

  #[error("checkpoint {0:016X} not found / 检查点不存在")]
  CkpMissing(u64),

  #[error("corrupt redo: {0}")]
  CorruptRedo(Box<str>),

  #[error("in recovery / 恢复中")]
  InRecovery,

  #[error("not in recovery / 不在恢复中")]
  NotInRecovery,

  #[error("undo directory locked / 撤销目录已被锁定")]
  Locked,

  #[error("record: {0}")]
  Record(#[from] undo_rec::Error),

  #[error("redo decode: {0}")]
  Decode(#[from] bitcode::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  #[inline]
  pub(crate) fn corrupt_redo(msg: impl Into<Box<str>>) -> Self {
    let msg = msg.into();
    log::error!("corrupt redo: {msg}");
    Self::CorruptRedo(msg)
  }
}

pub type Result<T> = std::result::Result<T, Error>;
