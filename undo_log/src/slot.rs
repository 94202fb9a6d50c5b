//! One undo log slot
//! 单个撤销日志槽

use parking_lot::Mutex;
use undo_ptr::{LogNo, Offset, Persistence, Xid, seg_of};

use crate::Meta;

pub(crate) struct Log {
  pub no: LogNo,
  pub persistence: Persistence,
  pub st: Mutex<State>,
}

#[derive(Debug)]
pub(crate) struct State {
  pub meta: Meta,
  pub full: bool,
  /// Unfinished transaction currently writing here
  /// 正在写入的未完成事务
  pub owner: Option<Xid>,
  /// Held by a session / 被会话持有
  pub attached: bool,
  /// Bytes below are fsynced / 此偏移以下已 fsync
  pub synced: Offset,
  pub retired: bool,
}

impl Log {
  pub fn new(no: LogNo, persistence: Persistence, meta: Meta, full: bool) -> Self {
    Self {
      no,
      persistence,
      st: Mutex::new(State {
        synced: meta.insert,
        meta,
        full,
        owner: None,
        attached: false,
        retired: false,
      }),
    }
  }
}

impl State {
  /// Full and nothing left to keep / 已满且无需保留的数据
  #[inline]
  pub fn retirable(&self) -> bool {
    self.full && self.meta.discard == self.meta.insert
  }

  /// Claim retirement once / 仅认领一次退役
  #[inline]
  pub fn take_retire(&mut self) -> bool {
    if self.retirable() && !self.retired {
      self.retired = true;
      return true;
    }
    false
  }

  /// Segments written since the last sync, inclusive
  /// 上次同步后写过的段（闭区间）
  pub fn dirty(&self) -> Option<(u64, u64)> {
    let low = self.synced.max(self.meta.discard);
    if self.meta.insert <= low {
      return None;
    }
    Some((seg_of(low), seg_of(self.meta.insert - 1)))
  }

  /// Apply one reservation of `size` raw bytes at the current head
  /// 在当前头部应用一次 `size` 原始字节的预留
  ///
  /// Returns true when `xid` took over the log.
  pub fn reserve(&mut self, xid: Xid, addr: Offset, size: u64) -> bool {
    let switched = self.meta.xid != xid;
    if switched {
      self.meta.xid = xid;
      self.meta.last_xact_start = addr;
      self.meta.is_first_rec = true;
    } else {
      self.meta.is_first_rec = false;
    }
    self.meta.insert += size;
    switched
  }
}
