//! Cross-process lock on the data directory
//! 数据目录跨进程锁

use std::{fs, path::PathBuf};

use fd_lock::RwLock;

use crate::{Error, Result};

type Guard = fd_lock::RwLockWriteGuard<'static, fs::File>;

/// Exclusive lock held for the lifetime of [`crate::UndoLogs`]
/// [`crate::UndoLogs`] 存活期间持有的排他锁
pub(crate) struct DirLock {
  // SAFETY: _guard must be dropped before _lock. Rust drops fields in declaration order.
  // 安全：_guard 必须在 _lock 之前释放。Rust 按字段声明顺序 Drop。
  _guard: Guard,
  _lock: Box<RwLock<fs::File>>,
  path: PathBuf,
}

impl DirLock {
  pub fn try_new(path: PathBuf) -> Result<Self> {
    let file = fs::OpenOptions::new()
      .write(true)
      .create(true)
      .truncate(true)
      .open(&path)?;
    let lock_ptr: *mut RwLock<fs::File> = Box::into_raw(Box::new(RwLock::new(file)));
    // SAFETY: Box provides stable address, guard lives shorter than lock
    // 安全：Box 提供稳定地址，guard 生命周期短于 lock
    let guard = match unsafe { (*lock_ptr).try_write() } {
      Ok(guard) => guard,
      Err(_) => {
        drop(unsafe { Box::from_raw(lock_ptr) });
        return Err(Error::Locked);
      }
    };
    let guard: Guard = unsafe { std::mem::transmute(guard) };
    let _lock = unsafe { Box::from_raw(lock_ptr) };
    Ok(Self {
      _guard: guard,
      _lock,
      path,
    })
  }
}

impl Drop for DirLock {
  fn drop(&mut self) {
    log::trace!("unlock {:?}", self.path);
  }
}
