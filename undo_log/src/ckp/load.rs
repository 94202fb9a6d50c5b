//! Pick and parse the checkpoint to start from
//! 选择并解析启动所用检查点

use std::{fs, io, path::Path};

use undo_ptr::LogNo;

use super::disk::{self, Entry};
use crate::{
  Error, Result,
  path::{CKP_DIR, ckp_name, parse_ckp_name},
};

pub(crate) struct Loaded {
  /// Redo position replay starts from, 0 for a fresh directory
  /// 重放起始 redo 位置，新目录为 0
  pub redo: u64,
  pub next_log_no: LogNo,
  pub entries: Vec<Entry>,
}

impl Loaded {
  const FRESH: Self = Self {
    redo: 0,
    next_log_no: 1,
    entries: Vec::new(),
  };
}

/// Redo positions of every checkpoint file, ascending
/// 所有检查点文件的 redo 位置，升序
pub fn list(dir: &Path) -> Result<Vec<u64>> {
  let rd = match fs::read_dir(dir.join(CKP_DIR)) {
    Ok(rd) => rd,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(e.into()),
  };
  let mut li = Vec::new();
  for e in rd {
    if let Some(redo) = e?.file_name().to_str().and_then(parse_ckp_name) {
      li.push(redo);
    }
  }
  li.sort_unstable();
  Ok(li)
}

pub(crate) fn load(dir: &Path, redo: Option<u64>) -> Result<Loaded> {
  let redo = match redo {
    Some(redo) => {
      if !list(dir)?.contains(&redo) {
        if redo == 0 {
          return Ok(Loaded::FRESH);
        }
        return Err(Error::CkpMissing(redo));
      }
      redo
    }
    None => match list(dir)?.last() {
      Some(&redo) => redo,
      None => return Ok(Loaded::FRESH),
    },
  };
  let path = dir.join(CKP_DIR).join(ckp_name(redo));
  let bin = fs::read(&path)?;
  let (next_log_no, entries) = disk::decode(&bin).map_err(|reason| {
    log::error!("corrupt undo checkpoint {path:?}: {reason}");
    Error::CorruptCkp { path, reason }
  })?;
  log::info!("load undo checkpoint {redo:016X}: {} logs", entries.len());
  Ok(Loaded {
    redo,
    next_log_no,
    entries,
  })
}
