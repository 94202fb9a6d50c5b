//! Checkpoint and recovery tests / 检查点与恢复测试

use std::{fs, path::Path};

use aok::{OK, Void};
use log::info;
use undo_log::{
  Error, LogInfo, MemRedo, Persistence, UndoLogs, UndoRecPtr, checkpoints, open,
  path::{CKP_DIR, ckp_name, ckp_precedes, parse_ckp_name, parse_seg_name, seg_path},
};
use undo_ptr::{DEFAULT_TABLESPACE, SEG_SIZE};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

const P: Persistence = Persistence::Permanent;

fn fresh(dir: &Path, mem: &MemRedo, conf: &[undo_log::Conf]) -> undo_log::Result<UndoLogs> {
  let (logs, _) = open(dir, conf, Box::new(mem.clone()), None)?;
  logs.finish_recovery()?;
  Ok(logs)
}

fn replay(logs: &UndoLogs, mem: &MemRedo, redo: u64) -> Void {
  for (pos, rec) in mem.read_from(redo)? {
    info!("replay {pos} {rec:?}");
    logs.redo(&rec)?;
  }
  OK
}

fn logged(li: Vec<LogInfo>) -> Vec<LogInfo> {
  li.into_iter().filter(|i| i.persistence == P).collect()
}

#[test]
fn test_fresh_dir() -> Void {
  let dir = tempfile::tempdir()?;
  let (logs, redo) = open(dir.path(), &[], Box::new(MemRedo::default()), None)?;
  assert_eq!(redo, 0);
  assert!(logs.is_empty());
  assert!(checkpoints(dir.path())?.is_empty());
  OK
}

#[test]
fn test_checkpoint_roundtrip() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();

  let (redo, before) = {
    let logs = fresh(dir.path(), &mem, &[])?;
    let mut s = logs.session();
    s.allocate(7, 100, P)?;
    s.allocate(7, 30, P)?;
    s.finish(7);
    s.allocate(8, 50, P)?;
    logs.set_prevlen(1, 50)?;
    s.allocate(9, 70, Persistence::Unlogged)?;
    s.allocate(9, 10, Persistence::Temp)?;
    drop(s);
    logs.discard(UndoRecPtr::new(1, 20), 0)?;

    let redo = mem.position();
    logs.checkpoint(redo, 0)?;
    (redo, logs.snapshot())
  };

  let meta = before[0].meta;
  assert_eq!(meta.xid, 8);
  assert!(meta.is_first_rec);
  assert_eq!(meta.last_xact_start, 130);
  assert_eq!(meta.prevlen, 50);
  assert_eq!(meta.discard, 20);

  let (logs, got) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(got, redo);
  assert_eq!(checkpoints(dir.path())?, [redo]);
  let expect: Vec<LogInfo> = before
    .iter()
    .filter(|i| i.persistence != Persistence::Temp)
    .copied()
    .collect();
  assert_eq!(logs.snapshot(), expect);

  logs.finish_recovery()?;
  let unlogged = logs.info(2).unwrap();
  assert_eq!(unlogged.persistence, Persistence::Unlogged);
  assert_eq!(unlogged.meta.discard, unlogged.meta.insert);
  assert!(!dir.path().join(seg_path(3, 0, DEFAULT_TABLESPACE)).exists());
  assert!(dir.path().join(seg_path(1, 0, DEFAULT_TABLESPACE)).exists());

  // log numbers are never reused
  let p = logs.session().allocate(10, 10, Persistence::Temp)?;
  assert_eq!(p.log_no(), 4);
  OK
}

#[test]
fn test_replay_after_checkpoint() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();

  let (redo, expect) = {
    let logs = fresh(dir.path(), &mem, &[])?;
    let mut s = logs.session();
    let mut s2 = logs.session();
    s.allocate(1, 100, P)?;
    let redo = mem.position();
    logs.checkpoint(redo, 0)?;

    s.allocate(1, 200, P)?;
    s.finish(1);
    s.allocate(2, 50, P)?;
    logs.set_prevlen(1, 50)?;
    logs.discard(UndoRecPtr::new(1, 100), 1)?;
    s2.allocate(3, SEG_SIZE - 10, P)?;
    s2.allocate(3, 20, P)?;
    (redo, logs.snapshot())
  };
  assert_eq!(expect.len(), 2);
  assert_eq!(expect[1].meta.end, 2 * SEG_SIZE);

  let (logs, got) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(got, redo);
  replay(&logs, &mem, redo)?;
  assert_eq!(logs.snapshot(), expect);

  // a second pass changes nothing
  replay(&logs, &mem, redo)?;
  assert_eq!(logs.snapshot(), expect);

  let before = mem.len();
  logs.finish_recovery()?;
  assert_eq!(mem.len(), before);
  OK
}

#[test]
fn test_replay_owner_changed_before_snapshot() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();

  let (redo, expect) = {
    let logs = fresh(dir.path(), &mem, &[])?;
    let mut s = logs.session();
    s.allocate(1, 100, P)?;
    let redo = mem.position();
    s.allocate(1, 50, P)?;
    s.finish(1);
    drop(s);

    // xid 2 takes log 1 over before the checkpoint reads it
    let mut s = logs.session();
    assert_eq!(s.allocate(2, 10, P)?.log_no(), 1);
    logs.checkpoint(redo, 0)?;
    (redo, logs.snapshot())
  };
  assert_eq!(expect[0].meta.xid, 2);
  assert_eq!(expect[0].meta.insert, 160);

  let (logs, got) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(got, redo);
  replay(&logs, &mem, redo)?;
  assert_eq!(logs.snapshot(), expect);
  assert_eq!(logs.log_no_from_xid(2, P), Some(1));
  assert_eq!(logs.log_no_from_xid(1, P), None);
  logs.finish_recovery()?;
  OK
}

#[test]
fn test_replay_without_checkpoint() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();

  let expect = {
    let logs = fresh(dir.path(), &mem, &[])?;
    let mut s = logs.session();
    let p = s.allocate(4, 500, P)?;
    s.rewind(p.with_offset(300), 9)?;
    s.allocate(4, 20, P)?;
    s.allocate(5, 10, Persistence::Unlogged)?;
    logged(logs.snapshot())
  };
  assert_eq!(expect[0].meta.insert, 320);

  let (logs, redo) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(redo, 0);
  replay(&logs, &mem, redo)?;
  assert_eq!(logs.snapshot(), expect);
  logs.finish_recovery()?;
  // the unlogged log was never checkpointed
  assert!(logs.info(2).is_none());
  OK
}

#[test]
fn test_replay_retires_full_log() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();
  let conf = [undo_log::Conf::MaxLogSize(SEG_SIZE)];

  let (redo, expect) = {
    let logs = fresh(dir.path(), &mem, &conf)?;
    let mut s = logs.session();
    s.allocate(1, SEG_SIZE - 100, P)?;
    let redo = mem.position();
    logs.checkpoint(redo, 0)?;

    let b = s.allocate(1, 200, P)?;
    assert_eq!(b.log_no(), 2);
    s.finish(1);
    logs.discard(UndoRecPtr::new(1, SEG_SIZE - 100), 1)?;
    assert!(logs.info(1).is_none());
    (redo, logs.snapshot())
  };

  let (logs, _) = open(dir.path(), &conf, Box::new(mem.clone()), Some(redo))?;
  assert!(logs.info(1).is_some());
  replay(&logs, &mem, redo)?;
  assert!(logs.info(1).is_none());
  assert_eq!(logs.snapshot(), expect);
  OK
}

#[test]
fn test_allocate_in_recovery() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();
  {
    let logs = fresh(dir.path(), &mem, &[])?;
    logs.session().allocate(9, 100, P)?;
    logs.checkpoint(mem.position(), 0)?;
  }

  let (logs, _) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(logs.log_no_from_xid(9, P), Some(1));
  let p = logs.allocate_in_recovery(9, 50, P)?;
  assert_eq!(p, UndoRecPtr::new(1, 100));
  let meta = logs.meta(1).unwrap();
  assert_eq!(meta.insert, 150);
  assert!(!meta.is_first_rec);
  assert!(matches!(
    logs.allocate_in_recovery(10, 50, P),
    Err(Error::NoLogForXid(10))
  ));
  OK
}

#[test]
fn test_corrupt_checkpoint() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();
  {
    let logs = fresh(dir.path(), &mem, &[])?;
    logs.session().allocate(1, 100, P)?;
    logs.checkpoint(42, 0)?;
  }
  let path = dir.path().join(CKP_DIR).join(ckp_name(42));
  let mut bin = fs::read(&path)?;
  bin[30] ^= 0xFF;
  fs::write(&path, &bin)?;
  assert!(matches!(
    open(dir.path(), &[], Box::new(mem.clone()), None),
    Err(Error::CorruptCkp { .. })
  ));

  fs::write(&path, &bin[..10])?;
  assert!(matches!(
    open(dir.path(), &[], Box::new(mem.clone()), Some(42)),
    Err(Error::CorruptCkp { .. })
  ));
  OK
}

#[test]
fn test_checkpoint_selection() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();
  {
    let logs = fresh(dir.path(), &mem, &[])?;
    logs.checkpoint(10, 0)?;
    logs.checkpoint(20, 0)?;
    assert_eq!(checkpoints(dir.path())?, [10, 20]);
    logs.checkpoint(0x300, 20)?;
    assert_eq!(checkpoints(dir.path())?, [20, 0x300]);
  }

  let (logs, redo) = open(dir.path(), &[], Box::new(mem.clone()), None)?;
  assert_eq!(redo, 0x300);
  drop(logs);
  let (_, redo) = open(dir.path(), &[], Box::new(mem.clone()), Some(20))?;
  assert_eq!(redo, 20);
  assert!(matches!(
    open(dir.path(), &[], Box::new(mem.clone()), Some(77)),
    Err(Error::CkpMissing(77))
  ));
  OK
}

#[test]
fn test_orphan_sweep() -> Void {
  let dir = tempfile::tempdir()?;
  let mem = MemRedo::default();
  {
    let logs = fresh(dir.path(), &mem, &[])?;
    logs.session().allocate(1, 10, P)?;
  }
  let stray = dir.path().join(seg_path(99, 3, DEFAULT_TABLESPACE));
  fs::write(&stray, b"")?;

  // no checkpoint, no replay: both files are orphans
  let (logs, _) = open(dir.path(), &[], Box::new(MemRedo::default()), None)?;
  logs.finish_recovery()?;
  assert!(!stray.exists());
  assert!(!dir.path().join(seg_path(1, 0, DEFAULT_TABLESPACE)).exists());
  assert_eq!(logs.session().allocate(2, 10, P)?.log_no(), 100);
  OK
}

#[test]
fn test_dir_locked() -> Void {
  let dir = tempfile::tempdir()?;
  let _held = open(dir.path(), &[], Box::new(MemRedo::default()), None)?;
  assert!(matches!(
    open(dir.path(), &[], Box::new(MemRedo::default()), None),
    Err(Error::Locked)
  ));
  OK
}

#[test]
fn test_file_names() -> Void {
  assert_eq!(ckp_name(0x1A), "000000000000001A");
  assert_eq!(parse_ckp_name("000000000000001A"), Some(0x1A));
  assert_eq!(parse_ckp_name("000000000000001a"), None);
  assert_eq!(parse_ckp_name("1A"), None);
  assert!(ckp_precedes(&ckp_name(0xFF), &ckp_name(0x100)));
  assert!(!ckp_precedes(&ckp_name(7), &ckp_name(7)));

  let path = seg_path(0xA, 0xB, 1663);
  assert_eq!(path, Path::new("undo/1663/00000A.000000000B"));
  let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
  assert_eq!(parse_seg_name(name), Some((0xA, 0xB)));
  assert_eq!(parse_seg_name("00000A.B"), None);
  OK
}
