use undo_ptr::{DEFAULT_TABLESPACE, MAX_LOG_SIZE};

/// Runtime configuration
/// 运行时配置
#[derive(Clone, Copy, Debug)]
pub enum Conf {
  /// Per-log size ceiling, lower it to exercise full logs
  /// 单日志大小上限，可调低以测试日志写满
  MaxLogSize(u64),
  /// Logs that may exist at once (active + full, not yet retired)
  /// 同时存在的日志数（活跃 + 已满未退役）
  MaxSlots(usize),
  /// Tablespace for new logs
  /// 新日志所在表空间
  Tablespace(u32),
}

const DEFAULT_MAX_SLOTS: usize = 1024;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Opt {
  pub max_log_size: u64,
  pub max_slots: usize,
  pub tablespace: u32,
}

impl Opt {
  pub fn new(conf: &[Conf]) -> Self {
    let mut opt = Self {
      max_log_size: MAX_LOG_SIZE,
      max_slots: DEFAULT_MAX_SLOTS,
      tablespace: DEFAULT_TABLESPACE,
    };
    for c in conf {
      match *c {
        Conf::MaxLogSize(n) => opt.max_log_size = n.clamp(1, MAX_LOG_SIZE),
        Conf::MaxSlots(n) => opt.max_slots = n.max(1),
        Conf::Tablespace(spc) => opt.tablespace = spc,
      }
    }
    opt
  }
}
