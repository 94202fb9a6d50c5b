/// Durability class of an undo log; each level has its own pool of logs
/// 撤销日志持久级别，每个级别有独立日志池
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Persistence {
  Permanent = b'p',
  Unlogged = b'u',
  Temp = b't',
}

impl Persistence {
  pub const ALL: [Self; 3] = [Self::Permanent, Self::Unlogged, Self::Temp];

  /// Dense index for per-level arrays
  /// 每级数组的下标
  #[inline]
  pub const fn idx(self) -> usize {
    match self {
      Self::Permanent => 0,
      Self::Unlogged => 1,
      Self::Temp => 2,
    }
  }

  #[inline]
  pub const fn as_u8(self) -> u8 {
    self as u8
  }

  #[inline]
  pub const fn from_u8(v: u8) -> Option<Self> {
    match v {
      b'p' => Some(Self::Permanent),
      b'u' => Some(Self::Unlogged),
      b't' => Some(Self::Temp),
      _ => None,
    }
  }

  /// Changes are redo-logged
  /// 变更写入 redo
  #[inline]
  pub const fn is_logged(self) -> bool {
    matches!(self, Self::Permanent)
  }
}
