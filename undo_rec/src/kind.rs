use crate::Error;

/// Undo record type / 撤销记录类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
  #[default]
  Insert = 0,
  MultiInsert = 1,
  Delete = 2,
  InplaceUpdate = 3,
  Update = 4,
  XidLockOnly = 5,
  InvalidXactSlot = 6,
}

impl TryFrom<u8> for Kind {
  type Error = Error;

  fn try_from(v: u8) -> Result<Self, Error> {
    Ok(match v {
      0 => Self::Insert,
      1 => Self::MultiInsert,
      2 => Self::Delete,
      3 => Self::InplaceUpdate,
      4 => Self::Update,
      5 => Self::XidLockOnly,
      6 => Self::InvalidXactSlot,
      _ => return Err(Error::UnknownKind(v)),
    })
  }
}
