use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown record type {0} / 未知记录类型")]
  UnknownKind(u8),

  #[error("unknown info bits {0:#04x} / 未知标志位")]
  UnknownInfo(u8),

  #[error("payload flag set without payload / 有负载标志但无负载")]
  EmptyPayload,

  #[error("{0} length {1} exceeds 65535 / 长度超限")]
  TooLong(&'static str, usize),

  #[error("start byte {0} outside page of {1} / 起始字节超出页")]
  StartOutOfPage(usize, usize),
}

pub type Result<T> = std::result::Result<T, Error>;
