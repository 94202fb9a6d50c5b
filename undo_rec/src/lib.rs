#![cfg_attr(docsrs, feature(doc_cfg))]

//! # undo_rec - Undo record codec
//! 撤销记录编解码
//!
//! Disk format (little-endian, packed, no alignment):
//! 磁盘格式（小端、紧凑、无对齐）：
//!
//! | part      | when       | bytes |
//! |-----------|------------|-------|
//! | header    | always     | 20    |
//! | relation  | info & 0x01| 5     |
//! | block     | info & 0x02| 14    |
//! | payload   | info & 0x04| 4     |
//! | xact      | info & 0x08| 12    |
//! | payload + tuple bytes  || n    |
//!
//! A record may start anywhere after a page header and continue on the
//! following pages right after their headers.
//! 记录可从页头之后任意位置开始，并在后续页页头之后继续。

pub mod disk;
pub mod error;
mod kind;
mod pack;
mod record;
mod unpack;

pub use error::{Error, Result};
pub use kind::Kind;
pub use pack::Packer;
pub use record::{Block, Rel, UnpackedRecord, Xact};
pub use unpack::Unpacker;
