#![cfg_attr(docsrs, feature(doc_cfg))]

//! # undo_ptr - Undo log addressing
//! 撤销日志寻址
//!
//! An undo address packs a log number and a byte offset into one `u64`:
//! 撤销地址将日志号与字节偏移打包进一个 `u64`：
//!
//! | bits   | field  |
//! |--------|--------|
//! | 63..40 | log_no |
//! | 39..0  | offset |
//!
//! Offsets count raw bytes, page headers included. Record data skips the
//! first [`PAGE_HEADER_SIZE`] bytes of every page, see [`usable`].
//! 偏移计算原始字节（含页头），记录数据跳过每页页头，见 [`usable`]。

pub mod consts;
mod persistence;
mod ptr;
pub mod usable;

pub use consts::*;
pub use persistence::Persistence;
pub use ptr::{UndoRecPtr, offset_in_page, page_of, seg_ceil, seg_of, seg_start};
pub use usable::{plus_usable, skip_header, usable_span};

/// Undo log number / 撤销日志号
pub type LogNo = u32;

/// Byte offset inside one undo log / 撤销日志内字节偏移
pub type Offset = u64;

/// Transaction id / 事务 ID
pub type Xid = u32;

/// No transaction / 无事务
pub const INVALID_XID: Xid = 0;
