//! Layout constants
//! 布局常量
//!
//! `BLCKSZ` and `SEG_PAGES` come from build.rs (`UNDO_BLCKSZ`, `UNDO_SEG_PAGES`).
//! `BLCKSZ` 与 `SEG_PAGES` 由 build.rs 生成（`UNDO_BLCKSZ`、`UNDO_SEG_PAGES`）。

include!(concat!(env!("OUT_DIR"), "/layout.rs"));

/// Reserved bytes at the head of every page
/// 每页头部保留字节数
pub const PAGE_HEADER_SIZE: usize = 24;

/// Record bytes that fit in one page
/// 单页可存放的记录字节数
pub const USABLE_BYTES_PER_PAGE: usize = BLCKSZ - PAGE_HEADER_SIZE;

/// Segment file size in bytes
/// 段文件字节数
pub const SEG_SIZE: u64 = (BLCKSZ * SEG_PAGES) as u64;

/// Width of log number (16.7m logs)
/// 日志号位宽
pub const LOG_NO_BITS: u32 = 24;

/// Width of offset (1TB per log)
/// 偏移位宽
pub const OFFSET_BITS: u32 = 64 - LOG_NO_BITS;

/// Address space of one log
/// 单个日志的地址空间
pub const MAX_LOG_SIZE: u64 = 1 << OFFSET_BITS;

pub const OFFSET_MASK: u64 = MAX_LOG_SIZE - 1;

/// Highest log number handed out; all-ones is reserved for the pending sentinel
/// 可分配的最大日志号；全 1 保留给待回填哨兵
pub const MAX_LOG_NO: u32 = (1 << LOG_NO_BITS) - 2;

/// Tablespace whose relation details are omitted from records
/// 记录中省略关系细节的默认表空间
pub const DEFAULT_TABLESPACE: u32 = 1663;

/// Main fork / 主分支
pub const MAIN_FORK: u8 = 0;

/// Checkpoint file name length (hex redo position)
/// 检查点文件名长度（十六进制 redo 位置）
pub const CKP_NAME_LEN: usize = 16;

const _: () = assert!(SEG_SIZE % BLCKSZ as u64 == 0);
const _: () = assert!(USABLE_BYTES_PER_PAGE > 0);
