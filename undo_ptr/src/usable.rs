//! Usable-byte arithmetic: record data never lands inside a page header
//! 可用字节运算：记录数据不落在页头内

use crate::{BLCKSZ, Offset, PAGE_HEADER_SIZE, USABLE_BYTES_PER_PAGE, offset_in_page};

/// First usable byte at or after `offset`
/// `offset` 处或之后的第一个可用字节
#[inline]
pub const fn skip_header(offset: Offset) -> Offset {
  let in_page = offset_in_page(offset);
  if in_page < PAGE_HEADER_SIZE {
    offset - in_page as u64 + PAGE_HEADER_SIZE as u64
  } else {
    offset
  }
}

/// Offset one past `n` record bytes written from `offset`
/// 从 `offset` 写入 `n` 字节记录后的结束偏移
///
/// Ending exactly on a page boundary returns the boundary, not the next header end.
/// 恰好结束于页边界时返回边界本身，而非下一页页头之后。
pub const fn plus_usable(offset: Offset, n: u64) -> Offset {
  let start = skip_header(offset);
  if n == 0 {
    return start;
  }
  let in_page = offset_in_page(start);
  let page_start = start - in_page as u64;
  let used = (in_page - PAGE_HEADER_SIZE) as u64 + n;
  let usable = USABLE_BYTES_PER_PAGE as u64;
  let pages = used / usable;
  let rem = used % usable;
  if rem == 0 {
    page_start + pages * BLCKSZ as u64
  } else {
    page_start + pages * BLCKSZ as u64 + PAGE_HEADER_SIZE as u64 + rem
  }
}

/// (record start, raw bytes from `offset` to record end)
/// （记录起点，从 `offset` 到记录结尾的原始字节数）
#[inline]
pub const fn usable_span(offset: Offset, n: u64) -> (Offset, u64) {
  let start = skip_header(offset);
  (start, plus_usable(offset, n) - offset)
}
