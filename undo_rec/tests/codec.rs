//! Record codec tests / 记录编解码测试

use aok::{OK, Void};
use log::info;
use proptest::prelude::*;
use undo_ptr::{BLCKSZ, PAGE_HEADER_SIZE, USABLE_BYTES_PER_PAGE, UndoRecPtr};
use undo_rec::{
  Block, Error, Kind, Rel, UnpackedRecord, Unpacker, Xact,
  disk::{HEADER_SIZE, INFO_BLOCK, INFO_PAYLOAD, INFO_REL, INFO_XACT, fixed_len},
};

#[static_init::constructor(0)]
extern "C" fn _log_init() {
  log_init::init();
}

const FILL: u8 = 0xEE;

/// Pack into fresh pages, first page starts at `start`
/// 打包到新页，首页从 `start` 开始
fn pack(rec: &UnpackedRecord, start: usize) -> Vec<Vec<u8>> {
  let packer = rec.packer().unwrap();
  let mut pages = Vec::new();
  let mut written = 0;
  let mut at = start;
  loop {
    let mut page = vec![FILL; BLCKSZ];
    let done = packer.insert(&mut page, at, &mut written);
    pages.push(page);
    if done {
      break;
    }
    at = PAGE_HEADER_SIZE;
  }
  assert_eq!(written, rec.expected_size());
  pages
}

fn unpack(pages: &[Vec<u8>], start: usize) -> UnpackedRecord {
  let mut u = Unpacker::new();
  let mut decoded = 0;
  let mut at = start;
  for (i, page) in pages.iter().enumerate() {
    if u.unpack(page, at, &mut decoded).unwrap() {
      assert_eq!(i + 1, pages.len(), "finished before last page");
      assert_eq!(Some(decoded), u.size());
      return u.into_record();
    }
    at = PAGE_HEADER_SIZE;
  }
  panic!("record not complete after {} pages", pages.len());
}

fn full() -> UnpackedRecord {
  UnpackedRecord {
    kind: Kind::Update,
    prevlen: 77,
    relfilenode: 16384,
    prevxid: 700,
    xid: 701,
    cid: 3,
    rel: Rel { tsid: 1700, fork: 1 },
    block: Some(Block {
      blkprev: UndoRecPtr::new(2, 4096),
      block: 42,
      offset: 7,
    }),
    xact: Some(Xact {
      epoch: 1,
      next: UndoRecPtr::PENDING,
    }),
    payload: b"payload".to_vec(),
    tuple: b"tuple bytes".to_vec(),
    buffer: None,
  }
}

#[test]
fn test_info_derived_from_fields() -> Void {
  let mut rec = UnpackedRecord::default();
  assert_eq!(rec.info(), 0);
  assert_eq!(rec.expected_size(), HEADER_SIZE);

  // Default tablespace and fork are omitted / 默认表空间与分支被省略
  rec.rel = Rel::default();
  assert_eq!(rec.info() & INFO_REL, 0);
  rec.rel.fork = 2;
  assert_eq!(rec.info() & INFO_REL, INFO_REL);

  rec.block = Some(Block::default());
  rec.xact = Some(Xact::default());
  rec.tuple = vec![1];
  assert_eq!(rec.info(), INFO_REL | INFO_BLOCK | INFO_PAYLOAD | INFO_XACT);
  assert_eq!(rec.expected_size(), fixed_len(rec.info()) + 1);
  assert_eq!(rec.packer()?.info(), rec.info());
  OK
}

#[test]
fn test_wire_layout() -> Void {
  let rec = full();
  let pages = pack(&rec, PAGE_HEADER_SIZE);
  assert_eq!(pages.len(), 1);
  let b = &pages[0][PAGE_HEADER_SIZE..];

  assert_eq!(b[0], Kind::Update as u8);
  assert_eq!(b[1], 0x0F);
  assert_eq!(&b[2..4], &77u16.to_le_bytes());
  assert_eq!(&b[4..8], &16384u32.to_le_bytes());
  assert_eq!(&b[8..12], &700u32.to_le_bytes());
  assert_eq!(&b[12..16], &701u32.to_le_bytes());
  assert_eq!(&b[16..20], &3u32.to_le_bytes());
  // relation / 关系
  assert_eq!(&b[20..24], &1700u32.to_le_bytes());
  assert_eq!(b[24], 1);
  // block / 块
  assert_eq!(&b[25..33], &UndoRecPtr::new(2, 4096).as_u64().to_le_bytes());
  assert_eq!(&b[33..37], &42u32.to_le_bytes());
  assert_eq!(&b[37..39], &7u16.to_le_bytes());
  // payload lengths / 负载长度
  assert_eq!(&b[39..41], &7u16.to_le_bytes());
  assert_eq!(&b[41..43], &11u16.to_le_bytes());
  // transaction / 事务
  assert_eq!(&b[43..47], &1u32.to_le_bytes());
  assert_eq!(&b[47..55], &u64::MAX.to_le_bytes());
  assert_eq!(&b[55..62], b"payload");
  assert_eq!(&b[62..73], b"tuple bytes");
  // Nothing past the record / 记录之后未被写入
  assert!(b[73..].iter().all(|&x| x == FILL));
  OK
}

#[test]
fn test_roundtrip_single_page() -> Void {
  let rec = full();
  let pages = pack(&rec, 100);
  assert_eq!(unpack(&pages, 100), rec);
  OK
}

#[test]
fn test_zero_length_payload_and_tuple() -> Void {
  let rec = UnpackedRecord {
    kind: Kind::XidLockOnly,
    xid: 9,
    ..Default::default()
  };
  assert_eq!(rec.info() & INFO_PAYLOAD, 0);
  let pages = pack(&rec, PAGE_HEADER_SIZE);
  let body = &pages[0][PAGE_HEADER_SIZE..];
  assert!(body[HEADER_SIZE..].iter().all(|&x| x == FILL));
  assert_eq!(unpack(&pages, PAGE_HEADER_SIZE), rec);

  // Tuple only: payload length field is still written as zero
  // 仅元组：负载长度字段仍写为 0
  let rec = UnpackedRecord {
    tuple: vec![5; 3],
    ..Default::default()
  };
  assert_eq!(rec.expected_size(), HEADER_SIZE + 4 + 3);
  let pages = pack(&rec, PAGE_HEADER_SIZE);
  assert_eq!(unpack(&pages, PAGE_HEADER_SIZE), rec);
  OK
}

#[test]
fn test_three_page_record() -> Void {
  let u = USABLE_BYTES_PER_PAGE;
  let mut rec = full();
  let fixed = fixed_len(rec.info());
  let total = 3 * u;
  let tuple_len = 1000;
  rec.payload = (0..total - fixed - tuple_len).map(|i| i as u8).collect();
  rec.tuple = (0..tuple_len).map(|i| (i * 7) as u8).collect();
  assert_eq!(rec.expected_size(), 3 * u);

  let pages = pack(&rec, PAGE_HEADER_SIZE);
  assert_eq!(pages.len(), 3);
  for p in &pages {
    // Headers untouched, bodies full / 页头未动，页体写满
    assert!(p[..PAGE_HEADER_SIZE].iter().all(|&x| x == FILL));
  }
  assert_eq!(unpack(&pages, PAGE_HEADER_SIZE), rec);
  info!("3 pages, {} bytes", rec.expected_size());
  OK
}

#[test]
fn test_header_split_across_pages() -> Void {
  let rec = full();
  // Only 5 bytes left on the first page / 首页仅剩 5 字节
  let start = BLCKSZ - 5;
  let pages = pack(&rec, start);
  assert_eq!(pages.len(), 2);
  assert_eq!(unpack(&pages, start), rec);

  // Split inside the optional parts / 在可选部分内部切分
  let start = BLCKSZ - HEADER_SIZE - 3;
  let pages = pack(&rec, start);
  assert_eq!(unpack(&pages, start), rec);
  OK
}

#[test]
fn test_unknown_kind_and_info() -> Void {
  let mut page = vec![0u8; BLCKSZ];
  page[PAGE_HEADER_SIZE] = 42;
  let mut decoded = 0;
  let err = Unpacker::new().unpack(&page, PAGE_HEADER_SIZE, &mut decoded);
  assert!(matches!(err, Err(Error::UnknownKind(42))));

  page[PAGE_HEADER_SIZE] = 0;
  page[PAGE_HEADER_SIZE + 1] = 0x30;
  let mut decoded = 0;
  let err = Unpacker::new().unpack(&page, PAGE_HEADER_SIZE, &mut decoded);
  assert!(matches!(err, Err(Error::UnknownInfo(0x30))));

  // Payload flag with both lengths zero / 负载标志但长度均为 0
  page[PAGE_HEADER_SIZE + 1] = INFO_PAYLOAD;
  let mut decoded = 0;
  let err = Unpacker::new().unpack(&page, PAGE_HEADER_SIZE, &mut decoded);
  assert!(matches!(err, Err(Error::EmptyPayload)));

  let mut decoded = 0;
  let err = Unpacker::new().unpack(&page, BLCKSZ + 1, &mut decoded);
  assert!(matches!(err, Err(Error::StartOutOfPage(..))));
  OK
}

#[test]
fn test_too_long() -> Void {
  let rec = UnpackedRecord {
    payload: vec![0; u16::MAX as usize + 1],
    ..Default::default()
  };
  assert!(matches!(rec.packer(), Err(Error::TooLong("payload", _))));
  OK
}

fn arb_ptr() -> impl Strategy<Value = UndoRecPtr> {
  any::<u64>().prop_map(UndoRecPtr::from_u64)
}

fn arb_record() -> impl Strategy<Value = UnpackedRecord> {
  (
    0u8..7,
    any::<(u16, u32, u32, u32, u32)>(),
    prop::option::of((any::<u32>(), any::<u8>())),
    prop::option::of((arb_ptr(), any::<u32>(), any::<u16>())),
    prop::option::of((any::<u32>(), arb_ptr())),
    prop::collection::vec(any::<u8>(), 0..3000),
    prop::collection::vec(any::<u8>(), 0..20000),
  )
    .prop_map(|(kind, (prevlen, relfilenode, prevxid, xid, cid), rel, block, xact, payload, tuple)| {
      UnpackedRecord {
        kind: Kind::try_from(kind).unwrap(),
        prevlen,
        relfilenode,
        prevxid,
        xid,
        cid,
        rel: rel.map(|(tsid, fork)| Rel { tsid, fork }).unwrap_or_default(),
        block: block.map(|(blkprev, block, offset)| Block {
          blkprev,
          block,
          offset,
        }),
        xact: xact.map(|(epoch, next)| Xact { epoch, next }),
        payload,
        tuple,
        buffer: None,
      }
    })
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn prop_pack_unpack(rec in arb_record(), start in PAGE_HEADER_SIZE..BLCKSZ) {
    let pages = pack(&rec, start);
    let out = unpack(&pages, start);
    prop_assert_eq!(out.kind, rec.kind);
    prop_assert_eq!(out.info(), rec.info());
    prop_assert_eq!(&out.payload, &rec.payload);
    prop_assert_eq!(&out.tuple, &rec.tuple);
    prop_assert_eq!(out, rec);
  }

  #[test]
  fn prop_expected_size_matches_written(rec in arb_record(), start in PAGE_HEADER_SIZE..BLCKSZ) {
    let pages = pack(&rec, start);
    let first = BLCKSZ - start;
    let rest = (pages.len() - 1) * undo_ptr::USABLE_BYTES_PER_PAGE;
    prop_assert!(rec.expected_size() <= first + rest);
    if pages.len() > 1 {
      prop_assert!(rec.expected_size() > first + rest - undo_ptr::USABLE_BYTES_PER_PAGE);
    }
  }
}
