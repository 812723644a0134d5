//! VM parameters and image-format constants.

use aq_asm::Word;

pub use aq_asm::WORD_SIZE;

/// Leading magic of a bytecode image: `"AQBC"`.
pub const IMAGE_MAGIC: [u8; 4] = [0x41, 0x51, 0x42, 0x43];

/// Byte offset of the big-endian `u64` memory size field in the header.
pub const IMAGE_SIZE_OFFSET: usize = 8;

/// Total header length: magic, reserved word, memory size.
pub const IMAGE_HEADER_LEN: usize = 16;

/// Bucket count of the host name table.
pub const NAME_TABLE_BUCKETS: usize = 1024;

/// Upper bound for a single guest heap allocation, in bytes.
pub const MAX_ALLOC_SIZE: Word = 1024 * 1024 * 64;

static_assertions::const_assert_eq!(WORD_SIZE, 8);
static_assertions::const_assert!(MAX_ALLOC_SIZE < usize::MAX as Word);
