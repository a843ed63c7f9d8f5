//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised while decoding a serialized partition sketch blob.
///
/// Decoding failures are never fatal to a query: the catalog degrades the
/// affected partition to "always a candidate" instead of dropping it.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob does not start with the sketch magic number.
    #[error("bad sketch magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        /// Magic number every sketch blob starts with.
        expected: u32,
        /// Magic number actually present in the blob.
        found: u32,
    },
    /// The blob was written by an unknown format version.
    #[error("unsupported sketch format version {0}")]
    UnsupportedVersion(u8),
    /// The CRC32 trailer does not match the blob content.
    #[error("sketch checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the blob trailer.
        stored: u32,
        /// Checksum computed over the blob content.
        computed: u32,
    },
    /// The blob ended before the expected number of bytes was read.
    #[error("unexpected end of sketch blob at offset {0}")]
    UnexpectedEof(usize),
    /// A synopsis kind tag has no known decoding.
    #[error("unknown synopsis kind tag {0}")]
    UnknownSynopsisKind(u8),
    /// Bytes remained after the last declared field was decoded.
    #[error("{0} trailing bytes after sketch payload")]
    TrailingBytes(usize),
    /// A field name was not valid UTF-8.
    #[error("field name is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}
