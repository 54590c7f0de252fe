//! WAL file and record format.
//!
//! # File Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Header (8 bytes)                   │
//! ├────────────────────────────────────┤
//! │ Record 1                           │
//! ├────────────────────────────────────┤
//! │ Record 2                           │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! Header: magic `"SKUW"` followed by the file format version (u32 LE).
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1)   │ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴──────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! The length covers format version, payload and CRC. The CRC covers format
//! version and payload. The payload is JSON:
//! `{"version": u64, "writes": [{"key": {...}, "doc": {...} | null}]}`.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use skudb_core::ResolvedWrite;

/// Magic bytes identifying a skudb WAL file
pub const WAL_MAGIC: [u8; 4] = *b"SKUW";

/// Current WAL file format version (stored in the header)
pub const WAL_FORMAT_VERSION: u32 = 1;

/// Size of the file header in bytes
pub const WAL_HEADER_SIZE: usize = 8;

/// Current WAL record format version
pub const WAL_RECORD_FORMAT_VERSION: u8 = 1;

/// Smallest legal value of the length field: format version + CRC
const MIN_RECORD_LEN: usize = 5;

/// One committed transaction as logged in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalRecord {
    /// Commit version assigned by the transaction manager
    pub version: u64,

    /// Resolved writes, in the order they were applied
    pub writes: Vec<ResolvedWrite>,
}

impl WalRecord {
    /// Create a new WAL record.
    pub fn new(version: u64, writes: Vec<ResolvedWrite>) -> Self {
        WalRecord { version, writes }
    }

    /// Encode the file header.
    pub fn header_bytes() -> [u8; WAL_HEADER_SIZE] {
        let mut bytes = [0u8; WAL_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&WAL_MAGIC);
        LittleEndian::write_u32(&mut bytes[4..8], WAL_FORMAT_VERSION);
        bytes
    }

    /// Check a file header, returning the format version it declares.
    pub fn check_header(bytes: &[u8]) -> Result<u32, WalRecordError> {
        if bytes.len() < WAL_HEADER_SIZE {
            return Err(WalRecordError::InsufficientData);
        }
        if bytes[0..4] != WAL_MAGIC {
            return Err(WalRecordError::InvalidFormat);
        }
        let version = LittleEndian::read_u32(&bytes[4..8]);
        if version != WAL_FORMAT_VERSION {
            return Err(WalRecordError::UnsupportedFileVersion(version));
        }
        Ok(version)
    }

    /// Serialize record to bytes (for writing to WAL).
    ///
    /// Format: length (4) + format_version (1) + payload + crc32 (4)
    pub fn to_bytes(&self) -> Result<Vec<u8>, WalRecordError> {
        let json = serde_json::to_vec(self).map_err(|e| WalRecordError::Payload(e.to_string()))?;

        let mut payload = Vec::with_capacity(1 + json.len());
        payload.push(WAL_RECORD_FORMAT_VERSION);
        payload.extend_from_slice(&json);

        let crc = Self::compute_crc(&payload);

        let total_len = payload.len() + 4;
        let mut record = Vec::with_capacity(4 + total_len);
        // Writes into a Vec cannot fail
        let _ = record.write_u32::<LittleEndian>(total_len as u32);
        record.extend_from_slice(&payload);
        let _ = record.write_u32::<LittleEndian>(crc);

        Ok(record)
    }

    /// Deserialize record from bytes.
    ///
    /// Returns (record, bytes_consumed) on success.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), WalRecordError> {
        if bytes.len() < 4 {
            return Err(WalRecordError::InsufficientData);
        }

        let length = LittleEndian::read_u32(&bytes[0..4]) as usize;
        if length < MIN_RECORD_LEN {
            return Err(WalRecordError::InvalidFormat);
        }
        if bytes.len() < 4 + length {
            return Err(WalRecordError::InsufficientData);
        }

        let payload_with_crc = &bytes[4..4 + length];
        let payload = &payload_with_crc[..length - 4];
        let stored_crc = LittleEndian::read_u32(&payload_with_crc[length - 4..]);

        let computed_crc = Self::compute_crc(payload);
        if stored_crc != computed_crc {
            return Err(WalRecordError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        let format_version = payload[0];
        if format_version != WAL_RECORD_FORMAT_VERSION {
            return Err(WalRecordError::UnsupportedVersion(format_version));
        }

        let record: WalRecord = serde_json::from_slice(&payload[1..])
            .map_err(|e| WalRecordError::Payload(e.to_string()))?;

        Ok((record, 4 + length))
    }

    fn compute_crc(data: &[u8]) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// WAL record parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalRecordError {
    /// Not enough data to parse record
    #[error("Insufficient data to parse record")]
    InsufficientData,

    /// Record format is invalid
    #[error("Invalid record format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from record
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported record format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Unsupported file format version in the header
    #[error("Unsupported WAL file version: {0}")]
    UnsupportedFileVersion(u32),

    /// Payload is not a valid commit record
    #[error("Invalid record payload: {0}")]
    Payload(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use skudb_core::{DocKey, Document};

    fn sample() -> WalRecord {
        let mut doc = Document::new();
        doc.insert("name".into(), json!("spoon"));
        doc.insert("sku".into(), json!(1000));
        WalRecord::new(
            7,
            vec![
                ResolvedWrite {
                    key: DocKey::new("items", "a1"),
                    doc: Some(doc),
                },
                ResolvedWrite {
                    key: DocKey::new("items", "gone"),
                    doc: None,
                },
            ],
        )
    }

    #[test]
    fn test_header_roundtrip() {
        let header = WalRecord::header_bytes();
        assert_eq!(&header[0..4], b"SKUW");
        assert_eq!(WalRecord::check_header(&header), Ok(WAL_FORMAT_VERSION));
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut header = WalRecord::header_bytes();
        header[0] = b'X';
        assert_eq!(
            WalRecord::check_header(&header),
            Err(WalRecordError::InvalidFormat)
        );
        assert_eq!(
            WalRecord::check_header(&header[..3]),
            Err(WalRecordError::InsufficientData)
        );
    }

    #[test]
    fn test_record_roundtrip_consumes_exact_length() {
        let record = sample();
        let mut bytes = record.to_bytes().unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(b"trailing");

        let (parsed, consumed) = WalRecord::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(consumed, len);
    }

    #[test]
    fn test_truncated_record_is_insufficient() {
        let bytes = sample().to_bytes().unwrap();
        for cut in [0, 3, 4, bytes.len() - 1] {
            assert_eq!(
                WalRecord::from_bytes(&bytes[..cut]),
                Err(WalRecordError::InsufficientData),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_flipped_payload_byte_fails_checksum() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[10] ^= 0xFF;
        assert!(matches!(
            WalRecord::from_bytes(&bytes),
            Err(WalRecordError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_header_reports_full_file_version() {
        let mut header = WalRecord::header_bytes();
        LittleEndian::write_u32(&mut header[4..8], 256);
        assert_eq!(
            WalRecord::check_header(&header),
            Err(WalRecordError::UnsupportedFileVersion(256))
        );
        assert_eq!(
            WalRecord::check_header(&WalRecord::header_bytes()),
            Ok(WAL_FORMAT_VERSION)
        );
    }

    #[test]
    fn test_zero_length_is_invalid() {
        assert_eq!(
            WalRecord::from_bytes(&[0, 0, 0, 0, 1]),
            Err(WalRecordError::InvalidFormat)
        );
    }

    proptest! {
        #[test]
        fn prop_any_single_corruption_is_detected(pos in 4usize..60, flip in 1u8..=255) {
            let mut bytes = sample().to_bytes().unwrap();
            let pos = pos.min(bytes.len() - 1);
            bytes[pos] ^= flip;
            prop_assert!(WalRecord::from_bytes(&bytes).is_err());
        }
    }
}
