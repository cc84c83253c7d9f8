//! Chunk splitting for large uploads
//!
//! A large unit is cut into consecutive, non-overlapping slices of a fixed
//! size; only the last slice may be shorter. Slices share the unit's buffer.

use crate::error::{Result, UploadError};
use crate::upload::types::UploadUnit;
use bytes::Bytes;

/// One slice of a unit, as sent to the chunk endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub file_name: String,
    /// Zero-based position of this chunk
    pub index: usize,
    pub total: usize,
    pub data: Bytes,
}

/// Number of chunks `size` bytes split into
pub fn chunk_count(size: u64, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    size.div_ceil(chunk_size as u64) as usize
}

/// Split `unit` into chunks of `chunk_size` bytes
///
/// # Arguments
///
/// * `unit` - The unit to split
/// * `chunk_size` - Bytes per chunk; the last chunk holds the remainder
///
/// # Returns
///
/// The chunks in order. An empty unit yields no chunks.
///
/// # Errors
///
/// Returns `InvalidParameter` if `chunk_size` is 0
pub fn split_into_chunks(unit: &UploadUnit, chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(UploadError::invalid_parameter(
            "chunk_size",
            "Chunk size must be greater than 0",
        ));
    }

    let data = unit.data();
    let total = chunk_count(unit.size(), chunk_size);

    Ok((0..total)
        .map(|index| {
            let start = index * chunk_size;
            let end = (start + chunk_size).min(data.len());
            Chunk {
                file_name: unit.name().to_string(),
                index,
                total,
                data: data.slice(start..end),
            }
        })
        .collect())
}

/// Progress after `sent` of `total` chunks, rounded to a whole percent
pub fn chunk_percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(0, 1024), 0);
        assert_eq!(chunk_count(1, 1024), 1);
        assert_eq!(chunk_count(1024, 1024), 1);
        assert_eq!(chunk_count(1025, 1024), 2);
        assert_eq!(chunk_count(2_500_000, 1_048_576), 3);
        assert_eq!(chunk_count(10, 0), 0);
    }

    #[test]
    fn test_split_covers_unit_exactly() {
        let payload: Vec<u8> = (0..=250u8).collect();
        let unit = UploadUnit::new("data.bin", "application/octet-stream", payload.clone());

        let chunks = split_into_chunks(&unit, 100).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].data.len(), 100);
        assert_eq!(chunks[1].data.len(), 100);
        assert_eq!(chunks[2].data.len(), 51);
        assert!(chunks.iter().all(|c| c.total == 3 && c.file_name == "data.bin"));

        let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
        assert_eq!(joined, payload);
    }

    #[test]
    fn test_split_empty_unit() {
        let unit = UploadUnit::new("empty.bin", "application/octet-stream", Vec::new());
        assert!(split_into_chunks(&unit, 100).unwrap().is_empty());
    }

    #[test]
    fn test_split_rejects_zero_chunk_size() {
        let unit = UploadUnit::new("data.bin", "application/octet-stream", vec![1u8]);
        assert!(split_into_chunks(&unit, 0).is_err());
    }

    #[test]
    fn test_chunk_percent() {
        assert_eq!(chunk_percent(1, 3), 33);
        assert_eq!(chunk_percent(2, 3), 67);
        assert_eq!(chunk_percent(3, 3), 100);
        assert_eq!(chunk_percent(0, 0), 100);
    }
}
