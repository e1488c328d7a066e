//! .fsa binary container for saved feature stores.

use std::io::{Read, Write};
use std::path::Path;

use crate::types::{FeatureStore, FeatureVector, SimilarityError, SimilarityResult};

/// Magic bytes: "FSAR"
const FSA_MAGIC: u32 = 0x46534152;

/// Current format version.
const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Writer for .fsa files.
pub struct ArchiveWriter;

/// Reader for .fsa files.
pub struct ArchiveReader;

impl ArchiveWriter {
    /// Write a feature store to a file.
    pub fn write_to_file(store: &FeatureStore, path: &Path) -> SimilarityResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        Self::write_to(store, &mut file)
    }

    /// Write a feature store to any writer.
    pub fn write_to<W: Write>(store: &FeatureStore, writer: &mut W) -> SimilarityResult<()> {
        let payload = serde_json::to_vec(store.as_slice())
            .map_err(|e| SimilarityError::Archive(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        write_u32(&mut header[0..4], FSA_MAGIC);
        write_u16(&mut header[4..6], FORMAT_VERSION);
        write_u16(&mut header[6..8], 0); // flags
        write_u64(&mut header[8..16], store.len() as u64);
        write_u32(&mut header[16..20], store.dimension().unwrap_or(0) as u32);
        write_u64(&mut header[24..32], payload.len() as u64);

        writer.write_all(&header)?;
        writer.write_all(&payload)?;

        tracing::debug!(
            "Wrote archive: {} vectors, {} payload bytes",
            store.len(),
            payload.len()
        );
        Ok(())
    }
}

impl ArchiveReader {
    /// Read a feature store from a file.
    pub fn read_from_file(path: &Path) -> SimilarityResult<FeatureStore> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read a feature store from any reader.
    ///
    /// Vectors go back through [`FeatureStore::insert`], so a tampered
    /// payload cannot produce a store that breaks its invariants.
    pub fn read_from<R: Read>(reader: &mut R) -> SimilarityResult<FeatureStore> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != FSA_MAGIC {
            return Err(SimilarityError::Archive(format!(
                "Invalid magic: expected 0x{FSA_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(SimilarityError::Archive(format!(
                "Unsupported version: {version}"
            )));
        }

        let count = read_u64(&header[8..16]) as usize;
        let dimension = read_u32(&header[16..20]) as usize;
        let payload_len = read_u64(&header[24..32]);

        // The header length is untrusted; read at most that many bytes.
        let mut payload = Vec::new();
        reader.take(payload_len).read_to_end(&mut payload)?;
        if payload.len() as u64 != payload_len {
            return Err(SimilarityError::Archive(format!(
                "Truncated payload: header says {payload_len} bytes, found {}",
                payload.len()
            )));
        }

        let vectors: Vec<FeatureVector> = serde_json::from_slice(&payload)
            .map_err(|e| SimilarityError::Archive(format!("Deserialization failed: {e}")))?;

        if vectors.len() != count {
            return Err(SimilarityError::Archive(format!(
                "Header says {count} vectors, payload has {}",
                vectors.len()
            )));
        }

        let mut store = if dimension > 0 {
            FeatureStore::with_dimension(dimension)
        } else {
            FeatureStore::new()
        };
        for vector in vectors {
            store.insert(vector)?;
        }
        Ok(store)
    }
}

// Little-endian byte helpers
fn write_u16(buf: &mut [u8], val: u16) {
    buf[..2].copy_from_slice(&val.to_le_bytes());
}
fn write_u32(buf: &mut [u8], val: u32) {
    buf[..4].copy_from_slice(&val.to_le_bytes());
}
fn write_u64(buf: &mut [u8], val: u64) {
    buf[..8].copy_from_slice(&val.to_le_bytes());
}
fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_le_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
}
