//! Versioned binary container for persisted models.
//!
//! Format ("ETQ1"):
//! ```text
//! [4-byte magic: "ETQ1"]
//! [4-byte metadata_len: u32 little-endian]
//! [JSON metadata: arbitrary key-value pairs]
//! [4-byte n_blocks: u32 little-endian]
//! [4-byte index_len: u32 little-endian]
//! [JSON block index: name, shape, offset, size per block]
//! [Raw block data: f64 values in little-endian]
//! [4-byte CRC32 of all preceding bytes]
//! ```
//!
//! The model is the unit of durability: a record either loads whole (magic,
//! checksum, and every declared block validated) or not at all.
//!
//! # Example
//!
//! ```
//! use etiquetar::serialization::{ModelReader, ModelWriter};
//! use serde_json::json;
//!
//! let mut writer = ModelWriter::new();
//! writer.set_metadata("num_classes", json!(2));
//! writer.add_block_f64("biases", vec![2], &[0.5, -0.5]);
//!
//! let bytes = writer.to_bytes().unwrap();
//! let reader = ModelReader::from_bytes(bytes).unwrap();
//! assert_eq!(reader.metadata("num_classes").unwrap(), 2);
//! assert_eq!(reader.read_block_f64("biases").unwrap(), vec![0.5, -0.5]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{EtiquetarError, Result};

/// Magic bytes identifying the container.
pub const MAGIC: [u8; 4] = *b"ETQ1";

/// Highest record version this build reads and the version it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Block descriptor in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Block name
    pub name: String,
    /// Shape dimensions
    pub shape: Vec<usize>,
    /// Byte offset in the data section
    pub offset: usize,
    /// Byte size
    pub size: usize,
}

/// Container metadata: arbitrary JSON by key.
pub type Metadata = BTreeMap<String, JsonValue>;

/// Container writer.
#[derive(Debug, Default)]
pub struct ModelWriter {
    metadata: Metadata,
    blocks: Vec<(BlockDescriptor, Vec<u8>)>,
}

impl ModelWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a metadata key-value pair.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: JsonValue) {
        self.metadata.insert(key.into(), value);
    }

    /// Appends a named block of f64 values with the given shape.
    pub fn add_block_f64(&mut self, name: impl Into<String>, shape: Vec<usize>, data: &[f64]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        let offset: usize = self.blocks.iter().map(|(_, d)| d.len()).sum();
        let descriptor = BlockDescriptor {
            name: name.into(),
            shape,
            offset,
            size: bytes.len(),
        };
        self.blocks.push((descriptor, bytes));
    }

    /// Serializes the container.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata or index serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();

        output.extend_from_slice(&MAGIC);

        let metadata_json = serde_json::to_string(&self.metadata)
            .map_err(|e| EtiquetarError::Serialization(format!("metadata: {e}")))?;
        let metadata_bytes = metadata_json.as_bytes();
        output.extend_from_slice(&(metadata_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(metadata_bytes);

        output.extend_from_slice(&(self.blocks.len() as u32).to_le_bytes());

        let descriptors: Vec<_> = self.blocks.iter().map(|(d, _)| d).collect();
        let index_json = serde_json::to_string(&descriptors)
            .map_err(|e| EtiquetarError::Serialization(format!("block index: {e}")))?;
        let index_bytes = index_json.as_bytes();
        output.extend_from_slice(&(index_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(index_bytes);

        for (_, data) in &self.blocks {
            output.extend_from_slice(data);
        }

        let crc = crc32(&output);
        output.extend_from_slice(&crc.to_le_bytes());

        Ok(output)
    }
}

/// Container reader.
#[derive(Debug)]
pub struct ModelReader {
    metadata: Metadata,
    blocks: Vec<BlockDescriptor>,
    data: Vec<u8>,
    data_offset: usize,
}

impl ModelReader {
    /// Parses a container from bytes, verifying magic and checksum.
    ///
    /// # Errors
    ///
    /// Returns an error on a wrong magic, a failed checksum, or a
    /// structurally truncated or malformed record.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.len() < MAGIC.len() + 4 + 4 + 4 + 4 {
            return Err(EtiquetarError::FormatError {
                message: "record too short for header".to_string(),
            });
        }
        if data[..4] != MAGIC {
            return Err(EtiquetarError::FormatError {
                message: format!("bad magic {:?}, expected {MAGIC:?}", &data[..4]),
            });
        }

        let body_len = data.len() - 4;
        let expected = u32::from_le_bytes([
            data[body_len],
            data[body_len + 1],
            data[body_len + 2],
            data[body_len + 3],
        ]);
        let actual = crc32(&data[..body_len]);
        if expected != actual {
            return Err(EtiquetarError::ChecksumMismatch { expected, actual });
        }

        let metadata_len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let metadata_end = 8 + metadata_len;
        if body_len < metadata_end + 8 {
            return Err(EtiquetarError::FormatError {
                message: "record too short for metadata".to_string(),
            });
        }
        let metadata: Metadata = if metadata_len > 0 {
            serde_json::from_slice(&data[8..metadata_end])
                .map_err(|e| EtiquetarError::Serialization(format!("metadata: {e}")))?
        } else {
            BTreeMap::new()
        };

        let n_blocks = u32::from_le_bytes([
            data[metadata_end],
            data[metadata_end + 1],
            data[metadata_end + 2],
            data[metadata_end + 3],
        ]) as usize;
        let index_len = u32::from_le_bytes([
            data[metadata_end + 4],
            data[metadata_end + 5],
            data[metadata_end + 6],
            data[metadata_end + 7],
        ]) as usize;
        let index_end = metadata_end + 8 + index_len;
        if body_len < index_end {
            return Err(EtiquetarError::FormatError {
                message: "record too short for block index".to_string(),
            });
        }
        let blocks: Vec<BlockDescriptor> = if n_blocks > 0 {
            serde_json::from_slice(&data[metadata_end + 8..index_end])
                .map_err(|e| EtiquetarError::Serialization(format!("block index: {e}")))?
        } else {
            Vec::new()
        };
        if blocks.len() != n_blocks {
            return Err(EtiquetarError::FormatError {
                message: format!(
                    "block count mismatch: header says {n_blocks}, index holds {}",
                    blocks.len()
                ),
            });
        }

        Ok(Self {
            metadata,
            blocks,
            data,
            data_offset: index_end,
        })
    }

    /// Metadata value by key.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&JsonValue> {
        self.metadata.get(key)
    }

    /// Descriptors of all blocks, in written order.
    #[must_use]
    pub fn blocks(&self) -> &[BlockDescriptor] {
        &self.blocks
    }

    /// Reads a named block as f64 values.
    ///
    /// # Errors
    ///
    /// Returns an error if the block is absent, its size disagrees with
    /// its declared shape, or its data falls outside the record.
    pub fn read_block_f64(&self, name: &str) -> Result<Vec<f64>> {
        let descriptor = self
            .blocks
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| EtiquetarError::FormatError {
                message: format!("missing block `{name}`"),
            })?;

        let n_values: usize = descriptor.shape.iter().product();
        if descriptor.size != n_values * 8 {
            return Err(EtiquetarError::FormatError {
                message: format!(
                    "block `{name}` size {} disagrees with shape {:?}",
                    descriptor.size, descriptor.shape
                ),
            });
        }

        let start = self.data_offset + descriptor.offset;
        let end = start + descriptor.size;
        // Data must stop before the trailing CRC.
        if end > self.data.len() - 4 {
            return Err(EtiquetarError::FormatError {
                message: format!("block `{name}` data out of bounds"),
            });
        }

        Ok(self.data[start..end]
            .chunks_exact(8)
            .map(|chunk| {
                f64::from_le_bytes([
                    chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
                ])
            })
            .collect())
    }
}

/// CRC32 lookup table (IEEE polynomial), built at compile time.
const fn crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                0xEDB8_8320 ^ (crc >> 1)
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC32_TABLE: [u32; 256] = crc32_table();

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = CRC32_TABLE[idx] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}
