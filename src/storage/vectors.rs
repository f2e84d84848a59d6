//! Vector blob encoding: little-endian f32, zstd-compressed

use crate::error::{DocQaError, Result};

const COMPRESSION_LEVEL: i32 = 3;

pub fn encode(vector: &[f32]) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(std::mem::size_of_val(vector));
    for &value in vector {
        raw.extend_from_slice(&value.to_le_bytes());
    }
    zstd::encode_all(&raw[..], COMPRESSION_LEVEL).map_err(|e| DocQaError::Io {
        source: e,
        context: "Failed to compress vector".to_string(),
    })
}

pub fn decode(blob: &[u8], dimension: usize) -> Result<Vec<f32>> {
    let raw = zstd::decode_all(blob).map_err(|e| DocQaError::Io {
        source: e,
        context: "Failed to decompress vector".to_string(),
    })?;

    let width = std::mem::size_of::<f32>();
    if raw.len() != dimension * width {
        return Err(DocQaError::DimensionMismatch {
            expected: dimension,
            actual: raw.len() / width,
        });
    }

    let mut out = Vec::with_capacity(dimension);
    for bytes in raw.chunks_exact(width) {
        let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if !value.is_finite() {
            return Err(DocQaError::Other(anyhow::anyhow!(
                "stored vector contains non-finite values"
            )));
        }
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_checks_length() {
        let blob = encode(&[0.5, -1.25, 3.0]).unwrap();
        assert_eq!(decode(&blob, 3).unwrap(), vec![0.5, -1.25, 3.0]);
        assert!(matches!(
            decode(&blob, 4),
            Err(DocQaError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let blob = encode(&[f32::NAN]).unwrap();
        assert!(decode(&blob, 1).is_err());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode(b"not zstd", 1).is_err());
    }
}
