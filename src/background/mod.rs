pub mod ranking;
pub mod search;
pub mod similarity;
pub mod stats;
pub mod store;
pub mod types;

/// Encode an embedding as little-endian f32 bytes for the `embedding` BLOB column.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`embedding_to_bytes`].
///
/// Returns `None` for a blob whose length is not a multiple of 4, so a corrupt
/// row is treated as "no embedding" rather than failing the whole read.
pub fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
