//! Utility functions for GLB construction

use gltf_json as json;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Compute bounding box for positions
pub fn compute_bounds(positions: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for pos in positions {
        for i in 0..3 {
            min[i] = min[i].min(pos[i]);
            max[i] = max[i].max(pos[i]);
        }
    }

    (min.to_vec(), max.to_vec())
}

/// Align buffer to 4-byte boundary
pub fn align_buffer(buffer: &mut Vec<u8>) {
    pad_to_four(buffer, 0);
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

/// Assemble GLB binary from JSON and buffer data
pub fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Vec<u8> {
    let json_string = json::serialize::to_string(root).expect("Failed to serialize GLTF JSON");
    assemble_glb_raw(json_string.as_bytes(), Some(buffer_data))
}

/// Assemble GLB binary from raw JSON bytes, with or without a BIN chunk
///
/// The JSON is not checked, so fixtures can carry malformed documents.
pub fn assemble_glb_raw(json_bytes: &[u8], buffer_data: Option<&[u8]>) -> Vec<u8> {
    let mut json_chunk = json_bytes.to_vec();
    pad_to_four(&mut json_chunk, b' ');

    let bin_chunk = buffer_data.map(|data| {
        let mut chunk = data.to_vec();
        pad_to_four(&mut chunk, 0);
        chunk
    });

    let total_length =
        12 + 8 + json_chunk.len() + bin_chunk.as_ref().map_or(0, |chunk| 8 + chunk.len());

    let mut glb = Vec::with_capacity(total_length);

    // Header
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json_chunk);

    if let Some(chunk) = bin_chunk {
        glb.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(&chunk);
    }

    glb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bounds_simple() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [-1.0, -2.0, -3.0]];
        let (min, max) = compute_bounds(&positions);
        assert_eq!(min, vec![-1.0, -2.0, -3.0]);
        assert_eq!(max, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_align_buffer() {
        let mut buffer = vec![1, 2, 3];
        align_buffer(&mut buffer);
        assert_eq!(buffer, vec![1, 2, 3, 0]);

        let mut buffer2 = vec![1, 2, 3, 4];
        align_buffer(&mut buffer2);
        assert_eq!(buffer2.len(), 4); // Already aligned
    }

    #[test]
    fn test_raw_glb_layout() {
        let glb = assemble_glb_raw(b"{}", Some(&[1, 2, 3]));
        assert_eq!(&glb[..4], b"glTF");
        // header 12 + json chunk (8 + 4) + bin chunk (8 + 4)
        assert_eq!(glb.len(), 36);
        assert_eq!(&glb[12..16], &4u32.to_le_bytes());
        assert_eq!(&glb[20..24], b"{}  ");
        assert_eq!(&glb[32..36], &[1, 2, 3, 0]);

        let json_only = assemble_glb_raw(b"{}", None);
        assert_eq!(json_only.len(), 24);
    }
}
