use crate::error::FormatError;
use flate2::read::DeflateDecoder;
use std::io::Read;

const ZLIB_HEADER_SIZE: usize = 2;
/// Output buffers grow past this only as data actually arrives
const MAX_PREALLOC: usize = 1 << 20;

/// Inflates a zlib stream that must not produce more than `expected_len`
/// bytes. Reading stops one byte past the limit.
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>, FormatError> {
    let Some(deflate) = data.get(ZLIB_HEADER_SIZE..) else {
        return Err(FormatError::Decompression(format!(
            "stream of {} bytes has no zlib header",
            data.len()
        )));
    };
    let mut out = Vec::with_capacity(expected_len.min(MAX_PREALLOC));
    DeflateDecoder::new(deflate)
        .take(expected_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|err| FormatError::Decompression(err.to_string()))?;
    if out.len() > expected_len {
        return Err(FormatError::Decompression(format!(
            "stream inflates past the expected {expected_len} bytes"
        )));
    }
    Ok(out)
}
