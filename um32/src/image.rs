use crate::ImageError;

const WORD_SIZE: usize = std::mem::size_of::<u32>();

/// Turn a program image (big-endian words, back to back) into words.
pub fn parse_image(bytes: &[u8]) -> Result<Vec<u32>, ImageError> {
    if bytes.len() % WORD_SIZE != 0 {
        return Err(ImageError::Truncated { len: bytes.len() });
    }
    let words = bytes
        .chunks_exact(WORD_SIZE)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    return Ok(words);
}

pub fn encode_image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_be_bytes()).collect()
}
