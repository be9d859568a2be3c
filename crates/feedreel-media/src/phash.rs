//! Perceptual frame hashing.
//!
//! Frames are hashed with the blockhash algorithm over a `HASH_BITS x HASH_BITS`
//! grid. The hash bytes are rendered as lowercase hex, so a 16x16 grid yields a
//! 64-character string that [`hamming_distance`] compares character by character.

use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use std::path::Path;

use crate::error::MediaResult;

/// Grid size used for frame hashes.
pub const HASH_BITS: u32 = 16;

fn frame_hasher() -> Hasher {
    HasherConfig::new()
        .hash_alg(HashAlg::Blockhash)
        .hash_size(HASH_BITS, HASH_BITS)
        .to_hasher()
}

/// Hash an image file on disk.
pub fn hash_image_file(path: &Path) -> MediaResult<String> {
    let image = image::open(path)?;
    Ok(hash_image(&image))
}

/// Compute the blockhash of an image as a lowercase hex string.
pub fn hash_image(image: &DynamicImage) -> String {
    frame_hasher()
        .hash_image(image)
        .as_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Count of differing characters; extra characters in the longer string all differ.
pub fn hamming_distance(a: &str, b: &str) -> u32 {
    let mut a_chars = a.chars();
    let mut b_chars = b.chars();
    let mut distance = 0;
    loop {
        match (a_chars.next(), b_chars.next()) {
            (Some(x), Some(y)) => {
                if x != y {
                    distance += 1;
                }
            }
            (Some(_), None) | (None, Some(_)) => distance += 1,
            (None, None) => return distance,
        }
    }
}
