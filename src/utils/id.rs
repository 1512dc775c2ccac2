// src/utils/id.rs

use rand::RngCore;

/// Short random entity ids in the `q-xxxxxxxx` style the original client
/// generated: a one-letter type prefix and 4 random bytes as lowercase hex.
pub fn generate_id(prefix: &str) -> String {
    let mut bytes = [0u8; 4];
    rand::rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", prefix, hex)
}
