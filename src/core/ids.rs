//! Document id synthesis

use chrono::Utc;
use rand::Rng;

/// Millisecond timestamp id, used when the client sends none
pub fn timestamp_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Timestamp id with a random suffix, used for the single retry after a collision
pub fn retry_id() -> String {
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
