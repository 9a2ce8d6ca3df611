use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of generated record ids
pub const RECORD_ID_LEN: usize = 20;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a record id: 20 random ASCII alphanumerics.
///
/// Ids end up in URLs and file names, so the alphabet stays URL- and
/// path-safe.
pub fn record_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RECORD_ID_LEN)
        .map(char::from)
        .collect()
}

/// Whether `id` is usable as a URL path segment and artifact key prefix
pub fn is_valid_record_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 128 && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
