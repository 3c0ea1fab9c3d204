//! Utility functions with platform-specific implementations.

/// Longest filename stem produced by [`sanitize_filename`], in characters.
pub const MAX_FILENAME_CHARS: usize = 80;

/// Get a time-based seed value for pseudo-random number generation.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_seed_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345)
}

#[cfg(target_arch = "wasm32")]
pub fn time_seed_nanos() -> u64 {
    // js_sys::Date::now() returns milliseconds as f64
    (js_sys::Date::now() * 1_000_000.0) as u64
}

/// Get current time as seconds since Unix epoch.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

/// Current UTC time, truncated to whole seconds.
pub fn utc_now() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(time_now_secs(), 0).unwrap_or_default()
}

/// A v4-shaped UUID seeded from the clock.
///
/// Not cryptographically random; it only has to differ between exports.
pub fn uuid_v4() -> String {
    let mut state = time_seed_nanos();
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *byte = (state >> 33) as u8;
    }

    // Set version (4) and variant (2)
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Make a title safe to use as a filename stem.
///
/// Keeps ASCII letters, digits, `_` and `-`, plus Han, Hiragana and
/// Katakana characters; everything else becomes `_`. The result is at most
/// [`MAX_FILENAME_CHARS`] characters and never empty.
pub fn sanitize_filename(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .take(MAX_FILENAME_CHARS)
        .map(|c| if is_filename_char(c) { c } else { '_' })
        .collect();

    if sanitized.is_empty() {
        "book".to_string()
    } else {
        sanitized
    }
}

/// Whether a character survives [`sanitize_filename`] unchanged.
pub fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == '-'
        || matches!(c,
            '\u{3040}'..='\u{309F}'   // Hiragana
            | '\u{30A0}'..='\u{30FF}' // Katakana
            | '\u{3400}'..='\u{4DBF}' // CJK Extension A
            | '\u{4E00}'..='\u{9FFF}' // CJK Unified Ideographs
        )
}
