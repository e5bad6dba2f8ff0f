// src/utils.rs
use chrono::Utc;
use uuid::Uuid;

/// Cap stored error messages so the ledger stays scannable.
pub const MAX_ERROR_LEN: usize = 200;

/// Generate an opaque session id shared by all records of one run,
/// e.g. `20260830_142501_3fa85f64`.
pub fn new_session_id() -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{stamp}_{suffix}")
}

/// Truncate an error message to `MAX_ERROR_LEN` characters, respecting
/// char boundaries.
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() <= MAX_ERROR_LEN {
        message.to_string()
    } else {
        message.chars().take(MAX_ERROR_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_shape() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn short_errors_pass_through() {
        assert_eq!(truncate_error("connection reset"), "connection reset");
    }

    #[test]
    fn long_errors_are_capped_at_200_chars() {
        let long = "x".repeat(500);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), 200);
        assert_eq!(truncated, "x".repeat(200));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long: String = "é".repeat(250);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.chars().count(), 200);
    }
}
