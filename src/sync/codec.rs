//! Memo text as the remote store keeps it.
//!
//! Project, memo and monthly-memo `memo` columns are stored base64-encoded
//! UTF-8. Values are decoded once when a fetch populates a collection and
//! encoded once when a value is sent; collections always hold plain text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub fn encode_memo(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Plain text for a stored memo. Values that are not valid base64 UTF-8 are
/// returned unchanged.
pub fn decode_memo(stored: &str) -> String {
    if stored.is_empty() {
        return String::new();
    }
    match STANDARD
        .decode(stored.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(text) => text,
        None => {
            log::debug!("Memo text is not encoded, keeping as stored");
            stored.to_string()
        }
    }
}

/// Decode the `memo` field of every row in place.
pub(crate) fn decode_rows(rows: &mut [serde_json::Value]) {
    for row in rows {
        if let Some(field) = row.get_mut("memo") {
            if let Some(stored) = field.as_str() {
                *field = serde_json::Value::String(decode_memo(stored));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_utf8_text() {
        assert_eq!(encode_memo("hi"), "aGk=");
        assert_eq!(decode_memo(&encode_memo("買い物 <b>&</b>")), "買い物 <b>&</b>");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(decode_memo("not base64!"), "not base64!");
        assert_eq!(decode_memo(""), "");
    }

    #[test]
    fn decodes_memo_column_only() {
        let mut rows = vec![serde_json::json!({"id": "1", "name": "aGk=", "memo": "aGk="})];
        decode_rows(&mut rows);
        assert_eq!(rows[0]["memo"], "hi");
        assert_eq!(rows[0]["name"], "aGk=");
    }
}
