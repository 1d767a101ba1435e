//! Decoding of text files that may not be UTF-8.
//!
//! Import files and raw OCR dumps edited on Windows often end up as
//! windows-1252 or carry a BOM.

use std::fs;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use crate::error::Result;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub had_errors: bool,
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let decoded = decode(&bytes);

    if decoded.encoding != "UTF-8" {
        log::info!("[ENCODING] {} decoded as {}", path.display(), decoded.encoding);
    }
    if decoded.had_errors {
        log::warn!("[ENCODING] {} contains undecodable bytes", path.display());
    }

    Ok(decoded.text)
}

pub fn decode(bytes: &[u8]) -> DecodedText {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_with(rest, UTF_8);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: UTF_8.name(),
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);

    decode_with(bytes, encoding)
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, _, had_errors) = encoding.decode(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name(),
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8_passes_through() {
        let d = decode("Persönlichkeit".as_bytes());
        assert_eq!(d.text, "Persönlichkeit");
        assert_eq!(d.encoding, "UTF-8");
        assert!(!d.had_errors);
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("#deck:D".as_bytes());
        assert_eq!(decode(&bytes).text, "#deck:D");
    }

    #[test]
    fn windows_1252_is_detected() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("Gemüse\tvegetable\nKörper\tbody\nÜbung\tpractice\n");
        let d = decode(&bytes);
        assert!(d.text.contains("Gemüse"));
        assert!(d.text.contains("Übung"));
    }

    #[test]
    fn read_text_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.txt");
        std::fs::write(&path, "Löffel\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "Löffel\n");
    }
}
