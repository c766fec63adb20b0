//! Character encoding detection for manifest and markup files.

use encoding_rs::Encoding;

/// Decode a manifest or markup file to UTF-8.
///
/// A BOM wins, then the encoding named in the XML declaration, then UTF-8
/// with a Windows-1252 fallback.
pub fn decode_document(bytes: &[u8]) -> String {
    if has_bom(bytes) {
        return decode_to_utf8(bytes);
    }
    if let Some(label) = detect_xml_encoding(bytes) {
        if !label.eq_ignore_ascii_case("utf-8") {
            if let Some(text) = decode_with_encoding(bytes, &label) {
                return text;
            }
            log::debug!("Unknown declared encoding '{}', sniffing instead", label);
        }
    }
    decode_to_utf8(bytes)
}

fn has_bom(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xEF, 0xBB, 0xBF])
        || bytes.starts_with(&[0xFF, 0xFE])
        || bytes.starts_with(&[0xFE, 0xFF])
}

/// Decode bytes to UTF-8 using their BOM, falling back to Windows-1252
/// for invalid UTF-8.
pub fn decode_to_utf8(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return encoding_rs::UTF_16LE.decode(bytes).0.into_owned();
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return encoding_rs::UTF_16BE.decode(bytes).0.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
    }
}

/// Decode bytes using a specific encoding label.
pub fn decode_with_encoding(bytes: &[u8], encoding_name: &str) -> Option<String> {
    let encoding = Encoding::for_label(encoding_name.as_bytes())?;
    let (result, _, _) = encoding.decode(bytes);
    Some(result.to_string())
}

/// Read the label from `<?xml ... encoding="..." ?>`, if the document starts with one.
pub fn detect_xml_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(512)];
    let head_str = String::from_utf8_lossy(head);
    let decl_end = head_str.find("?>")?;
    let decl = &head_str[..decl_end];

    let start = decl.find("encoding=")?;
    let rest = &decl[start + 9..];
    let quote = rest.chars().next()?;
    if quote == '"' || quote == '\'' {
        let rest = &rest[1..];
        if let Some(end) = rest.find(quote) {
            return Some(rest[..end].to_string());
        }
    }
    None
}
