//! Text encodings for the file tools.
//!
//! Files default to UTF-8. A caller can name another encoding by label
//! (`gbk`, `utf-16`, `utf-8-sig`, ...). When none is named, or the named
//! one does not decode the bytes cleanly, the encoding is detected: a BOM
//! decides first, then valid UTF-8, then `chardetng`'s guess.

use std::fmt;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030, GBK, UTF_8, UTF_16BE, UTF_16LE};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const UTF16LE_BOM: &[u8] = b"\xFF\xFE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 with a leading BOM
    Utf8Bom,
    /// Little-endian UTF-16 with a leading BOM
    Utf16,
    Utf16Le,
    Utf16Be,
    /// Any other encoding `encoding_rs` can both decode and encode
    Legacy(&'static Encoding),
}

impl TextEncoding {
    /// Look up an encoding by label. Unknown labels give `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => return Some(Self::Utf8),
            "utf-8-sig" | "utf8-sig" => return Some(Self::Utf8Bom),
            "utf-16" | "utf16" => return Some(Self::Utf16),
            "utf-16-le" | "utf-16le" => return Some(Self::Utf16Le),
            "utf-16-be" | "utf-16be" => return Some(Self::Utf16Be),
            _ => {}
        }
        Encoding::for_label(label.as_bytes()).and_then(Self::from_encoding)
    }

    fn from_encoding(encoding: &'static Encoding) -> Option<Self> {
        if encoding == UTF_8 {
            Some(Self::Utf8)
        } else if encoding == UTF_16LE {
            Some(Self::Utf16Le)
        } else if encoding == UTF_16BE {
            Some(Self::Utf16Be)
        } else if encoding.output_encoding() == encoding {
            Some(Self::Legacy(encoding))
        } else {
            // replacement and friends cannot be written back
            None
        }
    }

    /// Guess the encoding of `bytes`.
    pub fn detect(bytes: &[u8]) -> Self {
        if let Some((encoding, _)) = Encoding::for_bom(bytes) {
            // Either UTF-16 byte order is read back as BOM-marked UTF-16
            return if encoding == UTF_8 { Self::Utf8Bom } else { Self::Utf16 };
        }
        if std::str::from_utf8(bytes).is_ok() {
            return Self::Utf8;
        }

        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        let guess = detector.guess(None, true);
        if guess == GB18030 || guess == GBK {
            return Self::Legacy(GBK);
        }
        Self::from_encoding(guess).unwrap_or(Self::Utf8)
    }

    pub fn is_utf8(&self) -> bool {
        *self == Self::Utf8
    }

    /// Decode `bytes`, replacing malformed sequences. The flag reports
    /// whether any replacement happened.
    pub fn decode(&self, bytes: &[u8]) -> (String, bool) {
        let (text, had_errors) = match self {
            Self::Utf8 | Self::Utf8Bom => UTF_8.decode_with_bom_removal(bytes),
            Self::Utf16 => {
                let (text, _, had_errors) = UTF_16LE.decode(bytes);
                (text, had_errors)
            }
            Self::Utf16Le => UTF_16LE.decode_with_bom_removal(bytes),
            Self::Utf16Be => UTF_16BE.decode_with_bom_removal(bytes),
            Self::Legacy(encoding) => encoding.decode_without_bom_handling(bytes),
        };
        (text.into_owned(), had_errors)
    }

    /// Encode `text`. Characters the encoding cannot represent are an error.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, String> {
        let bytes = match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf8Bom => [UTF8_BOM, text.as_bytes()].concat(),
            Self::Utf16 => {
                let mut bytes = UTF16LE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
                bytes
            }
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Legacy(encoding) => {
                let (bytes, _, unmappable) = encoding.encode(text);
                if unmappable {
                    return Err(format!("Text cannot be encoded as {self}"));
                }
                bytes.into_owned()
            }
        };
        Ok(bytes)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf-8"),
            Self::Utf8Bom => f.write_str("utf-8-sig"),
            Self::Utf16 => f.write_str("utf-16"),
            Self::Utf16Le => f.write_str("utf-16-le"),
            Self::Utf16Be => f.write_str("utf-16-be"),
            Self::Legacy(encoding) => f.write_str(&encoding.name().to_ascii_lowercase()),
        }
    }
}

/// Decode file bytes for reading. A requested encoding is used when it
/// decodes cleanly; otherwise the encoding is detected.
pub(crate) fn decode_file(bytes: &[u8], requested: Option<TextEncoding>) -> (String, TextEncoding) {
    if let Some(encoding) = requested {
        let (text, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return (text, encoding);
        }
        tracing::debug!(%encoding, "File does not decode cleanly, detecting its encoding");
    }
    let detected = TextEncoding::detect(bytes);
    (detected.decode(bytes).0, detected)
}

/// Read the optional `encoding` argument. An unknown label is logged and
/// treated as absent.
pub(crate) fn requested(arguments: &serde_json::Value) -> Option<TextEncoding> {
    let label = arguments["encoding"].as_str()?;
    let encoding = TextEncoding::from_label(label);
    if encoding.is_none() {
        tracing::debug!(label, "Unknown encoding label, ignoring");
    }
    encoding
}

/// JSON schema for the `encoding` argument.
pub(crate) fn schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": format!(
            "{description} Common values: utf-8, utf-8-sig, gbk, gb2312, gb18030, utf-16, utf-16-le, utf-16-be"
        )
    })
}
