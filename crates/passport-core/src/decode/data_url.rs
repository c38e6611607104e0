//! `data:` URL handling.
//!
//! Uploaded files reach the editor as base64 data URLs. Only the base64
//! form is accepted; percent-encoded payloads are rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{decode_image, DecodeError, DecodedImage};

/// MIME type assumed when the data URL header omits one.
pub const DEFAULT_DATA_URL_MIME: &str = "image/png";

/// A data URL split into its MIME type and decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse `data:<mime>;base64,<payload>`.
    pub fn parse(url: &str) -> Result<Self, DecodeError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| DecodeError::InvalidDataUrl("missing data: scheme".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::InvalidDataUrl("missing ',' separator".to_string()))?;

        let mut params = header.split(';');
        let mime = params.next().unwrap_or_default().trim();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(DecodeError::InvalidDataUrl(
                "only base64 payloads are supported".to_string(),
            ));
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DecodeError::InvalidDataUrl(e.to_string()))?;

        Ok(Self {
            mime: if mime.is_empty() {
                DEFAULT_DATA_URL_MIME.to_string()
            } else {
                mime.to_string()
            },
            bytes,
        })
    }

    /// Build a base64 data URL from raw bytes.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }
}

/// Decode the image carried by a data URL.
pub fn decode_data_url(url: &str) -> Result<DecodedImage, DecodeError> {
    let parsed = DataUrl::parse(url)?;
    decode_image(&parsed.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_mime() {
        let url = DataUrl::encode("image/jpeg", &[1, 2, 3, 4]);
        let parsed = DataUrl::parse(&url).unwrap();
        assert_eq!(parsed.mime, "image/jpeg");
        assert_eq!(parsed.bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_parse_defaults_mime() {
        let parsed = DataUrl::parse("data:;base64,AQID").unwrap();
        assert_eq!(parsed.mime, DEFAULT_DATA_URL_MIME);
        assert_eq!(parsed.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_rejects_non_data_url() {
        assert!(matches!(
            DataUrl::parse("blob:https://example.test/123"),
            Err(DecodeError::InvalidDataUrl(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(DataUrl::parse("data:image/png;base64").is_err());
    }

    #[test]
    fn test_parse_rejects_plain_payload() {
        assert!(DataUrl::parse("data:text/plain,hello").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_decode_data_url_png() {
        let img = image::RgbImage::from_pixel(5, 7, image::Rgb([9, 8, 7]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();

        let url = DataUrl::encode("image/png", buf.get_ref());
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.dimensions(), (5, 7));
    }
}
