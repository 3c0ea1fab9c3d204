//! Cover image payloads.
//!
//! The drafting application stores the generated cover as a `data:` URL. Raw
//! base64 without the `data:` prefix is accepted too; its type is sniffed
//! from the magic bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// An encoded raster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoverImage {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl CoverImage {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Decode a `data:image/...;base64,` URL or bare base64.
    pub fn from_data_url(url: &str) -> Result<Self, Error> {
        let url = url.trim();
        let (declared, payload) = match url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| Error::InvalidCover("data URL has no payload".to_string()))?;
                let Some(media_type) = header.strip_suffix(";base64") else {
                    return Err(Error::InvalidCover(
                        "only base64 data URLs are supported".to_string(),
                    ));
                };
                (Some(media_type.to_string()), payload)
            }
            None => (None, url),
        };

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::InvalidCover(e.to_string()))?;

        let media_type = match declared.filter(|t| !t.is_empty()) {
            Some(media_type) => media_type,
            None => sniff_media_type(&data)
                .ok_or_else(|| Error::InvalidCover("unrecognized image data".to_string()))?
                .to_string(),
        };

        if !media_type.starts_with("image/") {
            return Err(Error::InvalidCover(format!("not an image: {media_type}")));
        }

        Ok(Self { media_type, data })
    }

    /// Re-encode as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.data))
    }

    /// File extension matching the media type.
    pub fn extension(&self) -> &'static str {
        match self.media_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            _ => "png",
        }
    }
}

impl TryFrom<String> for CoverImage {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_url(&value)
    }
}

impl From<CoverImage> for String {
    fn from(cover: CoverImage) -> Self {
        cover.to_data_url()
    }
}

/// Read an optional cover, treating a blank or undecodable value as no cover.
///
/// Only EPUB uses the cover, so a bad one must not keep the rest of the book
/// from loading.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<CoverImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match CoverImage::from_data_url(&raw) {
        Ok(cover) => Ok(Some(cover)),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unusable cover image");
            Ok(None)
        }
    }
}

fn sniff_media_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.starts_with(b"GIF8") {
        Some("image/gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(PNG_HEADER));
        let cover = CoverImage::from_data_url(&url).unwrap();
        assert_eq!(cover.media_type, "image/png");
        assert_eq!(cover.data, PNG_HEADER);
        assert_eq!(cover.extension(), "png");
        assert_eq!(cover.to_data_url(), url);
    }

    #[test]
    fn test_decode_bare_base64_sniffs_type() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 16];
        let cover = CoverImage::from_data_url(&STANDARD.encode(jpeg)).unwrap();
        assert_eq!(cover.media_type, "image/jpeg");
        assert_eq!(cover.extension(), "jpg");
    }

    #[test]
    fn test_reject_non_image() {
        let url = format!("data:text/plain;base64,{}", STANDARD.encode("hi"));
        assert!(matches!(
            CoverImage::from_data_url(&url),
            Err(Error::InvalidCover(_))
        ));
        assert!(CoverImage::from_data_url("data:image/png,raw").is_err());
        assert!(CoverImage::from_data_url("!!not base64!!").is_err());
    }
}
