use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::services::media::{MediaError, Thumbnail};

/// Load album art referenced by an MPRIS `artUrl`.
///
/// Supports `file://` URLs and `data:` URIs. Remote URLs are not fetched.
///
/// # Errors
/// Returns `MediaError::ThumbnailUnavailable` when the art cannot be read.
pub async fn load_thumbnail(art_url: &str) -> Result<Thumbnail, MediaError> {
    let unavailable = |details: String| MediaError::ThumbnailUnavailable {
        source_uri: art_url.to_string(),
        details,
    };

    if let Some(rest) = art_url.strip_prefix("data:") {
        return decode_data_uri(rest).ok_or_else(|| unavailable("malformed data URI".into()));
    }

    let Some(encoded_path) = art_url.strip_prefix("file://") else {
        return Err(unavailable("unsupported URL scheme".into()));
    };

    let path = percent_decode(encoded_path);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    if bytes.is_empty() {
        return Err(unavailable("empty file".into()));
    }

    Ok(Thumbnail {
        content_type: content_type_for(Path::new(&path)).map(str::to_string),
        bytes,
    })
}

fn decode_data_uri(rest: &str) -> Option<Thumbnail> {
    let (header, payload) = rest.split_once(',')?;
    let content_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;

    Some(Thumbnail {
        bytes,
        content_type: (!content_type.is_empty()).then(|| content_type.to_string()),
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Decode `%XX` escapes in a file URL path. Invalid escapes are kept verbatim.
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                decoded.push(value);
                i += 3;
                continue;
            }
        }

        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
