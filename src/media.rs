//! Media-type helpers shared by the upload service and the CLI.
//!
//! Lookups are case-insensitive and ignore media-type parameters
//! (`image/png; charset=binary` is `image/png`).

use std::path::Path;

/// Fallback for names without a known extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media types the upload transform runs on. Everything else is stored as-is.
const TRANSFORMABLE: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/tiff",
    "image/gif",
    "image/bmp",
];

const CONTENT_TYPES: &[(&str, &str)] = &[
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("psd", "image/vnd.adobe.photoshop"),
    // Documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("eps", "application/postscript"),
    ("ai", "application/postscript"),
    // Text and web
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Archives
    ("zip", "application/zip"),
    ("rar", "application/x-rar-compressed"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
    ("7z", "application/x-7z-compressed"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("aiff", "audio/aiff"),
    // Video
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("m4v", "video/x-m4v"),
];

/// Lowercased media type without parameters.
pub(crate) fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether uploads of this type go through the resize/cutout transform.
pub fn is_transformable(media_type: &str) -> bool {
    TRANSFORMABLE.contains(&essence(media_type).as_str())
}

/// Any `image/*` type. Thumbnails are only attempted for these.
pub fn is_image_content_type(media_type: &str) -> bool {
    essence(media_type)
        .strip_prefix("image/")
        .is_some_and(|sub| !sub.is_empty())
}

/// Guess a media type from a file name's extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, media_type)| *media_type)
        .unwrap_or(OCTET_STREAM)
}

/// Object key for a transformed upload: the last extension becomes `.png`.
///
/// Any directory prefix is kept. Names without an extension gain one.
pub fn png_object_key(file_name: &str) -> String {
    let (dir, base) = match file_name.rfind('/') {
        Some(i) => file_name.split_at(i + 1),
        None => ("", file_name),
    };
    let stem = match base.rfind('.') {
        Some(i) if i > 0 => &base[..i],
        _ => base,
    };
    format!("{dir}{stem}.png")
}
