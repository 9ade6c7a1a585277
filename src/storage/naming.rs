use chrono::Utc;
use uuid::Uuid;

/// Extension for a declared media type, used when the original filename has none.
pub fn extension_for_media_type(media_type: &str) -> Option<&'static str> {
    let essence = media_type.split(';').next().unwrap_or(media_type).trim();
    match essence.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/bmp" => Some("bmp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        "image/heic" => Some("heic"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        "video/ogg" => Some("ogv"),
        _ => None,
    }
}

/// Longest client-supplied extension kept in a generated filename.
pub const MAX_EXTENSION_LEN: usize = 10;

/// The original filename's extension, lowercased. Only short ASCII
/// alphanumeric extensions are accepted.
pub fn extension_from_filename(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (stem, ext) = base.rsplit_once('.')?;
    let ext = ext.trim();
    let acceptable = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    acceptable.then(|| ext.to_ascii_lowercase())
}

/// Filename extension first, then the media-type table. A miss on both
/// yields no extension at all.
pub fn resolve_extension(file_name: &str, media_type: &str) -> Option<String> {
    extension_from_filename(file_name)
        .or_else(|| extension_for_media_type(media_type).map(str::to_string))
}

/// `<unix-millis>-<uuid-v4>[.<ext>]`
pub fn generate_filename(original_filename: &str, media_type: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let id = Uuid::new_v4();
    match resolve_extension(original_filename, media_type) {
        Some(ext) => format!("{timestamp}-{id}.{ext}"),
        None => format!("{timestamp}-{id}"),
    }
}

/// Swaps the extension of `file_name` for `ext`, appending one if absent.
pub fn replace_extension(file_name: &str, ext: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() && !stem.ends_with(['/', '\\']) => stem,
        _ => file_name,
    };
    format!("{stem}.{ext}")
}
