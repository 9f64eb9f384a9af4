use crate::types::UNTITLED_SERMON;

pub const MAX_STEM_CHARS: usize = 251;
pub const AUDIO_EXTENSION: &str = ".mp3";

const ILLEGAL: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Filesystem-safe stem for a sermon title, without extension.
///
/// Strips characters that are illegal in paths, trims surrounding whitespace and
/// keeps at most [`MAX_STEM_CHARS`] bytes, cut on a character boundary, so the
/// final name stays within the common 255-byte component limit. Empty results
/// fall back to [`UNTITLED_SERMON`].
pub fn sanitize_stem(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| !ILLEGAL.contains(c)).collect();
    let cleaned = cleaned.trim();

    let mut end = cleaned.len().min(MAX_STEM_CHARS);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    // Truncation can expose trailing whitespace again.
    let stem = cleaned[..end].trim_end();

    if stem.is_empty() {
        UNTITLED_SERMON.to_string()
    } else {
        stem.to_string()
    }
}

/// File name for a sermon title: sanitized stem plus `.mp3`.
pub fn sanitize_filename(title: &str) -> String {
    format!("{}{}", sanitize_stem(title), AUDIO_EXTENSION)
}
