//! Destination naming: Content-Disposition parsing, sanitizing and fallbacks.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use url::Url;

/// Parses a Content-Disposition header to extract the filename.
///
/// Handles:
/// - `attachment; filename="example.mp4"`
/// - `attachment; filename=example.mp4`
/// - `attachment; filename*=UTF-8''example%20file.mp4` (RFC 5987, any charset)
///
/// The extended form wins when both are present. Percent-escapes are decoded
/// in both forms. Returns `None` for an absent or empty filename.
#[must_use]
pub fn parse_content_disposition(header: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid for slicing `header`.
    let lower = header.to_ascii_lowercase();

    if let Some(pos) = lower.find("filename*=") {
        let value = header[pos + 10..].split(';').next().unwrap_or_default().trim();
        let mut parts = value.splitn(3, '\'');
        if let (Some(_charset), Some(_language), Some(encoded)) =
            (parts.next(), parts.next(), parts.next())
        {
            let decoded = percent_decode(encoded);
            let name = decoded.trim().trim_matches(['"', '\'']);
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    let pos = lower.find("filename=")?;
    let value = header[pos + 9..].trim_start();
    let raw = match value.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default(),
        None => value.split(';').next().unwrap_or_default(),
    };
    let raw = raw.trim().trim_matches(['"', '\'']);
    if raw.is_empty() {
        return None;
    }
    Some(percent_decode(raw).into_owned())
}

fn percent_decode(value: &str) -> Cow<'_, str> {
    urlencoding::decode(value).unwrap_or(Cow::Borrowed(value))
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Name used when the server does not send one.
///
/// `cdvl_video_{id}.bin` when the id is known; otherwise the third-from-last
/// URL path segment (`.../<id>/<token>/<name>` style links), else
/// `cdvl_video_unknown.bin`.
#[must_use]
pub fn fallback_filename(content_id: Option<u64>, url: &Url) -> String {
    if let Some(id) = content_id {
        return format!("cdvl_video_{id}.bin");
    }
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() >= 3 {
        let segment = percent_decode(segments[segments.len() - 3]);
        return format!("cdvl_video_{}.bin", sanitize_filename(&segment));
    }
    "cdvl_video_unknown.bin".to_string()
}

/// Picks the destination path.
///
/// Priority: explicit path (absolute, or relative to `output_dir`), then the
/// sanitized server filename, then [`fallback_filename`].
#[must_use]
pub fn resolve_final_path(
    output_dir: &Path,
    explicit: Option<&Path>,
    server_filename: Option<&str>,
    content_id: Option<u64>,
    url: &Url,
) -> PathBuf {
    if let Some(path) = explicit {
        return if path.is_absolute() {
            path.to_path_buf()
        } else {
            output_dir.join(path)
        };
    }
    if let Some(name) = server_filename
        .map(sanitize_filename)
        .filter(|name| !name.trim_matches('_').is_empty())
    {
        return output_dir.join(name);
    }
    output_dir.join(fallback_filename(content_id, url))
}
