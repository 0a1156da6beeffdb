//! Playlist rewriting and proxied-reference encoding.
//!
//! Rewrites every playable reference in an HLS playlist into an opaque
//! same-origin URL so the client never talks to the origin directly. The
//! pass is line-oriented: line count and ordering are preserved, and no
//! byte outside a matched reference span changes.

use thiserror::Error;
use url::Url;

/// Route that relays proxied references back through the origin.
pub const SEGMENT_ROUTE: &str = "/segment";

/// Content type for playlists served to clients.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// File extension that marks a sub-playlist reference.
const PLAYLIST_EXTENSION: &str = ".m3u8";

/// Prefix of every rewritten reference.
const PROXIED_PREFIX: &str = "/segment?ref=";

/// Errors from playlist handling and reference decoding.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The fetched body is not an HLS playlist.
    #[error("not a playlist: {reason}")]
    NotAPlaylist {
        /// Why the body was rejected
        reason: String,
    },

    /// A proxied reference did not decode to an absolute http(s) URL.
    #[error("invalid proxied reference: {reason}")]
    InvalidReference {
        /// Why the reference was rejected
        reason: String,
    },
}

/// Encodes an absolute origin URL as a same-origin segment-route path.
///
/// The encoding is a plain percent-encoding of the full URL carried in the
/// `ref` query parameter: lossless, reversible, and free of ambiguity with
/// query delimiters.
pub fn encode_reference(target: &Url) -> String {
    format!("{SEGMENT_ROUTE}?ref={}", urlencoding::encode(target.as_str()))
}

/// Decodes the raw `ref` query value of a segment request back to the
/// absolute origin URL that produced it.
///
/// Expects the still-percent-encoded value; decoding happens exactly once,
/// here.
///
/// # Errors
/// - `ManifestError::InvalidReference` - not valid percent-encoded UTF-8, not
///   an absolute URL, or not an http(s) URL
pub fn decode_reference(raw: &str) -> Result<Url, ManifestError> {
    let decoded = urlencoding::decode(raw).map_err(|e| ManifestError::InvalidReference {
        reason: e.to_string(),
    })?;
    let target = Url::parse(&decoded).map_err(|e| ManifestError::InvalidReference {
        reason: e.to_string(),
    })?;
    match target.scheme() {
        "http" | "https" => Ok(target),
        other => Err(ManifestError::InvalidReference {
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Checks that a fetched body is an HLS playlist before rewriting it.
///
/// # Errors
/// - `ManifestError::NotAPlaylist` - the body does not start with `#EXTM3U`
pub fn validate(body: &str) -> Result<(), ManifestError> {
    let head = body.trim_start_matches('\u{feff}').trim_start();
    if head.starts_with("#EXTM3U") {
        Ok(())
    } else {
        Err(ManifestError::NotAPlaylist {
            reason: "missing #EXTM3U header".to_string(),
        })
    }
}

/// Whether a relay target is itself a playlist, judged by the URL's file
/// extension or by the origin-reported content type.
pub fn is_playlist_target(target: &Url, content_type: Option<&str>) -> bool {
    if target.path().ends_with(PLAYLIST_EXTENSION) {
        return true;
    }
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("mpegurl"))
}

/// Rewrites every playable reference in `playlist` into a same-origin
/// proxied URL, resolving relative references against `base`.
///
/// Tag, blank, and non-reference payload lines pass through byte-for-byte;
/// line count and ordering never change. Lines already pointing at the
/// segment route are left alone, so a second pass over rewritten output is
/// a no-op.
pub fn rewrite(playlist: &str, base: &Url) -> String {
    playlist
        .split('\n')
        .map(|raw| rewrite_line(raw, base))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One classified playlist line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Empty or whitespace-only.
    Blank,
    /// Comment or metadata tag (leading `#`).
    Tag,
    /// A playable reference to rewrite.
    Reference(&'a str),
    /// Payload line that is not a playable reference.
    Plain,
}

/// Classifies a playlist line (without its line terminator).
///
/// A reference is an absolute http(s) URL on its own line, or a bare path
/// whose file name ends in the playlist extension; sub-playlist references
/// are commonly relative paths on their own line.
fn classify(line: &str) -> Line<'_> {
    let token = line.trim();
    if token.is_empty() {
        return Line::Blank;
    }
    if token.starts_with('#') {
        return Line::Tag;
    }
    if token.starts_with(PROXIED_PREFIX) {
        // Already proxied; rewriting must stay idempotent.
        return Line::Plain;
    }
    if token.starts_with("http://") || token.starts_with("https://") {
        return Line::Reference(token);
    }
    if is_subplaylist_path(token) {
        return Line::Reference(token);
    }
    Line::Plain
}

fn is_subplaylist_path(token: &str) -> bool {
    let path = token.split(['?', '#']).next().unwrap_or(token);
    path.ends_with(PLAYLIST_EXTENSION)
}

fn rewrite_line(raw: &str, base: &Url) -> String {
    let (line, terminator) = match raw.strip_suffix('\r') {
        Some(stripped) => (stripped, "\r"),
        None => (raw, ""),
    };

    let Line::Reference(token) = classify(line) else {
        return raw.to_string();
    };

    let Ok(absolute) = base.join(token) else {
        // Unresolvable references pass through untouched rather than
        // corrupting the playlist structure.
        return raw.to_string();
    };

    // Replace only the reference span; surrounding whitespace survives.
    let start = line.len() - line.trim_start().len();
    let end = start + token.len();
    format!(
        "{}{}{}{}",
        &line[..start],
        encode_reference(&absolute),
        &line[end..],
        terminator
    )
}
