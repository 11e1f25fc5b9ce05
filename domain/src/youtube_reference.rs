//! Extraction of video and channel identifiers from the URLs users paste.

use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?(?:youtube\.com/(?:[^/\n\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=|shorts/)|youtu\.be/)([a-zA-Z0-9_-]{11})").unwrap()
});
static CHANNEL_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/channel/([a-zA-Z0-9_-]+)").unwrap());
static CUSTOM_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:c|user)/([a-zA-Z0-9_-]+)").unwrap());
static HANDLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([a-zA-Z0-9_.-]+)").unwrap());

fn first_capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extracts the 11 character video id from any common YouTube video URL form (watch,
/// `youtu.be`, embed, `/v/`, `/e/`, shorts), with or without scheme and `www.`.
pub fn extract_video_id(reference: &str) -> Option<String> {
    first_capture(&VIDEO_ID_REGEX, reference)
}

/// How a channel URL identifies its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelReference {
    /// `/channel/<id>`, usable as is.
    Id(String),
    /// `/c/<name>` or `/user/<name>`, needs a search to resolve.
    Custom(String),
    /// `@handle`, needs a search to resolve.
    Handle(String),
}

pub fn parse_channel_reference(url: &str) -> Option<ChannelReference> {
    first_capture(&CHANNEL_ID_REGEX, url)
        .map(ChannelReference::Id)
        .or_else(|| first_capture(&CUSTOM_NAME_REGEX, url).map(ChannelReference::Custom))
        .or_else(|| first_capture(&HANDLE_REGEX, url).map(ChannelReference::Handle))
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
