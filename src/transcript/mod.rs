//! Transcript acquisition.
//!
//! A [`TranscriptSource`] turns a parsed video reference into cleaned
//! transcript text. The YouTube implementation reads captions through yt-dlp.

mod youtube;

pub use youtube::YoutubeTranscriptSource;

use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// A validated reference to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// Platform video identifier (11 characters for YouTube).
    pub id: String,
    /// The URL or id as submitted, trimmed.
    pub url: String,
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"))
}

impl VideoRef {
    /// Parse a YouTube URL or bare video id.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VidaskError::InvalidInput(
                "Video URL cannot be empty".to_string(),
            ));
        }

        let id = extract_video_id(input).ok_or_else(|| {
            VidaskError::InvalidInput(format!("Could not extract video ID from URL: {}", input))
        })?;

        Ok(Self {
            id,
            url: input.to_string(),
        })
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

fn extract_video_id(input: &str) -> Option<String> {
    if video_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") | Some("shorts") | Some("v") | Some("live") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    video_id_regex()
        .is_match(&candidate)
        .then_some(candidate)
}

/// Source of transcript text for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the cleaned transcript for `video`.
    ///
    /// Fails with `NotFound` when no transcript exists (or it is empty after
    /// cleaning), `TranscriptDisabled` when captions are turned off and
    /// `Upstream` when the platform cannot be reached.
    async fn fetch(&self, video: &VideoRef) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_formats() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42s",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "  dQw4w9WgXcQ  ",
        ];

        for case in cases {
            let video = VideoRef::parse(case).unwrap();
            assert_eq!(video.id, "dQw4w9WgXcQ", "input: {}", case);
            assert_eq!(video.url, case.trim());
        }
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for case in [
            "",
            "   ",
            "not-a-video-id",
            "https://example.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=short",
            "https://www.youtube.com/playlist?list=PLtest",
        ] {
            assert!(
                matches!(VideoRef::parse(case), Err(VidaskError::InvalidInput(_))),
                "input: {:?}",
                case
            );
        }
    }

    #[test]
    fn test_watch_url() {
        let video = VideoRef::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
