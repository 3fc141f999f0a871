//! YouTube caption source.
//!
//! Uses `yt-dlp --dump-json` to discover caption tracks, then downloads the
//! chosen track in YouTube's `json3` format and flattens it to plain text.

use super::{TranscriptSource, VideoRef};
use crate::chunking::normalize_whitespace;
use crate::config::TranscriptSettings;
use crate::error::{Result, VidaskError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// A caption track chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language: String,
    pub url: String,
    /// Whether the track was generated by speech recognition.
    pub automatic: bool,
}

/// YouTube transcript source.
pub struct YoutubeTranscriptSource {
    languages: Vec<String>,
    preserve_formatting: bool,
    http: reqwest::Client,
    tag_regex: Regex,
}

impl YoutubeTranscriptSource {
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            languages: settings.languages.clone(),
            preserve_formatting: settings.preserve_formatting,
            http,
            tag_regex: Regex::new(r"</?[a-zA-Z][^>]*>").expect("Invalid regex"),
        })
    }

    /// Fetch video info JSON using yt-dlp.
    async fn fetch_info(&self, video: &VideoRef) -> Result<serde_json::Value> {
        let url = video.watch_url();

        let output = Command::new("yt-dlp")
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VidaskError::Upstream(
                        "yt-dlp not found. Please install it and ensure it's in your PATH."
                            .to_string(),
                    )
                } else {
                    VidaskError::Upstream(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidaskError::NotFound(format!(
                "Video {} not found or unavailable: {}",
                video.id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| VidaskError::Upstream(format!("Failed to parse yt-dlp output: {}", e)))
    }

    /// Flatten a json3 caption document to text.
    pub fn parse_json3(&self, body: &str) -> Result<String> {
        let document: Json3Document = serde_json::from_str(body)
            .map_err(|e| VidaskError::Upstream(format!("Unreadable caption document: {}", e)))?;

        let text = document
            .events
            .iter()
            .filter_map(|event| event.segs.as_ref())
            .map(|segs| segs.iter().map(|s| s.utf8.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");

        let text = if self.preserve_formatting {
            text
        } else {
            self.tag_regex.replace_all(&text, "").into_owned()
        };

        Ok(normalize_whitespace(&text))
    }
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Pick the best json3 caption track for the preferred languages.
///
/// Manual subtitles win over automatic captions for the same language, and
/// `en` also matches regional variants such as `en-US`.
pub fn select_caption_track(
    info: &serde_json::Value,
    languages: &[String],
) -> Result<CaptionTrack> {
    let manual = info["subtitles"].as_object();
    let automatic = info["automatic_captions"].as_object();

    let has_any = manual.is_some_and(|m| !m.is_empty()) || automatic.is_some_and(|a| !a.is_empty());
    if !has_any {
        let id = info["id"].as_str().unwrap_or("unknown");
        return Err(VidaskError::TranscriptDisabled(id.to_string()));
    }

    for language in languages {
        for (tracks, is_automatic) in [(manual, false), (automatic, true)] {
            let Some(tracks) = tracks else { continue };

            let mut keys: Vec<&String> = tracks
                .keys()
                .filter(|key| {
                    *key == language || key.starts_with(&format!("{}-", language))
                })
                .collect();
            // Exact match first, then regional variants alphabetically.
            keys.sort_by_key(|key| (*key != language, (*key).clone()));

            for key in keys {
                let json3_url = tracks[key.as_str()]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .find(|format| format["ext"].as_str() == Some("json3"))
                    .and_then(|format| format["url"].as_str());

                if let Some(url) = json3_url {
                    return Ok(CaptionTrack {
                        language: key.clone(),
                        url: url.to_string(),
                        automatic: is_automatic,
                    });
                }
            }
        }
    }

    Err(VidaskError::NotFound(
        "Transcript not found for this video.".to_string(),
    ))
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self), fields(video_id = %video.id))]
    async fn fetch(&self, video: &VideoRef) -> Result<String> {
        let info = self.fetch_info(video).await?;
        let track = select_caption_track(&info, &self.languages)?;
        info!(
            "Using {} captions ({})",
            track.language,
            if track.automatic { "automatic" } else { "manual" }
        );

        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .map_err(|e| VidaskError::Upstream(format!("Transcript could not be fetched: {}", e)))?;

        if !response.status().is_success() {
            return Err(VidaskError::Upstream(format!(
                "Transcript could not be fetched: HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let text = self.parse_json3(&body)?;
        debug!("Transcript has {} characters", text.len());

        if text.is_empty() {
            return Err(VidaskError::NotFound(
                "Transcript is empty after fetch/clean.".to_string(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(preserve_formatting: bool) -> YoutubeTranscriptSource {
        YoutubeTranscriptSource::new(&TranscriptSettings {
            preserve_formatting,
            ..TranscriptSettings::default()
        })
        .unwrap()
    }

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "segs": [{"utf8": "Hello"}, {"utf8": " <i>there</i>"}]},
                {"tStartMs": 900},
                {"tStartMs": 1000, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 1500, "segs": [{"utf8": "general   Kenobi"}]}
            ]
        }"#;

        assert_eq!(source(false).parse_json3(body).unwrap(), "Hello there general Kenobi");
        assert_eq!(
            source(true).parse_json3(body).unwrap(),
            "Hello <i>there</i> general Kenobi"
        );
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(matches!(
            source(false).parse_json3("<html>"),
            Err(VidaskError::Upstream(_))
        ));
    }

    #[test]
    fn test_prefers_manual_subtitles() {
        let info = json!({
            "id": "dQw4w9WgXcQ",
            "subtitles": {
                "en": [{"ext": "vtt", "url": "manual-vtt"}, {"ext": "json3", "url": "manual-json3"}]
            },
            "automatic_captions": {
                "en": [{"ext": "json3", "url": "auto-json3"}]
            }
        });

        let track = select_caption_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.url, "manual-json3");
        assert!(!track.automatic);
    }

    #[test]
    fn test_falls_back_to_automatic_and_regional() {
        let info = json!({
            "id": "dQw4w9WgXcQ",
            "subtitles": {"de": [{"ext": "json3", "url": "de"}]},
            "automatic_captions": {
                "en-US": [{"ext": "json3", "url": "auto-en-us"}],
                "fr": [{"ext": "json3", "url": "auto-fr"}]
            }
        });

        let track = select_caption_track(&info, &langs(&["en", "fr"])).unwrap();
        assert_eq!(track.url, "auto-en-us");
        assert_eq!(track.language, "en-US");
        assert!(track.automatic);

        let track = select_caption_track(&info, &langs(&["es", "de"])).unwrap();
        assert_eq!(track.url, "de");
    }

    #[test]
    fn test_no_captions_is_disabled() {
        let info = json!({"id": "dQw4w9WgXcQ", "subtitles": {}, "automatic_captions": {}});
        assert!(matches!(
            select_caption_track(&info, &langs(&["en"])),
            Err(VidaskError::TranscriptDisabled(_))
        ));
    }

    #[test]
    fn test_missing_language_is_not_found() {
        let info = json!({
            "id": "dQw4w9WgXcQ",
            "automatic_captions": {"ja": [{"ext": "json3", "url": "ja"}]}
        });
        assert!(matches!(
            select_caption_track(&info, &langs(&["en"])),
            Err(VidaskError::NotFound(_))
        ));
    }
}
