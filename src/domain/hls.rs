use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub struct MediaSegment {
    pub duration: f64,
    pub uri: String,
}

/// A parsed HLS media playlist, as written by the transcoder.
pub struct MediaPlaylist {
    pub segments: Vec<MediaSegment>,
}

fn extinf() -> &'static Regex {
    static EXTINF: OnceLock<Regex> = OnceLock::new();
    EXTINF.get_or_init(|| Regex::new(r"^#EXTINF:\s*([0-9]+(?:\.[0-9]+)?)").unwrap())
}

impl MediaPlaylist {
    /// Collects segment URIs with their `#EXTINF` durations; other tags are skipped.
    pub fn parse(content: &str) -> Self {
        let mut playlist = MediaPlaylist {
            segments: Vec::new(),
        };
        let mut pending_duration: Option<f64> = None;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(caps) = extinf().captures(line) {
                pending_duration = caps[1].parse().ok();
            } else if !line.starts_with('#') {
                playlist.segments.push(MediaSegment {
                    duration: pending_duration.take().unwrap_or(0.0),
                    uri: line.to_string(),
                });
            }
        }

        playlist
    }

    pub async fn read_from(path: &Path) -> Result<Self, std::io::Error> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    /// Duration listed for the segment whose URI ends with `file_name`.
    pub fn duration_of(&self, file_name: &str) -> Option<f64> {
        self.segments
            .iter()
            .find(|s| s.uri.rsplit('/').next() == Some(file_name))
            .map(|s| s.duration)
    }
}
