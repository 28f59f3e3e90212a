use serde::Serialize;

/// Codec family decodable by the broadest range of downstream players.
pub const PREFERRED_VIDEO_CODEC: &str = "avc1";

/// Audio container that muxes with an `avc1`/mp4 video leg without re-encoding.
pub const PREFERRED_AUDIO_CONTAINER: &str = "mp4";

/// One encoding of a media item. `url` is short-lived and is never kept
/// beyond the resolution that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub itag: Option<i64>,
    pub mime_type: String,
    pub container: String,
    pub codec_tag: String,
    pub is_video: bool,
    pub is_audio: bool,
    pub height: Option<u32>,
    pub bitrate: Option<u64>,
    pub content_length: Option<u64>,
    #[serde(skip)]
    pub url: String,
}

impl FormatDescriptor {
    /// Splits `video/mp4; codecs="avc1.4d401e, mp4a.40.2"` into
    /// `(container, codecs)`.
    pub fn split_mime(mime_type: &str) -> (String, Vec<String>) {
        let mut parts = mime_type.splitn(2, ';');
        let base = parts.next().unwrap_or("").trim();
        let container = base.split('/').nth(1).unwrap_or("").to_lowercase();

        let codecs = parts
            .next()
            .and_then(|params| params.split_once("codecs="))
            .map(|(_, list)| {
                list.trim_matches(|c: char| c == '"' || c.is_whitespace())
                    .split(',')
                    .map(|c| c.trim().trim_matches('"').to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        (container, codecs)
    }

    /// `avc1.640028` -> `avc1`.
    pub fn codec_family(&self) -> String {
        self.codec_tag
            .split('.')
            .next()
            .unwrap_or("")
            .to_lowercase()
    }

    pub fn is_muxed(&self) -> bool {
        self.is_video && self.is_audio
    }

    fn video_only(&self) -> bool {
        self.is_video && !self.is_audio
    }

    fn audio_only(&self) -> bool {
        self.is_audio && !self.is_video
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// Upper bound on video height; `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualityCeiling(pub Option<u32>);

impl QualityCeiling {
    pub const HIGHEST: Self = Self(None);

    /// Accepts `highest`, `best`, `1080`, `720p` and the empty string.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "" | "highest" | "best" | "max" => Some(Self::HIGHEST),
            other => other
                .strip_suffix('p')
                .unwrap_or(other)
                .parse::<u32>()
                .ok()
                .map(|h| Self(Some(h))),
        }
    }

    /// Descriptors without a declared height never exceed a ceiling.
    pub fn allows(&self, height: Option<u32>) -> bool {
        match (self.0, height) {
            (Some(max), Some(h)) => h <= max,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamResolution {
    Single(FormatDescriptor),
    Dual {
        video: FormatDescriptor,
        audio: FormatDescriptor,
    },
}

/// First strictly-greater wins, so ties keep declaration order.
fn best_by<'a, K, I, F>(iter: I, key: F) -> Option<&'a FormatDescriptor>
where
    I: Iterator<Item = &'a FormatDescriptor>,
    K: Ord,
    F: Fn(&FormatDescriptor) -> K,
{
    let mut best: Option<(&'a FormatDescriptor, K)> = None;
    for descriptor in iter {
        let k = key(descriptor);
        let replace = match &best {
            Some((_, best_key)) => k > *best_key,
            None => true,
        };
        if replace {
            best = Some((descriptor, k));
        }
    }
    best.map(|(d, _)| d)
}

fn height_key(d: &FormatDescriptor) -> u32 {
    d.height.unwrap_or(0)
}

fn bitrate_key(d: &FormatDescriptor) -> u64 {
    d.bitrate.unwrap_or(0)
}

/// Best video-only descriptor at or below `ceiling`, preferring the
/// widely-compatible codec family.
pub fn select_video(
    descriptors: &[FormatDescriptor],
    ceiling: QualityCeiling,
) -> Option<&FormatDescriptor> {
    let qualifying = || {
        descriptors
            .iter()
            .filter(move |d| d.video_only() && ceiling.allows(d.height))
    };

    best_by(
        qualifying().filter(|d| d.codec_family() == PREFERRED_VIDEO_CODEC),
        height_key,
    )
    .or_else(|| best_by(qualifying(), height_key))
}

/// Best audio-only descriptor, preferring the re-mux friendly container.
pub fn select_audio(descriptors: &[FormatDescriptor]) -> Option<&FormatDescriptor> {
    let audio = || descriptors.iter().filter(|d| d.audio_only());

    best_by(
        audio().filter(|d| d.container == PREFERRED_AUDIO_CONTAINER),
        bitrate_key,
    )
    .or_else(|| best_by(audio(), bitrate_key))
}

/// Best descriptor carrying both legs at or below `ceiling`.
pub fn select_muxed(
    descriptors: &[FormatDescriptor],
    ceiling: QualityCeiling,
) -> Option<&FormatDescriptor> {
    let qualifying = || {
        descriptors
            .iter()
            .filter(move |d| d.is_muxed() && ceiling.allows(d.height))
    };

    best_by(
        qualifying().filter(|d| d.codec_family() == PREFERRED_VIDEO_CODEC),
        height_key,
    )
    .or_else(|| best_by(qualifying(), height_key))
}

/// Composes the selectors into a resolution for the requested kind.
pub fn select_stream(
    descriptors: &[FormatDescriptor],
    kind: StreamKind,
    ceiling: QualityCeiling,
) -> Option<StreamResolution> {
    match kind {
        StreamKind::Audio => select_audio(descriptors)
            .or_else(|| best_by(descriptors.iter().filter(|d| d.is_muxed()), bitrate_key))
            .cloned()
            .map(StreamResolution::Single),
        StreamKind::Video => {
            if let (Some(video), Some(audio)) =
                (select_video(descriptors, ceiling), select_audio(descriptors))
            {
                return Some(StreamResolution::Dual {
                    video: video.clone(),
                    audio: audio.clone(),
                });
            }
            select_muxed(descriptors, ceiling)
                .cloned()
                .map(StreamResolution::Single)
        }
    }
}
