use serde_json::{Value, json};

use super::{ClientProfile, PlayerData};
use crate::sources::youtube::formats::FormatDescriptor;

/// Builds the InnerTube request context for a profile.
pub fn build_context(profile: &ClientProfile, visitor_data: Option<&str>) -> Value {
    let mut client = json!({
        "clientName": profile.client_name,
        "clientVersion": profile.client_version,
        "userAgent": profile.user_agent,
        "hl": "en",
        "gl": "US",
        "utcOffsetMinutes": 0
    });

    if let Some(obj) = client.as_object_mut() {
        let optional = [
            ("deviceMake", profile.device_make),
            ("deviceModel", profile.device_model),
            ("osName", profile.os_name),
            ("osVersion", profile.os_version),
            ("platform", profile.platform),
            ("visitorData", visitor_data),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                obj.insert(key.to_string(), v.into());
            }
        }
        if let Some(sdk) = profile.android_sdk_version {
            obj.insert("androidSdkVersion".to_string(), sdk.into());
        }
    }

    let mut context = json!({
        "client": client,
        "user": { "lockedSafetyMode": false },
        "request": { "useSsl": true }
    });

    if let Some(embed_url) = profile.embed_url {
        if let Some(obj) = context.as_object_mut() {
            obj.insert("thirdParty".to_string(), json!({ "embedUrl": embed_url }));
        }
    }

    context
}

/// Applies the identity headers a profile presents on every InnerTube call.
pub fn with_identity(
    mut req: reqwest::RequestBuilder,
    profile: &ClientProfile,
    visitor_data: Option<&str>,
) -> reqwest::RequestBuilder {
    req = req
        .header(reqwest::header::USER_AGENT, profile.user_agent)
        .header("X-YouTube-Client-Name", profile.client_id.to_string())
        .header("X-YouTube-Client-Version", profile.client_version);

    if let Some(vd) = visitor_data {
        req = req.header("X-Goog-Visitor-Id", vd);
    }
    for (name, value) in profile.extra_headers {
        req = req.header(*name, *value);
    }
    req
}

/// Reads `playabilityStatus`; `Err(reason)` when the item is not playable.
pub fn check_playability(body: &Value) -> Result<(), String> {
    let status = body
        .get("playabilityStatus")
        .and_then(|p| p.get("status"))
        .and_then(|s| s.as_str())
        .unwrap_or("UNKNOWN");

    if status == "OK" {
        return Ok(());
    }

    let reason = body
        .get("playabilityStatus")
        .and_then(|p| p.get("reason"))
        .and_then(|r| r.as_str())
        .unwrap_or("no reason provided");
    Err(format!("status={}, reason={}", status, reason))
}

/// Numbers arrive either as JSON numbers or as decimal strings.
fn as_u64(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse::<u64>().ok()))
}

/// Parses one entry of `formats` / `adaptiveFormats`. Entries without a plain
/// `url` (signature-ciphered) are unusable here and yield `None`.
pub fn parse_descriptor(format: &Value, muxed: bool) -> Option<FormatDescriptor> {
    let url = format.get("url").and_then(|u| u.as_str())?;
    if url.is_empty() {
        return None;
    }

    let mime_type = format.get("mimeType").and_then(|m| m.as_str())?;
    let (container, codecs) = FormatDescriptor::split_mime(mime_type);

    let has_video = mime_type.starts_with("video/");
    let has_audio = mime_type.starts_with("audio/")
        || (has_video && (muxed || codecs.len() > 1 || format.get("audioQuality").is_some()));

    Some(FormatDescriptor {
        itag: format.get("itag").and_then(|v| v.as_i64()),
        mime_type: mime_type.to_string(),
        container,
        codec_tag: codecs.first().cloned().unwrap_or_default(),
        is_video: has_video,
        is_audio: has_audio,
        height: as_u64(format.get("height")).and_then(|h| u32::try_from(h).ok()),
        bitrate: as_u64(format.get("bitrate")).or_else(|| as_u64(format.get("averageBitrate"))),
        content_length: as_u64(format.get("contentLength")),
        url: url.to_string(),
    })
}

/// Turns a player response into `PlayerData`, or a rejection reason.
pub fn extract_player_data(body: &Value) -> Result<PlayerData, String> {
    check_playability(body)?;

    let streaming_data = body
        .get("streamingData")
        .ok_or_else(|| "no streamingData in response".to_string())?;

    let muxed = streaming_data
        .get("formats")
        .and_then(|f| f.as_array())
        .into_iter()
        .flatten()
        .filter_map(|f| parse_descriptor(f, true));
    let adaptive = streaming_data
        .get("adaptiveFormats")
        .and_then(|f| f.as_array())
        .into_iter()
        .flatten()
        .filter_map(|f| parse_descriptor(f, false));

    let descriptors: Vec<FormatDescriptor> = adaptive.chain(muxed).collect();
    if descriptors.is_empty() {
        return Err("no descriptor with a usable url".to_string());
    }

    let details = body.get("videoDetails");
    Ok(PlayerData {
        descriptors,
        duration_seconds: as_u64(details.and_then(|d| d.get("lengthSeconds"))).unwrap_or(0),
        title: details
            .and_then(|d| d.get("title"))
            .and_then(|t| t.as_str())
            .map(str::to_string),
        author: details
            .and_then(|d| d.get("author"))
            .and_then(|a| a.as_str())
            .map(str::to_string),
    })
}
