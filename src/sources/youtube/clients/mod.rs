pub mod common;
pub mod innertube;

use async_trait::async_trait;

use super::formats::FormatDescriptor;
use crate::common::types::MediaId;

pub use innertube::InnerTubeClient;

/// An impersonated client identity used to negotiate with the player API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    /// Registry key, also used in configuration.
    pub name: &'static str,
    pub client_name: &'static str,
    /// Numeric id sent as `X-YouTube-Client-Name`.
    pub client_id: u32,
    pub client_version: &'static str,
    pub device_make: Option<&'static str>,
    pub device_model: Option<&'static str>,
    pub os_name: Option<&'static str>,
    pub os_version: Option<&'static str>,
    pub android_sdk_version: Option<u32>,
    pub platform: Option<&'static str>,
    pub user_agent: &'static str,
    pub embed_url: Option<&'static str>,
    pub extra_headers: &'static [(&'static str, &'static str)],
}

/// Known identities, most likely to be served first. Mobile and VR apps get
/// plain stream URLs far more often than desktop web fingerprints.
pub static CLIENT_PROFILES: &[ClientProfile] = &[
    ClientProfile {
        name: "ANDROID_VR",
        client_name: "ANDROID_VR",
        client_id: 28,
        client_version: "1.61.48",
        device_make: Some("Oculus"),
        device_model: Some("Quest 3"),
        os_name: Some("Android"),
        os_version: Some("12L"),
        android_sdk_version: Some(32),
        platform: Some("MOBILE"),
        user_agent: "com.google.android.apps.youtube.vr.oculus/1.61.48 \
             (Linux; U; Android 12L; eureka-user Build/SQ3A.220605.009.A1) gzip",
        embed_url: None,
        extra_headers: &[],
    },
    ClientProfile {
        name: "IOS",
        client_name: "IOS",
        client_id: 5,
        client_version: "21.02.1",
        device_make: Some("Apple"),
        device_model: Some("iPhone16,2"),
        os_name: Some("iPhone"),
        os_version: Some("18.2.22C152"),
        android_sdk_version: None,
        platform: Some("MOBILE"),
        user_agent: "com.google.ios.youtube/21.02.1 (iPhone16,2; U; CPU iOS 18_2 like Mac OS X;)",
        embed_url: None,
        extra_headers: &[],
    },
    ClientProfile {
        name: "ANDROID",
        client_name: "ANDROID",
        client_id: 3,
        client_version: "20.01.35",
        device_make: Some("Google"),
        device_model: Some("Pixel 6"),
        os_name: Some("Android"),
        os_version: Some("14"),
        android_sdk_version: Some(34),
        platform: Some("MOBILE"),
        user_agent: "com.google.android.youtube/20.01.35 (Linux; U; Android 14) identity",
        embed_url: None,
        extra_headers: &[],
    },
    ClientProfile {
        name: "TV_EMBEDDED",
        client_name: "TVHTML5_SIMPLY_EMBEDDED_PLAYER",
        client_id: 85,
        client_version: "2.0",
        device_make: None,
        device_model: None,
        os_name: None,
        os_version: None,
        android_sdk_version: None,
        platform: Some("TV"),
        user_agent: "Mozilla/5.0 (SmartHub; SMART-TV; U; Linux/SmartTV; Maple2012) \
             AppleWebKit/534.7 (KHTML, like Gecko) SmartTV Safari/534.7",
        embed_url: Some("https://www.youtube.com"),
        extra_headers: &[],
    },
    ClientProfile {
        name: "WEB_EMBEDDED",
        client_name: "WEB_EMBEDDED_PLAYER",
        client_id: 56,
        client_version: "1.20250219.01.00",
        device_make: None,
        device_model: None,
        os_name: None,
        os_version: None,
        android_sdk_version: None,
        platform: Some("DESKTOP"),
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
             AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
        embed_url: Some("https://www.youtube.com"),
        extra_headers: &[("Origin", "https://www.youtube.com")],
    },
    ClientProfile {
        name: "WEB",
        client_name: "WEB",
        client_id: 1,
        client_version: "2.20260114.01.00",
        device_make: None,
        device_model: None,
        os_name: None,
        os_version: None,
        android_sdk_version: None,
        platform: Some("DESKTOP"),
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
             AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36",
        embed_url: None,
        extra_headers: &[
            ("Origin", "https://www.youtube.com"),
            ("Referer", "https://www.youtube.com/"),
        ],
    },
];

/// Looks a profile up by registry key or by its wire client name.
pub fn profile_by_name(name: &str) -> Option<&'static ClientProfile> {
    let name = name.trim().to_uppercase();
    CLIENT_PROFILES
        .iter()
        .find(|p| p.name == name || p.client_name == name)
}

/// Resolves configured names into an ordered profile list. Unknown names are
/// skipped; an empty outcome falls back to the full registry.
pub fn profiles_from_names(names: &[String]) -> Vec<&'static ClientProfile> {
    let mut profiles: Vec<&'static ClientProfile> = Vec::new();
    for name in names {
        match profile_by_name(name) {
            Some(profile) if !profiles.contains(&profile) => profiles.push(profile),
            Some(_) => tracing::warn!("Duplicate YouTube client in config: {}", name),
            None => tracing::warn!("Unknown YouTube client: {}", name),
        }
    }

    if profiles.is_empty() {
        if !names.is_empty() {
            tracing::warn!("No valid YouTube clients configured! Falling back to defaults.");
        }
        profiles.extend(CLIENT_PROFILES.iter());
    }
    profiles
}

/// What a successful negotiation hands back.
#[derive(Debug, Clone, Default)]
pub struct PlayerData {
    pub descriptors: Vec<FormatDescriptor>,
    pub duration_seconds: u64,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Uniform outcome of one identity's attempt.
#[derive(Debug)]
pub enum Negotiation {
    Success(PlayerData),
    Reject(String),
}

/// A capability provider the resolver tries in priority order.
#[async_trait]
pub trait PlayerProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn negotiate(&self, media_id: &MediaId) -> Negotiation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_with_mobile_identities() {
        let names: Vec<_> = CLIENT_PROFILES.iter().map(|p| p.name).collect();
        assert_eq!(names.first(), Some(&"ANDROID_VR"));
        assert_eq!(names.last(), Some(&"WEB"));
        let ios = names.iter().position(|n| *n == "IOS").unwrap();
        let web_embedded = names.iter().position(|n| *n == "WEB_EMBEDDED").unwrap();
        assert!(ios < web_embedded);
    }

    #[test]
    fn registry_names_are_unique() {
        for (i, a) in CLIENT_PROFILES.iter().enumerate() {
            for b in &CLIENT_PROFILES[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.client_id, b.client_id);
            }
        }
    }

    #[test]
    fn lookup_by_key_or_wire_name() {
        assert_eq!(profile_by_name("ios").unwrap().client_id, 5);
        assert_eq!(
            profile_by_name("WEB_EMBEDDED_PLAYER").unwrap().name,
            "WEB_EMBEDDED"
        );
        assert!(profile_by_name("SMART_FRIDGE").is_none());
    }

    #[test]
    fn configured_order_is_kept_and_unknowns_skipped() {
        let names = vec![
            "web".to_string(),
            "nope".to_string(),
            "ANDROID".to_string(),
            "WEB".to_string(),
        ];
        let profiles = profiles_from_names(&names);
        let keys: Vec<_> = profiles.iter().map(|p| p.name).collect();
        assert_eq!(keys, vec!["WEB", "ANDROID"]);
    }

    #[test]
    fn empty_or_invalid_config_falls_back_to_registry() {
        assert_eq!(profiles_from_names(&[]).len(), CLIENT_PROFILES.len());
        assert_eq!(
            profiles_from_names(&["bogus".to_string()]).len(),
            CLIENT_PROFILES.len()
        );
    }
}
