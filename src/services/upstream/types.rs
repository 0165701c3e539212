//! Upstream API Types
//!
//! Payload definitions for the h5 media API and the envelope parse that
//! resolves its response shapes once, at the client boundary.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use super::client::UpstreamError;
use crate::models::{
    CaptionTrack, Category, Season, StreamFormat, StreamVariant, Subject, SubjectType,
};

// ============================================================================
// Envelope
// ============================================================================

/// Response envelope of the upstream API.
///
/// The h5 API wraps payloads as `{ "code": 0, "data": {...} }`; relay
/// deployments answer with a flat `{ "success": true, ... }` object. Anything
/// else, including a known shape whose payload does not decode, is `Rejected`.
#[derive(Debug)]
pub enum Envelope<T> {
    Wrapped { payload: T, raw: Value },
    Flat { payload: T, raw: Value },
    Rejected {
        code: Option<i64>,
        message: Option<String>,
        raw: Value,
    },
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn parse(raw: Value) -> Self {
        let code = raw.get("code").and_then(Value::as_i64);
        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        if code == Some(0) {
            if let Some(data) = raw.get("data").filter(|d| d.is_object()) {
                if let Ok(payload) = T::deserialize(data) {
                    return Envelope::Wrapped { payload, raw };
                }
            }
        } else if code.is_none() && raw.get("success").and_then(Value::as_bool) == Some(true) {
            if let Ok(payload) = T::deserialize(&raw) {
                return Envelope::Flat { payload, raw };
            }
        }

        Envelope::Rejected { code, message, raw }
    }

    /// Payload plus the raw body it came from, or `UpstreamError::Rejected`
    pub fn into_parts(self) -> Result<(T, Value), UpstreamError> {
        match self {
            Envelope::Wrapped { payload, raw } | Envelope::Flat { payload, raw } => {
                Ok((payload, raw))
            }
            Envelope::Rejected { code, message, raw } => {
                Err(UpstreamError::Rejected { code, message, raw })
            }
        }
    }
}

/// Accept a string or a number and keep it as a string; ids and sizes come
/// back as either depending on the endpoint.
fn lossy_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Treat an explicit `null` like a missing field
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Play
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStream {
    #[serde(default, deserialize_with = "lossy_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lossy_string")]
    pub resolutions: Option<String>,
    #[serde(default, deserialize_with = "lossy_string")]
    pub size: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
}

/// `data` of `/subject/play` (or the flat relay body)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayData {
    #[serde(default, deserialize_with = "null_default")]
    pub streams: Vec<RawStream>,
    #[serde(default, deserialize_with = "null_default")]
    pub hls: Vec<RawStream>,
    #[serde(default, deserialize_with = "null_default")]
    pub dash: Vec<RawStream>,
    #[serde(default, deserialize_with = "null_default")]
    pub free_num: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub limited: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub has_resource: bool,
    #[serde(default)]
    pub title: Option<String>,
}

impl PlayData {
    /// Flatten the three upstream lists into typed variants
    pub fn variants(&self) -> Vec<StreamVariant> {
        let tagged = [
            (StreamFormat::Progressive, &self.streams),
            (StreamFormat::Hls, &self.hls),
            (StreamFormat::Dash, &self.dash),
        ];

        tagged
            .into_iter()
            .flat_map(|(format, list)| {
                list.iter()
                    .filter_map(|s| {
                        s.url
                            .as_deref()
                            .filter(|url| !url.is_empty())
                            .map(|url| (s, url))
                    })
                    .map(move |(s, url)| StreamVariant {
                        id: s.id.clone(),
                        url: url.to_string(),
                        format,
                        container: s.format.clone(),
                        quality: s.resolutions.clone(),
                        size: s.size.clone(),
                        codec_name: s.codec_name.clone(),
                        free_num: self.free_num,
                        limited: self.limited,
                    })
            })
            .collect()
    }
}

// ============================================================================
// Captions
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCaption {
    #[serde(default)]
    pub lan_name: Option<String>,
    #[serde(default)]
    pub lan: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptionData {
    #[serde(default, deserialize_with = "null_default")]
    pub captions: Vec<RawCaption>,
}

impl CaptionData {
    pub fn tracks(self) -> Vec<CaptionTrack> {
        self.captions
            .into_iter()
            .filter_map(|c| {
                let url = c.url.filter(|url| !url.is_empty())?;
                Some(CaptionTrack {
                    language: c.lan_name.unwrap_or_default(),
                    url,
                    lan: c.lan.unwrap_or_default(),
                })
            })
            .collect()
    }
}

// ============================================================================
// Detail
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubject {
    #[serde(default, deserialize_with = "lossy_string")]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail_path: Option<String>,
    /// 1 = movie, anything else = series
    #[serde(default)]
    pub subject_type: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeason {
    #[serde(default)]
    pub se: u32,
    #[serde(default)]
    pub max_ep: u32,
    #[serde(default)]
    pub all_ep: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawResource {
    #[serde(default)]
    pub seasons: Vec<RawSeason>,
}

/// `data` of `/detail`
#[derive(Debug, Deserialize)]
pub struct DetailData {
    pub subject: RawSubject,
    #[serde(default)]
    pub resource: RawResource,
}

impl DetailData {
    /// Map to the Subject contract. `se=0, maxEp=0` entries describe the movie
    /// file itself and are not seasons.
    pub fn into_subject(self, requested_path: &str) -> Subject {
        let seasons = self
            .resource
            .seasons
            .iter()
            .filter(|s| s.se > 0 && s.max_ep > 0)
            .map(|s| Season::from_listing(s.se, s.max_ep, s.all_ep.as_deref()))
            .collect();

        Subject {
            subject_id: self.subject.subject_id.unwrap_or_default(),
            detail_path: self
                .subject
                .detail_path
                .unwrap_or_else(|| requested_path.to_string()),
            title: self.subject.title.unwrap_or_default(),
            kind: if self.subject.subject_type == 1 {
                SubjectType::Movie
            } else {
                SubjectType::Series
            },
            seasons,
        }
    }
}

// ============================================================================
// Home
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlatform {
    #[serde(default, deserialize_with = "lossy_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub upload_by: Option<String>,
}

/// `data` of `/home`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeData {
    #[serde(default)]
    pub platform_list: Vec<RawPlatform>,
}

impl HomeData {
    pub fn categories(self) -> Vec<Category> {
        self.platform_list
            .into_iter()
            .filter_map(|p| {
                let id = p.id.filter(|s| !s.is_empty())?;
                let title = p.title.filter(|s| !s.is_empty())?;
                Some(Category {
                    id,
                    title,
                    upload_by: p.upload_by.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wrapped() {
        let raw = json!({"code": 0, "message": "ok", "data": {"streams": [{"url": "https://cdn/a.mp4", "format": "MP4", "resolutions": 720}], "freeNum": 3}});
        let (data, _) = Envelope::<PlayData>::parse(raw).into_parts().unwrap();

        let variants = data.variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].format, StreamFormat::Progressive);
        assert_eq!(variants[0].quality.as_deref(), Some("720"));
        assert_eq!(variants[0].free_num, 3);
    }

    #[test]
    fn test_envelope_flat() {
        let raw = json!({"success": true, "streams": [], "hls": [{"url": "https://cdn/a.m3u8"}], "limited": true});
        match Envelope::<PlayData>::parse(raw) {
            Envelope::Flat { payload, .. } => {
                let variants = payload.variants();
                assert_eq!(variants[0].format, StreamFormat::Hls);
                assert!(variants[0].limited);
            }
            other => panic!("expected flat envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_error_code_is_rejected() {
        let raw = json!({"code": 403, "message": "forbidden", "data": null});
        match Envelope::<PlayData>::parse(raw) {
            Envelope::Rejected { code, message, raw } => {
                assert_eq!(code, Some(403));
                assert_eq!(message.as_deref(), Some("forbidden"));
                assert_eq!(raw["code"], 403);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_envelope_code_zero_without_data_is_rejected() {
        let raw = json!({"code": 0, "data": null});
        assert!(matches!(
            Envelope::<PlayData>::parse(raw),
            Envelope::Rejected { code: Some(0), .. }
        ));
    }

    #[test]
    fn test_null_sibling_lists_do_not_reject_play() {
        let raw = json!({"code": 0, "data": {
            "streams": [{"url": "https://cdn/a.mp4"}],
            "hls": null,
            "dash": null,
            "freeNum": null,
            "limited": null
        }});
        let (data, _) = Envelope::<PlayData>::parse(raw).into_parts().unwrap();

        let variants = data.variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].url, "https://cdn/a.mp4");
        assert_eq!(variants[0].free_num, 0);
        assert!(!variants[0].limited);
    }

    #[test]
    fn test_stream_without_url_is_skipped() {
        let raw = json!({"code": 0, "data": {
            "streams": [{"id": 1, "resolutions": 480}, {"url": ""}, {"url": null}],
            "hls": [{"url": "https://cdn/a.m3u8"}]
        }});
        let (data, _) = Envelope::<PlayData>::parse(raw).into_parts().unwrap();

        let variants = data.variants();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].format, StreamFormat::Hls);
    }

    #[test]
    fn test_caption_without_url_is_skipped() {
        let raw = json!({"code": 0, "data": {"captions": [
            {"lanName": "English", "lan": "en"},
            {"lanName": "Indonesian", "lan": "in_id", "url": "https://cdn/id.srt"}
        ]}});
        let (data, _) = Envelope::<CaptionData>::parse(raw).into_parts().unwrap();

        let tracks = data.tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].lan, "in_id");

        let raw = json!({"code": 0, "data": {"captions": null}});
        let (data, _) = Envelope::<CaptionData>::parse(raw).into_parts().unwrap();
        assert!(data.tracks().is_empty());
    }

    #[test]
    fn test_detail_into_subject_filters_movie_entry() {
        let raw = json!({
            "code": 0,
            "data": {
                "subject": {"subjectId": 778, "title": "Show", "detailPath": "show-x", "subjectType": 2},
                "resource": {"seasons": [
                    {"se": 0, "maxEp": 0, "allEp": ""},
                    {"se": 1, "maxEp": 3, "allEp": ""},
                    {"se": 2, "maxEp": 9, "allEp": "1,2"}
                ]}
            }
        });
        let (detail, _) = Envelope::<DetailData>::parse(raw).into_parts().unwrap();
        let subject = detail.into_subject("show-x");

        assert_eq!(subject.subject_id, "778");
        assert_eq!(subject.kind, SubjectType::Series);
        assert_eq!(subject.seasons.len(), 2);
        assert_eq!(subject.seasons[0].episodes.len(), 3);
        assert_eq!(subject.seasons[1].episodes.len(), 2);
    }

    #[test]
    fn test_home_categories_require_id_and_title() {
        let raw = json!({"code": 0, "data": {"platformList": [
            {"id": "1", "title": "Anime", "uploadBy": "ops"},
            {"id": "2"},
            {"title": "No id"}
        ]}});
        let (home, _) = Envelope::<HomeData>::parse(raw).into_parts().unwrap();
        let categories = home.categories();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].title, "Anime");
        assert_eq!(categories[0].upload_by, "ops");
    }
}
