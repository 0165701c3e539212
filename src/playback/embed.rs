use std::fmt;

use crate::models::{Episode, Season, Subject};

/// What the player loads for the selected item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedReference {
    /// The catalog already carried a playable URL for the episode
    Direct(String),
    /// Playback surface URL carrying the resolution query
    Resolver(String),
}

impl EmbedReference {
    /// Build the reference for `episode` of `season`.
    ///
    /// Movies resolve with `se=0&ep=0`. For series a missing season or
    /// episode falls back to 1.
    pub fn for_selection(
        subject: &Subject,
        season: Option<&Season>,
        episode: Option<&Episode>,
        player_path: &str,
    ) -> Self {
        if let Some(url) = episode
            .and_then(|e| e.player_url.as_deref())
            .filter(|u| !u.trim().is_empty())
        {
            return EmbedReference::Direct(url.to_string());
        }

        let (se, ep) = if subject.is_movie() {
            (0, 0)
        } else {
            (
                season.map(|s| s.season_number).unwrap_or(1),
                episode.map(|e| e.episode_number).unwrap_or(1),
            )
        };

        EmbedReference::Resolver(format!(
            "{}?subjectId={}&se={}&ep={}&detailPath={}&title={}",
            player_path,
            urlencoding::encode(&subject.subject_id),
            se,
            ep,
            urlencoding::encode(&subject.detail_path),
            urlencoding::encode(&subject.title),
        ))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EmbedReference::Direct(url) | EmbedReference::Resolver(url) => url,
        }
    }
}

impl fmt::Display for EmbedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
