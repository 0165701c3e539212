use serde::{Deserialize, Serialize};

/// Kind of title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Movie,
    Series,
}

/// One title as seen by the player: identifiers plus its season/episode tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub subject_id: String,
    pub detail_path: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SubjectType,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

impl Subject {
    /// Movies, and series the catalog returned without seasons, play as a
    /// single item (`se=0`, `ep=0`)
    pub fn is_movie(&self) -> bool {
        self.kind == SubjectType::Movie || self.seasons.is_empty()
    }

    pub fn season(&self, season_number: u32) -> Option<&Season> {
        self.seasons
            .iter()
            .find(|s| s.season_number == season_number)
    }

    pub fn first_season(&self) -> Option<&Season> {
        self.seasons.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_number: u32,
    pub episodes: Vec<Episode>,
}

impl Season {
    /// Build a season from the upstream listing fields.
    ///
    /// `all_ep` is a comma-separated list of episode numbers ("1,2,5"); when it
    /// is blank the season is assumed to hold `1..=max_ep`.
    pub fn from_listing(season_number: u32, max_ep: u32, all_ep: Option<&str>) -> Self {
        let numbers: Vec<u32> = match all_ep.map(str::trim).filter(|s| !s.is_empty()) {
            Some(list) => list
                .split(',')
                .filter_map(|n| n.trim().parse().ok())
                .collect(),
            None => (1..=max_ep).collect(),
        };

        Self {
            season_number,
            episodes: numbers.into_iter().map(Episode::numbered).collect(),
        }
    }

    fn position(&self, episode_number: u32) -> Option<usize> {
        self.episodes
            .iter()
            .position(|e| e.episode_number == episode_number)
    }

    pub fn episode(&self, episode_number: u32) -> Option<&Episode> {
        self.position(episode_number).map(|i| &self.episodes[i])
    }

    pub fn first_episode(&self) -> Option<&Episode> {
        self.episodes.first()
    }

    /// Episode following `episode_number` in listing order
    pub fn next_after(&self, episode_number: u32) -> Option<&Episode> {
        self.position(episode_number)
            .and_then(|i| self.episodes.get(i + 1))
    }

    /// Episode preceding `episode_number` in listing order
    pub fn previous_before(&self, episode_number: u32) -> Option<&Episode> {
        match self.position(episode_number) {
            Some(i) if i > 0 => self.episodes.get(i - 1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub episode_number: u32,
    pub episode_name: String,
    /// Direct playable URL when the catalog already embeds one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_url: Option<String>,
}

impl Episode {
    pub fn numbered(episode_number: u32) -> Self {
        Self {
            episode_number,
            episode_name: format!("Episode {}", episode_number),
            player_url: None,
        }
    }
}
