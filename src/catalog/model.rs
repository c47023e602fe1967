use serde::{Deserialize, Serialize};

/// Kinds addressable by name search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Artist,
    Band,
    Song,
    Genre,
}

/// Kinds that carry a manager list (songs are owned via upload or transitively,
/// genres are admin-only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedKind {
    Artist,
    Band,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    /// Delegated managers (user IDs). Duplicate-free; adds are idempotent.
    #[serde(default)]
    pub manager_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub band_id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    /// Ordered member line-up.
    #[serde(default)]
    pub member_artist_ids: Vec<String>,
    #[serde(default)]
    pub manager_ids: Vec<String>,
}

/// A song's credit lists reference artists *or* bands by bare ID; the edge
/// carries no type tag. Resolving a reference means probing both collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub song_id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub release_time: i64,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub performers: Vec<String>,
    #[serde(default)]
    pub lyricists: Vec<String>,
    #[serde(default)]
    pub composers: Vec<String>,
    #[serde(default)]
    pub arrangers: Vec<String>,
    #[serde(default)]
    pub instrumentalists: Vec<String>,
    #[serde(default)]
    pub genre_ids: Vec<String>,
    /// Set once at creation; update operations never touch it.
    pub uploaded_by: String,
    /// Server-assigned epoch milliseconds; immutable.
    pub upload_time: i64,
}

impl Song {
    /// All credited entity references across the six role lists, in list
    /// order. Duplicates across lists are tolerated and preserved.
    pub fn credited(&self) -> impl Iterator<Item = &str> {
        self.creators
            .iter()
            .chain(&self.performers)
            .chain(&self.lyricists)
            .chain(&self.composers)
            .chain(&self.arrangers)
            .chain(&self.instrumentalists)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// Partial updates: absent field = unchanged. Applied atomically under the
// graph lock together with the authorization check.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BandPatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub member_artist_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongPatch {
    pub name: Option<String>,
    pub release_time: Option<i64>,
    pub creators: Option<Vec<String>>,
    pub performers: Option<Vec<String>>,
    pub lyricists: Option<Vec<String>>,
    pub composers: Option<Vec<String>>,
    pub arrangers: Option<Vec<String>>,
    pub instrumentalists: Option<Vec<String>>,
    pub genre_ids: Option<Vec<String>>,
}

impl Artist {
    pub fn apply(&mut self, patch: ArtistPatch) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(bio) = patch.bio { self.bio = bio; }
    }
}

impl Band {
    pub fn apply(&mut self, patch: BandPatch) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(bio) = patch.bio { self.bio = bio; }
        if let Some(members) = patch.member_artist_ids { self.member_artist_ids = members; }
    }
}

impl Song {
    pub fn apply(&mut self, patch: SongPatch) {
        if let Some(name) = patch.name { self.name = name; }
        if let Some(t) = patch.release_time { self.release_time = t; }
        if let Some(v) = patch.creators { self.creators = v; }
        if let Some(v) = patch.performers { self.performers = v; }
        if let Some(v) = patch.lyricists { self.lyricists = v; }
        if let Some(v) = patch.composers { self.composers = v; }
        if let Some(v) = patch.arrangers { self.arrangers = v; }
        if let Some(v) = patch.instrumentalists { self.instrumentalists = v; }
        if let Some(v) = patch.genre_ids { self.genre_ids = v; }
    }
}
