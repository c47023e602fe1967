//! In-memory entity graph. Four insertion-ordered collections behind a single
//! read-write lock; every catalog operation holds the appropriate guard for
//! its whole validate-authorize-mutate sequence, so a partially applied
//! mutation is never observable.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AppError, AppResult};

use super::model::{
    Artist, ArtistPatch, Band, BandPatch, EntityKind, Genre, ManagedKind, Song, SongPatch,
};

/// HashMap keyed by ID plus an insertion-order list, so name search returns
/// matches in the order entities were created.
struct Collection<T> {
    items: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: HashMap::new(), order: Vec::new() }
    }
}

impl<T> Collection<T> {
    fn insert(&mut self, id: String, item: T) {
        if !self.items.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.items.insert(id, item);
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            self.order.retain(|k| k != id);
        }
        removed
    }

    /// Iterate in insertion order.
    fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }
}

#[derive(Default)]
pub struct CatalogState {
    artists: Collection<Artist>,
    bands: Collection<Band>,
    songs: Collection<Song>,
    genres: Collection<Genre>,
}

/// Cloneable handle over the shared graph.
#[derive(Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogState>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.inner.write()
    }
}

impl CatalogState {
    // --- lookups ---

    pub fn artist(&self, id: &str) -> Option<&Artist> {
        self.artists.get(id)
    }

    pub fn band(&self, id: &str) -> Option<&Band> {
        self.bands.get(id)
    }

    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    pub fn genre(&self, id: &str) -> Option<&Genre> {
        self.genres.get(id)
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.genres.iter().cloned().collect()
    }

    pub fn song_ids(&self) -> Vec<String> {
        self.songs.iter().map(|s| s.song_id.clone()).collect()
    }

    // --- creates (name uniqueness within the kind) ---

    pub fn insert_artist(&mut self, artist: Artist) -> AppResult<()> {
        if self.artists.iter().any(|a| a.name == artist.name) {
            return Err(AppError::conflict("artist_name_taken", "artist name already exists"));
        }
        self.artists.insert(artist.artist_id.clone(), artist);
        Ok(())
    }

    pub fn insert_band(&mut self, band: Band) -> AppResult<()> {
        if self.bands.iter().any(|b| b.name == band.name) {
            return Err(AppError::conflict("band_name_taken", "band name already exists"));
        }
        self.bands.insert(band.band_id.clone(), band);
        Ok(())
    }

    /// Song names are not unique; uploads of the same title coexist.
    pub fn insert_song(&mut self, song: Song) -> AppResult<()> {
        self.songs.insert(song.song_id.clone(), song);
        Ok(())
    }

    pub fn insert_genre(&mut self, genre: Genre) -> AppResult<()> {
        if self.genres.iter().any(|g| g.name == genre.name) {
            return Err(AppError::conflict("genre_name_taken", "genre name already exists"));
        }
        self.genres.insert(genre.genre_id.clone(), genre);
        Ok(())
    }

    // --- partial updates (absent field = unchanged) ---

    pub fn update_artist(&mut self, id: &str, patch: ArtistPatch) -> AppResult<Artist> {
        let artist = self
            .artists
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("artist_not_found", "no artist with that id"))?;
        artist.apply(patch);
        Ok(artist.clone())
    }

    pub fn update_band(&mut self, id: &str, patch: BandPatch) -> AppResult<Band> {
        let band = self
            .bands
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("band_not_found", "no band with that id"))?;
        band.apply(patch);
        Ok(band.clone())
    }

    /// `uploaded_by` and `upload_time` are not representable in the patch and
    /// therefore survive every update.
    pub fn update_song(&mut self, id: &str, patch: SongPatch) -> AppResult<Song> {
        let song = self
            .songs
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("song_not_found", "no song with that id"))?;
        song.apply(patch);
        Ok(song.clone())
    }

    // --- deletes ---
    // No cascade: removing an artist/band leaves its ID behind in songs'
    // credit lists.

    pub fn delete_artist(&mut self, id: &str) -> AppResult<()> {
        self.artists
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("artist_not_found", "no artist with that id"))
    }

    pub fn delete_band(&mut self, id: &str) -> AppResult<()> {
        self.bands
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("band_not_found", "no band with that id"))
    }

    pub fn delete_song(&mut self, id: &str) -> AppResult<()> {
        self.songs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("song_not_found", "no song with that id"))
    }

    pub fn delete_genre(&mut self, id: &str) -> AppResult<()> {
        self.genres
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("genre_not_found", "no genre with that id"))
    }

    // --- relations ---

    /// Idempotent set-insert into a manager list.
    pub fn add_manager(&mut self, kind: ManagedKind, entity_id: &str, user_id: &str) -> AppResult<()> {
        let managers = match kind {
            ManagedKind::Artist => self
                .artists
                .get_mut(entity_id)
                .map(|a| &mut a.manager_ids)
                .ok_or_else(|| AppError::not_found("artist_not_found", "no artist with that id"))?,
            ManagedKind::Band => self
                .bands
                .get_mut(entity_id)
                .map(|b| &mut b.manager_ids)
                .ok_or_else(|| AppError::not_found("band_not_found", "no band with that id"))?,
        };
        if !managers.iter().any(|m| m == user_id) {
            managers.push(user_id.to_string());
        }
        Ok(())
    }

    /// All credit references of a song, duplicates across lists preserved.
    pub fn credited_entities(&self, song_id: &str) -> AppResult<Vec<String>> {
        let song = self
            .songs
            .get(song_id)
            .ok_or_else(|| AppError::not_found("song_not_found", "no song with that id"))?;
        Ok(song.credited().map(str::to_string).collect())
    }

    /// Case-insensitive substring match over names, insertion order preserved.
    /// An empty result is a normal outcome, not an error.
    pub fn find_by_name(&self, kind: EntityKind, needle: &str) -> Vec<String> {
        let needle = needle.to_lowercase();
        let hit = |name: &str| name.to_lowercase().contains(&needle);
        match kind {
            EntityKind::Artist => self
                .artists
                .iter()
                .filter(|a| hit(&a.name))
                .map(|a| a.artist_id.clone())
                .collect(),
            EntityKind::Band => self
                .bands
                .iter()
                .filter(|b| hit(&b.name))
                .map(|b| b.band_id.clone())
                .collect(),
            EntityKind::Song => self
                .songs
                .iter()
                .filter(|s| hit(&s.name))
                .map(|s| s.song_id.clone())
                .collect(),
            EntityKind::Genre => self
                .genres
                .iter()
                .filter(|g| hit(&g.name))
                .map(|g| g.genre_id.clone())
                .collect(),
        }
    }

    /// Songs referencing the given entity. Artists match against all six
    /// credit lists; bands only against creators and performers, a narrower
    /// scope kept on purpose.
    pub fn songs_filtered_by(&self, entity_id: &str, kind: ManagedKind) -> Vec<String> {
        let references = |song: &Song| match kind {
            ManagedKind::Artist => song.credited().any(|r| r == entity_id),
            ManagedKind::Band => song
                .creators
                .iter()
                .chain(&song.performers)
                .any(|r| r == entity_id),
        };
        self.songs
            .iter()
            .filter(|s| references(s))
            .map(|s| s.song_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artist(id: &str, name: &str) -> Artist {
        Artist {
            artist_id: id.into(),
            name: name.into(),
            bio: String::new(),
            manager_ids: vec![],
        }
    }

    fn song(id: &str, name: &str) -> Song {
        Song {
            song_id: id.into(),
            name: name.into(),
            release_time: 0,
            creators: vec![],
            performers: vec![],
            lyricists: vec![],
            composers: vec![],
            arrangers: vec![],
            instrumentalists: vec![],
            genre_ids: vec![],
            uploaded_by: "u0".into(),
            upload_time: 0,
        }
    }

    #[test]
    fn find_by_name_is_case_insensitive_and_insertion_ordered() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        g.insert_artist(artist("a1", "Aretha Franklin")).unwrap();
        g.insert_artist(artist("a2", "Bessie Smith")).unwrap();
        g.insert_artist(artist("a3", "miles davis")).unwrap();
        let hits = g.find_by_name(EntityKind::Artist, "A");
        // "a" matches Aretha, miles dAvis; Bessie does not contain an 'a'
        assert_eq!(hits, vec!["a1".to_string(), "a3".to_string()]);
        let none = g.find_by_name(EntityKind::Artist, "zz");
        assert!(none.is_empty());
    }

    #[test]
    fn duplicate_artist_name_conflicts() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        g.insert_artist(artist("a1", "Nina Simone")).unwrap();
        let dup = g.insert_artist(artist("a2", "Nina Simone"));
        assert!(matches!(dup, Err(AppError::Conflict { .. })));
    }

    #[test]
    fn add_manager_is_idempotent_and_checks_existence() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        g.insert_artist(artist("a1", "Nina Simone")).unwrap();
        g.add_manager(ManagedKind::Artist, "a1", "u1").unwrap();
        g.add_manager(ManagedKind::Artist, "a1", "u1").unwrap();
        assert_eq!(g.artist("a1").unwrap().manager_ids, vec!["u1".to_string()]);
        let missing = g.add_manager(ManagedKind::Artist, "nope", "u1");
        assert!(matches!(missing, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn credited_entities_keeps_duplicates_across_lists() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        let mut s = song("s1", "Take Five");
        s.creators = vec!["a1".into()];
        s.performers = vec!["a1".into(), "b1".into()];
        g.insert_song(s).unwrap();
        let refs = g.credited_entities("s1").unwrap();
        assert_eq!(refs, vec!["a1".to_string(), "a1".to_string(), "b1".to_string()]);
    }

    #[test]
    fn band_filter_is_narrower_than_artist_filter() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        let mut s = song("s1", "Take Five");
        s.lyricists = vec!["x1".into()];
        g.insert_song(s).unwrap();
        // A lyricist credit counts for an artist, not for a band
        assert_eq!(g.songs_filtered_by("x1", ManagedKind::Artist), vec!["s1".to_string()]);
        assert!(g.songs_filtered_by("x1", ManagedKind::Band).is_empty());
        let mut s2 = song("s2", "Blue Rondo");
        s2.performers = vec!["x1".into()];
        g.insert_song(s2).unwrap();
        assert_eq!(g.songs_filtered_by("x1", ManagedKind::Band), vec!["s2".to_string()]);
    }

    #[test]
    fn patch_leaves_absent_fields_unchanged() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        let mut a = artist("a1", "Nina Simone");
        a.bio = "High Priestess of Soul".into();
        g.insert_artist(a).unwrap();
        let updated = g
            .update_artist("a1", ArtistPatch { name: Some("Dr. Nina Simone".into()), bio: None })
            .unwrap();
        assert_eq!(updated.name, "Dr. Nina Simone");
        assert_eq!(updated.bio, "High Priestess of Soul");
    }

    #[test]
    fn deleting_an_artist_leaves_dangling_credit_references() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        g.insert_artist(artist("a1", "Nina Simone")).unwrap();
        let mut s = song("s1", "Sinnerman");
        s.creators = vec!["a1".into()];
        g.insert_song(s).unwrap();
        g.delete_artist("a1").unwrap();
        // The song still names the vanished artist
        assert_eq!(g.credited_entities("s1").unwrap(), vec!["a1".to_string()]);
        assert!(g.artist("a1").is_none());
    }

    #[test]
    fn reinsert_after_delete_keeps_order_sane() {
        let catalog = Catalog::new();
        let mut g = catalog.write();
        g.insert_artist(artist("a1", "First")).unwrap();
        g.insert_artist(artist("a2", "Second")).unwrap();
        g.delete_artist("a1").unwrap();
        g.insert_artist(artist("a3", "Third")).unwrap();
        assert_eq!(
            g.find_by_name(EntityKind::Artist, ""),
            vec!["a2".to_string(), "a3".to_string()]
        );
    }
}
