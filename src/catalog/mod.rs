//! The entity graph: artists, bands, songs, genres and the relations between
//! them (manager lists, role-credit lists, genre tags).

mod model;
mod graph;

pub use model::{
    Artist, ArtistPatch, Band, BandPatch, EntityKind, Genre, ManagedKind, Song, SongPatch,
};
pub use graph::{Catalog, CatalogState};
