//! Catalog operations: the create/update/delete/query surface for artists,
//! bands, songs and genres. Every operation follows the same shape: validate
//! the session (or admin) precondition, resolve authorization where a mutation
//! of an existing entity is requested, then apply against the entity graph.
//! Results are `(value, message)` pairs; failures are AppError, recovered at
//! the dispatch boundary into the uniform `[null, message]` response.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{
    Artist, ArtistPatch, Band, BandPatch, Catalog, EntityKind, Genre, ManagedKind, Song, SongPatch,
};
use crate::error::{AppError, AppResult};
use crate::identity::{self, Deny, IdentityStore, Target, Verdict};
use crate::stats;

/// Authentication fields carried by every payload except register/login.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAuth {
    pub user_id: String,
    pub user_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAuth {
    pub admin_id: String,
    pub admin_token: String,
}

/// Every operation yields a value (possibly null) and a human-readable message.
pub type Reply = (Value, String);
pub type OpResult = AppResult<Reply>;

fn ok(value: Value, message: &str) -> OpResult {
    Ok((value, message.to_string()))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// --- request payloads ---

#[derive(Debug, Deserialize)]
pub struct RegisterReq {
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginReq {
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutReq {
    #[serde(flatten)]
    pub auth: UserAuth,
}

#[derive(Debug, Deserialize)]
pub struct CreateArtistReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBandReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub member_artist_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSongReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub name: String,
    #[serde(default)]
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
}

#[derive(Debug, Deserialize)]
pub struct CreateGenreReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct GetArtistReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub artist_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetBandReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub band_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetSongReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub song_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetGenreReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub genre_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArtistReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub artist_id: String,
    #[serde(flatten)]
    pub patch: ArtistPatch,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBandReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub band_id: String,
    #[serde(flatten)]
    pub patch: BandPatch,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSongReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub song_id: String,
    #[serde(flatten)]
    pub patch: SongPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteArtistReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub artist_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBandReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub band_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSongReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub song_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteGenreReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub genre_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AddManagerReq {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub kind: ManagedKind,
    pub entity_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SongsByEntityReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub entity_id: String,
    pub kind: ManagedKind,
}

#[derive(Debug, Deserialize)]
pub struct CheckOwnershipReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub kind: EntityKind,
    pub target_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListGenresReq {
    #[serde(flatten)]
    pub auth: UserAuth,
}

#[derive(Debug, Deserialize)]
pub struct RateSongReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub song_id: String,
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct SongPopularityReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub song_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistPopularityReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    pub artist_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendReq {
    #[serde(flatten)]
    pub auth: UserAuth,
    #[serde(default = "default_recommend_limit")]
    pub limit: usize,
}

fn default_recommend_limit() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct TendencyReq {
    #[serde(flatten)]
    pub auth: UserAuth,
}

/// The service owning both stores. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct CatalogService {
    pub identity: IdentityStore,
    pub catalog: Catalog,
}

impl CatalogService {
    pub fn new(identity: IdentityStore, catalog: Catalog) -> Self {
        Self { identity, catalog }
    }

    // --- sessions ---

    pub fn register(&self, req: RegisterReq) -> OpResult {
        let user_id = self.identity.register(&req.display_name, &req.password)?;
        info!(target: "catalog", "registered user {}", req.display_name);
        ok(json!(user_id), "registered")
    }

    pub fn login(&self, req: LoginReq) -> OpResult {
        let (user_id, token) = self.identity.login(&req.display_name, &req.password)?;
        ok(json!({ "user_id": user_id, "user_token": token }), "logged in")
    }

    pub fn logout(&self, req: LogoutReq) -> OpResult {
        self.identity.logout(&req.auth.user_id, &req.auth.user_token)?;
        ok(Value::Null, "logged out")
    }

    // --- artists ---

    pub fn create_artist(&self, req: CreateArtistReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let artist = Artist {
            artist_id: Uuid::new_v4().to_string(),
            name: req.name,
            bio: req.bio,
            manager_ids: vec![],
        };
        let mut g = self.catalog.write();
        g.insert_artist(artist.clone())?;
        info!(target: "catalog", "created artist {}", artist.artist_id);
        ok(json!(artist), "artist created")
    }

    pub fn get_artist(&self, req: GetArtistReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        let artist = g
            .artist(&req.artist_id)
            .ok_or_else(|| AppError::not_found("artist_not_found", "no artist with that id"))?;
        ok(json!(artist), "artist found")
    }

    /// Metadata edits are open to any live session; only deletion and manager
    /// changes are admin-gated. Deliberate asymmetry.
    pub fn update_artist(&self, req: UpdateArtistReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let mut g = self.catalog.write();
        let artist = g.update_artist(&req.artist_id, req.patch)?;
        ok(json!(artist), "artist updated")
    }

    pub fn delete_artist(&self, req: DeleteArtistReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let mut g = self.catalog.write();
        g.delete_artist(&req.artist_id)?;
        info!(target: "catalog", "deleted artist {}", req.artist_id);
        ok(Value::Null, "artist deleted")
    }

    pub fn search_artists(&self, req: SearchReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.find_by_name(EntityKind::Artist, &req.query)), "search complete")
    }

    // --- bands ---

    pub fn create_band(&self, req: CreateBandReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let band = Band {
            band_id: Uuid::new_v4().to_string(),
            name: req.name,
            bio: req.bio,
            member_artist_ids: req.member_artist_ids,
            manager_ids: vec![],
        };
        let mut g = self.catalog.write();
        g.insert_band(band.clone())?;
        info!(target: "catalog", "created band {}", band.band_id);
        ok(json!(band), "band created")
    }

    pub fn get_band(&self, req: GetBandReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        let band = g
            .band(&req.band_id)
            .ok_or_else(|| AppError::not_found("band_not_found", "no band with that id"))?;
        ok(json!(band), "band found")
    }

    pub fn update_band(&self, req: UpdateBandReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let mut g = self.catalog.write();
        let band = g.update_band(&req.band_id, req.patch)?;
        ok(json!(band), "band updated")
    }

    pub fn delete_band(&self, req: DeleteBandReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let mut g = self.catalog.write();
        g.delete_band(&req.band_id)?;
        info!(target: "catalog", "deleted band {}", req.band_id);
        ok(Value::Null, "band deleted")
    }

    pub fn search_bands(&self, req: SearchReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.find_by_name(EntityKind::Band, &req.query)), "search complete")
    }

    // --- songs ---

    /// Any authenticated user may upload; the uploader is recorded and keeps
    /// mutation rights over the song for its lifetime.
    pub fn create_song(&self, req: CreateSongReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let song = Song {
            song_id: Uuid::new_v4().to_string(),
            name: req.name,
            release_time: req.release_time,
            creators: req.creators,
            performers: req.performers,
            lyricists: req.lyricists,
            composers: req.composers,
            arrangers: req.arrangers,
            instrumentalists: req.instrumentalists,
            genre_ids: req.genre_ids,
            uploaded_by: req.auth.user_id.clone(),
            upload_time: now_ms(),
        };
        let mut g = self.catalog.write();
        g.insert_song(song.clone())?;
        info!(target: "catalog", "song {} uploaded by {}", song.song_id, song.uploaded_by);
        ok(json!(song), "song created")
    }

    pub fn get_song(&self, req: GetSongReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        let song = g
            .song(&req.song_id)
            .ok_or_else(|| AppError::not_found("song_not_found", "no song with that id"))?;
        ok(json!(song), "song found")
    }

    /// Song updates go through the ownership resolver: admin, uploader, or a
    /// manager of any credited artist/band. The graph lock is held across the
    /// verdict and the apply so the two see the same state.
    pub fn update_song(&self, req: UpdateSongReq) -> OpResult {
        let mut g = self.catalog.write();
        let verdict = identity::resolve(
            &self.identity,
            &g,
            &req.auth.user_id,
            &req.auth.user_token,
            Target::Song(&req.song_id),
        );
        deny_to_error(&verdict, "song")?;
        let song = g.update_song(&req.song_id, req.patch)?;
        ok(json!(song), "song updated")
    }

    pub fn delete_song(&self, req: DeleteSongReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let mut g = self.catalog.write();
        g.delete_song(&req.song_id)?;
        info!(target: "catalog", "deleted song {}", req.song_id);
        ok(Value::Null, "song deleted")
    }

    pub fn search_songs(&self, req: SearchReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.find_by_name(EntityKind::Song, &req.query)), "search complete")
    }

    pub fn songs_by_entity(&self, req: SongsByEntityReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.songs_filtered_by(&req.entity_id, req.kind)), "filter complete")
    }

    // --- delegation and ownership ---

    pub fn add_manager(&self, req: AddManagerReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let mut g = self.catalog.write();
        g.add_manager(req.kind, &req.entity_id, &req.user_id)?;
        info!(target: "catalog", "manager {} added to {:?} {}", req.user_id, req.kind, req.entity_id);
        ok(Value::Null, "manager added")
    }

    /// Expose the resolver verdict as data. The verdict itself carries the
    /// authentication outcome, so no separate gate here.
    pub fn check_ownership(&self, req: CheckOwnershipReq) -> OpResult {
        let g = self.catalog.read();
        let target = match req.kind {
            EntityKind::Artist => Target::Artist(&req.target_id),
            EntityKind::Band => Target::Band(&req.target_id),
            EntityKind::Song => Target::Song(&req.target_id),
            EntityKind::Genre => {
                return Err(AppError::validation(
                    "unownable_kind",
                    "genres have no ownership to check",
                ));
            }
        };
        let verdict = identity::resolve(
            &self.identity,
            &g,
            &req.auth.user_id,
            &req.auth.user_token,
            target,
        );
        ok(
            json!({ "granted": verdict.granted(), "reason": verdict.reason_code() }),
            "ownership checked",
        )
    }

    // --- genres ---

    pub fn create_genre(&self, req: CreateGenreReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let genre = Genre {
            genre_id: Uuid::new_v4().to_string(),
            name: req.name,
            description: req.description,
        };
        let mut g = self.catalog.write();
        g.insert_genre(genre.clone())?;
        ok(json!(genre), "genre created")
    }

    pub fn get_genre(&self, req: GetGenreReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        let genre = g
            .genre(&req.genre_id)
            .ok_or_else(|| AppError::not_found("genre_not_found", "no genre with that id"))?;
        ok(json!(genre), "genre found")
    }

    pub fn delete_genre(&self, req: DeleteGenreReq) -> OpResult {
        identity::require_admin(&self.identity, &req.auth.admin_id, &req.auth.admin_token)?;
        let mut g = self.catalog.write();
        g.delete_genre(&req.genre_id)?;
        ok(Value::Null, "genre deleted")
    }

    pub fn list_genres(&self, req: ListGenresReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.genres()), "genres listed")
    }

    pub fn search_genres(&self, req: SearchReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(g.find_by_name(EntityKind::Genre, &req.query)), "search complete")
    }

    // --- analytics ---

    pub fn rate_song(&self, req: RateSongReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        stats::validate_rating(req.rating)?;
        let g = self.catalog.read();
        if g.song(&req.song_id).is_none() {
            return Err(AppError::not_found("song_not_found", "no song with that id"));
        }
        ok(Value::Null, "rating recorded")
    }

    pub fn song_popularity(&self, req: SongPopularityReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        if g.song(&req.song_id).is_none() {
            return Err(AppError::not_found("song_not_found", "no song with that id"));
        }
        ok(json!(stats::popularity_score()), "popularity computed")
    }

    pub fn artist_popularity(&self, req: ArtistPopularityReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        if g.artist(&req.artist_id).is_none() {
            return Err(AppError::not_found("artist_not_found", "no artist with that id"));
        }
        ok(json!(stats::popularity_score()), "popularity computed")
    }

    pub fn recommend_songs(&self, req: RecommendReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        ok(json!(stats::recommend(&g.song_ids(), req.limit)), "recommendations ready")
    }

    pub fn creation_tendency(&self, req: TendencyReq) -> OpResult {
        identity::require_user(&self.identity, &req.auth.user_id, &req.auth.user_token)?;
        let g = self.catalog.read();
        let weights: serde_json::Map<String, Value> = stats::creation_tendency(&g.genres())
            .into_iter()
            .map(|(id, w)| (id, json!(w)))
            .collect();
        ok(Value::Object(weights), "tendency computed")
    }
}

/// Convert a denial into the matching error; grants pass through. Callers
/// treat every denial uniformly, the reason only picks the taxonomy bucket.
fn deny_to_error(verdict: &Verdict, kind: &str) -> AppResult<()> {
    match verdict {
        Verdict::Granted(_) => Ok(()),
        Verdict::Denied(Deny::AuthenticationFailure) => {
            Err(AppError::auth("auth_required", "identity or token is not live"))
        }
        Verdict::Denied(Deny::NotFound) => Err(AppError::not_found(
            format!("{kind}_not_found"),
            format!("no {kind} with that id"),
        )),
        Verdict::Denied(Deny::NoPermission) => Err(AppError::forbidden(
            "no_permission".to_string(),
            format!("not an owner, manager, or admin of this {kind}"),
        )),
    }
}
