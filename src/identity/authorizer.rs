//! Ownership resolution: decides whether an actor may mutate a target entity.
//! Three permission sources fold into one verdict, checked in order: global
//! admin role, direct delegated management (artist/band manager lists), and
//! transitive management of a song through its credited artists and bands.

use crate::catalog::CatalogState;

use super::store::IdentityStore;

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AdminOverride,
    DirectManagement,
    UploaderOwnership,
    TransitiveManagement,
}

/// Why access was denied. Callers must treat every denial uniformly; the
/// reason is diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    AuthenticationFailure,
    NotFound,
    NoPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Granted(Grant),
    Denied(Deny),
}

impl Verdict {
    pub fn granted(&self) -> bool {
        matches!(self, Verdict::Granted(_))
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Verdict::Granted(Grant::AdminOverride) => "admin_override",
            Verdict::Granted(Grant::DirectManagement) => "direct_management",
            Verdict::Granted(Grant::UploaderOwnership) => "uploader_ownership",
            Verdict::Granted(Grant::TransitiveManagement) => "transitive_management",
            Verdict::Denied(Deny::AuthenticationFailure) => "authentication_failure",
            Verdict::Denied(Deny::NotFound) => "not_found",
            Verdict::Denied(Deny::NoPermission) => "no_permission",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Artist(&'a str),
    Band(&'a str),
    Song(&'a str),
}

/// Resolve the ownership verdict for `actor_id` against `target`.
///
/// Order matters and is part of the contract:
/// 1. dead session denies before anything else;
/// 2. the admin role grants before the target is even looked up, so an admin
///    acting on a missing ID sees the operation's own NotFound instead of a
///    masked permission error;
/// 3. a missing target denies with NotFound;
/// 4. songs: uploader match first (the cheap common case), then a scan of the
///    credited entities. Each credit reference is untyped; it is probed as an
///    Artist first and as a Band second, so on an ID collision the Artist's
///    manager list is consulted before the Band's.
///
/// There is no error path: every outcome is a Verdict.
pub fn resolve(
    identity: &IdentityStore,
    graph: &CatalogState,
    actor_id: &str,
    token: &str,
    target: Target<'_>,
) -> Verdict {
    if !identity.is_live(actor_id, token) {
        return Verdict::Denied(Deny::AuthenticationFailure);
    }
    if identity.is_admin(actor_id, token) {
        return Verdict::Granted(Grant::AdminOverride);
    }
    match target {
        Target::Artist(id) => match graph.artist(id) {
            None => Verdict::Denied(Deny::NotFound),
            Some(a) => manager_verdict(&a.manager_ids, actor_id),
        },
        Target::Band(id) => match graph.band(id) {
            None => Verdict::Denied(Deny::NotFound),
            Some(b) => manager_verdict(&b.manager_ids, actor_id),
        },
        Target::Song(id) => {
            let Some(song) = graph.song(id) else {
                return Verdict::Denied(Deny::NotFound);
            };
            if song.uploaded_by == actor_id {
                return Verdict::Granted(Grant::UploaderOwnership);
            }
            for credit in song.credited() {
                if manages_credited_entity(graph, credit, actor_id) {
                    return Verdict::Granted(Grant::TransitiveManagement);
                }
            }
            Verdict::Denied(Deny::NoPermission)
        }
    }
}

fn manager_verdict(manager_ids: &[String], actor_id: &str) -> Verdict {
    if manager_ids.iter().any(|m| m == actor_id) {
        Verdict::Granted(Grant::DirectManagement)
    } else {
        Verdict::Denied(Deny::NoPermission)
    }
}

/// Untyped credit reference probe, Artist before Band. The Band collection is
/// only consulted when the Artist probe did not grant.
fn manages_credited_entity(graph: &CatalogState, entity_id: &str, actor_id: &str) -> bool {
    if let Some(a) = graph.artist(entity_id) {
        if a.manager_ids.iter().any(|m| m == actor_id) {
            return true;
        }
    }
    if let Some(b) = graph.band(entity_id) {
        if b.manager_ids.iter().any(|m| m == actor_id) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Artist, Band, Catalog, Song};

    fn live_user(ids: &IdentityStore, name: &str) -> (String, String) {
        let uid = ids.register(name, "pw").unwrap();
        let (_, token) = ids.login(name, "pw").unwrap();
        (uid, token)
    }

    fn artist_with_manager(id: &str, manager: &str) -> Artist {
        Artist {
            artist_id: id.to_string(),
            name: format!("artist {id}"),
            bio: String::new(),
            manager_ids: vec![manager.to_string()],
        }
    }

    fn song_created_by(id: &str, creator_ref: &str, uploader: &str) -> Song {
        Song {
            song_id: id.to_string(),
            name: format!("song {id}"),
            release_time: 0,
            creators: vec![creator_ref.to_string()],
            performers: vec![],
            lyricists: vec![],
            composers: vec![],
            arrangers: vec![],
            instrumentalists: vec![],
            genre_ids: vec![],
            uploaded_by: uploader.to_string(),
            upload_time: 0,
        }
    }

    #[test]
    fn dead_session_denies_before_lookup() {
        let ids = IdentityStore::new();
        let catalog = Catalog::new();
        let g = catalog.read();
        let v = resolve(&ids, &g, "ghost", "token", Target::Song("missing"));
        assert_eq!(v, Verdict::Denied(Deny::AuthenticationFailure));
    }

    #[test]
    fn admin_grants_even_for_missing_target() {
        let ids = IdentityStore::new();
        ids.ensure_default_admin("root", "pw").unwrap();
        let (aid, atok) = ids.login("root", "pw").unwrap();
        let catalog = Catalog::new();
        let g = catalog.read();
        let v = resolve(&ids, &g, &aid, &atok, Target::Artist("missing"));
        assert_eq!(v, Verdict::Granted(Grant::AdminOverride));
    }

    #[test]
    fn uploader_wins_before_credit_scan() {
        let ids = IdentityStore::new();
        let (uid, token) = live_user(&ids, "uploader");
        let catalog = Catalog::new();
        {
            let mut g = catalog.write();
            g.insert_song(song_created_by("s1", "a1", &uid)).unwrap();
        }
        let g = catalog.read();
        let v = resolve(&ids, &g, &uid, &token, Target::Song("s1"));
        assert_eq!(v, Verdict::Granted(Grant::UploaderOwnership));
    }

    #[test]
    fn transitive_management_through_credited_artist() {
        let ids = IdentityStore::new();
        let (manager, token) = live_user(&ids, "manager");
        let (stranger, stoken) = live_user(&ids, "stranger");
        let catalog = Catalog::new();
        {
            let mut g = catalog.write();
            g.insert_artist(artist_with_manager("a1", &manager)).unwrap();
            g.insert_song(song_created_by("s1", "a1", "someone-else")).unwrap();
        }
        let g = catalog.read();
        let ok = resolve(&ids, &g, &manager, &token, Target::Song("s1"));
        assert_eq!(ok, Verdict::Granted(Grant::TransitiveManagement));
        let no = resolve(&ids, &g, &stranger, &stoken, Target::Song("s1"));
        assert_eq!(no, Verdict::Denied(Deny::NoPermission));
    }

    #[test]
    fn artist_probe_takes_precedence_over_band_on_id_collision() {
        let ids = IdentityStore::new();
        let (via_artist, artist_tok) = live_user(&ids, "via-artist");
        let (via_band, band_tok) = live_user(&ids, "via-band");
        let catalog = Catalog::new();
        {
            let mut g = catalog.write();
            // Same ID lives in both collections; managers differ
            g.insert_artist(artist_with_manager("x1", &via_artist)).unwrap();
            g.insert_band(Band {
                band_id: "x1".to_string(),
                name: "colliding band".to_string(),
                bio: String::new(),
                member_artist_ids: vec![],
                manager_ids: vec![via_band.to_string()],
            })
            .unwrap();
            g.insert_song(song_created_by("s1", "x1", "someone-else")).unwrap();
        }
        let g = catalog.read();
        // Artist manager granted by the first probe
        let a = resolve(&ids, &g, &via_artist, &artist_tok, Target::Song("s1"));
        assert_eq!(a, Verdict::Granted(Grant::TransitiveManagement));
        // Band manager still granted: band is consulted when the artist probe does not grant
        let b = resolve(&ids, &g, &via_band, &band_tok, Target::Song("s1"));
        assert_eq!(b, Verdict::Granted(Grant::TransitiveManagement));
    }

    #[test]
    fn direct_management_on_artist_and_band() {
        let ids = IdentityStore::new();
        let (manager, token) = live_user(&ids, "manager");
        let catalog = Catalog::new();
        {
            let mut g = catalog.write();
            g.insert_artist(artist_with_manager("a1", &manager)).unwrap();
            g.insert_band(Band {
                band_id: "b1".to_string(),
                name: "band".to_string(),
                bio: String::new(),
                member_artist_ids: vec![],
                manager_ids: vec![],
            })
            .unwrap();
        }
        let g = catalog.read();
        let a = resolve(&ids, &g, &manager, &token, Target::Artist("a1"));
        assert_eq!(a, Verdict::Granted(Grant::DirectManagement));
        let b = resolve(&ids, &g, &manager, &token, Target::Band("b1"));
        assert_eq!(b, Verdict::Denied(Deny::NoPermission));
    }
}
