//! Analytics behind the authenticated surface: ratings, popularity scores,
//! recommendations and creation tendency. None of these have a real data
//! source; scores are uniform random draws.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Genre;
use crate::error::{AppError, AppResult};

pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// Ratings live in a fixed 1..=5 range; anything else is malformed input.
pub fn validate_rating(rating: i64) -> AppResult<()> {
    if (RATING_MIN..=RATING_MAX).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::validation(
            "rating_out_of_range".to_string(),
            format!("rating must be between {RATING_MIN} and {RATING_MAX}"),
        ))
    }
}

/// Uniform popularity score in [0, 100).
pub fn popularity_score() -> f64 {
    rand::thread_rng().gen_range(0.0..100.0)
}

/// Random sample of up to `limit` song IDs.
pub fn recommend(song_ids: &[String], limit: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    song_ids
        .choose_multiple(&mut rng, limit.min(song_ids.len()))
        .cloned()
        .collect()
}

/// Per-genre weights in [0, 1), one entry per existing genre.
pub fn creation_tendency(genres: &[Genre]) -> Vec<(String, f64)> {
    let mut rng = rand::thread_rng();
    genres
        .iter()
        .map(|g| (g.genre_id.clone(), rng.gen_range(0.0..1.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_range_boundaries() {
        assert!(validate_rating(RATING_MIN).is_ok());
        assert!(validate_rating(RATING_MAX).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(-3).is_err());
    }

    #[test]
    fn recommend_never_exceeds_catalog() {
        let ids: Vec<String> = (0..3).map(|i| format!("s{i}")).collect();
        let out = recommend(&ids, 10);
        assert_eq!(out.len(), 3);
        for id in &out {
            assert!(ids.contains(id));
        }
    }

    #[test]
    fn popularity_is_in_range() {
        for _ in 0..32 {
            let p = popularity_score();
            assert!((0.0..100.0).contains(&p));
        }
    }
}
