//! Elo rating updates. `K=32`, ratings
//! clamp at a floor of 100 so a long losing streak never goes negative
//! or to zero.

use crate::models::MIN_RATING;

const K: f64 = 32.0;

fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) as f64 / 400.0))
}

/// Returns `(new_rating_a, new_rating_b)` given the match outcome from
/// A's perspective (`a_won`).
pub fn apply_match(rating_a: i32, rating_b: i32, a_won: bool) -> (i32, i32) {
    let expected_a = expected_score(rating_a, rating_b);
    let score_a = if a_won { 1.0 } else { 0.0 };
    let delta_a = (K * (score_a - expected_a)).round() as i32;
    let new_a = (rating_a + delta_a).max(MIN_RATING);
    let new_b = (rating_b - delta_a).max(MIN_RATING);
    (new_a, new_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_win_gains_k_over_two() {
        let (new_a, new_b) = apply_match(1000, 1000, true);
        assert_eq!(new_a, 1016);
        assert_eq!(new_b, 984);
    }

    #[test]
    fn rating_never_drops_below_floor() {
        let (_, new_b) = apply_match(2000, 100, true);
        assert!(new_b >= MIN_RATING);
    }

    #[test]
    fn underdog_win_gains_more_than_favorite_win() {
        let (underdog_gain, _) = apply_match(900, 1300, true);
        let (favorite_gain, _) = apply_match(1300, 900, true);
        assert!(underdog_gain - 900 > favorite_gain - 1300);
    }
}
