//! Points awarded for a single round.

/// Highest number of hints a player can unlock for one song.
pub const MAX_HINTS: u8 = 5;
/// Points for a correct guess on the first hint; also the per-round ceiling.
pub const MAX_POINTS_PER_ROUND: u32 = 5;
/// A correct guess is always worth at least this much.
pub const MIN_POINTS_FOR_CORRECT: u32 = 1;

/// Points earned for a round given the hints unlocked and the guess outcome.
///
/// Wrong guesses earn nothing. Correct guesses earn `6 - hints_used`, clamped
/// to `1..=5`, so even out-of-range hint counts stay within bounds.
pub fn points(hints_used: u8, is_correct: bool) -> u32 {
    if !is_correct {
        return 0;
    }

    let raw = (MAX_POINTS_PER_ROUND as i64 + 1) - i64::from(hints_used);
    raw.clamp(
        i64::from(MIN_POINTS_FOR_CORRECT),
        i64::from(MAX_POINTS_PER_ROUND),
    ) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_hint_is_worth_five() {
        assert_eq!(points(1, true), 5);
    }

    #[test]
    fn all_hints_is_worth_one() {
        assert_eq!(points(5, true), 1);
    }

    #[test]
    fn wrong_guess_is_worth_nothing() {
        for hints in 0..=u8::MAX {
            assert_eq!(points(hints, false), 0);
        }
    }

    #[test]
    fn correct_points_stay_in_bounds_and_never_increase() {
        let mut previous = u32::MAX;
        for hints in 1..=MAX_HINTS {
            let earned = points(hints, true);
            assert!((MIN_POINTS_FOR_CORRECT..=MAX_POINTS_PER_ROUND).contains(&earned));
            assert!(earned <= previous);
            previous = earned;
        }
    }

    #[test]
    fn out_of_range_hints_are_clamped() {
        assert_eq!(points(0, true), 5);
        assert_eq!(points(u8::MAX, true), 1);
    }
}
