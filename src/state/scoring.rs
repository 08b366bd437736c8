//! Scoring rules for matched pairs and finished sessions.
//!
//! Every bonus shrinks in discrete steps as the session drags on and is
//! floored at zero, so the score only ever grows.

/// Points granted for any matched pair.
pub const MATCH_BASE: u32 = 100;
/// Points granted once the last pair is found.
pub const COMPLETION_BASE: u32 = 200;

const MATCH_BONUS_STEPS: u32 = 30;
const MATCH_BONUS_STEP_SECS: u32 = 5;
const MATCH_BONUS_STEP_POINTS: u32 = 5;

const COMPLETION_TIME_LIMIT_SECS: u32 = 60;
const COMPLETION_TIME_POINTS: u32 = 5;
const COMPLETION_MOVE_LIMIT: u32 = 20;
const COMPLETION_MOVE_POINTS: u32 = 10;

/// Time bonus for a match found after `elapsed_secs` seconds.
pub fn match_time_bonus(elapsed_secs: u32) -> u32 {
    MATCH_BONUS_STEPS.saturating_sub(elapsed_secs / MATCH_BONUS_STEP_SECS)
        * MATCH_BONUS_STEP_POINTS
}

/// Total points for a match found after `elapsed_secs` seconds.
pub fn match_points(elapsed_secs: u32) -> u32 {
    MATCH_BASE + match_time_bonus(elapsed_secs)
}

/// Breakdown of the bonus added when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionBonus {
    /// Remaining seconds under the time limit, weighted.
    pub time_bonus: u32,
    /// Remaining moves under the move limit, weighted.
    pub move_bonus: u32,
    /// `COMPLETION_BASE` plus both bonuses.
    pub total: u32,
}

/// Completion bonus for a session finished in `elapsed_secs` with `moves` turns.
pub fn completion_bonus(elapsed_secs: u32, moves: u32) -> CompletionBonus {
    let time_bonus =
        COMPLETION_TIME_LIMIT_SECS.saturating_sub(elapsed_secs) * COMPLETION_TIME_POINTS;
    let move_bonus = COMPLETION_MOVE_LIMIT.saturating_sub(moves) * COMPLETION_MOVE_POINTS;

    CompletionBonus {
        time_bonus,
        move_bonus,
        total: COMPLETION_BASE + time_bonus + move_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_bonus_decays_every_five_seconds() {
        assert_eq!(match_time_bonus(0), 150);
        assert_eq!(match_time_bonus(4), 150);
        assert_eq!(match_time_bonus(5), 145);
        assert_eq!(match_time_bonus(149), 5);
        assert_eq!(match_time_bonus(150), 0);
        assert_eq!(match_time_bonus(10_000), 0);
    }

    #[test]
    fn match_points_never_drop_below_base() {
        assert_eq!(match_points(0), 250);
        assert_eq!(match_points(u32::MAX), MATCH_BASE);
    }

    #[test]
    fn completion_bonus_weights_time_and_moves() {
        let bonus = completion_bonus(10, 8);
        assert_eq!(bonus.time_bonus, 250);
        assert_eq!(bonus.move_bonus, 120);
        assert_eq!(bonus.total, 570);
    }

    #[test]
    fn completion_bonus_is_floored() {
        let bonus = completion_bonus(600, 40);
        assert_eq!(bonus, CompletionBonus {
            time_bonus: 0,
            move_bonus: 0,
            total: COMPLETION_BASE,
        });
    }
}
