use uuid::Uuid;

use crate::state::{
    deck::{Card, Deck},
    scoring::{self, CompletionBonus},
};

/// Phases the turn engine can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    /// No session has been started yet.
    #[default]
    Idle,
    /// Waiting for the first card of a turn.
    AwaitingFirstSelection,
    /// One card is face up, waiting for its candidate partner.
    AwaitingSecondSelection,
    /// Two mismatched cards are shown until the reveal delay elapses.
    Resolving,
    /// Every pair has been found; terminal for the session.
    Complete,
}

impl EnginePhase {
    /// Whether card selections are currently processed.
    pub fn accepts_selection(self) -> bool {
        matches!(
            self,
            EnginePhase::AwaitingFirstSelection | EnginePhase::AwaitingSecondSelection
        )
    }
}

/// Reason a selection left the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The engine is idle, resolving a mismatch or complete.
    NotAccepting(EnginePhase),
    /// No card has this identifier.
    OutOfRange,
    /// The card's pair has already been found.
    AlreadyMatched,
    /// The card is already face up in the current turn.
    AlreadyFlipped,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Session the summary belongs to.
    pub session_id: Uuid,
    /// Seconds elapsed when the last pair was found.
    pub elapsed_secs: u32,
    /// Number of two-card turns played.
    pub moves: u32,
    /// Bonus added on completion.
    pub bonus: CompletionBonus,
    /// Score including the completion bonus.
    pub final_score: u32,
}

/// Result of a single card selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// First card of a turn is now face up.
    Flipped {
        /// Card that was turned.
        card_id: usize,
    },
    /// Both cards share a face and stay up for good.
    Matched {
        /// Cards of the pair, in selection order.
        pair: (usize, usize),
        /// Points earned by the match itself.
        points: u32,
        /// Present when this match finished the session.
        completion: Option<Completion>,
    },
    /// Faces differ; the cards stay up until [`TurnEngine::resolve_mismatch`].
    Mismatched {
        /// Session the pending reveal belongs to.
        session_id: Uuid,
        /// Cards of the failed pair, in selection order.
        pair: (usize, usize),
    },
}

/// Mutable data of the session currently on the board.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Fresh identifier generated on every start.
    pub id: Uuid,
    /// Cards in board order.
    pub cards: Vec<Card>,
    /// Face-up cards awaiting the end of the turn.
    pub pending: Vec<usize>,
    /// Pairs found so far.
    pub matched_pairs: usize,
    /// Pairs required to complete the session.
    pub total_pairs: usize,
    /// Completed two-card turns.
    pub moves: u32,
    /// Accumulated score, never decreases.
    pub score: u32,
    /// Seconds counted by the session timer.
    pub elapsed_secs: u32,
    /// True from start until completion.
    pub is_playing: bool,
}

impl SessionState {
    fn new(deck: Deck) -> Self {
        let total_pairs = deck.pair_count();
        Self {
            id: Uuid::new_v4(),
            cards: deck.into_cards(),
            pending: Vec::with_capacity(2),
            matched_pairs: 0,
            total_pairs,
            moves: 0,
            score: 0,
            elapsed_secs: 0,
            is_playing: true,
        }
    }
}

/// State machine evaluating turns of the memory game.
///
/// All mutation goes through [`start`](Self::start), [`select`](Self::select),
/// [`resolve_mismatch`](Self::resolve_mismatch) and [`tick`](Self::tick).
/// Continuations scheduled by the caller carry the session id they were
/// created for so that a restart makes them inert.
#[derive(Debug, Clone, Default)]
pub struct TurnEngine {
    phase: EnginePhase,
    session: Option<SessionState>,
}

impl TurnEngine {
    /// Create an engine with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Borrow the current session, if one was started.
    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Identifier of the current session.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|session| session.id)
    }

    /// Whether the session timer should keep running.
    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_playing)
    }

    /// Deal `deck` and reset every counter. Restarting mid-session discards
    /// the previous session.
    pub fn start(&mut self, deck: Deck) -> Uuid {
        let session = SessionState::new(deck);
        let id = session.id;
        self.session = Some(session);
        self.phase = EnginePhase::AwaitingFirstSelection;
        id
    }

    /// Turn `card_id` face up and evaluate the turn when it is the second card.
    pub fn select(&mut self, card_id: usize) -> SelectOutcome {
        if !self.phase.accepts_selection() {
            return SelectOutcome::Ignored(IgnoreReason::NotAccepting(self.phase));
        }
        let Some(session) = self.session.as_mut() else {
            return SelectOutcome::Ignored(IgnoreReason::NotAccepting(self.phase));
        };
        let Some(card) = session.cards.get_mut(card_id) else {
            return SelectOutcome::Ignored(IgnoreReason::OutOfRange);
        };
        if card.is_matched {
            return SelectOutcome::Ignored(IgnoreReason::AlreadyMatched);
        }
        if card.is_flipped {
            return SelectOutcome::Ignored(IgnoreReason::AlreadyFlipped);
        }

        card.is_flipped = true;
        session.pending.push(card_id);

        if self.phase == EnginePhase::AwaitingFirstSelection {
            self.phase = EnginePhase::AwaitingSecondSelection;
            return SelectOutcome::Flipped { card_id };
        }

        session.moves += 1;
        self.phase = EnginePhase::Resolving;
        self.evaluate_turn()
    }

    fn evaluate_turn(&mut self) -> SelectOutcome {
        let Some(session) = self.session.as_mut() else {
            return SelectOutcome::Ignored(IgnoreReason::NotAccepting(self.phase));
        };
        let (first, second) = (session.pending[0], session.pending[1]);

        if session.cards[first].face != session.cards[second].face {
            return SelectOutcome::Mismatched {
                session_id: session.id,
                pair: (first, second),
            };
        }

        session.cards[first].is_matched = true;
        session.cards[second].is_matched = true;
        session.pending.clear();
        session.matched_pairs += 1;

        let points = scoring::match_points(session.elapsed_secs);
        session.score += points;

        let completion = if session.matched_pairs == session.total_pairs {
            session.is_playing = false;
            let bonus = scoring::completion_bonus(session.elapsed_secs, session.moves);
            session.score += bonus.total;
            self.phase = EnginePhase::Complete;
            Some(Completion {
                session_id: session.id,
                elapsed_secs: session.elapsed_secs,
                moves: session.moves,
                bonus,
                final_score: session.score,
            })
        } else {
            self.phase = EnginePhase::AwaitingFirstSelection;
            None
        };

        SelectOutcome::Matched {
            pair: (first, second),
            points,
            completion,
        }
    }

    /// Hide the mismatched pair of `session_id`. Returns `false` when the
    /// continuation is stale (other session or nothing to resolve).
    pub fn resolve_mismatch(&mut self, session_id: Uuid) -> bool {
        if self.phase != EnginePhase::Resolving {
            return false;
        }
        let Some(session) = self.session.as_mut().filter(|s| s.id == session_id) else {
            return false;
        };

        for id in session.pending.drain(..) {
            session.cards[id].is_flipped = false;
        }
        self.phase = EnginePhase::AwaitingFirstSelection;
        true
    }

    /// Advance the session clock by one second, returning the new elapsed
    /// time. `None` tells the timer to stop.
    pub fn tick(&mut self, session_id: Uuid) -> Option<u32> {
        let session = self
            .session
            .as_mut()
            .filter(|session| session.id == session_id && session.is_playing)?;
        session.elapsed_secs += 1;
        Some(session.elapsed_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(faces: &[&str]) -> (TurnEngine, Uuid) {
        let mut engine = TurnEngine::new();
        let id = engine.start(Deck::from_faces(faces.iter().copied()).unwrap());
        (engine, id)
    }

    fn scenario_engine() -> (TurnEngine, Uuid) {
        engine_with(&["A", "B", "A", "B", "C", "D", "C", "D"])
    }

    fn snapshot(engine: &TurnEngine) -> (EnginePhase, Vec<Card>, Vec<usize>, usize, u32, u32) {
        let session = engine.session().unwrap();
        (
            engine.phase(),
            session.cards.clone(),
            session.pending.clone(),
            session.matched_pairs,
            session.moves,
            session.score,
        )
    }

    #[test]
    fn initial_state_is_idle() {
        let mut engine = TurnEngine::new();
        assert_eq!(engine.phase(), EnginePhase::Idle);
        assert!(!engine.is_playing());
        assert_eq!(
            engine.select(0),
            SelectOutcome::Ignored(IgnoreReason::NotAccepting(EnginePhase::Idle))
        );
    }

    #[test]
    fn start_resets_counters() {
        let (engine, id) = scenario_engine();
        let session = engine.session().unwrap();
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);
        assert_eq!(session.id, id);
        assert_eq!(session.total_pairs, 4);
        assert_eq!((session.moves, session.score, session.matched_pairs), (0, 0, 0));
        assert_eq!(session.elapsed_secs, 0);
        assert!(session.is_playing);
    }

    #[test]
    fn first_selection_flips_without_counting_a_move() {
        let (mut engine, _) = scenario_engine();
        assert_eq!(engine.select(0), SelectOutcome::Flipped { card_id: 0 });

        let session = engine.session().unwrap();
        assert!(session.cards[0].is_flipped);
        assert_eq!(session.pending, vec![0]);
        assert_eq!(session.moves, 0);
        assert_eq!(engine.phase(), EnginePhase::AwaitingSecondSelection);
    }

    #[test]
    fn selecting_flipped_card_is_a_no_op() {
        let (mut engine, _) = scenario_engine();
        engine.select(0);
        let before = snapshot(&engine);

        assert_eq!(
            engine.select(0),
            SelectOutcome::Ignored(IgnoreReason::AlreadyFlipped)
        );
        assert_eq!(snapshot(&engine), before);
    }

    #[test]
    fn selecting_matched_card_is_a_no_op() {
        let (mut engine, _) = scenario_engine();
        engine.select(0);
        engine.select(2);
        let before = snapshot(&engine);

        assert_eq!(
            engine.select(2),
            SelectOutcome::Ignored(IgnoreReason::AlreadyMatched)
        );
        assert_eq!(snapshot(&engine), before);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let (mut engine, _) = scenario_engine();
        let before = snapshot(&engine);
        assert_eq!(
            engine.select(8),
            SelectOutcome::Ignored(IgnoreReason::OutOfRange)
        );
        assert_eq!(snapshot(&engine), before);
    }

    #[test]
    fn match_marks_pair_and_scores() {
        let (mut engine, _) = scenario_engine();
        engine.select(0);
        let outcome = engine.select(2);

        assert_eq!(
            outcome,
            SelectOutcome::Matched {
                pair: (0, 2),
                points: 250,
                completion: None,
            }
        );
        let session = engine.session().unwrap();
        assert!(session.cards[0].is_matched && session.cards[2].is_matched);
        assert_eq!(session.matched_pairs, 1);
        assert_eq!(session.moves, 1);
        assert_eq!(session.score, 250);
        assert!(session.pending.is_empty());
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);
    }

    #[test]
    fn match_bonus_uses_elapsed_time() {
        let (mut engine, id) = scenario_engine();
        for _ in 0..12 {
            engine.tick(id);
        }
        engine.select(0);
        match engine.select(2) {
            SelectOutcome::Matched { points, .. } => assert_eq!(points, 100 + 28 * 5),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn mismatch_blocks_input_until_resolved() {
        let (mut engine, id) = scenario_engine();
        engine.select(0);
        assert_eq!(
            engine.select(1),
            SelectOutcome::Mismatched {
                session_id: id,
                pair: (0, 1),
            }
        );
        assert_eq!(engine.phase(), EnginePhase::Resolving);
        assert_eq!(engine.session().unwrap().moves, 1);

        let before = snapshot(&engine);
        assert_eq!(
            engine.select(4),
            SelectOutcome::Ignored(IgnoreReason::NotAccepting(EnginePhase::Resolving))
        );
        assert_eq!(snapshot(&engine), before);

        assert!(engine.resolve_mismatch(id));
        let session = engine.session().unwrap();
        assert!(session.cards.iter().all(|card| !card.is_flipped && !card.is_matched));
        assert!(session.pending.is_empty());
        assert_eq!(session.score, 0);
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);
    }

    #[test]
    fn stale_mismatch_continuation_is_ignored() {
        let (mut engine, old_id) = scenario_engine();
        engine.select(0);
        engine.select(1);

        let new_id = engine.start(Deck::from_faces(["X", "Y", "X", "Y"]).unwrap());
        assert_ne!(old_id, new_id);
        assert!(!engine.resolve_mismatch(old_id));
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);

        engine.select(0);
        engine.select(1);
        assert!(!engine.resolve_mismatch(old_id));
        assert_eq!(engine.phase(), EnginePhase::Resolving);
        assert!(engine.resolve_mismatch(new_id));
    }

    #[test]
    fn resolve_without_pending_mismatch_does_nothing() {
        let (mut engine, id) = scenario_engine();
        assert!(!engine.resolve_mismatch(id));
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);
    }

    #[test]
    fn moves_count_turns_not_selections() {
        let (mut engine, id) = scenario_engine();
        engine.select(0);
        assert_eq!(engine.session().unwrap().moves, 0);
        engine.select(1);
        assert_eq!(engine.session().unwrap().moves, 1);
        engine.resolve_mismatch(id);
        engine.select(0);
        engine.select(2);
        assert_eq!(engine.session().unwrap().moves, 2);
    }

    #[test]
    fn full_scenario_reaches_complete() {
        let (mut engine, id) = scenario_engine();
        let mut expected = 0;

        engine.select(0);
        assert!(matches!(engine.select(2), SelectOutcome::Matched { .. }));
        expected += 250;
        assert_eq!(engine.session().unwrap().matched_pairs, 1);

        engine.select(1);
        assert!(matches!(engine.select(4), SelectOutcome::Mismatched { .. }));
        assert!(engine.resolve_mismatch(id));
        assert_eq!(engine.session().unwrap().moves, 2);

        engine.select(1);
        engine.select(3);
        expected += 250;
        engine.select(4);
        engine.select(6);
        expected += 250;
        assert_ne!(engine.phase(), EnginePhase::Complete);

        engine.select(5);
        let completion = match engine.select(7) {
            SelectOutcome::Matched {
                completion: Some(completion),
                points,
                ..
            } => {
                expected += points;
                completion
            }
            other => panic!("expected completing match, got {other:?}"),
        };

        let bonus = scoring::completion_bonus(0, 5);
        expected += bonus.total;
        assert_eq!(engine.phase(), EnginePhase::Complete);
        assert_eq!(completion.session_id, id);
        assert_eq!(completion.moves, 5);
        assert_eq!(completion.bonus, bonus);
        assert_eq!(completion.final_score, expected);
        assert_eq!(engine.session().unwrap().score, expected);
        assert_eq!(engine.session().unwrap().matched_pairs, 4);
        assert!(!engine.is_playing());
    }

    #[test]
    fn complete_session_ignores_input_and_stops_clock() {
        let (mut engine, id) = engine_with(&["A", "A"]);
        engine.select(0);
        engine.select(1);
        assert_eq!(engine.phase(), EnginePhase::Complete);

        assert_eq!(engine.tick(id), None);
        assert_eq!(
            engine.select(0),
            SelectOutcome::Ignored(IgnoreReason::NotAccepting(EnginePhase::Complete))
        );
    }

    #[test]
    fn tick_counts_only_current_session() {
        let (mut engine, id) = scenario_engine();
        assert_eq!(engine.tick(id), Some(1));
        assert_eq!(engine.tick(id), Some(2));
        assert_eq!(engine.tick(Uuid::new_v4()), None);
        assert_eq!(engine.session().unwrap().elapsed_secs, 2);
    }

    #[test]
    fn restart_after_complete_begins_fresh_session() {
        let (mut engine, first) = engine_with(&["A", "A"]);
        engine.select(0);
        engine.select(1);

        let second = engine.start(Deck::from_faces(["A", "A"]).unwrap());
        assert_ne!(first, second);
        assert_eq!(engine.phase(), EnginePhase::AwaitingFirstSelection);
        assert_eq!(engine.session().unwrap().score, 0);
        assert!(engine.is_playing());
    }
}
