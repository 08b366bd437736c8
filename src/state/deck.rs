//! Paired symbol deck used by the turn engine.

use std::collections::HashMap;

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

/// A single card on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Position index on the board, unique within a deck.
    pub id: usize,
    /// Symbol printed on the card face.
    pub face: String,
    /// Face up while waiting for the end of the current turn.
    pub is_flipped: bool,
    /// Permanently face up once its pair has been found.
    pub is_matched: bool,
}

impl Card {
    fn hidden(id: usize, face: String) -> Self {
        Self {
            id,
            face,
            is_flipped: false,
            is_matched: false,
        }
    }
}

/// Ordered cards dealt for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Rejected explicit deck layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    /// A deck needs at least one pair.
    #[error("deck must contain at least one pair")]
    Empty,
    /// Every face must appear exactly twice.
    #[error("face `{face}` appears {count} times (expected 2)")]
    Unpaired {
        /// Offending symbol.
        face: String,
        /// Number of occurrences found in the layout.
        count: usize,
    },
}

impl Deck {
    /// Deal every symbol twice and shuffle the result with `rng`.
    pub fn shuffled<R>(symbols: &[String], rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut faces: Vec<String> = symbols
            .iter()
            .chain(symbols.iter())
            .cloned()
            .collect();
        faces.shuffle(rng);

        Self::from_faces_unchecked(faces)
    }

    /// Build a deck keeping the given face order.
    pub fn from_faces<I, S>(faces: I) -> Result<Self, DeckError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let faces: Vec<String> = faces.into_iter().map(Into::into).collect();
        if faces.is_empty() {
            return Err(DeckError::Empty);
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for face in &faces {
            *counts.entry(face.as_str()).or_default() += 1;
        }
        if let Some((face, count)) = counts.into_iter().find(|(_, count)| *count != 2) {
            return Err(DeckError::Unpaired {
                face: face.to_owned(),
                count,
            });
        }

        Ok(Self::from_faces_unchecked(faces))
    }

    fn from_faces_unchecked(faces: Vec<String>) -> Self {
        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(id, face)| Card::hidden(id, face))
            .collect();
        Self { cards }
    }

    /// Number of distinct pairs in the deck.
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// Number of cards in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck holds no card at all.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Borrow the cards in board order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(crate) fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn symbols(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn face_counts(deck: &Deck) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for card in deck.cards() {
            *counts.entry(card.face.clone()).or_default() += 1;
        }
        counts
    }

    #[test]
    fn shuffled_deck_holds_each_symbol_twice() {
        let symbols = symbols(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let deck = Deck::shuffled(&symbols, &mut rng);
            assert_eq!(deck.len(), 16);
            assert_eq!(deck.len() % 2, 0);
            assert_eq!(deck.pair_count(), 8);

            let counts = face_counts(&deck);
            assert_eq!(counts.len(), 8);
            assert!(counts.values().all(|count| *count == 2));
        }
    }

    #[test]
    fn card_ids_follow_board_positions() {
        let symbols = symbols(&["A", "B", "C"]);
        let deck = Deck::shuffled(&symbols, &mut StdRng::seed_from_u64(1));

        for (index, card) in deck.cards().iter().enumerate() {
            assert_eq!(card.id, index);
            assert!(!card.is_flipped);
            assert!(!card.is_matched);
        }
    }

    #[test]
    fn same_seed_deals_same_order() {
        let symbols = symbols(&["A", "B", "C", "D"]);
        let first = Deck::shuffled(&symbols, &mut StdRng::seed_from_u64(42));
        let second = Deck::shuffled(&symbols, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn explicit_layout_is_kept() {
        let deck = Deck::from_faces(["A", "B", "A", "B"]).unwrap();
        let faces: Vec<&str> = deck.cards().iter().map(|card| card.face.as_str()).collect();
        assert_eq!(faces, ["A", "B", "A", "B"]);
    }

    #[test]
    fn explicit_layout_rejects_unpaired_faces() {
        assert_eq!(
            Deck::from_faces(Vec::<String>::new()).unwrap_err(),
            DeckError::Empty
        );

        match Deck::from_faces(["A", "A", "A", "B"]).unwrap_err() {
            DeckError::Unpaired { face, count } => {
                assert!(face == "A" && count == 3 || face == "B" && count == 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
