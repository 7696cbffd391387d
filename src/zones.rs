//! Card zones (Deck, Hand, Discard)

use crate::core::{CardId, CardRef, PlayerId};
use serde::{Deserialize, Serialize};

/// Where a card can be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Deck,
    Hand,
    Discard,
    Field,
}

/// An ordered pile of cards
///
/// For the deck, the end of the vector is the top.
#[derive(Debug, Clone)]
pub struct CardZone {
    pub zone_type: Zone,
    pub owner: PlayerId,
    pub cards: Vec<CardRef>,
}

impl CardZone {
    pub fn new(zone_type: Zone, owner: PlayerId) -> Self {
        CardZone {
            zone_type,
            owner,
            cards: Vec::new(),
        }
    }

    pub fn add(&mut self, card: CardRef) {
        self.cards.push(card);
    }

    /// Remove by id, keeping the order of the rest
    pub fn remove(&mut self, card_id: CardId) -> Option<CardRef> {
        let pos = self.cards.iter().position(|card| card.id == card_id)?;
        Some(self.cards.remove(pos))
    }

    pub fn get(&self, card_id: CardId) -> Option<&CardRef> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.iter().any(|card| card.id == card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CardRef> {
        self.cards.iter()
    }

    /// Draw from top (for the deck)
    pub fn draw_top(&mut self) -> Option<CardRef> {
        self.cards.pop()
    }

    /// The top `count` cards, top first, without removing them
    pub fn peek_top(&self, count: usize) -> Vec<CardRef> {
        self.cards.iter().rev().take(count).cloned().collect()
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }

    pub fn take_all(&mut self) -> Vec<CardRef> {
        std::mem::take(&mut self.cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, CardName, Effect, TrainerCard, TrainerKind, Trigger};
    use std::sync::Arc;

    fn card(id: u32) -> CardRef {
        let trainer = TrainerCard {
            id: format!("T-{id}"),
            name: CardName::new(format!("Card {id}")),
            kind: TrainerKind::Item,
            text: String::new(),
            effect: Effect::new("", Trigger::OnPlay),
            fossil: None,
        };
        CardRef::new(CardId::new(id), Card::Trainer(Arc::new(trainer)))
    }

    #[test]
    fn test_card_zone() {
        let mut zone = CardZone::new(Zone::Hand, PlayerId::FIRST);
        assert!(zone.is_empty());

        zone.add(card(10));
        zone.add(card(11));
        assert_eq!(zone.len(), 2);
        assert!(zone.contains(CardId::new(10)));

        assert_eq!(zone.remove(CardId::new(10)).map(|c| c.id), Some(CardId::new(10)));
        assert!(zone.remove(CardId::new(10)).is_none());
        assert_eq!(zone.len(), 1);
    }

    #[test]
    fn test_deck_operations() {
        let mut deck = CardZone::new(Zone::Deck, PlayerId::FIRST);
        deck.add(card(10)); // Bottom
        deck.add(card(11));
        deck.add(card(12)); // Top

        let top: Vec<CardId> = deck.peek_top(2).iter().map(|c| c.id).collect();
        assert_eq!(top, vec![CardId::new(12), CardId::new(11)]);
        assert_eq!(deck.draw_top().map(|c| c.id), Some(CardId::new(12)));

        assert_eq!(deck.cards[0].id, CardId::new(10));
        assert_eq!(deck.take_all().len(), 2);
        assert!(deck.draw_top().is_none());
    }
}
