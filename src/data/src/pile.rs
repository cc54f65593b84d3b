// Copyright © spellclash 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The [Pile] sum type: the four shapes a labelled pile of cards can take,
//! plus the operations §4.2 of the design describes for each.
//!
//! `EventPile`'s extra behaviour (splitting by neighbourhood, shuffling a
//! discard underneath) is implemented as additional methods on
//! [OrderedPile] rather than as a separate storage shape: an event deck is,
//! structurally, just another ordered sequence of cards, and every label
//! that is "just a sequence" (`EventDeck`, `EventDiscard`, `Headline`,
//! `Terror`, `Rumor`) is represented the same way.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use utils::error::GameError;
use utils::outcome::Value;
use utils::{fail, verify};

use crate::card::{Card, CodexNeighbourhoodCard, ImageId};
use crate::core::primitives::Neighbourhood;

/// An ordered, bottom-to-top sequence of cards. The last element is "top".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedPile {
    cards: Vec<Card>,
}

impl OrderedPile {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn peek_top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn peek_bottom(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn push_top(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn push_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    pub fn draw_top(&mut self) -> Value<Card> {
        self.cards.pop().ok_or_else(|| GameError::EmptyDeck("pile is empty".to_string()))
    }

    pub fn draw_bottom(&mut self) -> Value<Card> {
        verify!(!self.cards.is_empty(), EmptyDeck, "pile is empty");
        Ok(self.cards.remove(0))
    }

    pub fn clear(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.cards)
    }

    /// Fisher-Yates shuffle using the operating system's cryptographically
    /// secure random source.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::thread_rng());
    }

    /// Removes the current top two cards (or fewer, if the pile is
    /// smaller), combines them with `card`, uniformly permutes the result,
    /// and pushes all of them back on top.
    pub fn shuffle_into_top_three(&mut self, card: Card) {
        let take = self.cards.len().min(2);
        let mut group: Vec<Card> = self.cards.split_off(self.cards.len() - take);
        group.push(card);
        group.shuffle(&mut rand::thread_rng());
        self.cards.extend(group);
    }

    /// Partitions this pile into (kept, removed-by-neighbourhood), mutating
    /// self to the kept cards and returning the removed sub-piles keyed by
    /// the neighbourhood they belong to. Relative order is preserved in
    /// both halves.
    pub fn remove_neighbourhood(
        &mut self,
        neighbourhoods: &[Neighbourhood],
    ) -> HashMap<Neighbourhood, OrderedPile> {
        let mut removed: HashMap<Neighbourhood, Vec<Card>> = HashMap::new();
        let mut kept = Vec::with_capacity(self.cards.len());
        for card in self.cards.drain(..) {
            match card.neighbourhood() {
                Some(nb) if neighbourhoods.contains(&nb) => {
                    removed.entry(nb).or_default().push(card);
                }
                _ => kept.push(card),
            }
        }
        self.cards = kept;
        removed.into_iter().map(|(nb, cards)| (nb, OrderedPile::new(cards))).collect()
    }

    /// Shuffles `discard` and places it underneath self: the discard
    /// becomes the new bottom of the combined pile.
    pub fn shuffle_discard(&mut self, mut discard: OrderedPile) {
        discard.shuffle();
        let mut combined = discard.cards;
        combined.append(&mut self.cards);
        self.cards = combined;
    }

    pub fn extend(&mut self, other: OrderedPile) {
        self.cards.extend(other.cards);
    }
}

/// A neighbourhood's encounter pile, its attached terror sub-pile, and its
/// optional attached codex card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourhoodPile {
    pub cards: OrderedPile,
    pub attached_terror: OrderedPile,
    pub attached_codex: Option<CodexNeighbourhoodCard>,
    pub card_back: ImageId,
}

impl NeighbourhoodPile {
    pub fn new(cards: Vec<Card>, card_back: ImageId) -> Self {
        Self {
            cards: OrderedPile::new(cards),
            attached_terror: OrderedPile::default(),
            attached_codex: None,
            card_back,
        }
    }

    pub fn add_terror(&mut self, card: Card) {
        self.attached_terror.push_top(card);
    }

    pub fn draw_terror(&mut self) -> Value<Card> {
        self.attached_terror.draw_top()
    }

    pub fn attach_codex(&mut self, card: CodexNeighbourhoodCard) -> Value<()> {
        verify!(self.attached_codex.is_none(), InvalidOp, "a codex card is already attached");
        self.attached_codex = Some(card);
        Ok(())
    }

    pub fn pop_codex(&mut self) -> Value<CodexNeighbourhoodCard> {
        self.attached_codex.take().ok_or_else(|| GameError::NotFound("no codex card attached".to_string()))
    }

    pub fn has_codex(&self, number: u32) -> bool {
        self.attached_codex.as_ref().is_some_and(|c| c.number == number)
    }

    pub fn modify_codex_counters(&mut self, delta: i32) -> Value<()> {
        let Some(codex) = self.attached_codex.as_mut() else {
            fail!(NotFound, "no codex card attached");
        };
        codex.counters = (codex.counters + delta).max(0);
        Ok(())
    }

    pub fn flip_codex(&mut self) -> Value<()> {
        let Some(codex) = self.attached_codex.as_mut() else {
            fail!(NotFound, "no codex card attached");
        };
        codex.is_flipped = !codex.is_flipped;
        Ok(())
    }
}

/// A mapping from codex number to card, used for both the `Archive` and
/// `Codex` labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedPile {
    cards: BTreeMap<u32, Card>,
}

impl KeyedPile {
    pub fn new(cards: BTreeMap<u32, Card>) -> Self {
        Self { cards }
    }

    pub fn get_card(&mut self, number: u32) -> Value<Card> {
        self.cards.remove(&number).ok_or_else(|| GameError::NotFound(format!("codex number {number} not found")))
    }

    pub fn peek(&self, number: u32) -> Option<&Card> {
        self.cards.get(&number)
    }

    pub fn peek_mut(&mut self, number: u32) -> Option<&mut Card> {
        self.cards.get_mut(&number)
    }

    pub fn add_card(&mut self, card: Card) {
        let number = card.codex_number().expect("only codex cards are stored in a keyed pile");
        self.cards.insert(number, card);
    }

    pub fn contains(&self, number: u32) -> bool {
        self.cards.contains_key(&number)
    }

    /// All cards, sorted by codex number.
    pub fn sorted(&self) -> Vec<&Card> {
        self.cards.values().collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// The `ActionRequired` pile: neighbourhood event cards awaiting a
/// `resolve_event`, keyed by an opaque ticket string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPile {
    tickets: HashMap<String, Card>,
}

impl PendingPile {
    pub fn insert(&mut self, ticket: String, card: Card) {
        self.tickets.insert(ticket, card);
    }

    pub fn pop(&mut self, ticket: &str) -> Value<Card> {
        self.tickets.remove(ticket).ok_or_else(|| GameError::NotFound(format!("ticket {ticket} not found")))
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }
}

/// A labelled pile, in one of its four storage shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum Pile {
    Ordered(OrderedPile),
    Neighbourhood(NeighbourhoodPile),
    Keyed(KeyedPile),
    Pending(PendingPile),
}

impl Pile {
    pub fn as_ordered(&self) -> Value<&OrderedPile> {
        match self {
            Pile::Ordered(p) => Ok(p),
            _ => fail!(Internal, "expected an ordered pile"),
        }
    }

    pub fn as_ordered_mut(&mut self) -> Value<&mut OrderedPile> {
        match self {
            Pile::Ordered(p) => Ok(p),
            _ => fail!(Internal, "expected an ordered pile"),
        }
    }

    pub fn as_neighbourhood(&self) -> Value<&NeighbourhoodPile> {
        match self {
            Pile::Neighbourhood(p) => Ok(p),
            _ => fail!(Internal, "expected a neighbourhood pile"),
        }
    }

    pub fn as_neighbourhood_mut(&mut self) -> Value<&mut NeighbourhoodPile> {
        match self {
            Pile::Neighbourhood(p) => Ok(p),
            _ => fail!(Internal, "expected a neighbourhood pile"),
        }
    }

    pub fn as_keyed_mut(&mut self) -> Value<&mut KeyedPile> {
        match self {
            Pile::Keyed(p) => Ok(p),
            _ => fail!(Internal, "expected a keyed pile"),
        }
    }

    pub fn as_keyed(&self) -> Value<&KeyedPile> {
        match self {
            Pile::Keyed(p) => Ok(p),
            _ => fail!(Internal, "expected a keyed pile"),
        }
    }

    pub fn as_pending(&self) -> Value<&PendingPile> {
        match self {
            Pile::Pending(p) => Ok(p),
            _ => fail!(Internal, "expected the pending-action pile"),
        }
    }

    pub fn as_pending_mut(&mut self) -> Value<&mut PendingPile> {
        match self {
            Pile::Pending(p) => Ok(p),
            _ => fail!(Internal, "expected the pending-action pile"),
        }
    }
}
