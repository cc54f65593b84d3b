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

//! The [Card] sum type and its wire-facing projection, [CardView].

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::primitives::Neighbourhood;

/// An opaque, lowercased image identifier for one side of a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for ImageId {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainCard {
    pub face: ImageId,
    pub back: ImageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineCard {
    pub face: ImageId,
    pub back: ImageId,
    pub is_rumor: bool,
    /// `-1` when this is not a rumor card, otherwise a clamped-at-zero counter.
    pub counters: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourhoodCard {
    pub face: ImageId,
    pub back: ImageId,
    pub neighbourhood: Neighbourhood,
    pub is_event: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodexCard {
    pub face: ImageId,
    pub back: ImageId,
    pub number: u32,
    pub is_item: bool,
    pub is_monster: bool,
    pub can_attach: bool,
    pub is_encounter: bool,
    pub is_flipped: bool,
    pub counters: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodexNeighbourhoodCard {
    pub face: ImageId,
    pub back: ImageId,
    pub number: u32,
    pub neighbourhood: Neighbourhood,
    pub can_attach: bool,
    pub is_encounter: bool,
    pub is_flipped: bool,
    pub counters: i32,
}

/// Every card has `face`/`back` image identifiers; variants add the fields
/// specific to their role on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Card {
    Plain(PlainCard),
    Headline(HeadlineCard),
    Neighbourhood(NeighbourhoodCard),
    Codex(CodexCard),
    CodexNeighbourhood(CodexNeighbourhoodCard),
}

impl Card {
    pub fn face(&self) -> &ImageId {
        match self {
            Card::Plain(c) => &c.face,
            Card::Headline(c) => &c.face,
            Card::Neighbourhood(c) => &c.face,
            Card::Codex(c) => &c.face,
            Card::CodexNeighbourhood(c) => &c.face,
        }
    }

    pub fn back(&self) -> &ImageId {
        match self {
            Card::Plain(c) => &c.back,
            Card::Headline(c) => &c.back,
            Card::Neighbourhood(c) => &c.back,
            Card::Codex(c) => &c.back,
            Card::CodexNeighbourhood(c) => &c.back,
        }
    }

    /// The neighbourhood this card belongs to, for the two variants that
    /// carry one.
    pub fn neighbourhood(&self) -> Option<Neighbourhood> {
        match self {
            Card::Neighbourhood(c) => Some(c.neighbourhood),
            Card::CodexNeighbourhood(c) => Some(c.neighbourhood),
            _ => None,
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Card::Neighbourhood(c) if c.is_event)
    }

    /// The codex number, for the two variants that carry one.
    pub fn codex_number(&self) -> Option<u32> {
        match self {
            Card::Codex(c) => Some(c.number),
            Card::CodexNeighbourhood(c) => Some(c.number),
            _ => None,
        }
    }

    pub fn is_flipped(&self) -> bool {
        match self {
            Card::Codex(c) => c.is_flipped,
            Card::CodexNeighbourhood(c) => c.is_flipped,
            _ => false,
        }
    }

    pub fn set_flipped(&mut self, flipped: bool) {
        match self {
            Card::Codex(c) => c.is_flipped = flipped,
            Card::CodexNeighbourhood(c) => c.is_flipped = flipped,
            _ => {}
        }
    }

    /// Adds `delta` to this card's counter, clamping at zero. No-op for
    /// variants without a counter.
    pub fn modify_counters(&mut self, delta: i32) {
        let counters = match self {
            Card::Headline(c) => &mut c.counters,
            Card::Codex(c) => &mut c.counters,
            Card::CodexNeighbourhood(c) => &mut c.counters,
            _ => return,
        };
        *counters = (*counters + delta).max(0);
    }
}

/// Which face of a card (and in which context) is shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardViewState {
    FaceBack,
    BackFace,
    Event,
    Archive,
    UnFlippedCodex,
    FlippedCodex,
    Rumor,
}

/// The canonical wire projection of a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardView {
    pub face: String,
    pub back: String,
    pub state: CardViewState,
    pub identifier: String,
    pub number: i64,
    pub counters: i32,
}

impl Card {
    /// Projects this card into its wire representation under the given
    /// view state. `identifier` is the caller-assigned opaque string used to
    /// address this card in follow-up commands (a ticket, or empty).
    pub fn to_view(&self, state: CardViewState, identifier: impl Into<String>) -> CardView {
        let number = self.codex_number().map_or(-1, |n| n as i64);
        let counters = match self {
            Card::Headline(c) => c.counters,
            Card::Codex(c) => c.counters,
            Card::CodexNeighbourhood(c) => c.counters,
            _ => -1,
        };
        CardView {
            face: self.face().as_str().to_string(),
            back: self.back().as_str().to_string(),
            state,
            identifier: identifier.into(),
            number,
            counters,
        }
    }
}
