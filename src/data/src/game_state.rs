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

//! [GameState]: the aggregate that owns every live pile under its label,
//! the piles held aside for later, and the history engine. The operation
//! vocabulary of the design (draw, spread-clue, spread-doom, ...) is
//! implemented in the `rules` crate as free functions over `&mut
//! GameState`; this module only owns the data and the bookkeeping common
//! to every operation (label lookup, committing a change-set).

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use utils::error::GameError;
use utils::outcome::Value;

use crate::core::primitives::{Neighbourhood, PlayerId, Scenario};
use crate::history::HistoryEngine;
use crate::label::Label;
use crate::pile::{NeighbourhoodPile, OrderedPile, Pile};
use crate::settings::GameSettings;

/// Neighbourhood rosters and event sub-piles held aside until
/// `add_neighbourhood` unlocks them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaterPiles {
    pub neighbourhoods: HashMap<Neighbourhood, NeighbourhoodPile>,
    pub event_decks: HashMap<Neighbourhood, OrderedPile>,
}

/// The single authoritative game state for the active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub settings: GameSettings,
    pub terror_deck_name: Option<String>,
    piles: HashMap<Label, Pile>,
    pub later: LaterPiles,
    history: HistoryEngine,
}

impl GameState {
    pub fn new(settings: GameSettings, piles: HashMap<Label, Pile>, later: LaterPiles) -> Self {
        let history = HistoryEngine::new(piles.clone());
        Self { settings, terror_deck_name: None, piles, later, history }
    }

    pub fn scenario(&self) -> Scenario {
        self.settings.scenario
    }

    pub fn pile(&self, label: Label) -> Value<&Pile> {
        self.piles.get(&label).ok_or_else(|| GameError::NotFound(format!("no pile for label {label:?}")))
    }

    pub fn pile_mut(&mut self, label: Label) -> Value<&mut Pile> {
        self.piles.get_mut(&label).ok_or_else(|| GameError::NotFound(format!("no pile for label {label:?}")))
    }

    pub fn has_pile(&self, label: Label) -> bool {
        self.piles.contains_key(&label)
    }

    pub fn install_pile(&mut self, label: Label, pile: Pile) {
        self.piles.insert(label, pile);
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.piles.keys()
    }

    pub fn seat(&mut self, player: PlayerId) {
        self.history.seat(player);
    }

    pub fn unseat(&mut self, player: PlayerId) {
        self.history.unseat(player);
    }

    pub fn can_undo(&self, player: PlayerId) -> bool {
        self.history.can_undo(player)
    }

    pub fn can_redo(&self, player: PlayerId) -> bool {
        self.history.can_redo(player)
    }

    /// Records the touched labels' post-mutation values on `player`'s
    /// timeline. Callers perform the mutation on the live piles first, then
    /// call this with the exact set of labels they touched.
    pub fn commit(&mut self, player: PlayerId, labels: impl IntoIterator<Item = Label>) {
        let labels: BTreeSet<Label> = labels.into_iter().collect();
        let piles = &self.piles;
        self.history.commit(player, labels, |label| {
            piles.get(&label).cloned().unwrap_or_else(|| panic!("committed label {label:?} has no live pile"))
        });
    }

    /// Undoes `player`'s most recent eligible action and installs the
    /// restored pile values as the new live state.
    pub fn undo(&mut self, player: PlayerId) -> Value<()> {
        for (label, pile) in self.history.undo(player)? {
            self.piles.insert(label, pile);
        }
        Ok(())
    }

    /// Redoes `player`'s next change-set and installs the restored pile
    /// values as the new live state.
    pub fn redo(&mut self, player: PlayerId) -> Value<()> {
        for (label, pile) in self.history.redo(player)? {
            self.piles.insert(label, pile);
        }
        Ok(())
    }

    /// Whether `ActionRequired` is empty, i.e. the game state is "stable"
    /// and eligible to be the head of an undo chain.
    pub fn is_stable(&self) -> Value<bool> {
        Ok(self.pile(Label::ActionRequired)?.as_pending()?.is_empty())
    }
}
