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

//! The history engine: per-label linear timelines of pile snapshots, plus
//! per-player change-logs with the non-interference undo rule.
//!
//! This module owns no live piles; [GameState](crate::game_state::GameState)
//! does. `undo`/`redo` here only walk timeline indices and hand back the
//! snapshot values the caller should install as the new live piles.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use utils::error::GameError;
use utils::outcome::Value;
use utils::verify;

use crate::core::primitives::PlayerId;
use crate::label::Label;
use crate::pile::Pile;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timeline {
    snapshots: Vec<Pile>,
    index: usize,
}

impl Timeline {
    fn new(initial: Pile) -> Self {
        Self { snapshots: vec![initial], index: 0 }
    }

    fn record(&mut self, value: Pile) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(value);
        self.index = self.snapshots.len() - 1;
    }

    fn current(&self) -> &Pile {
        &self.snapshots[self.index]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PlayerLog {
    changes: Vec<BTreeSet<Label>>,
    /// `-1` means "nothing to undo".
    index: i64,
}

impl PlayerLog {
    fn new() -> Self {
        Self { changes: Vec::new(), index: -1 }
    }
}

/// Per-label snapshot timelines plus per-player change-logs, implementing
/// the non-interference undo rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEngine {
    timelines: HashMap<Label, Timeline>,
    players: HashMap<PlayerId, PlayerLog>,
}

impl HistoryEngine {
    /// Creates a history engine with one snapshot per label, taken from the
    /// freshly factory-built game state.
    pub fn new(initial: HashMap<Label, Pile>) -> Self {
        let timelines = initial.into_iter().map(|(label, pile)| (label, Timeline::new(pile))).collect();
        Self { timelines, players: HashMap::new() }
    }

    pub fn seat(&mut self, player: PlayerId) {
        self.players.entry(player).or_insert_with(PlayerLog::new);
    }

    pub fn unseat(&mut self, player: PlayerId) {
        self.players.remove(&player);
    }

    /// Snapshots every touched label's current value and records the
    /// change-set on `player`'s log, truncating every other seated
    /// player's forward (redo) history in the process. `current` supplies
    /// the post-mutation value for each touched label.
    pub fn commit(
        &mut self,
        player: PlayerId,
        labels: BTreeSet<Label>,
        current: impl Fn(Label) -> Pile,
    ) {
        for &label in &labels {
            let value = current(label);
            match self.timelines.get_mut(&label) {
                Some(timeline) => timeline.record(value),
                None => {
                    self.timelines.insert(label, Timeline::new(value));
                }
            }
        }

        let other_ids: Vec<PlayerId> = self.players.keys().copied().filter(|&q| q != player).collect();
        for q in other_ids {
            let log = self.players.get_mut(&q).expect("id came from this map");
            let keep = (log.index + 1).max(0) as usize;
            log.changes.truncate(keep);
        }

        let log = self.players.entry(player).or_insert_with(PlayerLog::new);
        let keep = (log.index + 1).max(0) as usize;
        log.changes.truncate(keep);
        log.changes.push(labels);
        log.index = log.changes.len() as i64 - 1;
    }

    fn own_change_set(&self, player: PlayerId) -> Option<&BTreeSet<Label>> {
        let log = self.players.get(&player)?;
        if log.index < 0 {
            return None;
        }
        log.changes.get(log.index as usize)
    }

    /// Whether `player` may undo: they must have an action on top of their
    /// own log, and it must not share a label with any other seated
    /// player's most recent action.
    pub fn can_undo(&self, player: PlayerId) -> bool {
        let Some(mine) = self.own_change_set(player) else {
            return false;
        };
        self.players.keys().filter(|&&q| q != player).all(|&q| match self.own_change_set(q) {
            Some(theirs) => mine.is_disjoint(theirs),
            None => true,
        })
    }

    pub fn can_redo(&self, player: PlayerId) -> bool {
        self.players.get(&player).is_some_and(|log| (log.index + 1) < log.changes.len() as i64)
    }

    /// Undoes `player`'s most recent eligible action, returning the
    /// restored (label, pile) pairs to be installed as the new live piles.
    pub fn undo(&mut self, player: PlayerId) -> Value<Vec<(Label, Pile)>> {
        verify!(self.can_undo(player), InvalidOp, "nothing eligible to undo for this player");
        let labels = self.own_change_set(player).expect("checked by can_undo").clone();

        let mut restored = Vec::with_capacity(labels.len());
        for label in labels {
            let timeline = self.timelines.get_mut(&label).expect("label was recorded by commit");
            verify!(timeline.index > 0, InvalidOp, "label {label:?} has no earlier snapshot");
            timeline.index -= 1;
            restored.push((label, timeline.current().clone()));
        }

        let log = self.players.get_mut(&player).expect("checked by can_undo");
        log.index -= 1;
        Ok(restored)
    }

    /// Redoes `player`'s next change-set, returning the restored (label,
    /// pile) pairs to be installed as the new live piles.
    pub fn redo(&mut self, player: PlayerId) -> Value<Vec<(Label, Pile)>> {
        let log = self.players.get(&player).ok_or_else(|| GameError::InvalidOp("player is not seated".to_string()))?;
        verify!((log.index + 1) < log.changes.len() as i64, InvalidOp, "nothing to redo");
        let labels = log.changes[(log.index + 1) as usize].clone();

        let mut restored = Vec::with_capacity(labels.len());
        for label in labels {
            let timeline = self.timelines.get_mut(&label).expect("label was recorded by commit");
            verify!(timeline.index + 1 < timeline.snapshots.len(), InvalidOp, "label {label:?} has no later snapshot");
            timeline.index += 1;
            restored.push((label, timeline.current().clone()));
        }

        let log = self.players.get_mut(&player).expect("checked above");
        log.index += 1;
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pile::OrderedPile;

    fn pile(n: usize) -> Pile {
        Pile::Ordered(OrderedPile::new(Vec::with_capacity(n)))
    }

    #[test]
    fn non_interference_allows_disjoint_undo() {
        let live: HashMap<Label, Pile> = HashMap::from([(Label::EventDeck, pile(0)), (Label::Headline, pile(0))]);
        let mut engine = HistoryEngine::new(live.clone());
        let x = PlayerId(0);
        let y = PlayerId(1);
        engine.seat(x);
        engine.seat(y);

        engine.commit(x, BTreeSet::from([Label::Headline]), |l| live[&l].clone());
        engine.commit(y, BTreeSet::from([Label::EventDeck]), |l| live[&l].clone());

        assert!(engine.can_undo(x));
        assert!(engine.can_undo(y));
    }

    #[test]
    fn interference_blocks_undo_until_resolved() {
        let live: HashMap<Label, Pile> = HashMap::from([(Label::EventDeck, pile(0))]);
        let mut engine = HistoryEngine::new(live.clone());
        let x = PlayerId(0);
        let y = PlayerId(1);
        engine.seat(x);
        engine.seat(y);

        engine.commit(x, BTreeSet::from([Label::EventDeck]), |l| live[&l].clone());
        assert!(engine.can_undo(x));

        engine.commit(y, BTreeSet::from([Label::EventDeck]), |l| live[&l].clone());
        assert!(!engine.can_undo(x));
        assert!(engine.can_undo(y));

        engine.undo(y).unwrap();
        assert!(engine.can_undo(x));
    }
}
