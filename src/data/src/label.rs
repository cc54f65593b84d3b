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

//! Pile labels: the unit of history. Every live pile lives under exactly one
//! label, and the history engine records timelines and change-sets in terms
//! of labels rather than the piles themselves.

use serde::{Deserialize, Serialize};

use crate::core::primitives::Neighbourhood;

/// The disjoint union of the eight fixed labels and the [Neighbourhood] enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    EventDeck,
    EventDiscard,
    Headline,
    Codex,
    Archive,
    Terror,
    Rumor,
    ActionRequired,
    Neighbourhood(Neighbourhood),
}

impl From<Neighbourhood> for Label {
    fn from(value: Neighbourhood) -> Self {
        Label::Neighbourhood(value)
    }
}
