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

//! Core primitive types shared across the whole game core: the enums that
//! name scenarios, expansions, and neighbourhoods, and the opaque handle
//! used to identify seated players.

use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

/// A scenario the players can choose to play.
///
/// The on-wire string is the scenario's display name (mixed case, matching
/// the board game's box art) rather than a canonicalised identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "Approach of Azathoth")]
    ApproachOfAzathoth,
    #[serde(rename = "Feast for Umordhoth")]
    FeastForUmordhoth,
    #[serde(rename = "Veil of Twilight")]
    VeilOfTwilight,
    #[serde(rename = "Echoes of the Deep")]
    EchoesOfTheDeep,
    #[serde(rename = "Shots in the Dark")]
    ShotsInTheDark,
    #[serde(rename = "Silence of Tsathoggua")]
    SilenceOfTsathoggua,
    #[serde(rename = "Dreams of R'lyeh")]
    DreamsOfRlyeh,
    #[serde(rename = "The Pale Lantern")]
    ThePaleLantern,
    #[serde(rename = "Tyrants of Ruin")]
    TyrantsOfRuin,
    #[serde(rename = "Ithaqua's Children")]
    IthaquasChildren,
    #[serde(rename = "The Dead Cry Out")]
    TheDeadCryOut,
    #[serde(rename = "The Key and the Gate")]
    TheKeyAndTheGate,
    #[serde(rename = "Bound to Serve")]
    BoundToServe,
}

/// Expansion bit flags. `settings.expansions` is the bitwise-or of whichever
/// of these are enabled; `0` means base game only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
#[repr(u8)]
pub enum Expansion {
    DeadOfNight = 1,
    UnderDarkWaves = 2,
    SecretsOfTheOrder = 4,
}

impl Expansion {
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// The scenario-specific terror kind, for scenarios that use a terror pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terror {
    #[serde(rename = "Feeding Frenzy")]
    FeedingFrenzy,
    #[serde(rename = "Frozen City")]
    FrozenCity,
}

/// A named region of the game board; keys a dedicated encounter pile and
/// optional attached codex / terror sub-piles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum Neighbourhood {
    // Base game.
    Downtown,
    Easttown,
    #[serde(rename = "Merchant District")]
    MerchantDistrict,
    #[serde(rename = "Miskatonic University")]
    MiskatonicUniversity,
    Northside,
    Rivertown,
    Southside,
    Uptown,
    #[serde(rename = "The Streets")]
    TheStreets,

    // Dead of Night.
    #[serde(rename = "Shots in the Dark")]
    ShotsInTheDarkNeighbourhood,
    #[serde(rename = "Silence of Tsathoggua")]
    SilenceOfTsathogguaNeighbourhood,

    // Under Dark Waves.
    #[serde(rename = "Central Kingsport")]
    CentralKingsport,
    #[serde(rename = "Innsmouth Shore")]
    InnsmouthShore,
    #[serde(rename = "Innsmouth Village")]
    InnsmouthVillage,
    #[serde(rename = "Kingsport Harbor")]
    KingsportHarbor,
    #[serde(rename = "Travel Routes")]
    TravelRoutes,
    #[serde(rename = "Devil Reef")]
    DevilReef,
    #[serde(rename = "Strange High House")]
    StrangeHighHouse,

    // Secrets of the Order.
    #[serde(rename = "French Hill")]
    FrenchHill,
    #[serde(rename = "The Underworld")]
    TheUnderworld,
    Thresholds,
    #[serde(rename = "The Unnamable")]
    TheUnnamable,
    #[serde(rename = "Witch House")]
    WitchHouse,
}

/// A stable, opaque identifier for a seated player, allocated at seat time.
///
/// Deliberately not the connection object itself: the history engine keys
/// its per-player change-logs by this handle so that it never aliases
/// networking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);
