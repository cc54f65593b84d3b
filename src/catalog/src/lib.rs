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

//! Static board-game catalog data: which expansion a scenario requires,
//! which codex numbers and neighbourhoods it ships with, and the codex
//! card roles (item / monster / attachable / encounter). None of this
//! changes at runtime; it is the fixed rulebook the deck factory and
//! `start_game` validation consult.
//!
//! Six scenario-specific "anomaly" locations that appear in the source
//! catalog this was ported from (Fractured Reality, Lost Souls, Nightmare
//! Breach, Temporal Fissure, Visions of the Moon, Yuggoth Emergent) are not
//! modelled: they are single-use board stickers with no pile of their own,
//! never addressed by any client command, and are dropped from the
//! `REQUIRED_NEIGHBOURHOODS` rosters below.

use std::collections::HashMap;

use data::core::primitives::{Expansion, Neighbourhood, Scenario, Terror};
use data::settings::GameSettings;
use once_cell::sync::Lazy;
use utils::outcome::Value;
use utils::verify;

use Neighbourhood::*;
use Scenario::*;

/// The expansion a scenario requires, for the nine scenarios that ship in
/// an expansion. The four base-game scenarios are absent from this map.
pub static SCENARIO_BY_EXPANSION: Lazy<HashMap<Scenario, Expansion>> = Lazy::new(|| {
    HashMap::from([
        (ShotsInTheDark, Expansion::DeadOfNight),
        (SilenceOfTsathoggua, Expansion::DeadOfNight),
        (DreamsOfRlyeh, Expansion::UnderDarkWaves),
        (ThePaleLantern, Expansion::UnderDarkWaves),
        (TyrantsOfRuin, Expansion::UnderDarkWaves),
        (IthaquasChildren, Expansion::UnderDarkWaves),
        (TheDeadCryOut, Expansion::SecretsOfTheOrder),
        (TheKeyAndTheGate, Expansion::SecretsOfTheOrder),
        (BoundToServe, Expansion::SecretsOfTheOrder),
    ])
});

/// Headline numbers that are rumors rather than plain headlines, keyed by
/// which expansion's headline deck they belong to. `None` is the base game.
pub static HEADLINE_RUMORS: Lazy<HashMap<Option<Expansion>, Vec<u32>>> = Lazy::new(|| {
    HashMap::from([
        (None, vec![29, 30, 31, 32]),
        (Some(Expansion::DeadOfNight), vec![38, 39]),
        (Some(Expansion::UnderDarkWaves), vec![43]),
        (Some(Expansion::SecretsOfTheOrder), vec![]),
    ])
});

fn range_inclusive(from: u32, to: u32) -> impl Iterator<Item = u32> {
    from..=to
}

/// Codex numbers a scenario's archive must contain, by codex number.
pub static REQUIRED_CODEX: Lazy<HashMap<Scenario, Vec<u32>>> = Lazy::new(|| {
    HashMap::from([
        (ApproachOfAzathoth, [2].into_iter().chain(range_inclusive(3, 9)).collect()),
        (FeastForUmordhoth, [1].into_iter().chain(range_inclusive(10, 19)).collect()),
        (VeilOfTwilight, [2].into_iter().chain(range_inclusive(20, 28)).collect()),
        (EchoesOfTheDeep, [2].into_iter().chain(range_inclusive(29, 40)).collect()),
        (ShotsInTheDark, [1].into_iter().chain(range_inclusive(41, 52)).collect()),
        (SilenceOfTsathoggua, [2].into_iter().chain(range_inclusive(53, 59)).collect()),
        (TyrantsOfRuin, range_inclusive(61, 75).collect()),
        (ThePaleLantern, [2].into_iter().chain(range_inclusive(76, 90)).collect()),
        (IthaquasChildren, [61].into_iter().chain(range_inclusive(91, 105)).collect()),
        (DreamsOfRlyeh, [2].into_iter().chain(range_inclusive(106, 120)).collect()),
        (BoundToServe, [2].into_iter().chain(range_inclusive(121, 134)).collect()),
        (TheDeadCryOut, [1].into_iter().chain(range_inclusive(135, 149)).collect()),
        (TheKeyAndTheGate, [2].into_iter().chain(range_inclusive(150, 164)).collect()),
    ])
});

/// The terror neighbourhood a scenario starts with, for the two scenarios
/// that use a terror track.
pub static DEFAULT_TERROR_NEIGHBOURHOOD: Lazy<HashMap<Scenario, Neighbourhood>> =
    Lazy::new(|| HashMap::from([(TyrantsOfRuin, InnsmouthShore), (IthaquasChildren, Easttown)]));

pub static SCENARIO_TERROR_MAP: Lazy<HashMap<Scenario, Terror>> = Lazy::new(|| {
    HashMap::from([(TyrantsOfRuin, Terror::FeedingFrenzy), (IthaquasChildren, Terror::FrozenCity)])
});

pub static CODEX_ITEMS: &[u32] = &[68, 69, 70, 90];
pub static CODEX_MONSTERS: &[u32] = &[19, 28, 39, 40, 60, 74, 75, 89, 104, 105, 145, 146];
pub static CODEX_ATTACHABLE: &[u32] = &[32, 33, 34, 35, 55, 56];
pub static CODEX_ENCOUNTERS: &[u32] = &[13, 14, 15, 16, 17, 147, 148, 149, 161, 162, 163, 164, 168];
pub static CODEX_SHUFFLE_ENCOUNTERS: &[u32] = &[13, 14, 15, 16, 17];
pub static CODEX_TOP_ENCOUNTERS: &[u32] = &[161, 162, 163, 164, 168];

/// The neighbourhood a codex encounter card (by number) attaches to.
pub static CODEX_NEIGHBOURHOODS: Lazy<HashMap<u32, Neighbourhood>> = Lazy::new(|| {
    HashMap::from([
        (13, Downtown),
        (14, Easttown),
        (15, Rivertown),
        (16, Uptown),
        (17, Southside),
        (32, Rivertown),
        (33, Downtown),
        (34, Northside),
        (35, MiskatonicUniversity),
        (55, Northside),
        (56, Uptown),
        (147, TheUnderworld),
        (148, TheUnderworld),
        (149, TheUnderworld),
        (161, Easttown),
        (162, FrenchHill),
        (163, MerchantDistrict),
        (164, Rivertown),
        (168, Uptown),
    ])
});

/// A scenario's neighbourhood roster: `start` is dealt out at `start_game`,
/// `later` is held aside until `add_neighbourhood` unlocks it.
#[derive(Debug, Clone, Default)]
pub struct ScenarioNeighbourhoods {
    pub start: Vec<Neighbourhood>,
    pub later: Vec<Neighbourhood>,
}

pub static REQUIRED_NEIGHBOURHOODS: Lazy<HashMap<Scenario, ScenarioNeighbourhoods>> = Lazy::new(|| {
    HashMap::from([
        (
            ApproachOfAzathoth,
            ScenarioNeighbourhoods {
                start: vec![Northside, Downtown, Easttown, MerchantDistrict, Rivertown, TheStreets],
                later: vec![],
            },
        ),
        (
            FeastForUmordhoth,
            ScenarioNeighbourhoods {
                start: vec![Downtown, Easttown, Rivertown, Uptown, Southside, TheStreets],
                later: vec![],
            },
        ),
        (
            VeilOfTwilight,
            ScenarioNeighbourhoods {
                start: vec![Northside, Rivertown, Southside, MiskatonicUniversity, Uptown, TheStreets],
                later: vec![],
            },
        ),
        (
            EchoesOfTheDeep,
            ScenarioNeighbourhoods {
                start: vec![MiskatonicUniversity, MerchantDistrict, Northside, Rivertown, Downtown, TheStreets],
                later: vec![],
            },
        ),
        (
            ShotsInTheDark,
            ScenarioNeighbourhoods {
                start: vec![Downtown, Easttown, Rivertown, Northside, MerchantDistrict, TheStreets],
                later: vec![],
            },
        ),
        (
            SilenceOfTsathoggua,
            ScenarioNeighbourhoods {
                start: vec![Northside, MerchantDistrict, Rivertown, MiskatonicUniversity, Uptown, TheStreets],
                later: vec![],
            },
        ),
        (
            DreamsOfRlyeh,
            ScenarioNeighbourhoods {
                start: vec![MiskatonicUniversity, Rivertown, Uptown, Southside, TheStreets, TravelRoutes],
                later: vec![CentralKingsport, KingsportHarbor, InnsmouthShore, InnsmouthVillage],
            },
        ),
        (
            ThePaleLantern,
            ScenarioNeighbourhoods {
                start: vec![
                    Downtown,
                    MiskatonicUniversity,
                    Uptown,
                    CentralKingsport,
                    KingsportHarbor,
                    TheStreets,
                    TravelRoutes,
                    StrangeHighHouse,
                ],
                later: vec![],
            },
        ),
        (
            TyrantsOfRuin,
            ScenarioNeighbourhoods {
                start: vec![
                    Northside,
                    Easttown,
                    MiskatonicUniversity,
                    Southside,
                    InnsmouthShore,
                    InnsmouthVillage,
                    TheStreets,
                    TravelRoutes,
                    DevilReef,
                ],
                later: vec![],
            },
        ),
        (
            IthaquasChildren,
            ScenarioNeighbourhoods {
                start: vec![
                    Downtown,
                    Northside,
                    Rivertown,
                    Easttown,
                    Southside,
                    InnsmouthShore,
                    CentralKingsport,
                    TheStreets,
                    TravelRoutes,
                ],
                later: vec![],
            },
        ),
        (
            TheDeadCryOut,
            ScenarioNeighbourhoods {
                start: vec![
                    Northside,
                    Easttown,
                    MiskatonicUniversity,
                    TheUnderworld,
                    FrenchHill,
                    Uptown,
                    Southside,
                    TheStreets,
                    Thresholds,
                ],
                later: vec![],
            },
        ),
        (
            TheKeyAndTheGate,
            ScenarioNeighbourhoods {
                start: vec![Easttown, FrenchHill, Uptown, Rivertown, MerchantDistrict, TheStreets, TheUnnamable],
                later: vec![Thresholds, TheUnderworld],
            },
        ),
        (
            BoundToServe,
            ScenarioNeighbourhoods {
                start: vec![Downtown, MerchantDistrict, Rivertown, FrenchHill, Uptown, Southside, TheStreets, WitchHouse],
                later: vec![],
            },
        ),
    ])
});

/// Validates that `settings.expansions` enables whichever expansion the
/// chosen scenario requires, and that the bitmask itself is in range.
pub fn validate_settings(settings: &GameSettings) -> Value<()> {
    verify!(settings.expansions <= 7, InvalidSettings, "expansions bitmask {} is out of range", settings.expansions);
    if let Some(required) = SCENARIO_BY_EXPANSION.get(&settings.scenario) {
        verify!(
            settings.expansions & required.bit() != 0,
            InvalidSettings,
            "scenario requires an expansion that is not enabled"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use data::core::primitives::Expansion;

    use super::*;

    #[test]
    fn base_game_scenario_needs_no_expansion() {
        let settings = GameSettings { scenario: ApproachOfAzathoth, expansions: 0 };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn expansion_scenario_without_its_bit_is_rejected() {
        let settings = GameSettings { scenario: ShotsInTheDark, expansions: 0 };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn expansion_scenario_with_its_bit_is_accepted() {
        let settings = GameSettings { scenario: ShotsInTheDark, expansions: Expansion::DeadOfNight.bit() };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn out_of_range_bitmask_is_rejected() {
        let settings = GameSettings { scenario: ApproachOfAzathoth, expansions: 8 };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn required_codex_and_neighbourhoods_cover_every_scenario() {
        for scenario in REQUIRED_CODEX.keys() {
            assert!(REQUIRED_NEIGHBOURHOODS.contains_key(scenario), "{scenario:?} has no neighbourhood roster");
        }
    }

    #[test]
    fn codex_neighbourhood_numbers_do_not_overlap_role_tables() {
        for number in CODEX_NEIGHBOURHOODS.keys() {
            assert!(!CODEX_ITEMS.contains(number), "codex {number} is both a neighbourhood card and an item");
            assert!(!CODEX_MONSTERS.contains(number), "codex {number} is both a neighbourhood card and a monster");
        }
    }
}
