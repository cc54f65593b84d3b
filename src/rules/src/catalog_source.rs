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

//! The card catalog the deck factory is generic over: per-scenario face/back
//! image identifiers. The exact asset names are external reference data
//! supplied to the core at session creation; [DefaultCatalog] is a small
//! bundled fixture covering every scenario, used for tests and for running
//! the server standalone.

use data::card::ImageId;
use data::core::primitives::{Expansion, Neighbourhood, Scenario, Terror};

/// Resolved face/back identifiers for one scenario's card pool.
pub trait CardCatalog {
    /// `(face, back)` pairs for one neighbourhood's encounter deck, already
    /// filtered to the enabled expansions.
    fn neighbourhood_cards(&self, scenario: Scenario, nb: Neighbourhood, expansions: u8) -> Vec<ImageId>;

    fn neighbourhood_back(&self, nb: Neighbourhood) -> ImageId;

    /// `(face, neighbourhood)` pairs for the scenario's event deck.
    fn event_cards(&self, scenario: Scenario) -> Vec<(ImageId, Neighbourhood)>;

    /// Headline card numbers available for one expansion tier (`None` is base).
    fn headline_numbers(&self, expansion: Option<Expansion>) -> Vec<u32>;

    fn headline_back(&self) -> ImageId;

    /// `(back, faces)` for a terror kind's deck.
    fn terror_cards(&self, terror: Terror) -> (ImageId, Vec<ImageId>);

    fn codex_card_face(&self, number: u32) -> ImageId;

    fn codex_back(&self) -> ImageId;
}

/// A deterministic fixture catalog: every identifier is synthesised from the
/// scenario/neighbourhood/number it names rather than drawn from real game
/// assets, which this core treats as external data (§4.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

/// Per-neighbourhood encounter deck size in the fixture catalog.
const FIXTURE_NEIGHBOURHOOD_SIZE: u32 = 8;

impl CardCatalog for DefaultCatalog {
    fn neighbourhood_cards(&self, scenario: Scenario, nb: Neighbourhood, expansions: u8) -> Vec<ImageId> {
        let tiers = 1 + (expansions.count_ones() as u32);
        (0..FIXTURE_NEIGHBOURHOOD_SIZE * tiers)
            .map(|i| ImageId::new(format!("neighbourhood_{scenario:?}_{nb:?}_{i}")))
            .collect()
    }

    fn neighbourhood_back(&self, nb: Neighbourhood) -> ImageId {
        ImageId::new(format!("neighbourhood_{nb:?}_back"))
    }

    fn event_cards(&self, scenario: Scenario) -> Vec<(ImageId, Neighbourhood)> {
        let roster = catalog::REQUIRED_NEIGHBOURHOODS
            .get(&scenario)
            .expect("validate_settings was called before the factory ran");
        roster
            .start
            .iter()
            .chain(roster.later.iter())
            .flat_map(|&nb| {
                // At least four event cards per "later" neighbourhood, matching
                // the THE_UNDERWORLD precondition in §4.3.
                (0..4).map(move |i| (ImageId::new(format!("event_{scenario:?}_{nb:?}_{i}")), nb))
            })
            .collect()
    }

    fn headline_numbers(&self, expansion: Option<Expansion>) -> Vec<u32> {
        // Ranges are chosen so each expansion's rumor numbers (see
        // `catalog::HEADLINE_RUMORS`) fall inside the range.
        match expansion {
            None => (1..=32).collect(),
            Some(Expansion::DeadOfNight) => (33..=39).collect(),
            Some(Expansion::UnderDarkWaves) => (40..=43).collect(),
            Some(Expansion::SecretsOfTheOrder) => (44..=46).collect(),
        }
    }

    fn headline_back(&self) -> ImageId {
        ImageId::new("headline_back")
    }

    fn terror_cards(&self, terror: Terror) -> (ImageId, Vec<ImageId>) {
        let back = ImageId::new(format!("terror_{terror:?}_back"));
        let faces = (0..10).map(|i| ImageId::new(format!("terror_{terror:?}_{i}"))).collect();
        (back, faces)
    }

    fn codex_card_face(&self, number: u32) -> ImageId {
        ImageId::new(format!("codex_{number}"))
    }

    fn codex_back(&self) -> ImageId {
        ImageId::new("codex_back")
    }
}
