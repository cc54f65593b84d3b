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

//! Builds the initial [GameState] for a validated [GameSettings] choice.

use std::collections::{BTreeMap, HashMap};

use data::card::{Card, CodexCard, CodexNeighbourhoodCard, HeadlineCard, NeighbourhoodCard, PlainCard};
use data::core::primitives::Expansion;
use data::game_state::{GameState, LaterPiles};
use data::label::Label;
use data::pile::{KeyedPile, NeighbourhoodPile, OrderedPile, PendingPile, Pile};
use data::settings::GameSettings;
use enum_iterator::all;
use rand::seq::SliceRandom;
use utils::outcome::Value;
use utils::verify;

use crate::catalog_source::CardCatalog;

fn enabled_expansions(mask: u8) -> Vec<Expansion> {
    all::<Expansion>().filter(|e| mask & e.bit() != 0).collect()
}

fn build_neighbourhood_pile(
    catalog: &dyn CardCatalog,
    settings: &GameSettings,
    nb: data::core::primitives::Neighbourhood,
) -> NeighbourhoodPile {
    let back = catalog.neighbourhood_back(nb);
    let cards = catalog
        .neighbourhood_cards(settings.scenario, nb, settings.expansions)
        .into_iter()
        .map(|face| Card::Neighbourhood(NeighbourhoodCard { face, back: back.clone(), neighbourhood: nb, is_event: false }))
        .collect();
    let mut pile = NeighbourhoodPile::new(cards, back);
    pile.cards.shuffle();
    pile
}

fn build_event_deck(catalog: &dyn CardCatalog, settings: &GameSettings) -> OrderedPile {
    let cards = catalog
        .event_cards(settings.scenario)
        .into_iter()
        .map(|(face, nb)| {
            Card::Neighbourhood(NeighbourhoodCard {
                face,
                back: catalog.neighbourhood_back(nb),
                neighbourhood: nb,
                is_event: true,
            })
        })
        .collect();
    let mut pile = OrderedPile::new(cards);
    pile.shuffle();
    pile
}

fn build_headline_pile(catalog: &dyn CardCatalog, settings: &GameSettings) -> OrderedPile {
    let back = catalog.headline_back();
    let mut cards: Vec<Card> = Vec::new();
    let mut tiers = vec![None];
    tiers.extend(enabled_expansions(settings.expansions).into_iter().map(Some));
    for tier in tiers {
        let rumor_numbers = catalog::HEADLINE_RUMORS.get(&tier).cloned().unwrap_or_default();
        for number in catalog.headline_numbers(tier) {
            let is_rumor = rumor_numbers.contains(&number);
            cards.push(Card::Headline(HeadlineCard {
                face: catalog.codex_card_face(number), // headline cards are numbered the same way as codex faces
                back: back.clone(),
                is_rumor,
                counters: if is_rumor { 0 } else { -1 },
            }));
        }
    }
    let mut pile = OrderedPile::new(cards);
    pile.shuffle();
    let mut top13 = Vec::with_capacity(13);
    for _ in 0..13 {
        if let Ok(card) = pile.draw_top() {
            top13.push(card);
        }
    }
    top13.reverse();
    OrderedPile::new(top13)
}

fn build_archive(catalog: &dyn CardCatalog, settings: &GameSettings) -> Value<KeyedPile> {
    let numbers =
        catalog::REQUIRED_CODEX.get(&settings.scenario).expect("validate_settings guarantees a scenario entry");
    let mut cards = BTreeMap::new();
    for &number in numbers {
        let card = if let Some(&nb) = catalog::CODEX_NEIGHBOURHOODS.get(&number) {
            Card::CodexNeighbourhood(CodexNeighbourhoodCard {
                face: catalog.codex_card_face(number),
                back: catalog.codex_back(),
                number,
                neighbourhood: nb,
                can_attach: catalog::CODEX_ATTACHABLE.contains(&number),
                is_encounter: catalog::CODEX_ENCOUNTERS.contains(&number),
                is_flipped: false,
                counters: 0,
            })
        } else {
            Card::Codex(CodexCard {
                face: catalog.codex_card_face(number),
                back: catalog.codex_back(),
                number,
                is_item: catalog::CODEX_ITEMS.contains(&number),
                is_monster: catalog::CODEX_MONSTERS.contains(&number),
                can_attach: false,
                is_encounter: false,
                is_flipped: false,
                counters: 0,
            })
        };
        cards.insert(number, card);
    }
    Ok(KeyedPile::new(cards))
}

/// Builds the initial game state for `settings`, which must already have
/// passed [catalog::validate_settings].
pub fn build_game_state(catalog: &dyn CardCatalog, settings: GameSettings) -> Value<GameState> {
    let roster = catalog::REQUIRED_NEIGHBOURHOODS
        .get(&settings.scenario)
        .expect("validate_settings guarantees a scenario entry");
    let start = roster.start.clone();
    let later_nbs = roster.later.clone();

    let mut piles: HashMap<Label, Pile> = HashMap::new();
    for &nb in &start {
        piles.insert(Label::Neighbourhood(nb), Pile::Neighbourhood(build_neighbourhood_pile(catalog, &settings, nb)));
    }

    let mut event_deck = build_event_deck(catalog, &settings);
    let later_event_decks = event_deck.remove_neighbourhood(&later_nbs);

    if later_nbs.contains(&data::core::primitives::Neighbourhood::TheUnderworld) {
        let count = later_event_decks
            .get(&data::core::primitives::Neighbourhood::TheUnderworld)
            .map(OrderedPile::len)
            .unwrap_or(0);
        verify!(count >= 4, InvalidOp, "THE_UNDERWORLD's later event deck must have at least 4 cards, has {count}");
    }

    piles.insert(Label::EventDeck, Pile::Ordered(event_deck));
    piles.insert(Label::EventDiscard, Pile::Ordered(OrderedPile::default()));
    piles.insert(Label::Headline, Pile::Ordered(build_headline_pile(catalog, &settings)));
    piles.insert(Label::Archive, Pile::Keyed(build_archive(catalog, &settings)?));
    piles.insert(Label::Codex, Pile::Keyed(KeyedPile::default()));
    piles.insert(Label::Rumor, Pile::Ordered(OrderedPile::default()));
    piles.insert(Label::ActionRequired, Pile::Pending(PendingPile::default()));

    let terror_deck_name = catalog::SCENARIO_TERROR_MAP.get(&settings.scenario).copied();
    if let Some(terror) = terror_deck_name {
        let (back, faces) = catalog.terror_cards(terror);
        let cards = faces.into_iter().map(|face| Card::Plain(PlainCard { face, back: back.clone() })).collect();
        let mut pile = OrderedPile::new(cards);
        pile.shuffle();
        piles.insert(Label::Terror, Pile::Ordered(pile));
    }

    let mut later_neighbourhoods = HashMap::new();
    for &nb in &later_nbs {
        later_neighbourhoods.insert(nb, build_neighbourhood_pile(catalog, &settings, nb));
    }

    let mut state = GameState::new(
        settings,
        piles,
        LaterPiles { neighbourhoods: later_neighbourhoods, event_decks: later_event_decks },
    );
    state.terror_deck_name = terror_deck_name.map(|t| format!("{t:?}"));
    Ok(state)
}
