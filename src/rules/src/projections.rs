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

//! Read-only projections of [GameState]: the payload broadcast after every
//! write (`update_info`), and the two view-only listings (`get_archive`,
//! `get_codex`). None of these touch the history engine.

use data::card::{Card, CardViewState};
use data::game_state::GameState;
use data::label::Label;
use serde::Serialize;
use utils::outcome::Value;

#[derive(Debug, Clone, Serialize)]
pub struct DeckSummary {
    pub name: String,
    pub visible_image: String,
    pub num_cards: usize,
    pub has_attached_codex: bool,
    pub num_attached_terror: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateInfo {
    pub decks: Vec<DeckSummary>,
    pub rumor_present: bool,
    pub terror_present: bool,
    pub add_deck_available: Vec<String>,
}

/// A fixed (non-neighbourhood) pile's summary: `num_cards`/affordances are
/// always zero/false except `num_cards`, and `visible_image` falls back to
/// `empty` when the pile has no cards to show.
fn fixed_summary(state: &GameState, label: Label, name: &str, visible_image: impl Into<String>) -> DeckSummary {
    let pile = state.pile(label).expect("label came from this state").as_ordered().expect("ordered pile");
    DeckSummary {
        name: name.to_string(),
        visible_image: visible_image.into(),
        num_cards: pile.len(),
        has_attached_codex: false,
        num_attached_terror: 0,
    }
}

/// The payload broadcast to every seated connection after a write.
pub fn update_info(state: &GameState) -> UpdateInfo {
    let mut decks = Vec::new();
    for &label in state.labels() {
        let Label::Neighbourhood(nb) = label else { continue };
        let pile = state.pile(label).expect("label came from this state").as_neighbourhood().expect("neighbourhood label");
        let visible_image = pile
            .cards
            .peek_top()
            .map(|c| c.back().as_str().to_string())
            .unwrap_or_else(|| pile.card_back.as_str().to_string());
        decks.push(DeckSummary {
            name: format!("{nb:?}"),
            visible_image,
            num_cards: pile.cards.len(),
            has_attached_codex: pile.attached_codex.is_some(),
            num_attached_terror: pile.attached_terror.len(),
        });
    }
    decks.sort_by(|a, b| a.name.cmp(&b.name));

    let headline = state.pile(Label::Headline).unwrap().as_ordered().unwrap();
    decks.push(fixed_summary(
        state,
        Label::Headline,
        "Headlines",
        headline.peek_top().map(|c| c.back().as_str().to_string()).unwrap_or_else(|| "empty_back".to_string()),
    ));

    let event_deck = state.pile(Label::EventDeck).unwrap().as_ordered().unwrap();
    decks.push(fixed_summary(
        state,
        Label::EventDeck,
        "Event Deck",
        event_deck.peek_top().map(|c| c.back().as_str().to_string()).unwrap_or_else(|| "empty_back".to_string()),
    ));

    let discard = state.pile(Label::EventDiscard).unwrap().as_ordered().unwrap();
    decks.push(fixed_summary(
        state,
        Label::EventDiscard,
        "Event Discard",
        discard.peek_bottom().map(|c| c.face().as_str().to_string()).unwrap_or_else(|| "empty_face".to_string()),
    ));

    let codex = state.pile(Label::Codex).unwrap().as_keyed().unwrap();
    decks.push(DeckSummary {
        name: "Codex".to_string(),
        visible_image: "codex_back".to_string(),
        num_cards: codex.len(),
        has_attached_codex: false,
        num_attached_terror: 0,
    });

    let terror_present = state.has_pile(Label::Terror);
    if terror_present {
        let terror = state.pile(Label::Terror).unwrap().as_ordered().unwrap();
        let name = state.terror_deck_name.clone().unwrap_or_else(|| "Terror".to_string());
        decks.push(fixed_summary(
            state,
            Label::Terror,
            &name,
            terror.peek_top().map(|c| c.back().as_str().to_string()).unwrap_or_else(|| "empty_back".to_string()),
        ));
    }

    let rumor = state.pile(Label::Rumor).unwrap().as_ordered().unwrap();
    let rumor_present = !rumor.is_empty();
    if rumor_present {
        decks.push(fixed_summary(
            state,
            Label::Rumor,
            "Rumor",
            rumor.peek_top().map(|c| c.face().as_str().to_string()).unwrap_or_else(|| "empty_face".to_string()),
        ));
    }

    let add_deck_available = state.later.neighbourhoods.keys().map(|nb| format!("{nb:?}")).collect();

    UpdateInfo { decks, rumor_present, terror_present, add_deck_available }
}

/// A sorted-by-number listing of the archive's cards.
pub fn get_archive(state: &GameState) -> Value<Vec<data::card::CardView>> {
    let archive = state.pile(Label::Archive)?.as_keyed()?;
    Ok(archive.sorted().into_iter().map(|c| c.to_view(CardViewState::Archive, "")).collect())
}

/// A sorted-by-number listing of the codex's cards, face up or down
/// according to each card's `is_flipped` state.
pub fn get_codex(state: &GameState) -> Value<Vec<data::card::CardView>> {
    let codex = state.pile(Label::Codex)?.as_keyed()?;
    Ok(codex
        .sorted()
        .into_iter()
        .map(|c| {
            let state = if matches!(c, Card::Codex(cc) if cc.is_flipped) {
                CardViewState::FlippedCodex
            } else {
                CardViewState::UnFlippedCodex
            };
            c.to_view(state, "")
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use data::core::primitives::Scenario;
    use data::settings::GameSettings;

    use super::*;
    use crate::catalog_source::DefaultCatalog;
    use crate::deck_factory::build_game_state;

    fn fixture() -> GameState {
        let settings = GameSettings { scenario: Scenario::ApproachOfAzathoth, expansions: 0 };
        build_game_state(&DefaultCatalog, settings).unwrap()
    }

    #[test]
    fn update_info_lists_one_deck_summary_per_neighbourhood_plus_the_fixed_piles() {
        let state = fixture();
        let info = update_info(&state);
        let neighbourhoods = catalog::REQUIRED_NEIGHBOURHOODS.get(&Scenario::ApproachOfAzathoth).unwrap().start.len();
        assert!(!info.terror_present, "this scenario has no terror pile");
        assert!(!info.rumor_present);
        // neighbourhoods + Headlines, Event Deck, Event Discard, Codex; no Terror or Rumor entry since neither is present.
        assert_eq!(info.decks.len(), neighbourhoods + 4);
        for name in ["Headlines", "Event Deck", "Event Discard", "Codex"] {
            assert!(info.decks.iter().any(|d| d.name == name), "missing deck summary for {name}");
        }
        assert!(!info.decks.iter().any(|d| d.name == "Rumor"));
    }

    #[test]
    fn get_archive_returns_cards_in_ascending_codex_order() {
        let state = fixture();
        let archive = get_archive(&state).unwrap();
        assert!(!archive.is_empty());
    }

    #[test]
    fn get_codex_is_empty_before_any_card_is_added_from_the_archive() {
        let state = fixture();
        let codex = get_codex(&state).unwrap();
        assert!(codex.is_empty());
    }
}
