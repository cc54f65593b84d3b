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

//! The thirteen game-state operations of the design (plus their read-only
//! siblings). Every mutating function here follows the same three-step
//! discipline: perform the mutation on the live piles, then call
//! [GameState::commit] with the exact set of labels touched.

use data::card::{Card, CardView, CardViewState};
use data::core::primitives::{Neighbourhood, PlayerId};
use data::game_state::GameState;
use data::label::Label;
use utils::error::GameError;
use utils::outcome::Value;
use utils::{fail, verify};

/// Either a drawn card (spread_terror's default-neighbourhood branch has no
/// card to show) or the neighbourhood the terror token was placed on.
pub enum TerrorSpread {
    Card(CardView),
    Neighbourhood(Neighbourhood),
}

/// `draw_from_neighbourhood`. Returns the drawn card's view and a ticket,
/// non-empty only when the card is an unresolved event.
pub fn draw_from_neighbourhood(state: &mut GameState, player: PlayerId, nb: Neighbourhood) -> Value<(CardView, String)> {
    let label = Label::Neighbourhood(nb);
    let card = state.pile_mut(label)?.as_neighbourhood_mut()?.cards.draw_top()?;

    let (view, ticket, labels) = match &card {
        Card::CodexNeighbourhood(_) => {
            let mut card = card;
            card.set_flipped(false);
            let view = card.to_view(CardViewState::Archive, "");
            state.pile_mut(Label::Archive)?.as_keyed_mut()?.add_card(card);
            (view, String::new(), vec![label, Label::Archive])
        }
        Card::Neighbourhood(nc) if nc.is_event => {
            let ticket = uuid::Uuid::new_v4().to_string();
            let view = card.to_view(CardViewState::Event, ticket.clone());
            state.pile_mut(Label::ActionRequired)?.as_pending_mut()?.insert(ticket.clone(), card);
            (view, ticket, vec![label, Label::ActionRequired])
        }
        _ => {
            let view = card.to_view(CardViewState::FaceBack, "");
            state.pile_mut(label)?.as_neighbourhood_mut()?.cards.push_bottom(card);
            (view, String::new(), vec![label])
        }
    };

    state.commit(player, labels);
    Ok((view, ticket))
}

/// `resolve_pending`.
pub fn resolve_pending(state: &mut GameState, player: PlayerId, ticket: &str, passed: bool) -> Value<()> {
    let card = state.pile_mut(Label::ActionRequired)?.as_pending_mut()?.pop(ticket)?;
    let nb = card.neighbourhood().expect("only neighbourhood cards reach ActionRequired");

    let labels = if passed {
        state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.push_bottom(card);
        vec![Label::ActionRequired, Label::EventDiscard]
    } else {
        state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.cards.shuffle_into_top_three(card);
        vec![Label::ActionRequired, Label::Neighbourhood(nb)]
    };

    state.commit(player, labels);
    Ok(())
}

/// `draw_terror_from_neighbourhood`.
pub fn draw_terror_from_neighbourhood(state: &mut GameState, player: PlayerId, nb: Neighbourhood) -> Value<CardView> {
    let label = Label::Neighbourhood(nb);
    let card = state.pile_mut(label)?.as_neighbourhood_mut()?.draw_terror()?;
    let view = card.to_view(CardViewState::FaceBack, "");
    state.pile_mut(Label::Terror)?.as_ordered_mut()?.push_bottom(card);
    state.commit(player, vec![label, Label::Terror]);
    Ok(view)
}

/// `spread_doom`. Reshuffles and propagates `EmptyDeck` on an empty event
/// deck, matching the "reshuffle happens before the error is surfaced" rule.
pub fn spread_doom(state: &mut GameState, player: PlayerId) -> Value<CardView> {
    let deck = state.pile_mut(Label::EventDeck)?.as_ordered_mut()?;
    if deck.is_empty() {
        reshuffle_event_deck(state, player)?;
        fail!(EmptyDeck, "event deck was empty; discard has been reshuffled in");
    }
    let card = state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.draw_bottom()?;
    let view = card.to_view(CardViewState::Event, "");
    state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.push_bottom(card);
    state.commit(player, vec![Label::EventDeck, Label::EventDiscard]);
    Ok(view)
}

/// `spread_clue`.
pub fn spread_clue(state: &mut GameState, player: PlayerId) -> Value<CardView> {
    let deck = state.pile_mut(Label::EventDeck)?.as_ordered_mut()?;
    if deck.is_empty() {
        reshuffle_event_deck(state, player)?;
        fail!(EmptyDeck, "event deck was empty; discard has been reshuffled in");
    }
    let card = state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.draw_top()?;
    let nb = card.neighbourhood().expect("event deck only holds neighbourhood cards");
    let view = card.to_view(CardViewState::Event, "");
    state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.cards.shuffle_into_top_three(card);
    state.commit(player, vec![Label::EventDeck, Label::Neighbourhood(nb)]);
    Ok(view)
}

fn reshuffle_event_deck(state: &mut GameState, player: PlayerId) -> Value<()> {
    let discard = state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.clear();
    state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.extend(data::pile::OrderedPile::new(discard));
    state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.shuffle();
    state.commit(player, vec![Label::EventDeck, Label::EventDiscard]);
    Ok(())
}

/// `spread_terror`.
pub fn spread_terror(state: &mut GameState, player: PlayerId) -> Value<TerrorSpread> {
    verify!(state.has_pile(Label::Terror), InvalidOp, "this scenario has no terror pile");

    let discard_bottom_nb = state.pile(Label::EventDiscard)?.as_ordered()?.peek_bottom().and_then(Card::neighbourhood);

    let (destination, result) = match discard_bottom_nb {
        Some(nb) => (nb, None),
        None => {
            let nb = *catalog::DEFAULT_TERROR_NEIGHBOURHOOD
                .get(&state.scenario())
                .ok_or_else(|| GameError::InvalidOp("scenario has no default terror neighbourhood".to_string()))?;
            (nb, Some(nb))
        }
    };

    let card = state.pile_mut(Label::Terror)?.as_ordered_mut()?.draw_top()?;
    let view = card.to_view(CardViewState::FaceBack, "");
    state.pile_mut(Label::Neighbourhood(destination))?.as_neighbourhood_mut()?.add_terror(card);
    state.commit(player, vec![Label::Terror, Label::Neighbourhood(destination)]);

    Ok(match result {
        Some(nb) => TerrorSpread::Neighbourhood(nb),
        None => TerrorSpread::Card(view),
    })
}

/// `place_terror`: `spread_terror` with an explicit destination.
pub fn place_terror(state: &mut GameState, player: PlayerId, nb: Neighbourhood) -> Value<()> {
    verify!(state.has_pile(Label::Terror), InvalidOp, "this scenario has no terror pile");
    let card = state.pile_mut(Label::Terror)?.as_ordered_mut()?.draw_top()?;
    state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.add_terror(card);
    state.commit(player, vec![Label::Terror, Label::Neighbourhood(nb)]);
    Ok(())
}

/// `gate_burst`. The draw-then-reshuffle variant (§9): draws and returns the
/// top card of the event deck if any, then always reshuffles the discard
/// underneath and clears it.
pub fn gate_burst(state: &mut GameState, player: PlayerId) -> Value<Option<CardView>> {
    let deck = state.pile_mut(Label::EventDeck)?.as_ordered_mut()?;
    let drawn = if deck.is_empty() { None } else { Some(deck.draw_top()?) };
    let view = drawn.as_ref().map(|c| c.to_view(CardViewState::Event, ""));

    let discard = state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.clear();
    state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.extend(data::pile::OrderedPile::new(discard));
    state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.shuffle();
    state.commit(player, vec![Label::EventDeck, Label::EventDiscard]);
    Ok(view)
}

/// `draw_headline`.
pub fn draw_headline(state: &mut GameState, player: PlayerId) -> Value<CardView> {
    let card = state.pile_mut(Label::Headline)?.as_ordered_mut()?.draw_top()?;
    let mut labels = vec![Label::Headline];
    let view = card.to_view(CardViewState::FaceBack, "");
    if matches!(&card, Card::Headline(h) if h.is_rumor) {
        let rumor = state.pile_mut(Label::Rumor)?.as_ordered_mut()?;
        rumor.clear();
        rumor.push_top(card);
        labels.push(Label::Rumor);
    }
    state.commit(player, labels);
    Ok(view)
}

/// `clear_rumor`.
pub fn clear_rumor(state: &mut GameState, player: PlayerId) -> Value<()> {
    let rumor = state.pile_mut(Label::Rumor)?.as_ordered_mut()?;
    verify!(!rumor.is_empty(), InvalidOp, "no rumor card is in play");
    rumor.clear();
    state.commit(player, vec![Label::Rumor]);
    Ok(())
}

/// `modify_counter_on_rumor`.
pub fn modify_counter_on_rumor(state: &mut GameState, player: PlayerId, delta: i32) -> Value<()> {
    let rumor = state.pile_mut(Label::Rumor)?.as_ordered_mut()?;
    verify!(!rumor.is_empty(), InvalidOp, "no rumor card is in play");
    let top = rumor.draw_top()?;
    let mut card = top;
    card.modify_counters(delta);
    state.pile_mut(Label::Rumor)?.as_ordered_mut()?.push_top(card);
    state.commit(player, vec![Label::Rumor]);
    Ok(())
}

/// `add_from_archive`.
pub fn add_from_archive(state: &mut GameState, player: PlayerId, number: u32) -> Value<()> {
    let card = state.pile_mut(Label::Archive)?.as_keyed_mut()?.get_card(number)?;

    let labels = match &card {
        Card::CodexNeighbourhood(cn) if cn.can_attach => {
            let nb = cn.neighbourhood;
            let Card::CodexNeighbourhood(cn) = card else { unreachable!() };
            state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.attach_codex(cn)?;
            vec![Label::Archive, Label::Neighbourhood(nb)]
        }
        Card::CodexNeighbourhood(cn) if cn.is_encounter && catalog::CODEX_SHUFFLE_ENCOUNTERS.contains(&number) => {
            let nb = cn.neighbourhood;
            state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.cards.shuffle_into_top_three(card);
            vec![Label::Archive, Label::Neighbourhood(nb)]
        }
        Card::CodexNeighbourhood(cn) if catalog::CODEX_TOP_ENCOUNTERS.contains(&number) => {
            let nb = cn.neighbourhood;
            state.pile_mut(Label::Neighbourhood(nb))?.as_neighbourhood_mut()?.cards.push_top(card);
            vec![Label::Archive, Label::Neighbourhood(nb)]
        }
        _ => {
            state.pile_mut(Label::Codex)?.as_keyed_mut()?.add_card(card);
            vec![Label::Archive, Label::Codex]
        }
    };

    state.commit(player, labels);
    Ok(())
}

/// `return_to_archive`. Locates `number` either in the Codex pile or as a
/// neighbourhood's attached codex card.
pub fn return_to_archive(state: &mut GameState, player: PlayerId, number: u32) -> Value<()> {
    if state.pile(Label::Codex)?.as_keyed()?.contains(number) {
        let mut card = state.pile_mut(Label::Codex)?.as_keyed_mut()?.get_card(number)?;
        card.set_flipped(false);
        card.modify_counters(-card_counters(&card));
        state.pile_mut(Label::Archive)?.as_keyed_mut()?.add_card(card);
        state.commit(player, vec![Label::Codex, Label::Archive]);
        return Ok(());
    }

    for label in state.labels().cloned().collect::<Vec<_>>() {
        if !matches!(label, Label::Neighbourhood(_)) {
            continue;
        }
        if state.pile(label)?.as_neighbourhood()?.has_codex(number) {
            let mut card = state.pile_mut(label)?.as_neighbourhood_mut()?.pop_codex()?;
            card.is_flipped = false;
            card.counters = 0;
            state.pile_mut(Label::Archive)?.as_keyed_mut()?.add_card(Card::CodexNeighbourhood(card));
            state.commit(player, vec![label, Label::Archive]);
            return Ok(());
        }
    }

    fail!(NotFound, "codex number {number} is not in the codex or attached to any neighbourhood")
}

fn card_counters(card: &Card) -> i32 {
    match card {
        Card::Headline(c) => c.counters,
        Card::Codex(c) => c.counters,
        Card::CodexNeighbourhood(c) => c.counters,
        _ => 0,
    }
}

/// `modify_counter_on_codex`.
pub fn modify_counter_on_codex(state: &mut GameState, player: PlayerId, number: u32, delta: i32) -> Value<()> {
    if let Some(card) = state.pile_mut(Label::Codex)?.as_keyed_mut()?.peek_mut(number) {
        card.modify_counters(delta);
        state.commit(player, vec![Label::Codex]);
        return Ok(());
    }

    for label in state.labels().cloned().collect::<Vec<_>>() {
        if !matches!(label, Label::Neighbourhood(_)) {
            continue;
        }
        if state.pile(label)?.as_neighbourhood()?.has_codex(number) {
            state.pile_mut(label)?.as_neighbourhood_mut()?.modify_codex_counters(delta)?;
            state.commit(player, vec![label]);
            return Ok(());
        }
    }

    fail!(NotFound, "codex number {number} is not in the codex or attached to any neighbourhood")
}

/// `flip_codex`.
pub fn flip_codex(state: &mut GameState, player: PlayerId, number: u32) -> Value<()> {
    if let Some(card) = state.pile_mut(Label::Codex)?.as_keyed_mut()?.peek_mut(number) {
        let flipped = !card.is_flipped();
        card.set_flipped(flipped);
        state.commit(player, vec![Label::Codex]);
        return Ok(());
    }

    for label in state.labels().cloned().collect::<Vec<_>>() {
        if !matches!(label, Label::Neighbourhood(_)) {
            continue;
        }
        if state.pile(label)?.as_neighbourhood()?.has_codex(number) {
            state.pile_mut(label)?.as_neighbourhood_mut()?.flip_codex()?;
            state.commit(player, vec![label]);
            return Ok(());
        }
    }

    fail!(NotFound, "codex number {number} is not in the codex or attached to any neighbourhood")
}

#[cfg(test)]
fn test_state(scenario: data::core::primitives::Scenario, expansions: u8) -> GameState {
    use data::settings::GameSettings;

    let settings = GameSettings { scenario, expansions };
    crate::deck_factory::build_game_state(&crate::catalog_source::DefaultCatalog, settings)
        .expect("fixture catalog always builds a valid game state")
}

/// `add_neighbourhood`. Returns the amount of doom to add to the physical
/// board (only non-zero for the `TheUnderworld` special case).
pub fn add_neighbourhood(state: &mut GameState, player: PlayerId, nb: Neighbourhood) -> Value<u32> {
    let pile = state
        .later
        .neighbourhoods
        .remove(&nb)
        .ok_or_else(|| GameError::NotFound(format!("{nb:?} is not a pending neighbourhood")))?;
    let event_deck = state.later.event_decks.remove(&nb);

    if nb == Neighbourhood::TheUnderworld {
        let mut event_deck =
            event_deck.ok_or_else(|| GameError::InvalidOp("THE_UNDERWORLD has no later event deck".to_string()))?;
        verify!(
            event_deck.len() >= 4,
            InvalidOp,
            "THE_UNDERWORLD's later event deck must have at least 4 cards, has {}",
            event_deck.len()
        );

        let mut doom_to_add = 0;
        for _ in 0..4 {
            if state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.draw_top().is_err() {
                doom_to_add += 1;
            }
        }

        let first_two: Vec<_> = (0..2).filter_map(|_| event_deck.draw_bottom().ok()).collect();
        let last_two: Vec<_> = (0..2).filter_map(|_| event_deck.draw_bottom().ok()).collect();
        state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.extend(data::pile::OrderedPile::new(first_two));
        state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.shuffle();
        for card in last_two {
            state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.push_bottom(card);
        }

        state.install_pile(Label::Neighbourhood(nb), data::pile::Pile::Neighbourhood(pile));
        state.commit(player, vec![Label::Neighbourhood(nb), Label::EventDeck, Label::EventDiscard]);
        return Ok(doom_to_add);
    }

    state.install_pile(Label::Neighbourhood(nb), data::pile::Pile::Neighbourhood(pile));
    let mut labels = vec![Label::Neighbourhood(nb)];
    if let Some(event_deck) = event_deck {
        state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.extend(event_deck);
        let discard = state.pile_mut(Label::EventDiscard)?.as_ordered_mut()?.clear();
        state.pile_mut(Label::EventDeck)?.as_ordered_mut()?.shuffle_discard(data::pile::OrderedPile::new(discard));
        labels.push(Label::EventDeck);
        labels.push(Label::EventDiscard);
    }
    state.commit(player, labels);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use data::core::primitives::{Expansion, Neighbourhood, PlayerId, Scenario};

    use super::*;

    #[test]
    fn draw_from_neighbourhood_moves_a_card_and_records_history() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let player = PlayerId(0);
        state.seat(player);
        let before = state.pile(Label::Neighbourhood(Neighbourhood::Downtown)).unwrap().as_neighbourhood().unwrap().cards.len();

        draw_from_neighbourhood(&mut state, player, Neighbourhood::Downtown).unwrap();

        let after = state.pile(Label::Neighbourhood(Neighbourhood::Downtown)).unwrap().as_neighbourhood().unwrap().cards.len();
        assert_eq!(before, after, "a non-event card is drawn from the top and pushed back to the bottom");
        assert!(state.can_undo(player));
    }

    #[test]
    fn spread_doom_reshuffles_an_empty_event_deck_instead_of_failing_outright() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let player = PlayerId(0);
        state.seat(player);

        while state.pile(Label::EventDeck).unwrap().as_ordered().unwrap().len() > 0 {
            spread_doom(&mut state, player).unwrap();
        }

        let result = spread_doom(&mut state, player);
        assert!(matches!(result, Err(GameError::EmptyDeck(_))));
        assert!(state.pile(Label::EventDeck).unwrap().as_ordered().unwrap().len() > 0, "the discard was reshuffled in");
    }

    #[test]
    fn add_from_archive_shuffles_a_neighbourhood_encounter_card_back_into_its_deck() {
        let mut state = test_state(Scenario::FeastForUmordhoth, 0);
        let player = PlayerId(0);
        state.seat(player);
        let before = state.pile(Label::Neighbourhood(Neighbourhood::Downtown)).unwrap().as_neighbourhood().unwrap().cards.len();

        add_from_archive(&mut state, player, 13).unwrap();

        let after = state.pile(Label::Neighbourhood(Neighbourhood::Downtown)).unwrap().as_neighbourhood().unwrap().cards.len();
        assert_eq!(before + 1, after);
        assert!(!state.pile(Label::Archive).unwrap().as_keyed().unwrap().contains(13));
    }

    #[test]
    fn modify_counter_on_codex_rejects_an_unknown_number() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let player = PlayerId(0);
        state.seat(player);
        let result = modify_counter_on_codex(&mut state, player, 999, 1);
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }

    #[test]
    fn non_interfering_players_can_both_undo() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let x = PlayerId(0);
        let y = PlayerId(1);
        state.seat(x);
        state.seat(y);

        draw_from_neighbourhood(&mut state, x, Neighbourhood::Downtown).unwrap();
        draw_from_neighbourhood(&mut state, y, Neighbourhood::Easttown).unwrap();

        assert!(state.can_undo(x));
        assert!(state.can_undo(y));
    }

    #[test]
    fn a_second_player_touching_the_same_label_blocks_the_first_players_undo() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let x = PlayerId(0);
        let y = PlayerId(1);
        state.seat(x);
        state.seat(y);

        draw_headline(&mut state, x).unwrap();
        assert!(state.can_undo(x));

        draw_headline(&mut state, y).unwrap();
        assert!(!state.can_undo(x));
        assert!(state.can_undo(y));

        state.undo(y).unwrap();
        assert!(state.can_undo(x));
    }

    #[test]
    fn add_neighbourhood_installs_a_pending_neighbourhood_and_merges_its_event_cards() {
        let mut state = test_state(Scenario::DreamsOfRlyeh, Expansion::UnderDarkWaves.bit());
        let player = PlayerId(0);
        state.seat(player);
        assert!(!state.has_pile(Label::Neighbourhood(Neighbourhood::KingsportHarbor)));

        let doom = add_neighbourhood(&mut state, player, Neighbourhood::KingsportHarbor).unwrap();

        assert_eq!(doom, 0);
        assert!(state.has_pile(Label::Neighbourhood(Neighbourhood::KingsportHarbor)));
        assert!(state.can_undo(player));
    }

    #[test]
    fn add_neighbourhood_rejects_a_neighbourhood_that_is_not_pending() {
        let mut state = test_state(Scenario::ApproachOfAzathoth, 0);
        let player = PlayerId(0);
        state.seat(player);
        let result = add_neighbourhood(&mut state, player, Neighbourhood::KingsportHarbor);
        assert!(matches!(result, Err(GameError::NotFound(_))));
    }
}
