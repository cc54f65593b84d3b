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

//! The command table: one handler per wire action, each a function of
//! `(session, sender, payload) -> ()` in the spirit of the design this
//! mirrors. Handlers never talk to the transport directly; they read and
//! write [Session] and let its `send`/`broadcast_*` methods push frames.

use data::card::CardView;
use data::core::primitives::{Neighbourhood, PlayerId};
use data::game_state::GameState;
use rules::catalog_source::DefaultCatalog;
use rules::operations::{self, TerrorSpread};
use rules::{deck_factory, projections};
use tracing::{debug, error, info, warn};
use utils::error::GameError;
use utils::outcome::Value;

use crate::message::{ClientMessage, LogMessage, ServerMessage};
use crate::session::{ConnectionId, Session};

/// Parses one inbound frame and routes it to its handler. Malformed JSON or
/// an unrecognised action is a [GameError::ProtocolError], reported to the
/// sender only; it never tears down the connection.
pub fn dispatch(session: &mut Session, sender: ConnectionId, raw: &str) {
    let message = match serde_json::from_str::<ClientMessage>(raw) {
        Ok(message) => message,
        Err(err) => {
            warn!(?sender, %err, "malformed frame");
            session.send(sender, &ServerMessage::Error { message: format!("protocol error: {err}") });
            return;
        }
    };

    debug!(?sender, ?message, "dispatching command");
    match message {
        ClientMessage::StartGame { scenario, expansions, player_name, player_colour } => {
            handle_start_game(session, sender, scenario, expansions, player_name, player_colour)
        }
        ClientMessage::Connect { player_name, player_colour } => handle_connect(session, sender, player_name, player_colour),
        ClientMessage::Reconnect => handle_reconnect(session, sender),
        ClientMessage::Undo => handle_mutation(session, sender, None, |state, player| {
            state.undo(player)?;
            Ok(None)
        }),
        ClientMessage::Redo => handle_mutation(session, sender, None, |state, player| {
            state.redo(player)?;
            Ok(None)
        }),
        ClientMessage::Draw { deck } => handle_mutation(session, sender, Some("%s drew a card".to_string()), move |state, player| {
            let (view, _ticket) = operations::draw_from_neighbourhood(state, player, deck)?;
            Ok(Some(vec![view]))
        }),
        ClientMessage::ResolveEvent { identifier, passed } => {
            let verb = if passed { "let an event pass" } else { "resolved an event" };
            handle_mutation(session, sender, Some(format!("%s {verb}")), move |state, player| {
                operations::resolve_pending(state, player, &identifier, passed)?;
                Ok(None)
            })
        }
        ClientMessage::ViewDiscard => handle_read(session, sender, None, None, |state| {
            Ok(state.pile(data::label::Label::EventDiscard)?.as_ordered()?.cards().iter().map(|c| c.to_view(data::card::CardViewState::Event, "")).collect())
        }),
        ClientMessage::ViewCodex => handle_read(session, sender, None, None, projections::get_codex),
        ClientMessage::ViewArchive => handle_read(session, sender, None, None, projections::get_archive),
        ClientMessage::ViewAttachedCodex { deck } => handle_read(session, sender, Some(format!("{deck:?}")), None, move |state| {
            let pile = state.pile(data::label::Label::Neighbourhood(deck))?.as_neighbourhood()?;
            Ok(pile
                .attached_codex
                .iter()
                .map(|c| {
                    let view_state = if c.is_flipped { data::card::CardViewState::FlippedCodex } else { data::card::CardViewState::UnFlippedCodex };
                    data::card::Card::CodexNeighbourhood(c.clone()).to_view(view_state, "")
                })
                .collect())
        }),
        ClientMessage::AddCodex { codex } => handle_mutation(session, sender, Some("%s added a codex card".to_string()), move |state, player| {
            operations::add_from_archive(state, player, codex)?;
            Ok(None)
        }),
        ClientMessage::RemoveCodex { codex } => handle_mutation(session, sender, Some("%s returned a codex card to the archive".to_string()), move |state, player| {
            operations::return_to_archive(state, player, codex)?;
            Ok(None)
        }),
        ClientMessage::FlipCodex { codex } => handle_mutation(session, sender, Some("%s flipped a codex card".to_string()), move |state, player| {
            operations::flip_codex(state, player, codex)?;
            Ok(None)
        }),
        ClientMessage::AddCounterCodex { codex } => handle_mutation(session, sender, None, move |state, player| {
            operations::modify_counter_on_codex(state, player, codex, 1)?;
            Ok(None)
        }),
        ClientMessage::RemoveCounterCodex { codex } => handle_mutation(session, sender, None, move |state, player| {
            operations::modify_counter_on_codex(state, player, codex, -1)?;
            Ok(None)
        }),
        ClientMessage::DrawTerror { deck } => handle_mutation(session, sender, Some("%s drew a terror token".to_string()), move |state, player| {
            let view = operations::draw_terror_from_neighbourhood(state, player, deck)?;
            Ok(Some(vec![view]))
        }),
        ClientMessage::AddDeck { deck } => handle_add_deck(session, sender, deck),
        ClientMessage::SpreadClue => handle_empty_deck_aware(session, sender, "%s spread a clue", "the event deck was empty and has been reshuffled", |state, player| {
            operations::spread_clue(state, player).map(|view| Some(vec![view]))
        }),
        ClientMessage::SpreadDoom => handle_empty_deck_aware(session, sender, "%s spread doom", "the event deck was empty and has been reshuffled", |state, player| {
            operations::spread_doom(state, player).map(|view| Some(vec![view]))
        }),
        ClientMessage::SpreadTerror => handle_mutation(session, sender, Some("%s spread terror".to_string()), |state, player| {
            Ok(match operations::spread_terror(state, player)? {
                TerrorSpread::Card(view) => Some(vec![view]),
                TerrorSpread::Neighbourhood(_) => None,
            })
        }),
        ClientMessage::PlaceTerror { deck } => handle_mutation(session, sender, Some(format!("%s placed terror in {deck:?}")), move |state, player| {
            operations::place_terror(state, player, deck)?;
            Ok(None)
        }),
        ClientMessage::GateBurst => handle_mutation(session, sender, Some("%s triggered a gate burst".to_string()), |state, player| {
            Ok(operations::gate_burst(state, player)?.map(|view| vec![view]))
        }),
        ClientMessage::Headline => handle_empty_deck_aware(session, sender, "%s drew a headline", "the headline deck was empty", |state, player| {
            operations::draw_headline(state, player).map(|view| Some(vec![view]))
        }),
        ClientMessage::ViewRumor => handle_read(session, sender, None, None, |state| {
            Ok(state
                .pile(data::label::Label::Rumor)?
                .as_ordered()?
                .cards()
                .iter()
                .map(|c| c.to_view(data::card::CardViewState::Rumor, ""))
                .collect())
        }),
        ClientMessage::RemoveRumor => handle_mutation(session, sender, Some("%s cleared the rumor".to_string()), |state, player| {
            operations::clear_rumor(state, player)?;
            Ok(None)
        }),
        ClientMessage::AddCounterRumor => handle_mutation(session, sender, None, |state, player| {
            operations::modify_counter_on_rumor(state, player, 1)?;
            Ok(None)
        }),
        ClientMessage::RemoveCounterRumor => handle_mutation(session, sender, None, |state, player| {
            operations::modify_counter_on_rumor(state, player, -1)?;
            Ok(None)
        }),
    }
}

/// Connection teardown: unseats the player (if seated) and, when this was
/// the last connection, tears down the game and logs.
pub fn disconnect(session: &mut Session, id: ConnectionId) {
    let (was_seated, now_empty) = session.remove_connection(id);
    if now_empty {
        info!(?id, "last connection closed; tearing down session");
        session.teardown();
    } else if was_seated {
        info!(?id, "player unseated on disconnect");
        session.broadcast_all(&session.hello());
    }
}

fn handle_start_game(
    session: &mut Session,
    sender: ConnectionId,
    scenario: data::core::primitives::Scenario,
    expansions: u8,
    player_name: String,
    player_colour: String,
) {
    let settings = data::settings::GameSettings { scenario, expansions };
    let game = match catalog::validate_settings(&settings).and_then(|_| deck_factory::build_game_state(&DefaultCatalog, settings)) {
        Ok(game) => game,
        Err(err) => {
            fail(session, sender, err);
            return;
        }
    };

    let booted = session.start_game(sender, player_name, player_colour, game);
    info!(?sender, ?scenario, booted = booted.len(), "game started");
    for id in booted {
        session.send(id, &ServerMessage::Boot {});
    }
    session.broadcast_all(&session.hello());
    send_update(session, None);
}

fn handle_connect(session: &mut Session, sender: ConnectionId, player_name: String, player_colour: String) {
    match session.connect(sender, player_name, player_colour) {
        Ok(_) => {
            info!(?sender, "player seated");
            session.send(sender, &ServerMessage::AllLogs { logs: session.logs().to_vec() });
            session.broadcast_all(&session.hello());
            send_update(session, None);
        }
        Err(err) => fail(session, sender, err),
    }
}

/// `add_deck` gets its own handler because it is the one operation whose
/// return value (doom to add to the physical board, non-zero only for the
/// underworld special case) belongs in the log line rather than in a
/// `viewer_reply`.
fn handle_add_deck(session: &mut Session, sender: ConnectionId, deck: Neighbourhood) {
    let outcome: Value<(u32, String, String)> = (|| {
        let player = session.player_id(sender)?;
        let (name, colour) = session.identity(sender).unwrap_or_default();
        let game = session.game_mut().ok_or_else(|| GameError::InvalidOp("no game is running".to_string()))?;
        let doom = operations::add_neighbourhood(game, player, deck)?;
        Ok((doom, name, colour))
    })();

    match outcome {
        Ok((doom, name, colour)) => {
            let template = if doom > 0 {
                format!("%s added {deck:?} to the board; add {doom} doom to the sheet")
            } else {
                format!("%s added {deck:?} to the board")
            };
            push_log(session, &template, &name, &colour, None);
            send_update(session, None);
        }
        Err(err) => fail(session, sender, err),
    }
}

fn handle_reconnect(session: &mut Session, sender: ConnectionId) {
    match session.reconnect(sender) {
        Ok((name, colour)) => session.send(sender, &ServerMessage::ReconnectReply { name, colour }),
        Err(err) => fail(session, sender, err),
    }
}

/// A read-only command: runs `op` against the live game and replies to
/// `sender` only. Never mutates history, never broadcasts `update`.
fn handle_read(
    session: &mut Session,
    sender: ConnectionId,
    deck: Option<String>,
    trigger: Option<String>,
    op: impl FnOnce(&GameState) -> Value<Vec<CardView>>,
) {
    let result = (|| {
        let game = session.game().ok_or_else(|| GameError::InvalidOp("no game is running".to_string()))?;
        op(game)
    })();

    match result {
        Ok(cards) => session.send(sender, &ServerMessage::ViewerReply { trigger, deck, cards }),
        Err(err) => fail(session, sender, err),
    }
}

/// A mutating command. On success, broadcasts `update` to every seated
/// connection and (if `log_template` is set) a `log` entry naming `sender`.
/// Any returned cards are sent back to `sender` as a `viewer_reply`.
fn handle_mutation(
    session: &mut Session,
    sender: ConnectionId,
    log_template: Option<String>,
    op: impl FnOnce(&mut GameState, PlayerId) -> Value<Option<Vec<CardView>>>,
) {
    let outcome = run(session, sender, op);
    match outcome {
        Ok((cards, player_name, colour)) => {
            if let Some(cards) = cards {
                session.send(sender, &ServerMessage::ViewerReply { trigger: None, deck: None, cards });
            }
            if let Some(template) = log_template {
                push_log(session, &template, &player_name, &colour, None);
            }
            send_update(session, None);
        }
        Err(err) => fail(session, sender, err),
    }
}

/// Like [handle_mutation], but treats [GameError::EmptyDeck] as a non-fatal
/// game event: the reshuffle it performed before failing still broadcasts
/// `update`, and the sender gets an empty `viewer_reply` plus a log entry
/// telling them to apply the board-game fallback instead of an `error`.
fn handle_empty_deck_aware(
    session: &mut Session,
    sender: ConnectionId,
    log_template: &str,
    empty_deck_log: &str,
    op: impl FnOnce(&mut GameState, PlayerId) -> Value<Option<Vec<CardView>>>,
) {
    let outcome = run(session, sender, op);
    match outcome {
        Ok((cards, player_name, colour)) => {
            session.send(sender, &ServerMessage::ViewerReply { trigger: None, deck: None, cards: cards.unwrap_or_default() });
            push_log(session, log_template, &player_name, &colour, None);
            send_update(session, None);
        }
        Err(GameError::EmptyDeck(reason)) => {
            warn!(?sender, %reason, "deck empty; reshuffled");
            session.send(sender, &ServerMessage::ViewerReply { trigger: None, deck: None, cards: vec![] });
            let (name, colour) = session.identity(sender).unwrap_or_default();
            push_log(session, empty_deck_log, &name, &colour, None);
            send_update(session, None);
        }
        Err(err) => fail(session, sender, err),
    }
}

/// Reports a failed command to its sender: an [GameError::Internal] is
/// unexpected and logged at `error` with its cause, anything else is an
/// ordinary rejected command and logged at `debug`.
fn fail(session: &mut Session, sender: ConnectionId, err: GameError) {
    match &err {
        GameError::Internal(cause) => error!(?sender, %cause, "internal error handling command"),
        other => debug!(?sender, %other, "command rejected"),
    }
    session.send(sender, &ServerMessage::Error { message: err.to_string() });
}

fn run(
    session: &mut Session,
    sender: ConnectionId,
    op: impl FnOnce(&mut GameState, PlayerId) -> Value<Option<Vec<CardView>>>,
) -> Value<(Option<Vec<CardView>>, String, String)> {
    let player = session.player_id(sender)?;
    let (name, colour) = session.identity(sender).unwrap_or_default();
    let game = session.game_mut().ok_or_else(|| GameError::InvalidOp("no game is running".to_string()))?;
    let cards = op(game, player)?;
    Ok((cards, name, colour))
}

fn push_log(session: &mut Session, template: &str, player_name: &str, colour: &str, card: Option<CardView>) {
    let message = template.replacen("%s", player_name, 1);
    let log = LogMessage { message, card, colour: colour.to_string() };
    session.push_log(log.clone());
    session.broadcast_seated(&ServerMessage::Log { message: log.message, card: log.card, colour: log.colour });
}

/// Broadcasts `update` to every seated connection with `can_undo`/`can_redo`
/// computed per recipient. `_trigger` is reserved for a future targeted
/// refresh and currently always broadcasts to everyone.
fn send_update(session: &mut Session, _trigger: Option<ConnectionId>) {
    let Some(game) = session.game() else {
        return;
    };
    let game_data = projections::update_info(game);
    let recipients: Vec<ConnectionId> = session.seated_connections().collect();
    for id in recipients {
        let Ok(player) = session.player_id(id) else { continue };
        let can_undo = session.game().map(|g| g.can_undo(player)).unwrap_or(false);
        let can_redo = session.game().map(|g| g.can_redo(player)).unwrap_or(false);
        session.send(id, &ServerMessage::Update { game_data: game_data.clone(), can_undo, can_redo });
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio_tungstenite::tungstenite::Message;

    use super::*;

    fn connected(session: &mut Session) -> (ConnectionId, UnboundedReceiver<Message>) {
        let id = ConnectionId::next();
        let (tx, rx) = mpsc::unbounded_channel();
        session.add_connection(id, tx);
        (id, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Message>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            messages.push(serde_json::from_str(&text).unwrap());
        }
        messages
    }

    fn is_action(message: &ServerMessage, action: &str) -> bool {
        let value = serde_json::to_value(message).unwrap();
        value["action"] == action
    }

    #[test]
    fn start_game_seats_the_caller_and_broadcasts_hello_and_update() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);

        dispatch(
            &mut session,
            id,
            r#"{"action":"start_game","scenario":"Approach of Azathoth","expansions":0,"player_name":"Ada","player_colour":"red"}"#,
        );

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| is_action(m, "hello")));
        assert!(messages.iter().any(|m| is_action(m, "update")));
        assert!(session.is_seated(id));
    }

    #[test]
    fn a_read_command_before_any_game_exists_is_an_error_not_a_panic() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);

        dispatch(&mut session, id, r#"{"action":"view_codex"}"#);

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(is_action(&messages[0], "error"));
    }

    #[test]
    fn draw_broadcasts_an_update_and_replies_to_the_sender_with_the_drawn_card() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);
        dispatch(
            &mut session,
            id,
            r#"{"action":"start_game","scenario":"Approach of Azathoth","expansions":0,"player_name":"Ada","player_colour":"red"}"#,
        );
        drain(&mut rx);

        dispatch(&mut session, id, r#"{"action":"draw","deck":"Downtown"}"#);

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| is_action(m, "viewer_reply")));
        assert!(messages.iter().any(|m| is_action(m, "update")));
        assert!(messages.iter().any(|m| is_action(m, "log")));
    }

    #[test]
    fn undo_after_undo_reports_an_error_rather_than_panicking() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);
        dispatch(
            &mut session,
            id,
            r#"{"action":"start_game","scenario":"Approach of Azathoth","expansions":0,"player_name":"Ada","player_colour":"red"}"#,
        );
        dispatch(&mut session, id, r#"{"action":"draw","deck":"Downtown"}"#);
        drain(&mut rx);

        dispatch(&mut session, id, r#"{"action":"undo"}"#);
        dispatch(&mut session, id, r#"{"action":"undo"}"#);

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|m| is_action(m, "error")));
    }

    #[test]
    fn disconnecting_the_only_connection_tears_down_the_game() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);
        dispatch(
            &mut session,
            id,
            r#"{"action":"start_game","scenario":"Approach of Azathoth","expansions":0,"player_name":"Ada","player_colour":"red"}"#,
        );
        drain(&mut rx);

        disconnect(&mut session, id);

        assert!(!session.game_available());
    }

    #[test]
    fn malformed_json_is_reported_without_touching_the_session() {
        let mut session = Session::new();
        let (id, mut rx) = connected(&mut session);

        dispatch(&mut session, id, "not json");

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(is_action(&messages[0], "error"));
        assert!(!session.game_available());
    }
}
