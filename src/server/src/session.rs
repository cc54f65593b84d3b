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

//! [Session]: the roster and transport registry the dispatcher mutates.
//! Owns the connection set, the name/colour/player bijections, the live
//! [GameState], and the log stream; holds no protocol or transport parsing
//! logic of its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use data::core::primitives::PlayerId;
use data::game_state::GameState;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;
use utils::error::GameError;
use utils::outcome::Value;
use utils::verify;

use crate::message::{LogMessage, ServerMessage};

/// Opaque per-connection handle, allocated when the transport accepts a
/// socket. Distinct from [PlayerId]: a connection exists before it is
/// seated and survives a reconnect under the same game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }
}

struct Seat {
    player: PlayerId,
    name: String,
    colour: String,
}

/// The roster and live game for one session. One [Session] exists per
/// server process; every connection shares it behind a lock held by the
/// caller (the transport layer).
pub struct Session {
    connections: HashMap<ConnectionId, UnboundedSender<Message>>,
    seats: HashMap<ConnectionId, Seat>,
    next_player: u32,
    game: Option<GameState>,
    logs: Vec<LogMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self { connections: HashMap::new(), seats: HashMap::new(), next_player: 0, game: None, logs: Vec::new() }
    }

    pub fn add_connection(&mut self, id: ConnectionId, sender: UnboundedSender<Message>) {
        self.connections.insert(id, sender);
    }

    /// Drops a connection. Returns whether it was seated, and whether the
    /// session is now empty (the caller tears down the game on the latter).
    pub fn remove_connection(&mut self, id: ConnectionId) -> (bool, bool) {
        self.connections.remove(&id);
        let was_seated = self.seats.remove(&id).is_some();
        (was_seated, self.connections.is_empty())
    }

    pub fn teardown(&mut self) {
        self.game = None;
        self.logs.clear();
        self.seats.clear();
        self.next_player = 0;
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GameState> {
        self.game.as_mut()
    }

    pub fn game_available(&self) -> bool {
        self.game.is_some()
    }

    pub fn is_seated(&self, id: ConnectionId) -> bool {
        self.seats.contains_key(&id)
    }

    pub fn player_id(&self, id: ConnectionId) -> Value<PlayerId> {
        self.seats.get(&id).map(|s| s.player).ok_or_else(|| GameError::ProtocolError("connection is not seated".to_string()))
    }

    pub fn taken_names(&self) -> Vec<String> {
        self.seats.values().map(|s| s.name.clone()).collect()
    }

    pub fn taken_colours(&self) -> Vec<String> {
        self.seats.values().map(|s| s.colour.clone()).collect()
    }

    /// Starts a fresh game: boots every seated connection (returning their
    /// ids so the dispatcher can send them a `boot`), clears the roster and
    /// logs, installs `game`, and seats `sender` under the given identity.
    pub fn start_game(&mut self, sender: ConnectionId, name: String, colour: String, game: GameState) -> Vec<ConnectionId> {
        let booted: Vec<ConnectionId> = self.seats.keys().copied().filter(|id| *id != sender).collect();
        self.seats.clear();
        self.logs.clear();
        self.next_player = 0;
        self.game = Some(game);
        let player = self.allocate_player();
        self.game.as_mut().expect("just installed").seat(player);
        self.seats.insert(sender, Seat { player, name, colour });
        booted
    }

    /// Seats a new player onto the running game.
    pub fn connect(&mut self, sender: ConnectionId, name: String, colour: String) -> Value<PlayerId> {
        verify!(self.game.is_some(), InvalidOp, "no game is running");
        verify!(!self.taken_names().contains(&name), InvalidOp, "That name has already been chosen.");
        verify!(!self.taken_colours().contains(&colour), InvalidOp, "That color has already been chosen.");
        let player = self.allocate_player();
        self.game.as_mut().expect("checked above").seat(player);
        self.seats.insert(sender, Seat { player, name, colour });
        Ok(player)
    }

    /// Re-establishes a previously seated connection's identity.
    pub fn reconnect(&self, sender: ConnectionId) -> Value<(String, String)> {
        let seat = self.seats.get(&sender).ok_or_else(|| GameError::InvalidOp("connection is not seated".to_string()))?;
        Ok((seat.name.clone(), seat.colour.clone()))
    }

    /// The name/colour of a seated connection, or `None` if unseated.
    pub fn identity(&self, id: ConnectionId) -> Option<(String, String)> {
        self.seats.get(&id).map(|seat| (seat.name.clone(), seat.colour.clone()))
    }

    pub fn unseat(&mut self, id: ConnectionId) {
        if let Some(seat) = self.seats.remove(&id) {
            if let Some(game) = self.game.as_mut() {
                game.unseat(seat.player);
            }
        }
    }

    fn allocate_player(&mut self) -> PlayerId {
        let id = PlayerId(self.next_player);
        self.next_player += 1;
        id
    }

    pub fn push_log(&mut self, message: LogMessage) {
        self.logs.push(message);
    }

    pub fn logs(&self) -> &[LogMessage] {
        &self.logs
    }

    pub fn seated_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.seats.keys().copied()
    }

    pub fn all_connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.keys().copied()
    }

    pub fn send(&self, id: ConnectionId, message: &ServerMessage) {
        if let Some(sender) = self.connections.get(&id) {
            if let Ok(text) = serde_json::to_string(message) {
                let _ = sender.send(Message::Text(text));
            }
        }
    }

    pub fn broadcast_seated(&self, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(_) => return,
        };
        for id in self.seats.keys() {
            if let Some(sender) = self.connections.get(id) {
                let _ = sender.send(Message::Text(text.clone()));
            }
        }
    }

    pub fn broadcast_all(&self, message: &ServerMessage) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(_) => return,
        };
        for sender in self.connections.values() {
            let _ = sender.send(Message::Text(text.clone()));
        }
    }

    pub fn hello(&self) -> ServerMessage {
        ServerMessage::Hello {
            game_available: self.game_available(),
            taken_names: Some(self.taken_names()),
            taken_colours: Some(self.taken_colours()),
        }
    }
}

#[cfg(test)]
mod tests {
    use data::core::primitives::Scenario;
    use data::settings::GameSettings;
    use rules::catalog_source::DefaultCatalog;
    use rules::deck_factory::build_game_state;
    use tokio::sync::mpsc;

    use super::*;

    fn sender() -> UnboundedSender<Message> {
        let (tx, _rx) = mpsc::unbounded_channel();
        tx
    }

    fn game() -> GameState {
        let settings = GameSettings { scenario: Scenario::ApproachOfAzathoth, expansions: 0 };
        build_game_state(&DefaultCatalog, settings).unwrap()
    }

    #[test]
    fn a_fresh_session_has_no_game_and_no_roster() {
        let session = Session::new();
        assert!(!session.game_available());
        assert!(session.taken_names().is_empty());
    }

    #[test]
    fn start_game_seats_the_starter_and_boots_prior_players() {
        let mut session = Session::new();
        let first = ConnectionId::next();
        let second = ConnectionId::next();
        session.add_connection(first, sender());
        session.add_connection(second, sender());

        session.connect(first, "Ada".to_string(), "red".to_string()).unwrap_err();
        let booted = session.start_game(first, "Ada".to_string(), "red".to_string(), game());
        assert!(booted.is_empty());
        assert!(session.is_seated(first));

        let booted = session.start_game(second, "Grace".to_string(), "blue".to_string(), game());
        assert_eq!(booted, vec![first]);
        assert!(!session.is_seated(first));
        assert!(session.is_seated(second));
    }

    #[test]
    fn connect_rejects_a_taken_name_or_colour() {
        let mut session = Session::new();
        let first = ConnectionId::next();
        let second = ConnectionId::next();
        session.add_connection(first, sender());
        session.add_connection(second, sender());
        session.start_game(first, "Ada".to_string(), "red".to_string(), game());

        assert!(session.connect(second, "Ada".to_string(), "blue".to_string()).is_err());
        assert!(session.connect(second, "Grace".to_string(), "red".to_string()).is_err());
        assert!(session.connect(second, "Grace".to_string(), "blue".to_string()).is_ok());
    }

    #[test]
    fn removing_the_last_connection_reports_the_session_as_empty() {
        let mut session = Session::new();
        let id = ConnectionId::next();
        session.add_connection(id, sender());
        session.start_game(id, "Ada".to_string(), "red".to_string(), game());

        let (was_seated, now_empty) = session.remove_connection(id);
        assert!(was_seated);
        assert!(now_empty);
    }
}
