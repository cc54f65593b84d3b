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

//! The wire envelope: every message is a JSON object with a mandatory
//! `action` field. [ClientMessage] and [ServerMessage] are its two
//! directions.

use data::card::CardView;
use data::core::primitives::{Neighbourhood, Scenario};
use rules::projections::UpdateInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    StartGame { scenario: Scenario, expansions: u8, player_name: String, player_colour: String },
    Connect { player_name: String, player_colour: String },
    Reconnect,
    Draw { deck: Neighbourhood },
    ResolveEvent { identifier: String, passed: bool },
    ViewDiscard,
    ViewCodex,
    ViewArchive,
    AddCodex { codex: u32 },
    FlipCodex { codex: u32 },
    RemoveCodex { codex: u32 },
    ViewAttachedCodex { deck: Neighbourhood },
    AddCounterCodex { codex: u32 },
    RemoveCounterCodex { codex: u32 },
    DrawTerror { deck: Neighbourhood },
    AddDeck { deck: Neighbourhood },
    SpreadClue,
    SpreadDoom,
    SpreadTerror,
    PlaceTerror { deck: Neighbourhood },
    GateBurst,
    Headline,
    ViewRumor,
    RemoveRumor,
    AddCounterRumor,
    RemoveCounterRumor,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack { message: String },
    Error { message: String },
    Hello { game_available: bool, taken_names: Option<Vec<String>>, taken_colours: Option<Vec<String>> },
    ReconnectReply { name: String, colour: String },
    Update { game_data: UpdateInfo, can_undo: bool, can_redo: bool },
    ViewerReply { trigger: Option<String>, deck: Option<String>, cards: Vec<CardView> },
    Log { message: String, card: Option<CardView>, colour: String },
    AllLogs { logs: Vec<LogMessage> },
    Boot {},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub message: String,
    pub card: Option<CardView>,
    pub colour: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_game_parses_from_its_wire_shape() {
        let json = r#"{"action":"start_game","scenario":"Approach of Azathoth","expansions":0,"player_name":"Ada","player_colour":"red"}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(message, ClientMessage::StartGame { expansions: 0, .. }));
    }

    #[test]
    fn draw_carries_its_neighbourhood() {
        let json = r#"{"action":"draw","deck":"Downtown"}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(message, ClientMessage::Draw { deck: Neighbourhood::Downtown }));
    }

    #[test]
    fn undo_and_redo_carry_no_fields() {
        assert!(matches!(serde_json::from_str::<ClientMessage>(r#"{"action":"undo"}"#).unwrap(), ClientMessage::Undo));
        assert!(matches!(serde_json::from_str::<ClientMessage>(r#"{"action":"redo"}"#).unwrap(), ClientMessage::Redo));
    }

    #[test]
    fn an_unknown_action_fails_to_parse() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"teleport"}"#).is_err());
    }

    #[test]
    fn error_reply_serializes_with_its_action_tag() {
        let message = ServerMessage::Error { message: "no game is running".to_string() };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains(r#""action":"error""#));
        assert!(json.contains("no game is running"));
    }
}
