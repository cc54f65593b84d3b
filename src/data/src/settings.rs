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

//! The settings a `start_game` command supplies. Validation itself lives in
//! the `catalog` crate, which owns the scenario→expansion table this is
//! checked against.

use serde::{Deserialize, Serialize};

use crate::core::primitives::Scenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    pub scenario: Scenario,
    /// Bitwise-or of enabled [crate::core::primitives::Expansion] values, in `0..=7`.
    pub expansions: u8,
}
