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

use crate::error::GameError;

/// Result of a game mutation that touches no return value.
pub type Outcome = Result<(), GameError>;

/// Equivalent alias to [Outcome] which wraps a returned value.
pub type Value<T> = Result<T, GameError>;

/// Mutation completed successfully, execution can continue.
pub const OK: Outcome = Ok(());
