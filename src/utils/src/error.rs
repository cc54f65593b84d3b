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

//! The error taxonomy shared by every fallible operation in the game core.
//!
//! Dispatcher code matches on [GameError]'s variant to decide whether a
//! failure becomes a targeted `error` reply or a non-fatal game event; no
//! other layer is meant to pattern-match on error strings.

use thiserror::Error;

/// A fallible game-core operation failure.
#[derive(Debug, Error)]
pub enum GameError {
    /// A pile needed a card and was empty.
    #[error("empty deck: {0}")]
    EmptyDeck(String),

    /// A codex number, ticket, or neighbourhood key was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation does not apply in this scenario or state.
    #[error("invalid operation: {0}")]
    InvalidOp(String),

    /// The scenario/expansion pair was rejected by the settings validator.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Malformed JSON or an unrecognised wire action.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// Anything else: I/O, serialization, or a broken invariant.
    #[error(transparent)]
    Internal(#[from] color_eyre::eyre::Error),
}

impl GameError {
    /// Whether this error is the "pile was empty" non-fatal game event
    /// described in the dispatcher's error handling rules.
    pub fn is_empty_deck(&self) -> bool {
        matches!(self, GameError::EmptyDeck(_))
    }
}

/// Immediately return a [GameError] of the given kind.
///
/// Equivalent in spirit to `color_eyre::bail!`, but produces one of our own
/// typed variants instead of an opaque report.
#[macro_export]
macro_rules! fail {
    (Internal, $($arg:tt)*) => {
        return std::result::Result::Err($crate::error::GameError::Internal(color_eyre::eyre::eyre!($($arg)*)))
    };
    ($kind:ident, $($arg:tt)*) => {
        return std::result::Result::Err($crate::error::GameError::$kind(format!($($arg)*)))
    };
}

/// Return a [GameError] of the given kind unless `$cond` holds.
///
/// Equivalent in spirit to `color_eyre::ensure!`.
#[macro_export]
macro_rules! verify {
    ($cond:expr, $kind:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::fail!($kind, $($arg)*);
        }
    };
}
