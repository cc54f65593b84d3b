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

use std::convert::Infallible;
use std::error;
use std::fmt::Display;

use color_eyre::eyre::{ContextCompat, WrapErr};

use crate::error::GameError;
use crate::outcome::Value;

/// Wrapper around `color_eyre`'s context helpers that lands in our own
/// [GameError::Internal] instead of a bare report.
pub trait WithError<T, E> {
    fn with_error<C, F>(self, f: F) -> Value<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> WithError<T, Infallible> for Option<T> {
    fn with_error<C, F>(self, context: F) -> Value<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.with_context(context).map_err(GameError::Internal)
    }
}

impl<T, E> WithError<T, E> for Result<T, E>
where
    E: error::Error + Send + Sync + 'static,
{
    fn with_error<C, F>(self, context: F) -> Value<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.with_context(context).map_err(GameError::Internal)
    }
}
