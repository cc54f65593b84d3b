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

use clap::Parser;

/// Serves the session controller's WebSocket endpoint at `/game`.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Port to bind on 0.0.0.0.
    #[arg(long, default_value_t = 8081)]
    pub port: u16,

    /// Path to the TLS certificate (PEM).
    #[arg(long, default_value = "/app/cert.pem")]
    pub cert: String,

    /// Path to the TLS private key (PEM, PKCS#8).
    #[arg(long, default_value = "/app/key.pem")]
    pub key: String,
}
