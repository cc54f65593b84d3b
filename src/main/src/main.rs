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

mod cli;
mod logging;
mod panic_handler;

use clap::Parser;
use cli::Cli;
use color_eyre::Result;
use server::transport::{self, TlsPaths};
use tracing::info;

fn main() -> Result<()> {
    logging::initialize();
    panic_handler::initialize()?;

    let cli = Cli::parse();
    info!(port = cli.port, "starting session server");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(transport::serve(cli.port, TlsPaths { cert: cli.cert, key: cli.key }))
}
