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

use std::panic;
use std::panic::PanicInfo;

use color_eyre::config::{HookBuilder, PanicHook};
use color_eyre::eyre;

/// Replaces Rust's default panic output with a human-readable crash report.
/// A panic in a connection task would otherwise only unwind that task; this
/// also covers a panic on the accept loop itself, which takes the process
/// down.
pub fn initialize() -> color_eyre::Result<()> {
    let (panic_hook, eyre_hook) =
        HookBuilder::default().capture_span_trace_by_default(false).display_location_section(true).into_hooks();

    let eyre_hook = eyre_hook.into_eyre_hook();
    eyre::set_hook(Box::new(move |error: &(dyn std::error::Error + 'static)| eyre_hook(error)))?;

    panic::set_hook(Box::new(move |panic_info| {
        on_panic(&panic_hook, panic_info);
    }));

    Ok(())
}

fn on_panic(panic_hook: &PanicHook, panic_info: &PanicInfo) {
    tracing::error!("{}", panic_hook.panic_report(panic_info));

    #[cfg(not(debug_assertions))]
    {
        use human_panic::{handle_dump, print_msg, Metadata};
        let meta = Metadata {
            version: env!("CARGO_PKG_VERSION").into(),
            name: env!("CARGO_PKG_NAME").into(),
            authors: "".into(),
            homepage: "".into(),
        };
        let file_path = handle_dump(&meta, panic_info);
        print_msg(file_path, &meta).expect("human-panic: printing error message to console failed");
    }

    #[cfg(debug_assertions)]
    {
        better_panic::Settings::auto().most_recent_first(false).lineno_suffix(true).create_panic_handler()(
            panic_info,
        );
    }

    std::process::exit(1);
}
