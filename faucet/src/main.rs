// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_crate_level_docs)]

mod commands;

use args::{CmdArgs, Parser};
use color_eyre::eyre::{Result, WrapErr, bail};
use tracectl::{TracingControl, get_trace_ctl, trace_target};
use tracing::{debug, level_filters::LevelFilter};

trace_target!("faucet", LevelFilter::WARN, &[]);

fn main() -> Result<()> {
    /* parse cmd line args */
    let args = CmdArgs::parse();

    /* initialize logging and error reports */
    TracingControl::init();
    TracingControl::install_error_report()?;
    if let Some(tracing) = args.tracing() {
        get_trace_ctl()
            .setup_from_string(tracing)
            .wrap_err("Invalid tracing configuration")?;
    }
    if args.show_tracing_tags() {
        get_trace_ctl().dump_targets_by_tag();
        return Ok(());
    }
    if args.show_tracing_targets() {
        get_trace_ctl().dump();
        return Ok(());
    }
    if args.tracing_config_generate() {
        println!("{}", get_trace_ctl().as_config_string());
        return Ok(());
    }

    let Some(command) = args.command() else {
        bail!("No command given, see --help");
    };
    debug!("Running {command:?}");
    let mut out = std::io::stdout().lock();
    commands::run(command, &mut out)
}
