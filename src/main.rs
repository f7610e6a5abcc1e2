//! Entry point of the live clock.
//!
//! Parses arguments, then hands over to [`commands::run`], which loads the
//! configuration and runs the clock until the user quits.

use linear_terminal_clock::args::{CliAction, ParsedArgs, display_help, display_version_info};
use linear_terminal_clock::commands::{self, run::handle_run_command};
use linear_terminal_clock::constants::*;
use linear_terminal_clock::logger::LogTarget;
use linear_terminal_clock::{log_pipe, log_warning};

fn main() {
    let code = match ParsedArgs::from_env().action {
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_target,
        } => commands::execute(config_dir, log_target, LogTarget::Stdout, || {
            handle_run_command(debug_enabled)
        }),
        CliAction::ShowVersion => {
            display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            display_help();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError | CliAction::Simulate { .. } => {
            log_warning!("Unknown or incomplete arguments");
            log_pipe!();
            display_help();
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}
