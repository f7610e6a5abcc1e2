//! Entry point of the simulator.
//!
//! Runs the clock against simulated time, either on the terminal or, with
//! `--print`, as plain frames on stdout.

use linear_terminal_clock::args::{CliAction, ParsedArgs, display_simulate_help, display_version_info};
use linear_terminal_clock::commands::{self, simulate::handle_simulate_command};
use linear_terminal_clock::constants::*;
use linear_terminal_clock::logger::LogTarget;
use linear_terminal_clock::{log_pipe, log_warning};

fn main() {
    let code = match ParsedArgs::parse_simulate(std::env::args()).action {
        CliAction::Simulate {
            request,
            config_dir,
            log_target,
        } => {
            // Frames own stdout when printing
            let fallback = if request.print {
                LogTarget::Stderr
            } else {
                LogTarget::Stdout
            };
            commands::execute(config_dir, log_target, fallback, || {
                handle_simulate_command(request)
            })
        }
        CliAction::ShowVersion => {
            display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            display_simulate_help();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError | CliAction::Run { .. } => {
            log_warning!("Unknown or incomplete arguments");
            log_pipe!();
            display_simulate_help();
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}
