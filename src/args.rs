//! Command-line argument parsing and processing.
//!
//! Both binaries share the standard flags (config directory, debug, log
//! destination, help and version). The simulator adds a scenario name and
//! options that shape the simulated range. Parsing never fails: anything
//! unexpected turns into [`CliAction::ShowHelpDueToError`].

use crate::commands::simulate::{Scenario, SimulationRequest};
use crate::constants::*;
use crate::logger::LogTarget;

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the live clock
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_target: Option<LogTarget>,
    },
    /// Run the clock against simulated time
    Simulate {
        request: SimulationRequest,
        config_dir: Option<String>,
        log_target: Option<LogTarget>,
    },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or malformed arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

// Flags understood by both binaries
#[derive(Default)]
struct CommonFlags {
    debug_enabled: bool,
    display_help: bool,
    display_version: bool,
    config_dir: Option<String>,
    log_target: Option<LogTarget>,
}

enum Consumed {
    Yes,
    No,
    Error,
}

impl CommonFlags {
    fn accept(&mut self, arg: &str, rest: &mut impl Iterator<Item = String>) -> Consumed {
        match arg {
            "--debug" | "-d" => self.debug_enabled = true,
            "--help" | "-h" => self.display_help = true,
            "--version" | "-V" | "-v" => self.display_version = true,
            "--config" | "-c" => match rest.next() {
                Some(dir) => self.config_dir = Some(dir),
                None => return Consumed::Error,
            },
            "--log" | "-l" => match rest.next() {
                Some(dest) => self.log_target = Some(LogTarget::parse(&dest)),
                None => return Consumed::Error,
            },
            _ => return Consumed::No,
        }
        Consumed::Yes
    }
}

fn next_number<T: std::str::FromStr>(rest: &mut impl Iterator<Item = String>) -> Option<T> {
    rest.next().and_then(|value| value.parse().ok())
}

impl ParsedArgs {
    /// Parse the live clock's arguments (the first item is the program name).
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = CommonFlags::default();
        let mut unknown_arg_found = false;

        let mut rest = args.into_iter().skip(1).map(|s| s.as_ref().to_string());
        while let Some(arg) = rest.next() {
            match flags.accept(&arg, &mut rest) {
                Consumed::Yes => {}
                Consumed::No | Consumed::Error => unknown_arg_found = true,
            }
        }

        let action = if flags.display_version {
            CliAction::ShowVersion
        } else if flags.display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            CliAction::Run {
                debug_enabled: flags.debug_enabled,
                config_dir: flags.config_dir,
                log_target: flags.log_target,
            }
        };

        ParsedArgs { action }
    }

    /// Parse the simulator's arguments (the first item is the program name).
    pub fn parse_simulate<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = CommonFlags::default();
        let mut unknown_arg_found = false;
        let mut scenario: Option<Scenario> = None;
        let mut start = None;
        let mut end = None;
        let mut step_secs = None;
        let mut delay_ms = None;
        let mut once = false;
        let mut print = false;
        let mut width = DEFAULT_PRINT_WIDTH;
        let mut height = DEFAULT_PRINT_HEIGHT;

        let mut rest = args.into_iter().skip(1).map(|s| s.as_ref().to_string());
        while let Some(arg) = rest.next() {
            match flags.accept(&arg, &mut rest) {
                Consumed::Yes => continue,
                Consumed::Error => {
                    unknown_arg_found = true;
                    continue;
                }
                Consumed::No => {}
            }

            let ok = match arg.as_str() {
                "--start" => rest.next().map(|v| start = Some(v)).is_some(),
                "--end" => rest.next().map(|v| end = Some(v)).is_some(),
                "--step" => next_number(&mut rest).map(|v| step_secs = Some(v)).is_some(),
                "--delay" => next_number(&mut rest).map(|v| delay_ms = Some(v)).is_some(),
                "--width" => next_number(&mut rest).map(|v| width = v).is_some(),
                "--height" => next_number(&mut rest).map(|v| height = v).is_some(),
                "--once" => {
                    once = true;
                    true
                }
                "--print" => {
                    print = true;
                    true
                }
                name if !name.starts_with('-') && scenario.is_none() => {
                    match Scenario::parse(name) {
                        Ok(s) => {
                            scenario = Some(s);
                            true
                        }
                        Err(_) => false,
                    }
                }
                _ => false,
            };
            if !ok {
                unknown_arg_found = true;
            }
        }

        let default_scenario = Scenario::parse(DEFAULT_SCENARIO).unwrap_or(Scenario::Seasons);

        let action = if flags.display_version {
            CliAction::ShowVersion
        } else if flags.display_help {
            CliAction::ShowHelp
        } else if unknown_arg_found {
            CliAction::ShowHelpDueToError
        } else {
            CliAction::Simulate {
                request: SimulationRequest {
                    scenario: scenario.unwrap_or(default_scenario),
                    start,
                    end,
                    step_secs,
                    delay_ms,
                    once,
                    print,
                    width,
                    height,
                    debug_enabled: flags.debug_enabled,
                },
                config_dir: flags.config_dir,
                log_target: flags.log_target,
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse the live clock's arguments from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays the live clock's help message.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("linear-terminal-clock [OPTIONS]");
    log_block_start!("Options:");
    log_common_options();
    log_block_start!("Keys:");
    log_indented!("q, Esc, Ctrl+C         Quit");
    log_block_start!("Signals:");
    log_indented!("SIGHUP, SIGUSR2        Reload the configuration");
    log_indented!("SIGINT, SIGTERM        Restore the terminal and exit");
    log_end!();
}

/// Displays the simulator's help message.
pub fn display_simulate_help() {
    log_version!();
    log_block_start!("Run the clock against simulated time");
    log_block_start!("Usage:");
    log_indented!("linear-terminal-clock-simulate-time [SCENARIO] [OPTIONS]");
    log_block_start!("Scenarios:");
    for scenario in Scenario::ALL {
        let marker = if scenario.name() == DEFAULT_SCENARIO {
            " (default)"
        } else {
            ""
        };
        log_indented!(
            "{:<22} {}{}",
            scenario.name(),
            scenario.description(),
            marker
        );
    }
    log_block_start!("Options:");
    log_indented!("--start <time>         Override the start (YYYY-MM-DD HH:MM[:SS])");
    log_indented!("--end <time>           Override the end (YYYY-MM-DD HH:MM[:SS])");
    log_indented!("--step <seconds>       Simulated time between frames");
    log_indented!("--delay <ms>           Real time each frame stays on screen");
    log_indented!("--once                 Stop after one pass instead of looping");
    log_indented!("--print                Print plain frames to stdout without a terminal");
    log_indented!("--width <columns>      Frame width for --print (default {DEFAULT_PRINT_WIDTH})");
    log_indented!("--height <rows>        Frame height for --print (default {DEFAULT_PRINT_HEIGHT})");
    log_common_options();
    log_end!();
}

fn log_common_options() {
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <dest>       Log to stdout, stderr, or a file path");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
}
