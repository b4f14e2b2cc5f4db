use colored::Colorize;
use commands::command_argument_builder;
use sonardump::handlers::{
    Mode, build_options, handle_feed, handle_single, init_logging, select_mode,
};
use sonardump_core::options::DEFAULT_MAX_DOWNLOADS;
use std::path::PathBuf;

mod commands;

#[tokio::main]
async fn main() {
    let mut cmd = command_argument_builder();
    let matches = match cmd.try_get_matches_from_mut(std::env::args_os()) {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    let quiet = matches.get_flag("quiet");
    let verbose = matches.get_flag("verbose");
    init_logging(verbose);

    let mode = match select_mode(
        matches.get_one::<String>("URL"),
        matches.get_one::<PathBuf>("shodan"),
    ) {
        Some(mode) => mode,
        None => {
            eprintln!("{} either a URL or --shodan <PATH> is required\n", "✗".red().bold());
            let _ = cmd.print_help();
            std::process::exit(1);
        }
    };

    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(".");
    let threads = matches
        .get_one::<usize>("threads")
        .copied()
        .unwrap_or(DEFAULT_MAX_DOWNLOADS);
    let options = build_options(output, threads, matches.get_flag("no-download"), quiet);

    let outcome = match mode {
        Mode::Single(url) => handle_single(&url, &options).await.map(|_| ()),
        Mode::Feed(path) => handle_feed(&path, &options).await.map(|_| ()),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
