//! Entry point for the `srb` command-line interface.
#![forbid(unsafe_code)]

use srb_cli::CliError;

#[expect(clippy::print_stderr, reason = "the binary reports failures on stderr")]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    match srb_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("srb: {}: {err}", err.category());
            std::process::exit(1);
        }
    }
}
