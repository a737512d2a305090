use clap::Parser;
use docshift::{cli, manifest};
use std::process::ExitCode;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let result = if manifest::should_emit_manifest(&argv) {
        manifest::print_manifest().map(|()| ExitCode::SUCCESS)
    } else {
        cli::dispatch(cli::Args::parse())
    };

    // Only failures from before logging starts land here.
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
