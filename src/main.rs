//! ftwin command-line entry point.

use clap::Parser;
use ftwin::cli::Cli;
use ftwin::duplicates::FinderError;
use ftwin::error::ExitCode;
#[cfg(feature = "json")]
use ftwin::error::StructuredError;

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match ftwin::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let cancelled = matches!(
                err.downcast_ref::<FinderError>(),
                Some(FinderError::Cancelled)
            );
            let exit_code = if cancelled {
                ExitCode::Interrupted
            } else {
                ExitCode::GeneralError
            };
            report(&err, exit_code, json_errors);
            std::process::exit(exit_code.as_i32());
        }
    }
}

#[cfg_attr(not(feature = "json"), allow(unused_variables))]
fn report(err: &anyhow::Error, exit_code: ExitCode, json_errors: bool) {
    #[cfg(feature = "json")]
    if json_errors {
        if let Ok(json) = serde_json::to_string_pretty(&StructuredError::new(err, exit_code)) {
            eprintln!("{json}");
            return;
        }
    }

    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
}
