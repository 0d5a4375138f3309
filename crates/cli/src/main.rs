//! The `wisp` command-line launcher (§6.2): a thin `clap` binary over the
//! `wisp` embedding facade. Holds no VM logic of its own — reading a file
//! or a literal fragment, running it, and reporting the result is all it
//! does.

use clap::Parser;
use std::process::ExitCode;
use wisp::Wisp;

/// Run a Wisp script.
#[derive(Parser)]
#[command(name = "wisp", version, about = "Run a Wisp script")]
struct Cli {
    /// Path to a script file to run.
    file: Option<String>,

    /// Evaluate a literal code fragment instead of reading a file.
    #[arg(short, long, value_name = "CODE")]
    eval: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let mut wisp = Wisp::new();

    let result = match (&cli.eval, &cli.file) {
        (Some(code), _) => wisp.run(code),
        (None, Some(path)) => wisp.run_file(path),
        (None, None) => {
            eprintln!("error: expected a file path or --eval <CODE>");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(output) => {
            for line in output {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
