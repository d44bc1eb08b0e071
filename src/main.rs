//! fb2fix - royallib.com FB2 archive repair

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::Level;

use fb2fix::{FixConfig, FixReport, Fixer, resolve_inputs};

#[derive(Parser)]
#[command(name = "fb2fix")]
#[command(version, about = "Repairs royallib.com FB2 archives", long_about = None)]
#[command(override_usage = "fb2fix <filename.fb2.zip> | <mask*.fb2.zip>")]
#[command(after_help = "EXAMPLES:
    fb2fix 'Title - royallib.com.fb2.zip'    Repair one archive
    fb2fix '*.fb2.zip'                       Repair every archive in the current directory")]
struct Cli {
    /// Archive path or glob pattern
    #[arg(value_name = "ARCHIVE")]
    input: String,

    /// Suppress progress messages
    #[arg(short, long)]
    quiet: bool,

    /// Log details to stderr (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep temporary workspaces for inspection
    #[arg(short, long)]
    keep_workspace: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{}", Cli::command().render_usage());
            return ExitCode::from(1);
        }
    };

    init_tracing(cli.verbose);

    let inputs = match resolve_inputs(&cli.input) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };
    if inputs.is_empty() {
        eprintln!("warning: no archives match '{}'", cli.input);
        return ExitCode::SUCCESS;
    }

    let total = inputs.len();
    let fixer = Fixer::with_config(FixConfig::default().with_keep_workspace(cli.keep_workspace));
    let summary = fixer.fix_all(inputs, |path, result| match result {
        Ok(report) if !cli.quiet => print_report(report),
        Ok(_) => {}
        Err(e) => eprintln!("error: {}: {e}", path.display()),
    });

    if !summary.is_success() {
        eprintln!(
            "\n{} of {total} archives could not be repaired",
            summary.failures.len()
        );
    }
    ExitCode::from(summary.exit_code())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &FixReport) {
    println!("\nProcessing '{}'", report.source.display());
    println!("Found '{}'", report.entry_name);
    println!("Renamed to '{}'", report.document_name);
    println!("Packed to '{}'", report.output.display());
    if let Some(workspace) = &report.kept_workspace {
        println!("Workspace kept at '{}'", workspace.display());
    }
}
