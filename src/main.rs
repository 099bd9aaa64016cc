use clap::Parser;
use git_upstream_sync::cli::Cli;
use git_upstream_sync::git::SystemGit;
use git_upstream_sync::{output, sync};

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config();

    let cwd = std::env::current_dir()?;
    output::print_working_dir(&cwd, &config);
    output::print_plan(&config);

    let git = SystemGit::new(cwd, config.git_logger());
    let callbacks =
        output::ConsoleCallbacks::new(output::create_sync_progress(&config), config.clone());
    let report = sync::sync(&git, &config, &callbacks);
    callbacks.finish();

    output::print_report(&report, &config);
    std::process::exit(report.outcome.exit_code());
}
