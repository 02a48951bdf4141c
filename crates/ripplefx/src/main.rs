mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Render(args)) => run::render(&cli.effect, args),
        Some(Command::Config(config_cmd)) => run::config(&cli.effect, config_cmd.action),
        None => run::run_window(&cli.effect, cli.run),
    }
}
