pub mod config;
pub mod git;
pub mod sync;

use clap::Parser;

use crate::sync::Sequencer;

#[derive(Parser)]
#[command(
    name = "plato-sync",
    version,
    about = "Pull the repo in the current directory, commit a timestamped test.txt, and push it"
)]
struct Cli {
    /// Accepted and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    _ignored: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let _cli = Cli::parse();

    let identity = config::resolve();
    match Sequencer::new(".", identity).run() {
        Ok(report) => {
            log::debug!("pushed {} to {}", report.commit, sync::REMOTE);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn stray_arguments_are_ignored() {
        assert!(Cli::try_parse_from(["plato-sync"]).is_ok());
        assert!(Cli::try_parse_from(["plato-sync", "extra", "--flag", "-x"]).is_ok());
    }
}
