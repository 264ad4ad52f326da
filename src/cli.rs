use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provision a Docker Swarm on Terraform-managed VMs and deploy a compose stack.
#[derive(Parser, Debug)]
#[command(name = "swarmctl")]
#[command(version)]
pub struct Cli {
    /// Extra TOML configuration file, merged over swarmctl.toml/swarmctl.json
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Wait for the manager's Docker daemon, init the swarm and save the worker join token
    Bootstrap,
    /// Join every worker to the manager using the saved token
    Join,
    /// Upload the compose and env files to the manager and run docker stack deploy
    Deploy,
    /// Bootstrap, join and deploy in sequence
    Up,
}

/// A single unit of work; `up` expands to all three in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Bootstrap,
    Join,
    Deploy,
}

impl Commands {
    pub fn steps(self) -> &'static [Step] {
        match self {
            Commands::Bootstrap => &[Step::Bootstrap],
            Commands::Join => &[Step::Join],
            Commands::Deploy => &[Step::Deploy],
            Commands::Up => &[Step::Bootstrap, Step::Join, Step::Deploy],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_config() {
        let cli = Cli::try_parse_from(["swarmctl", "join", "--config", "prod.toml"]).unwrap();
        assert_eq!(cli.command, Commands::Join);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));

        let cli = Cli::try_parse_from(["swarmctl", "up"]).unwrap();
        assert_eq!(cli.command, Commands::Up);
        assert!(cli.config.is_none());
    }

    #[test]
    fn up_runs_every_step_in_order() {
        assert_eq!(
            Commands::Up.steps(),
            &[Step::Bootstrap, Step::Join, Step::Deploy]
        );
        assert_eq!(Commands::Deploy.steps(), &[Step::Deploy]);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["swarmctl"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
