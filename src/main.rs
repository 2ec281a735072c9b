use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod exec;
mod infra;
mod pod;
mod session;

pub use error::{BastionError, Result};

use cli::commands::{self, ssh::SshOptions, PathArgs};
use infra::InfrastructureKind;

#[derive(Parser)]
#[command(name = "kube-bastion")]
#[command(about = "SSH into cluster nodes through a disposable bastion pod")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open an SSH session to a node through a bastion pod
    Ssh {
        /// Node name
        node: String,

        #[command(flatten)]
        paths: PathArgs,

        /// Infrastructure provider (aws, google, azurerm, alicloud, openstack);
        /// read from the Terraform root module when omitted
        #[arg(long)]
        infra: Option<InfrastructureKind>,

        /// Owner the bastion pod is named after (default: current user)
        #[arg(short, long)]
        owner: Option<String>,

        /// Login user on the node
        #[arg(short, long)]
        user: Option<String>,

        /// SSH public key matching the private key
        #[arg(long)]
        public_key: Option<PathBuf>,
    },

    /// Print the address of a node
    Resolve {
        /// Node name
        node: String,

        #[command(flatten)]
        paths: PathArgs,

        /// Infrastructure provider; read from the Terraform root module when omitted
        #[arg(long)]
        infra: Option<InfrastructureKind>,
    },

    /// Show the phase of your bastion pod
    Status {
        #[command(flatten)]
        paths: PathArgs,

        /// Owner the bastion pod is named after (default: current user)
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Delete your bastion pod
    Cleanup {
        #[command(flatten)]
        paths: PathArgs,

        /// Owner the bastion pod is named after (default: current user)
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show config file location and effective settings
    Show,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Ssh {
            node,
            paths,
            infra,
            owner,
            user,
            public_key,
        } => {
            commands::ssh::execute(SshOptions {
                node,
                paths,
                infra,
                owner,
                user,
                public_key,
            })
            .await
        }
        Commands::Resolve { node, paths, infra } => {
            commands::resolve::execute(node, paths, infra).await
        }
        Commands::Status { paths, owner } => commands::status::execute(paths, owner).await,
        Commands::Cleanup { paths, owner } => commands::cleanup::execute(paths, owner).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ssh() {
        let cli = Cli::try_parse_from([
            "kube-bastion",
            "-v",
            "ssh",
            "izabc123z",
            "--dir",
            "/work",
            "--infra",
            "alicloud",
            "--owner",
            "alice",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Ssh {
                node,
                paths,
                infra,
                owner,
                ..
            } => {
                assert_eq!(node, "izabc123z");
                assert_eq!(paths.dir, PathBuf::from("/work"));
                assert_eq!(infra, Some(InfrastructureKind::Alicloud));
                assert_eq!(owner.as_deref(), Some("alice"));
            }
            _ => panic!("expected ssh command"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_infra() {
        assert!(Cli::try_parse_from(["kube-bastion", "resolve", "node-1", "--infra", "vsphere"]).is_err());
    }
}
