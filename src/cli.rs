use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wincollect")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision a Windows host for one-shot data collection", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Mount the payload share, copy the toolchain, and start the bootstrap sshd
    Deploy(DeployArgs),

    /// Kill remote processes, remove services, and delete the collection directory
    Teardown(TargetArgs),

    /// Print the target's %TEMP% directory
    TempDir(TargetArgs),

    /// Query systeminfo on the target and report host identity
    HostInfo(HostInfoArgs),
}

// ============================================================================
// Shared argument groups
// ============================================================================

#[derive(Args)]
pub struct TargetArgs {
    /// Target machine hostname or IP
    #[arg(short = 'm', long)]
    pub host: String,

    /// Account used for every remote call
    #[arg(short, long, default_value = "Administrator")]
    pub username: String,

    /// Password for that account
    #[arg(short, long, env = "WINCOLLECT_PASSWORD")]
    pub password: String,
}

#[derive(Args)]
pub struct ShareArgs {
    /// Host exposing the payload share (overrides share.json)
    #[arg(long)]
    pub share_host: Option<String>,

    /// Share name on that host (overrides share.json)
    #[arg(long)]
    pub share_name: Option<String>,

    /// Account used against the share (overrides share.json)
    #[arg(long)]
    pub share_user: Option<String>,

    /// Password for the share account (overrides share.json)
    #[arg(long, env = "WINCOLLECT_SHARE_PASSWORD")]
    pub share_pass: Option<String>,

    /// Payload subdirectory on the share for this release
    #[arg(long)]
    pub share_dir: Option<String>,
}

// ============================================================================
// Deploy
// ============================================================================

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(flatten)]
    pub share: ShareArgs,

    /// Port the bootstrap sshd listens on
    #[arg(long, default_value = "12541")]
    pub ssh_port: u16,

    /// Daemon executable recorded in the start log
    #[arg(long, default_value = "sshd.exe")]
    pub daemon_exe: String,

    /// Skip copying the toolchain (already present on the target)
    #[arg(long)]
    pub skip_copy: bool,
}

// ============================================================================
// Host info
// ============================================================================

#[derive(Args)]
pub struct HostInfoArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Write the JSON report to this file as well as stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_tree_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_args_parse() {
        let cli = Cli::try_parse_from([
            "wincollect",
            "deploy",
            "-m",
            "10.0.0.7",
            "-p",
            "s3cret",
            "--share-host",
            "smb.example.com",
            "--ssh-port",
            "2222",
            "--skip-copy",
        ])
        .unwrap();

        match cli.command {
            Command::Deploy(args) => {
                assert_eq!(args.target.host, "10.0.0.7");
                assert_eq!(args.target.username, "Administrator");
                assert_eq!(args.ssh_port, 2222);
                assert!(args.skip_copy);
                assert_eq!(args.share.share_host.as_deref(), Some("smb.example.com"));
            }
            _ => panic!("expected deploy"),
        }
    }
}
