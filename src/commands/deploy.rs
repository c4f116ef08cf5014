use crate::cli::DeployArgs;
use crate::commands::executor_for;
use crate::config;
use anyhow::{Context, Result};
use deploykit::Deployer;

pub fn run(args: &DeployArgs) -> Result<()> {
    let share = config::resolve_share(&args.share)?;
    let executor = executor_for(&args.target)?;
    let mut deployer = Deployer::new(executor, share);

    let collection_dir = deployer
        .setup(&args.daemon_exe, args.ssh_port, args.skip_copy)
        .with_context(|| format!("deploying to {} failed", args.target.host))?;

    println!("collection directory: {collection_dir}");
    println!("sshd listening on port {}", args.ssh_port);
    Ok(())
}
