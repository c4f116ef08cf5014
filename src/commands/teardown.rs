use crate::cli::TargetArgs;
use crate::commands::executor_for;
use anyhow::Result;

pub fn run(args: &TargetArgs) -> Result<()> {
    let executor = executor_for(args)?;

    log::info!("teardown sequence started on {}", args.host);
    let report = deploykit::cleanup::cleanup_all(&executor);
    log::info!("teardown sequence ended");

    println!("{report}");
    Ok(())
}
