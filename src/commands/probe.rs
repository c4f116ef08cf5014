use crate::cli::{HostInfoArgs, TargetArgs};
use crate::commands::executor_for;
use anyhow::{Context, Result};
use std::fs;

pub fn temp_dir(args: &TargetArgs) -> Result<()> {
    let executor = executor_for(args)?;
    println!("{}", deploykit::win_temp_dir(&executor));
    Ok(())
}

pub fn host_info(args: &HostInfoArgs) -> Result<()> {
    let executor = executor_for(&args.target)?;
    let info = winexec::hostinfo::host_info(&executor)
        .with_context(|| format!("querying systeminfo on {} failed", args.target.host))?;

    let json = serde_json::to_string_pretty(&info)?;
    if let Some(path) = &args.output {
        fs::write(path, &json).with_context(|| format!("could not write {}", path.display()))?;
    }
    println!("{json}");
    Ok(())
}
