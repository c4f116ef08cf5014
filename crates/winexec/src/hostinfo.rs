//! Host identity diagnostic through `systeminfo`.
//!
//! The reachability prober calls this one read-only command when the SMB
//! ports turn out to be open; everything else it does is its own business.

use crate::Executor;
use crate::error::Result;
use serde::Serialize;

/// Basic identity of a remote Windows host, as reported by `systeminfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// The `Host Name` line
    pub host_name: Option<String>,
    /// The `OS Name` line
    pub os_name: Option<String>,
    /// The `OS Version` line
    pub os_version: Option<String>,
}

/// Run `systeminfo` on the target and extract the fixed key set.
pub fn host_info(executor: &Executor) -> Result<HostInfo> {
    let result = executor.execute("systeminfo")?;
    Ok(parse_systeminfo(&result.stdout))
}

/// Parse colon-delimited `Key: Value` lines from systeminfo output.
fn parse_systeminfo(stdout: &str) -> HostInfo {
    let mut info = HostInfo::default();
    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Host Name" => info.host_name = Some(value.to_string()),
            "OS Name" => info.os_name = Some(value.to_string()),
            "OS Version" => info.os_version = Some(value.to_string()),
            _ => {}
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Host Name:                 WIN-SRC01\r
OS Name:                   Microsoft Windows Server 2008 R2 Standard\r
OS Version:                6.1.7601 Service Pack 1 Build 7601\r
OS Manufacturer:           Microsoft Corporation\r
System Boot Time:          1/4/2013, 9:04:12 AM\r
";

    #[test]
    fn test_parse_systeminfo_extracts_fixed_keys() {
        let info = parse_systeminfo(SAMPLE);
        assert_eq!(info.host_name.as_deref(), Some("WIN-SRC01"));
        assert_eq!(
            info.os_name.as_deref(),
            Some("Microsoft Windows Server 2008 R2 Standard")
        );
        assert_eq!(
            info.os_version.as_deref(),
            Some("6.1.7601 Service Pack 1 Build 7601")
        );
    }

    #[test]
    fn test_parse_systeminfo_ignores_other_keys() {
        let info = parse_systeminfo("OS Manufacturer: Microsoft Corporation\n");
        assert_eq!(info, HostInfo::default());
    }

    #[test]
    fn test_parse_systeminfo_tolerates_garbage() {
        let info = parse_systeminfo("no delimiter here\n\n");
        assert_eq!(info, HostInfo::default());
    }
}
