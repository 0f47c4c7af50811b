use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::info;
use rustix::fs::Mode;

use crate::constants::{DIR_CONF, FILE_NETWORK_SCRIPT};
use crate::fs::{mkdir_p, write_file_mode};
use crate::process::ProcessRunner;

/// Where the bring-up script is written before it runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptLocation {
    pub dir: PathBuf,
    pub path: PathBuf,
}

impl Default for ScriptLocation {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DIR_CONF),
            path: PathBuf::from(FILE_NETWORK_SCRIPT),
        }
    }
}

impl ScriptLocation {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join("network.sh");
        Self { dir, path }
    }
}

/// Persist `script` at `location` and execute it. A script that exits
/// non-zero is reported as an error.
pub fn run_script<R: ProcessRunner>(
    script: &str,
    location: &ScriptLocation,
    runner: &R,
) -> Result<()> {
    mkdir_p(&location.dir, Mode::from(0o700))?;
    write_file_mode(&location.path, script.as_bytes(), Mode::from(0o700))?;

    info!("Running network script {:?}", location.path);
    let status = runner.run(&location.path, &[])?;
    if !status.success() {
        return Err(anyhow!(
            "network script {:?} failed: {}",
            location.path,
            status
        ));
    }
    Ok(())
}
