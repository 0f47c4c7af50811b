use std::fs::{File, create_dir, rename};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::debug;
use rustix::fs::{Mode, chmod};

/// Create `path` and any missing parents. Directories created here get
/// `mode`; existing ones are left as they are.
pub fn mkdir_p<P: AsRef<Path>>(path: P, mode: Mode) -> Result<()> {
    for dir in path.as_ref().ancestors().collect::<Vec<_>>().into_iter().rev() {
        if dir.as_os_str().is_empty() || dir.is_dir() {
            continue;
        }
        debug!("Creating directory {:?}", dir);
        match create_dir(dir) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => (),
            Err(e) => return Err(anyhow!("unable to create directory {:?}: {}", dir, e)),
            Ok(()) => chmod(dir, mode)
                .map_err(|e| anyhow!("unable to change mode of {:?}: {}", dir, e))?,
        }
    }
    Ok(())
}

/// Replace the file at `path` with `contents` and give it `mode`. The data
/// goes to a temporary sibling first so a reader never sees a partial file.
pub fn write_file_mode<P: AsRef<Path>>(path: P, contents: &[u8], mode: Mode) -> Result<()> {
    let p = path.as_ref();
    let dir = p
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = p
        .file_name()
        .ok_or_else(|| anyhow!("invalid path {:?}", p))?;
    let tmp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    {
        let mut f = File::create(&tmp).context(format!("unable to create {:?}", tmp))?;
        f.write_all(contents)
            .context(format!("unable to write {:?}", tmp))?;
        f.sync_all().context(format!("unable to sync {:?}", tmp))?;
    }
    chmod(&tmp, mode).map_err(|e| anyhow!("unable to change mode of {:?}: {}", tmp, e))?;
    rename(&tmp, p).context(format!("unable to rename {:?} to {:?}", tmp, p))
}
