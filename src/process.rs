use std::path::Path;
use std::process::{Command, ExitStatus};

use anyhow::{Result, anyhow};
use log::debug;

/// Runs an external program to completion and reports how it exited.
pub trait ProcessRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ExitStatus>;
}

/// Spawns real processes that share this process's stdout and stderr.
#[derive(Debug, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<ExitStatus> {
        debug!("Running {:?} {:?}", program, args);
        Command::new(program)
            .args(args)
            .status()
            .map_err(|e| anyhow!("unable to run {:?}: {}", program, e))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_system_process_runner_exit_status() {
        let runner = SystemProcessRunner;
        let ok = runner.run(Path::new("true"), &[]).unwrap();
        assert!(ok.success());
        let failed = runner.run(Path::new("false"), &[]).unwrap();
        assert!(!failed.success());
    }

    #[test]
    fn test_system_process_runner_missing_program() {
        let runner = SystemProcessRunner;
        assert!(
            runner
                .run(Path::new("/nonexistent/netconf-test-binary"), &[])
                .is_err()
        );
    }
}
