//! Process execution helpers.
//!
//! `LinuxHal` builds its event and device-mapper operations on this trait. Callers
//! above the HAL never run tools directly.

use crate::HalResult;
use std::path::Path;
use std::process::Output;

/// Process execution trait (external command runner).
///
/// No timeout is applied: a hung tool hangs the caller.
pub trait ProcessOps {
    /// Run `program` with `args`, capturing stdout and stderr.
    ///
    /// A nonzero exit status is not an error here; callers inspect `Output::status`.
    fn command_output(&self, program: &Path, args: &[&str]) -> HalResult<Output>;

    /// Run `program` and fail with `HalError::CommandFailed` on a nonzero exit.
    fn command_status(&self, program: &Path, args: &[&str]) -> HalResult<()> {
        let output = self.command_output(program, args)?;
        if !output.status.success() {
            return Err(crate::HalError::CommandFailed {
                program: program.display().to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
