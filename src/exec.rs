// src/exec.rs

//! Blocking collaborator-process execution
//!
//! Every external call (git, the store tools) goes through [`run`]:
//! stdin nullified, stdout captured and returned, stderr captured and
//! logged line by line. A non-success exit status is surfaced as
//! [`Error::ExternalCommandFailed`] with the rendered command line, so the
//! failing step can be reproduced by hand.

use crate::error::{Error, Result};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Run a collaborator command to completion and return its stdout
pub(crate) fn run(command: &mut Command) -> Result<String> {
    let rendered = render(command);
    debug!("Executing: {}", rendered);

    let output = command
        .stdin(Stdio::null()) // prevent stdin hangs
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        warn!("[{}] {}", command.get_program().to_string_lossy(), line);
    }

    if !output.status.success() {
        return Err(Error::ExternalCommandFailed {
            command: rendered,
            status: output.status.code().unwrap_or(-1),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Render a command line for diagnostics
fn render(command: &Command) -> String {
    let mut s = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        s.push(' ');
        s.push_str(&arg.to_string_lossy());
    }
    s
}
