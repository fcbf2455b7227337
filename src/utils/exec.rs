//! One-shot external commands whose output is only logged.
//!
//! ```ignore
//! Cmd::from_slice(&["nightlight", "off"]).quiet().run()?;
//! ```

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    process::{Command, Output, Stdio},
    sync::OnceLock,
};

/// Short-lived command run to completion with stdin closed.
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    quiet: bool,
}

impl Cmd {
    /// Create from a command array (e.g., `["nightlight", "off"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter().map(|s| s.as_ref().to_owned());
        Self {
            program: iter.next().unwrap_or_default(),
            args: iter.collect(),
            quiet: false,
        }
    }

    /// Don't log stderr of a successful run.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Execute the command to completion and return its output.
    ///
    /// A non-zero exit status is an error carrying the command's stderr.
    pub fn run(self) -> Result<Output> {
        if self.program.is_empty() {
            anyhow::bail!("empty command");
        }
        let name = self.program.to_string_lossy().into_owned();

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !output.status.success() {
            anyhow::bail!(failure_message(&name, &output));
        }

        if !self.quiet {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<_> = stderr
                .lines()
                .map(strip_ansi)
                .filter(|line| !line.trim().is_empty())
                .collect();
            if !lines.is_empty() {
                log!(&name; "{}", lines.join("\n"));
            }
        }
        Ok(output)
    }
}

/// Strip ANSI escape sequences (colors, cursor movement) from a string.
pub(crate) fn strip_ansi(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").unwrap());
    re.replace_all(s, "")
}

fn failure_message(name: &str, output: &Output) -> String {
    let mut msg = format!("Command `{name}` failed with {}", output.status);
    for stream in [&output.stderr, &output.stdout] {
        let text = String::from_utf8_lossy(stream);
        let text = strip_ansi(text.trim());
        if !text.is_empty() {
            msg.push('\n');
            msg.push_str(&text);
        }
    }
    msg
}
