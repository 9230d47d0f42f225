// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External process invocation.
//!
//! Every package manager call goes through a [`CommandRunner`], so adapters
//! never spawn processes themselves. Production code uses [`SystemRunner`].
//! Tests hand adapters a scripted runner instead and never touch the host's
//! package database.

use std::{
    ffi::{OsStr, OsString},
    io,
    process::Command,
};
use tracing::{debug, instrument};

/// Run external programs to completion.
///
/// Calls block until the child exits. There is no timeout, so a hung
/// installer hangs the caller.
pub trait CommandRunner {
    /// Run program with arguments, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// - Return [`io::Error`] if the process cannot be spawned at all.
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandOutput>;

    /// Check that program can be spawned and answers `--version` cleanly.
    fn probe(&self, program: &OsStr) -> bool {
        self.run(program, &[OsString::from("--version")])
            .map(|output| output.success())
            .unwrap_or(false)
    }
}

/// Captured result of an external process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Construct output for a process that exited with `code`.
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Check if either output stream contains `needle`, ignoring ASCII case.
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_ascii_lowercase();
        self.stdout.to_ascii_lowercase().contains(&needle)
            || self.stderr.to_ascii_lowercase().contains(&needle)
    }

    /// Short diagnostic suitable for a failure report.
    ///
    /// Prefers stderr, falls back to stdout, and finally to the exit code.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.into();
        }

        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.into();
        }

        match self.code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".into(),
        }
    }
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip(self, args), level = "debug")]
    fn run(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandOutput> {
        debug!("run {:?} {:?}", program, args);
        let output = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn diagnostic_prefers_stderr() {
        let output = CommandOutput::new(1, "resolving...\n", "network error\n");
        assert_eq!(output.diagnostic(), "network error");

        let output = CommandOutput::new(1, "no package found\r\n", "");
        assert_eq!(output.diagnostic(), "no package found");

        let output = CommandOutput::new(3, "", "  ");
        assert_eq!(output.diagnostic(), "exited with code 3");

        let output = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert_eq!(output.diagnostic(), "terminated by signal");
    }

    #[test]
    fn contains_ignores_case() {
        let output = CommandOutput::new(0, "", "Warning: git 2.45 is ALREADY INSTALLED");
        assert!(output.contains("already installed"));
        assert!(!output.contains("not installed"));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_output() -> anyhow::Result<()> {
        let output = SystemRunner.run(OsStr::new("echo"), &[OsString::from("hello")])?;
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");

        Ok(())
    }

    #[test]
    fn system_runner_probe_missing_program() {
        assert!(!SystemRunner.probe(OsStr::new("devstrap-no-such-program-exists")));
    }
}
