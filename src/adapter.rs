// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manager adapters.
//!
//! An __adapter__ wraps one platform package manager behind the
//! [`PackageManager`] trait. The reconciler only ever asks three questions of
//! an adapter: is the tool reachable, is this package already installed, and
//! please install this package. Everything tool specific, i.e., argument
//! vectors, listing formats, exit codes, and "already installed" chatter,
//! stays inside the adapter.
//!
//! # Available Adapters
//!
//! - [`WinGet`] for Windows hosts.
//! - [`Homebrew`] for macOS hosts.
//!
//! Use [`for_platform`] to pick the right one for the detected [`Platform`].
//!
//! # Environment Changes
//!
//! Freshly installed software may live in a directory the current session
//! does not have on `PATH` yet. Adapters never touch the process environment
//! themselves. Instead, [`InstallResult::Installed`] carries the entries the
//! caller should prepend.

pub mod exit;
pub mod homebrew;
pub mod winget;

pub use homebrew::Homebrew;
pub use winget::WinGet;

use crate::{
    package::Package,
    platform::{OsClass, Platform},
    syscall::CommandRunner,
};

use std::{io, path::PathBuf};

/// Query and install capability of a platform package manager.
pub trait PackageManager {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Platform this package manager serves.
    fn os_class(&self) -> OsClass;

    /// Check that the underlying tool can be reached right now.
    fn is_available(&self) -> bool;

    /// Check if package is currently installed.
    ///
    /// Always a fresh query against the package manager, never cached.
    ///
    /// # Errors
    ///
    /// - Return [`AdapterError::Spawn`] if the tool cannot be run.
    /// - Return [`AdapterError::Query`] if the tool refuses to list packages.
    fn is_installed(&self, package: &Package) -> Result<bool>;

    /// Install package.
    ///
    /// Failures are reported through [`InstallResult::Failed`] rather than
    /// as errors, so one bad package never stops a batch.
    fn install(&self, package: &Package) -> InstallResult;
}

/// Outcome of a single install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallResult {
    /// Package is now present on the host.
    Installed {
        /// Directories to prepend to `PATH` for the rest of the session.
        path_entries: Vec<PathBuf>,
    },

    /// Package could not be installed.
    Failed { detail: String },
}

impl InstallResult {
    /// Installed without any environment changes.
    pub fn installed() -> Self {
        Self::Installed {
            path_entries: Vec::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed {
            detail: detail.into(),
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

/// Select package manager adapter for platform.
pub fn for_platform<R>(platform: &Platform, runner: R) -> Box<dyn PackageManager>
where
    R: CommandRunner + 'static,
{
    match platform.os_class() {
        OsClass::Windows => Box::new(WinGet::new(runner)),
        OsClass::MacOs => Box::new(Homebrew::new(runner)),
    }
}

/// Package manager query error types.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Package manager binary could not be spawned.
    #[error("failed to run {program}: {source}")]
    Spawn {
        #[source]
        source: io::Error,
        program: String,
    },

    /// Package manager ran but could not answer the query.
    #[error("{program} could not list installed packages: {detail}")]
    Query { program: String, detail: String },
}

/// Friendly result alias :3
pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
