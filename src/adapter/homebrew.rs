// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Homebrew adapter.
//!
//! Homebrew keeps formulae and casks in separate listings, so the package
//! kind decides which listing gets consulted. Generic packages are treated as
//! formulae.
//!
//! A fresh Homebrew install on Apple silicon lives under `/opt/homebrew`,
//! which is not on `PATH` until the user's shell profile runs
//! `brew shellenv`. The adapter therefore looks for the binary in the well
//! known prefixes first, and reports `<prefix>/bin` and `<prefix>/sbin` after
//! every successful install so the caller can make new tools visible to the
//! rest of the session.

use crate::{
    adapter::{
        exit::{self, Disposition, HOMEBREW_RULES},
        AdapterError, InstallResult, PackageManager, Result,
    },
    package::{Package, PackageKind},
    platform::OsClass,
    syscall::{CommandRunner, SystemRunner},
};

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Locations checked for the brew binary before falling back to `PATH`.
pub const BREW_CANDIDATES: &[&str] = &["/opt/homebrew/bin/brew", "/usr/local/bin/brew"];

/// Homebrew adapter.
#[derive(Debug)]
pub struct Homebrew<R = SystemRunner>
where
    R: CommandRunner,
{
    runner: R,
    program: OsString,
}

impl<R> Homebrew<R>
where
    R: CommandRunner,
{
    /// Construct adapter, locating the brew binary.
    pub fn new(runner: R) -> Self {
        let program = BREW_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.is_file())
            .map(|path| path.as_os_str().to_owned())
            .unwrap_or_else(|| "brew".into());
        debug!("using brew binary {:?}", program);

        Self::with_program(runner, program)
    }

    /// Construct adapter with explicit path to brew binary.
    pub fn with_program(runner: R, program: impl Into<OsString>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    fn list_args(&self, package: &Package) -> Vec<OsString> {
        let listing = match package.kind() {
            PackageKind::Cask => "--cask",
            PackageKind::Formula | PackageKind::Generic => "--formula",
        };

        vec!["list".into(), listing.into(), "-1".into()]
    }

    fn install_args(&self, package: &Package) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["install".into()];
        if package.kind() == PackageKind::Cask {
            args.push("--cask".into());
        }
        args.push(package.identifier().into());
        args.extend(package.install_args().iter().map(OsString::from));
        args
    }

    /// Directories `brew shellenv` would put on `PATH`.
    fn shellenv_path_entries(&self) -> Vec<PathBuf> {
        let prefix = match self.runner.run(&self.program, &[OsString::from("--prefix")]) {
            Ok(output) if output.success() && !output.stdout.trim().is_empty() => {
                PathBuf::from(output.stdout.trim())
            }
            Ok(output) => {
                warn!("cannot determine homebrew prefix: {}", output.diagnostic());
                return Vec::new();
            }
            Err(error) => {
                warn!("cannot determine homebrew prefix: {error}");
                return Vec::new();
            }
        };

        vec![prefix.join("bin"), prefix.join("sbin")]
    }
}

impl<R> PackageManager for Homebrew<R>
where
    R: CommandRunner,
{
    fn name(&self) -> &str {
        "homebrew"
    }

    fn os_class(&self) -> OsClass {
        OsClass::MacOs
    }

    fn is_available(&self) -> bool {
        self.runner.probe(&self.program)
    }

    #[instrument(skip(self, package), fields(id = package.identifier()), level = "debug")]
    fn is_installed(&self, package: &Package) -> Result<bool> {
        let output = self
            .runner
            .run(&self.program, &self.list_args(package))
            .map_err(|source| AdapterError::Spawn {
                source,
                program: self.name().into(),
            })?;

        if !output.success() {
            return Err(AdapterError::Query {
                program: self.name().into(),
                detail: output.diagnostic(),
            });
        }

        let wanted = formula_name(package.identifier());
        Ok(output.stdout.lines().map(str::trim).any(|line| line == wanted))
    }

    #[instrument(skip(self, package), fields(id = package.identifier()), level = "debug")]
    fn install(&self, package: &Package) -> InstallResult {
        let output = match self.runner.run(&self.program, &self.install_args(package)) {
            Ok(output) => output,
            Err(error) => return InstallResult::failed(format!("failed to run brew: {error}")),
        };

        match exit::classify(HOMEBREW_RULES, &output) {
            Disposition::Success => {
                info!("brew installed {} {}", package.kind(), package.identifier());
            }
            Disposition::AlreadySatisfied => {
                info!("brew reports {} already installed", package.identifier());
            }
            Disposition::Failure => {
                warn!(
                    "brew failed to install {} (exit code {:?})",
                    package.identifier(),
                    output.code
                );
                return InstallResult::failed(output.diagnostic());
            }
        }

        InstallResult::Installed {
            path_entries: self.shellenv_path_entries(),
        }
    }
}

/// Strip tap prefix from formula name, e.g., "user/repo/formula" to "formula".
fn formula_name(identifier: &str) -> &str {
    identifier.rsplit('/').next().unwrap_or(identifier)
}
