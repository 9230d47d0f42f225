// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Declarative install reconciliation.
//!
//! __Reconciliation__ compares the packages a profile wants against what the
//! package manager reports as installed, and installs only what is missing.
//! Running it twice without anything changing in between installs nothing the
//! second time, and every package shows up as already present.
//!
//! # Algorithm
//!
//! Packages are handled strictly one after another in input order:
//!
//! 1. If the package manager does not serve the platform, or cannot be
//!    reached, the package fails as "package manager unavailable".
//! 2. If the package manager lists the package as installed, the package is
//!    already present and no install is attempted.
//! 3. Otherwise the package is installed, and either succeeds or fails with
//!    whatever diagnostic the package manager produced.
//!
//! A failure never stops the batch, and nothing is rolled back. Packages
//! installed earlier in the batch stay installed when a later one fails. The
//! reconciler always hands back a complete [`ReconciliationReport`], with one
//! outcome per requested package in the same order as requested.

use crate::{
    adapter::{InstallResult, PackageManager},
    package::Package,
    platform::Platform,
};

use indicatif::ProgressBar;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};
use tracing::{info, instrument, warn};

/// Failure detail used when the package manager cannot be reached.
pub const UNAVAILABLE_DETAIL: &str = "package manager unavailable";

/// Reconcile desired packages without progress reporting.
///
/// See [`Reconciler::reconcile`].
pub fn reconcile<'p, A>(
    platform: &Platform,
    adapter: &A,
    desired: &'p [Package],
) -> ReconciliationReport<'p>
where
    A: PackageManager + ?Sized,
{
    Reconciler::new(platform, adapter).reconcile(desired)
}

/// Reconcile packages of a profile through a package manager.
pub struct Reconciler<'r, A>
where
    A: PackageManager + ?Sized,
{
    platform: &'r Platform,
    adapter: &'r A,
    bar: ProgressBar,
}

impl<'r, A> Reconciler<'r, A>
where
    A: PackageManager + ?Sized,
{
    /// Construct new reconciler with progress reporting hidden.
    pub fn new(platform: &'r Platform, adapter: &'r A) -> Self {
        Self {
            platform,
            adapter,
            bar: ProgressBar::hidden(),
        }
    }

    /// Report progress through given progress bar.
    ///
    /// The bar's length is set to the batch size and cleared when done.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.bar = bar;
        self
    }

    /// Install every missing package in `desired`.
    ///
    /// Never fails. Problems with individual packages, including an
    /// unreachable package manager, are recorded as [`InstallStatus::Failed`]
    /// outcomes.
    #[instrument(skip_all, fields(platform = %self.platform, manager = self.adapter.name()), level = "debug")]
    pub fn reconcile<'p>(&self, desired: &'p [Package]) -> ReconciliationReport<'p> {
        let mut outcomes = Vec::with_capacity(desired.len());
        let mut path_entries: Vec<PathBuf> = Vec::new();
        self.bar.set_length(desired.len() as u64);

        for package in desired {
            self.bar.set_message(package.to_string());
            let outcome = self.reconcile_one(package, &mut path_entries);
            self.bar.inc(1);
            outcomes.push(outcome);
        }

        self.bar.finish_and_clear();

        ReconciliationReport {
            outcomes,
            path_entries,
        }
    }

    /// Determine what [`Reconciler::reconcile`] would do without installing.
    #[instrument(skip_all, fields(platform = %self.platform, manager = self.adapter.name()), level = "debug")]
    pub fn plan<'p>(&self, desired: &'p [Package]) -> InstallPlan<'p> {
        let entries = desired
            .iter()
            .map(|package| {
                let action = if !self.adapter_ready() {
                    PlanAction::Unavailable
                } else {
                    match self.adapter.is_installed(package) {
                        Ok(true) => PlanAction::Skip,
                        Ok(false) => PlanAction::Install,
                        Err(error) => PlanAction::Unknown(error.to_string()),
                    }
                };

                PlannedPackage { package, action }
            })
            .collect();

        InstallPlan { entries }
    }

    fn reconcile_one<'p>(
        &self,
        package: &'p Package,
        path_entries: &mut Vec<PathBuf>,
    ) -> InstallOutcome<'p> {
        if !self.adapter_ready() {
            warn!("{package}: {UNAVAILABLE_DETAIL}");
            return InstallOutcome::failed(package, UNAVAILABLE_DETAIL);
        }

        match self.adapter.is_installed(package) {
            Ok(true) => {
                info!("{package}: already present");
                return InstallOutcome::already_present(package);
            }
            Ok(false) => {}
            Err(error) => {
                warn!("{package}: cannot query install state: {error}");
                return InstallOutcome::failed(package, error.to_string());
            }
        }

        info!("{package}: installing with {}", self.adapter.name());
        match self.adapter.install(package) {
            InstallResult::Installed {
                path_entries: entries,
            } => {
                for entry in entries {
                    if !path_entries.contains(&entry) {
                        path_entries.push(entry);
                    }
                }
                info!("{package}: installed");
                InstallOutcome::installed(package)
            }
            InstallResult::Failed { detail } => {
                warn!("{package}: install failed: {detail}");
                InstallOutcome::failed(package, detail)
            }
        }
    }

    fn adapter_ready(&self) -> bool {
        self.adapter.os_class() == self.platform.os_class() && self.adapter.is_available()
    }
}

/// Status of a reconciled package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// Package was installed before reconciliation touched it.
    AlreadyPresent,

    /// Package was installed by this reconciliation.
    Installed,

    /// Package could not be installed.
    Failed,
}

impl Display for InstallStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::AlreadyPresent => fmt.write_str("already present"),
            Self::Installed => fmt.write_str("installed"),
            Self::Failed => fmt.write_str("failed"),
        }
    }
}

/// Result of reconciling one package.
///
/// Borrows the package it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome<'p> {
    package: &'p Package,
    status: InstallStatus,
    detail: Option<String>,
}

impl<'p> InstallOutcome<'p> {
    pub fn already_present(package: &'p Package) -> Self {
        Self {
            package,
            status: InstallStatus::AlreadyPresent,
            detail: None,
        }
    }

    pub fn installed(package: &'p Package) -> Self {
        Self {
            package,
            status: InstallStatus::Installed,
            detail: None,
        }
    }

    pub fn failed(package: &'p Package, detail: impl Into<String>) -> Self {
        Self {
            package,
            status: InstallStatus::Failed,
            detail: Some(detail.into()),
        }
    }

    pub fn package(&self) -> &'p Package {
        self.package
    }

    pub fn status(&self) -> InstallStatus {
        self.status
    }

    /// Diagnostic, only present for failures.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_failed(&self) -> bool {
        self.status == InstallStatus::Failed
    }
}

impl Display for InstallOutcome<'_> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match &self.detail {
            Some(detail) => write!(fmt, "{}: {} ({detail})", self.package, self.status),
            None => write!(fmt, "{}: {}", self.package, self.status),
        }
    }
}

/// Outcome of a whole reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport<'p> {
    outcomes: Vec<InstallOutcome<'p>>,
    path_entries: Vec<PathBuf>,
}

impl<'p> ReconciliationReport<'p> {
    /// Outcomes in the order packages were requested.
    pub fn outcomes(&self) -> &[InstallOutcome<'p>] {
        &self.outcomes
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstallOutcome<'p>> {
        self.outcomes.iter()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &InstallOutcome<'p>> {
        self.outcomes.iter().filter(|outcome| outcome.is_failed())
    }

    pub fn count(&self, status: InstallStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Process exit code for this report: nonzero if anything failed.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Directories package managers asked to have prepended to `PATH`.
    ///
    /// Deduplicated, in the order they were first reported.
    pub fn path_entries(&self) -> &[PathBuf] {
        &self.path_entries
    }

    /// One line summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} packages: {} installed, {} already present, {} failed",
            self.len(),
            self.count(InstallStatus::Installed),
            self.count(InstallStatus::AlreadyPresent),
            self.count(InstallStatus::Failed),
        )
    }
}

/// What reconciliation would do for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Already installed, nothing to do.
    Skip,

    /// Missing, would be installed.
    Install,

    /// Package manager cannot be reached.
    Unavailable,

    /// Install state could not be determined.
    Unknown(String),
}

impl Display for PlanAction {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Skip => fmt.write_str("already present"),
            Self::Install => fmt.write_str("would install"),
            Self::Unavailable => fmt.write_str(UNAVAILABLE_DETAIL),
            Self::Unknown(detail) => write!(fmt, "unknown ({detail})"),
        }
    }
}

/// Planned action for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPackage<'p> {
    pub package: &'p Package,
    pub action: PlanAction,
}

impl Display for PlannedPackage<'_> {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}: {}", self.package, self.action)
    }
}

/// Dry run of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan<'p> {
    entries: Vec<PlannedPackage<'p>>,
}

impl<'p> InstallPlan<'p> {
    pub fn entries(&self) -> &[PlannedPackage<'p>] {
        &self.entries
    }

    /// Packages that would be installed.
    pub fn to_install(&self) -> impl Iterator<Item = &'p Package> + '_ {
        self.entries
            .iter()
            .filter(|entry| entry.action == PlanAction::Install)
            .map(|entry| entry.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn outcome_display() {
        let git = Package::new("git", PackageKind::Formula);
        let posh = Package::new("JanDeDobbeleer.OhMyPosh", PackageKind::Generic)
            .with_name("oh-my-posh");

        assert_eq!(
            InstallOutcome::already_present(&git).to_string(),
            "git: already present"
        );
        assert_eq!(
            InstallOutcome::failed(&posh, "network error").to_string(),
            "oh-my-posh (JanDeDobbeleer.OhMyPosh): failed (network error)"
        );
    }

    #[test]
    fn detail_only_on_failure() {
        let git = Package::new("git", PackageKind::Formula);
        assert_eq!(InstallOutcome::installed(&git).detail(), None);
        assert_eq!(InstallOutcome::already_present(&git).detail(), None);
        assert_eq!(
            InstallOutcome::failed(&git, "network error").detail(),
            Some("network error")
        );
    }

    #[test]
    fn report_summary_and_exit_code() {
        let git = Package::new("git", PackageKind::Formula);
        let posh = Package::new("oh-my-posh", PackageKind::Formula);
        let report = ReconciliationReport {
            outcomes: vec![
                InstallOutcome::already_present(&git),
                InstallOutcome::failed(&posh, "network error"),
            ],
            path_entries: Vec::new(),
        };

        assert_eq!(
            report.summary(),
            "2 packages: 0 installed, 1 already present, 1 failed"
        );
        assert_eq!(report.exit_code(), 1);
        assert!(!report.is_success());

        let empty = ReconciliationReport::default();
        assert!(empty.is_empty());
        assert_eq!(empty.exit_code(), 0);
    }
}
