// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Personal environment bootstrapper.
//!
//! Devstrap takes a declarative __profile__ of desired developer tooling and
//! makes the host match it through the platform package manager, WinGet on
//! Windows and Homebrew on macOS. Only missing packages get installed, so
//! running devstrap again on an up to date machine does nothing.
//!
//! # Moving Parts
//!
//! 1. [`Platform`] detection decides which package manager applies.
//! 2. A [`ProfileSource`] supplies the desired [`Package`]s.
//! 3. A [`PackageManager`] adapter answers install state queries and performs
//!    installs.
//! 4. The [`Reconciler`] ties them together and produces a
//!    [`ReconciliationReport`].

pub mod adapter;
pub mod config;
pub mod package;
pub mod path;
pub mod platform;
pub mod reconcile;
pub mod syscall;

pub use adapter::{for_platform, InstallResult, PackageManager};
pub use config::{ProfileDocument, ProfileFile, ProfileSource};
pub use package::{Package, PackageKind};
pub use platform::{OsClass, Platform};
pub use reconcile::{reconcile, InstallOutcome, InstallStatus, ReconciliationReport, Reconciler};
