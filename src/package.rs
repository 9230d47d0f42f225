// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package representation.
//!
//! A __package__ is a logical unit of software that a profile wants present on
//! the host. Packages are built from a profile document and never change
//! afterwards.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Kind of package as understood by the package manager.
///
/// WinGet has no notion of kinds, so every Windows package is
/// [`PackageKind::Generic`]. Homebrew distinguishes formulae from casks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    Formula,
    Cask,
    #[default]
    Generic,
}

impl Display for PackageKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Formula => fmt.write_str("formula"),
            Self::Cask => fmt.write_str("cask"),
            Self::Generic => fmt.write_str("generic"),
        }
    }
}

/// A package to reconcile.
///
/// Identity is the pair of identifier and kind. The display name is purely
/// presentational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    identifier: String,
    kind: PackageKind,
    install_args: Vec<String>,
}

impl Package {
    /// Construct new package whose display name is its identifier.
    pub fn new(identifier: impl Into<String>, kind: PackageKind) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            kind,
            install_args: Vec::new(),
        }
    }

    /// Use a different display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Extra arguments handed verbatim to the package manager on install.
    pub fn with_install_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.install_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    pub fn install_args(&self) -> &[String] {
        &self.install_args
    }

    /// Check if two packages refer to the same thing.
    pub fn same_identity(&self, other: &Package) -> bool {
        self.identifier == other.identifier && self.kind == other.kind
    }
}

impl Display for Package {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.name == self.identifier {
            write!(fmt, "{}", self.name)
        } else {
            write!(fmt, "{} ({})", self.name, self.identifier)
        }
    }
}
