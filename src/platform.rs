// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Platform detection.
//!
//! Devstrap only knows how to bootstrap two kinds of hosts: Windows through
//! WinGet, and macOS through Homebrew. The running platform is determined
//! exactly once at startup. Any other operating system fails closed, because
//! there is no package manager we could reconcile against.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Class of operating system that devstrap supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsClass {
    Windows,
    MacOs,
}

impl Display for OsClass {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Windows => fmt.write_str("windows"),
            Self::MacOs => fmt.write_str("macos"),
        }
    }
}

/// Detected host platform.
///
/// Constructed once per run and read-only afterwards. There is no way to
/// build a [`Platform`] for an unsupported operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    os_class: OsClass,
}

impl Platform {
    /// Construct platform for a known OS class.
    pub fn new(os_class: OsClass) -> Self {
        Self { os_class }
    }

    /// Detect platform of running process.
    ///
    /// # Errors
    ///
    /// - Return [`UnsupportedPlatformError`] if the host is neither Windows
    ///   nor macOS.
    pub fn detect() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name as reported by [`std::env::consts::OS`] to a platform.
    ///
    /// # Errors
    ///
    /// - Return [`UnsupportedPlatformError`] for any name other than
    ///   "windows" or "macos".
    pub fn from_os(os: impl AsRef<str>) -> Result<Self> {
        match os.as_ref() {
            "windows" => Ok(Self::new(OsClass::Windows)),
            "macos" => Ok(Self::new(OsClass::MacOs)),
            other => Err(UnsupportedPlatformError { os: other.into() }),
        }
    }

    pub fn os_class(&self) -> OsClass {
        self.os_class
    }

    pub fn is_windows(&self) -> bool {
        self.os_class == OsClass::Windows
    }

    pub fn is_macos(&self) -> bool {
        self.os_class == OsClass::MacOs
    }
}

impl Display for Platform {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        self.os_class.fmt(fmt)
    }
}

/// Running operating system is not supported.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported platform {os:?}, only windows and macos can be bootstrapped")]
pub struct UnsupportedPlatformError {
    pub os: String,
}

/// Friendly result alias :3
pub type Result<T, E = UnsupportedPlatformError> = std::result::Result<T, E>;
