// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Install result classification.
//!
//! Package managers disagree on how to say "nothing to do". WinGet reports an
//! already installed package through dedicated HRESULT exit codes, while
//! Homebrew prints a warning and exits zero. Each tool gets a small static
//! table of [`ExitRule`]s that maps an exit code, optionally narrowed by an
//! output fragment, to a [`Disposition`]. Rules are checked in order and the
//! first match wins. Anything unmatched is a failure.
//!
//! Output text alone never decides anything. WinGet prints "already
//! installed" before every upgrade attempt, including ones that fail.

use crate::syscall::CommandOutput;

/// What an install attempt amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Package manager installed the package.
    Success,

    /// Package manager found the package already in place.
    AlreadySatisfied,

    /// Install did not happen.
    Failure,
}

/// Single classification rule.
///
/// A rule matches when every condition it sets holds. A rule with neither
/// condition set matches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRule {
    pub code: Option<i32>,
    pub output: Option<&'static str>,
    pub disposition: Disposition,
}

impl ExitRule {
    /// Rule matching on exit code alone.
    pub const fn code(code: i32, disposition: Disposition) -> Self {
        Self {
            code: Some(code),
            output: None,
            disposition,
        }
    }

    /// Rule matching on exit code together with output fragment.
    ///
    /// Fragment is matched case-insensitively against stdout and stderr.
    pub const fn code_with_output(
        code: i32,
        fragment: &'static str,
        disposition: Disposition,
    ) -> Self {
        Self {
            code: Some(code),
            output: Some(fragment),
            disposition,
        }
    }

    pub fn matches(&self, output: &CommandOutput) -> bool {
        let code_matches = self.code.is_none_or(|code| output.code == Some(code));
        let output_matches = self.output.is_none_or(|fragment| output.contains(fragment));
        code_matches && output_matches
    }
}

/// `APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE`: installed, nothing newer.
pub const WINGET_UPDATE_NOT_APPLICABLE: i32 = 0x8A15_002B_u32 as i32;

/// `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED`.
pub const WINGET_PACKAGE_ALREADY_INSTALLED: i32 = 0x8A15_0061_u32 as i32;

/// `APPINSTALLER_CLI_ERROR_NO_APPLICATIONS_FOUND`: query matched nothing.
pub const WINGET_NO_APPLICATIONS_FOUND: i32 = 0x8A15_0014_u32 as i32;

pub const WINGET_RULES: &[ExitRule] = &[
    ExitRule::code(WINGET_UPDATE_NOT_APPLICABLE, Disposition::AlreadySatisfied),
    ExitRule::code(WINGET_PACKAGE_ALREADY_INSTALLED, Disposition::AlreadySatisfied),
    ExitRule::code(0, Disposition::Success),
];

pub const HOMEBREW_RULES: &[ExitRule] = &[
    ExitRule::code_with_output(0, "already installed", Disposition::AlreadySatisfied),
    ExitRule::code(0, Disposition::Success),
];

/// Classify process output against a rule table.
pub fn classify(rules: &[ExitRule], output: &CommandOutput) -> Disposition {
    rules
        .iter()
        .find(|rule| rule.matches(output))
        .map(|rule| rule.disposition)
        .unwrap_or(Disposition::Failure)
}
