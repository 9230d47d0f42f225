// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Windows Package Manager adapter.
//!
//! Queries and installs are always made by exact package identifier, e.g.,
//! `Git.Git` instead of a fuzzy "git" search. Source and package agreements
//! are accepted up front so winget never stops to ask.

use crate::{
    adapter::{
        exit::{self, Disposition, WINGET_RULES},
        AdapterError, InstallResult, PackageManager, Result,
    },
    package::Package,
    platform::OsClass,
    syscall::{CommandRunner, SystemRunner},
};

use std::ffi::OsString;
use tracing::{debug, info, instrument, warn};

/// WinGet adapter.
#[derive(Debug)]
pub struct WinGet<R = SystemRunner>
where
    R: CommandRunner,
{
    runner: R,
    program: OsString,
}

impl<R> WinGet<R>
where
    R: CommandRunner,
{
    /// Construct adapter that expects `winget` on `PATH`.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: "winget".into(),
        }
    }

    fn list_args(&self, package: &Package) -> Vec<OsString> {
        vec![
            "list".into(),
            "--id".into(),
            package.identifier().into(),
            "--exact".into(),
            "--accept-source-agreements".into(),
            "--disable-interactivity".into(),
        ]
    }

    fn install_args(&self, package: &Package) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "install".into(),
            "--id".into(),
            package.identifier().into(),
            "--exact".into(),
            "--silent".into(),
            "--accept-package-agreements".into(),
            "--accept-source-agreements".into(),
            "--disable-interactivity".into(),
        ];
        args.extend(package.install_args().iter().map(OsString::from));
        args
    }
}

impl<R> PackageManager for WinGet<R>
where
    R: CommandRunner,
{
    fn name(&self) -> &str {
        "winget"
    }

    fn os_class(&self) -> OsClass {
        OsClass::Windows
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

        // INVARIANT: Nonzero exit from winget-list means no match, not a broken query.
        if !output.success() {
            debug!("{} not listed: {}", package.identifier(), output.diagnostic());
            return Ok(false);
        }

        match listed_ids(&output.stdout) {
            Some(ids) => Ok(ids
                .iter()
                .any(|listed| id_matches(listed, package.identifier()))),
            None => {
                debug!("no listing table, trusting exact query exit code");
                Ok(true)
            }
        }
    }

    #[instrument(skip(self, package), fields(id = package.identifier()), level = "debug")]
    fn install(&self, package: &Package) -> InstallResult {
        let output = match self.runner.run(&self.program, &self.install_args(package)) {
            Ok(output) => output,
            Err(error) => return InstallResult::failed(format!("failed to run winget: {error}")),
        };

        match exit::classify(WINGET_RULES, &output) {
            Disposition::Success => {
                info!("winget installed {}", package.identifier());
                InstallResult::installed()
            }
            Disposition::AlreadySatisfied => {
                info!("winget reports {} already installed", package.identifier());
                InstallResult::installed()
            }
            Disposition::Failure => {
                warn!(
                    "winget failed to install {} (exit code {:?})",
                    package.identifier(),
                    output.code
                );
                InstallResult::failed(output.diagnostic())
            }
        }
    }
}

/// Values of the Id column in a `winget list` table.
///
/// Columns are located by their header offsets, because names contain
/// spaces. Returns `None` if the output carries no table at all.
fn listed_ids(stdout: &str) -> Option<Vec<String>> {
    // Progress spinners are redrawn with carriage returns.
    let lines = stdout
        .lines()
        .map(|line| line.rsplit('\r').next().unwrap_or(line))
        .collect::<Vec<_>>();
    let separator = lines.iter().position(|line| line.starts_with("---"))?;
    let header = lines.get(separator.checked_sub(1)?)?;

    let columns = column_starts(header);
    let at = columns
        .iter()
        .position(|(_, title)| title.eq_ignore_ascii_case("id"))?;
    let start = columns[at].0;
    let end = columns.get(at + 1).map(|(offset, _)| *offset);

    let ids = lines[separator + 1..]
        .iter()
        .map(|row| {
            let field = row.chars().skip(start);
            let field: String = match end {
                Some(end) => field.take(end - start).collect(),
                None => field.collect(),
            };
            field.trim().to_string()
        })
        .filter(|id| !id.is_empty())
        .collect();

    Some(ids)
}

/// Character offset and title of each header column.
fn column_starts(header: &str) -> Vec<(usize, String)> {
    let mut columns = Vec::new();
    let mut previous = ' ';
    for (offset, ch) in header.chars().enumerate() {
        if !ch.is_whitespace() && previous.is_whitespace() {
            let title = header
                .chars()
                .skip(offset)
                .take_while(|ch| !ch.is_whitespace())
                .collect();
            columns.push((offset, title));
        }
        previous = ch;
    }

    columns
}

/// Compare listed Id with wanted identifier, case-insensitively.
///
/// WinGet cuts long Ids short with a trailing ellipsis, so a shortened Id
/// matches any identifier it is a prefix of.
fn id_matches(listed: &str, wanted: &str) -> bool {
    match listed.strip_suffix('…') {
        Some(prefix) if !prefix.is_empty() => wanted
            .to_lowercase()
            .starts_with(&prefix.to_lowercase()),
        _ => listed.eq_ignore_ascii_case(wanted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::exit::{WINGET_NO_APPLICATIONS_FOUND, WINGET_UPDATE_NOT_APPLICABLE},
        package::PackageKind,
        syscall::{testing::ScriptedRunner, CommandOutput},
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    const LISTING: &str = indoc! {r#"
        Name         Id          Version Source
        -----------------------------------------
        Git          Git.Git     2.45.1  winget
    "#};

    #[test]
    fn is_installed_matches_exact_identifier() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().on("list", CommandOutput::new(0, LISTING, ""));
        let winget = WinGet::new(runner);

        assert!(winget.is_installed(&Package::new("Git.Git", PackageKind::Generic))?);
        assert!(winget.is_installed(&Package::new("git.git", PackageKind::Generic))?);
        assert!(!winget.is_installed(&Package::new("Git", PackageKind::Generic))?);

        Ok(())
    }

    #[test]
    fn is_installed_accepts_shortened_identifier() -> anyhow::Result<()> {
        let listing = indoc! {"
            Name                              Id                               Version
            ---------------------------------------------------------------------------
            Visual Studio Build Tools 2022    Microsoft.VisualStudio.2022.Bui… 17.9.6
        "};
        let runner = ScriptedRunner::new().on("list", CommandOutput::new(0, listing, ""));
        let winget = WinGet::new(runner);

        let build_tools = Package::new(
            "Microsoft.VisualStudio.2022.BuildTools",
            PackageKind::Generic,
        );
        assert!(winget.is_installed(&build_tools)?);
        let community = Package::new(
            "Microsoft.VisualStudio.2022.Community",
            PackageKind::Generic,
        );
        assert!(!winget.is_installed(&community)?);

        Ok(())
    }

    #[test]
    fn is_installed_skips_progress_spinner() -> anyhow::Result<()> {
        let listing = format!("\r   - \r   \\ \r{LISTING}");
        let runner = ScriptedRunner::new().on("list", CommandOutput::new(0, listing, ""));
        let winget = WinGet::new(runner);

        assert!(winget.is_installed(&Package::new("Git.Git", PackageKind::Generic))?);
        assert!(!winget.is_installed(&Package::new("winget", PackageKind::Generic))?);

        Ok(())
    }

    #[test]
    fn is_installed_trusts_exact_query_without_table() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().on("list", CommandOutput::new(0, "", ""));
        let winget = WinGet::new(runner);
        assert!(winget.is_installed(&Package::new("Git.Git", PackageKind::Generic))?);

        Ok(())
    }

    #[test]
    fn install_fails_on_broken_upgrade_of_installed_package() {
        let runner = ScriptedRunner::new().on(
            "install",
            CommandOutput::new(
                0x8A15_0006_u32 as i32,
                "Found an existing package already installed. Trying to upgrade...\nInstaller failed with exit code: 1603",
                "",
            ),
        );
        let winget = WinGet::new(runner);
        let result = winget.install(&Package::new("Git.Git", PackageKind::Generic));
        assert!(!result.is_installed());
    }

    #[test]
    fn is_installed_treats_no_match_as_absent() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new().on(
            "list",
            CommandOutput::new(
                WINGET_NO_APPLICATIONS_FOUND,
                "No installed package found matching input criteria.",
                "",
            ),
        );
        let winget = WinGet::new(runner);
        assert!(!winget.is_installed(&Package::new("Git.Git", PackageKind::Generic))?);

        Ok(())
    }

    #[test]
    fn is_installed_reports_spawn_failure() {
        let winget = WinGet::new(ScriptedRunner::new());
        let result = winget.is_installed(&Package::new("Git.Git", PackageKind::Generic));
        assert!(matches!(result, Err(AdapterError::Spawn { .. })));
    }

    #[test]
    fn install_appends_package_args() {
        let runner = ScriptedRunner::new().on("install", CommandOutput::new(0, "", ""));
        let winget = WinGet::new(runner);
        let package = Package::new("JanDeDobbeleer.OhMyPosh", PackageKind::Generic)
            .with_install_args(["--scope", "user"]);

        assert_eq!(winget.install(&package), InstallResult::installed());
        assert_eq!(
            winget.runner.calls(),
            vec![vec![
                "winget",
                "install",
                "--id",
                "JanDeDobbeleer.OhMyPosh",
                "--exact",
                "--silent",
                "--accept-package-agreements",
                "--accept-source-agreements",
                "--disable-interactivity",
                "--scope",
                "user",
            ]]
        );
    }

    #[test]
    fn install_normalizes_already_installed() {
        let runner = ScriptedRunner::new().on(
            "install",
            CommandOutput::new(
                WINGET_UPDATE_NOT_APPLICABLE,
                "Found an existing package already installed.",
                "",
            ),
        );
        let winget = WinGet::new(runner);
        let result = winget.install(&Package::new("Git.Git", PackageKind::Generic));
        assert_eq!(result, InstallResult::installed());
    }

    #[test]
    fn install_failure_carries_diagnostic() {
        let runner =
            ScriptedRunner::new().on("install", CommandOutput::new(1, "", "network error\n"));
        let winget = WinGet::new(runner);
        let result = winget.install(&Package::new("Git.Git", PackageKind::Generic));
        assert_eq!(result, InstallResult::failed("network error"));
    }

    #[test]
    fn availability_probes_version() {
        let winget = WinGet::new(ScriptedRunner::new().on("--version", CommandOutput::new(0, "v1.8", "")));
        assert!(winget.is_available());

        let winget = WinGet::new(ScriptedRunner::new());
        assert!(!winget.is_available());
    }
}
