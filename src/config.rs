// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the profile document that devstrap reconciles
//! against. Parsing and serialization live here; reading the document from
//! disk is handled by [`ProfileFile`].
//!
//! # General Layout
//!
//! A profile document is a TOML file holding any number of named
//! __profiles__. Each profile lists desired packages per platform. Windows
//! hosts get one flat list of WinGet identifiers. macOS hosts get two lists,
//! one for formulae and one for casks.
//!
//! ```toml
//! [profile.default]
//! description = "Everyday tooling"
//!
//! [profile.default.windows]
//! packages = [
//!     "Git.Git",
//!     { id = "JanDeDobbeleer.OhMyPosh", name = "oh-my-posh", args = ["--scope", "user"] },
//! ]
//!
//! [profile.default.macos]
//! formulae = ["git", "oh-my-posh"]
//! casks = ["visual-studio-code"]
//! ```
//!
//! A package entry is either a bare identifier, or a table with an `id`, an
//! optional display `name`, and optional extra install `args`. Shell
//! expansion is performed on every install argument.

use crate::{
    package::{Package, PackageKind},
    platform::{OsClass, Platform},
};

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Name of profile used when the caller does not pick one.
pub const DEFAULT_PROFILE: &str = "default";

/// Supply desired packages for a profile on a platform.
pub trait ProfileSource {
    /// List packages of named profile for platform, in document order.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnknownProfile`] if no such profile exists.
    /// - May return other [`ConfigError`]s if the document must be loaded.
    fn packages(&self, profile: &str, platform: &Platform) -> Result<Vec<Package>>;
}

/// Profile document layout.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProfileDocument {
    /// Named profiles.
    #[serde(rename = "profile", default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl ProfileDocument {
    /// Look up profile by name.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnknownProfile`] if document lacks the profile.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.into(),
                available: self.profiles.keys().cloned().collect(),
            })
    }

    /// Small document to get new users going.
    pub fn starter() -> Self {
        let profile = Profile {
            description: Some("Everyday tooling".into()),
            windows: Some(WindowsPackages {
                packages: vec![
                    PackageEntry::Id("Git.Git".into()),
                    PackageEntry::Detailed(PackageSpec {
                        id: "JanDeDobbeleer.OhMyPosh".into(),
                        name: Some("oh-my-posh".into()),
                        args: vec!["--scope".into(), "user".into()],
                    }),
                ],
            }),
            macos: Some(MacosPackages {
                formulae: vec![
                    PackageEntry::Id("git".into()),
                    PackageEntry::Id("oh-my-posh".into()),
                ],
                casks: Vec::new(),
            }),
        };

        Self {
            profiles: BTreeMap::from([(DEFAULT_PROFILE.into(), profile)]),
        }
    }
}

impl ProfileSource for ProfileDocument {
    fn packages(&self, profile: &str, platform: &Platform) -> Result<Vec<Package>> {
        Ok(self.profile(profile)?.packages_for(platform))
    }
}

impl FromStr for ProfileDocument {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut document: ProfileDocument =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every install argument.
        for profile in document.profiles.values_mut() {
            for entry in profile.entries_mut() {
                entry.expand_args()?;
            }
        }

        Ok(document)
    }
}

impl Display for ProfileDocument {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Single named profile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Brief description of what the profile sets up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Packages for Windows hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<WindowsPackages>,

    /// Packages for macOS hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macos: Option<MacosPackages>,
}

impl Profile {
    /// Materialize packages for platform.
    ///
    /// Windows entries become [`PackageKind::Generic`]. On macOS, formulae
    /// come first followed by casks, each in document order. A profile with
    /// no section for the platform yields nothing.
    pub fn packages_for(&self, platform: &Platform) -> Vec<Package> {
        match platform.os_class() {
            OsClass::Windows => self
                .windows
                .iter()
                .flat_map(|windows| windows.packages.iter())
                .map(|entry| entry.to_package(PackageKind::Generic))
                .collect(),
            OsClass::MacOs => {
                let Some(macos) = &self.macos else {
                    return Vec::new();
                };

                macos
                    .formulae
                    .iter()
                    .map(|entry| entry.to_package(PackageKind::Formula))
                    .chain(
                        macos
                            .casks
                            .iter()
                            .map(|entry| entry.to_package(PackageKind::Cask)),
                    )
                    .collect()
            }
        }
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut PackageEntry> {
        let windows = self
            .windows
            .iter_mut()
            .flat_map(|windows| windows.packages.iter_mut());
        let macos = self
            .macos
            .iter_mut()
            .flat_map(|macos| macos.formulae.iter_mut().chain(macos.casks.iter_mut()));

        windows.chain(macos)
    }
}

/// Windows package listing.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct WindowsPackages {
    /// WinGet packages by exact identifier.
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

/// macOS package listing.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct MacosPackages {
    /// Homebrew formulae.
    #[serde(default)]
    pub formulae: Vec<PackageEntry>,

    /// Homebrew casks.
    #[serde(default)]
    pub casks: Vec<PackageEntry>,
}

/// Package entry in a profile.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PackageEntry {
    /// Just the identifier.
    Id(String),

    /// Identifier with display name and install arguments.
    Detailed(PackageSpec),
}

impl PackageEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Detailed(spec) => &spec.id,
        }
    }

    /// Convert entry to package of given kind.
    pub fn to_package(&self, kind: PackageKind) -> Package {
        match self {
            Self::Id(id) => Package::new(id.as_str(), kind),
            Self::Detailed(spec) => {
                let package = Package::new(spec.id.as_str(), kind).with_install_args(&spec.args);
                match &spec.name {
                    Some(name) => package.with_name(name.as_str()),
                    None => package,
                }
            }
        }
    }

    fn expand_args(&mut self) -> Result<()> {
        if let Self::Detailed(spec) = self {
            for arg in spec.args.iter_mut() {
                *arg = shellexpand::full(arg.as_str())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned();
            }
        }

        Ok(())
    }
}

/// Detailed package entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PackageSpec {
    /// Package manager specific identifier.
    pub id: String,

    /// Display name, defaults to identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Extra arguments passed verbatim on install.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Profile document stored on disk.
///
/// The document is read fresh on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFile {
    path: PathBuf,
}

impl ProfileFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Read and parse profile document.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file is not a valid document.
    /// - Return [`ConfigError::ShellExpansion`] if an argument cannot be
    ///   expanded.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self) -> Result<ProfileDocument> {
        debug!("load profile document {:?}", self.path.display());
        read_to_string(&self.path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: self.path.clone(),
            })?
            .parse()
    }
}

impl ProfileSource for ProfileFile {
    fn packages(&self, profile: &str, platform: &Platform) -> Result<Vec<Package>> {
        self.load()?.packages(profile, platform)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Profile document cannot be read.
    #[error("failed to read profile document at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Requested profile is not in the document.
    #[error("no profile named {name:?}, available profiles: {available:?}")]
    UnknownProfile { name: String, available: Vec<String> },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    const DOCUMENT: &str = r#"
        [profile.default]
        description = "Everyday tooling"

        [profile.default.windows]
        packages = [
            "Git.Git",
            { id = "JanDeDobbeleer.OhMyPosh", name = "oh-my-posh", args = ["--location", "$TOOLS"] },
        ]

        [profile.default.macos]
        formulae = ["git", "oh-my-posh"]
        casks = ["visual-studio-code"]

        [profile.work]
        [profile.work.macos]
        casks = ["slack"]
    "#;

    #[sealed_test(env = [("TOOLS", "/home/blah/tools")])]
    fn deserialize_profile_document() -> anyhow::Result<()> {
        let result: ProfileDocument = DOCUMENT.parse()?;

        let expect = ProfileDocument {
            profiles: BTreeMap::from([
                (
                    "default".into(),
                    Profile {
                        description: Some("Everyday tooling".into()),
                        windows: Some(WindowsPackages {
                            packages: vec![
                                PackageEntry::Id("Git.Git".into()),
                                PackageEntry::Detailed(PackageSpec {
                                    id: "JanDeDobbeleer.OhMyPosh".into(),
                                    name: Some("oh-my-posh".into()),
                                    args: vec!["--location".into(), "/home/blah/tools".into()],
                                }),
                            ],
                        }),
                        macos: Some(MacosPackages {
                            formulae: vec![
                                PackageEntry::Id("git".into()),
                                PackageEntry::Id("oh-my-posh".into()),
                            ],
                            casks: vec![PackageEntry::Id("visual-studio-code".into())],
                        }),
                    },
                ),
                (
                    "work".into(),
                    Profile {
                        description: None,
                        windows: None,
                        macos: Some(MacosPackages {
                            formulae: Vec::new(),
                            casks: vec![PackageEntry::Id("slack".into())],
                        }),
                    },
                ),
            ]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("TOOLS", "/home/blah/tools")])]
    fn packages_for_windows() -> anyhow::Result<()> {
        let document: ProfileDocument = DOCUMENT.parse()?;
        let platform = Platform::new(OsClass::Windows);
        let result = document.packages("default", &platform)?;
        let expect = vec![
            Package::new("Git.Git", PackageKind::Generic),
            Package::new("JanDeDobbeleer.OhMyPosh", PackageKind::Generic)
                .with_name("oh-my-posh")
                .with_install_args(["--location", "/home/blah/tools"]),
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("TOOLS", "/home/blah/tools")])]
    fn packages_for_macos_puts_formulae_before_casks() -> anyhow::Result<()> {
        let document: ProfileDocument = DOCUMENT.parse()?;
        let platform = Platform::new(OsClass::MacOs);
        let result = document.packages("default", &platform)?;
        let expect = vec![
            Package::new("git", PackageKind::Formula),
            Package::new("oh-my-posh", PackageKind::Formula),
            Package::new("visual-studio-code", PackageKind::Cask),
        ];
        assert_eq!(result, expect);

        // Profile without a windows section reconciles nothing on Windows.
        let result = document.packages("work", &Platform::new(OsClass::Windows))?;
        assert!(result.is_empty());

        Ok(())
    }

    #[sealed_test(env = [("TOOLS", "/home/blah/tools")])]
    fn unknown_profile_lists_available() -> anyhow::Result<()> {
        let document: ProfileDocument = DOCUMENT.parse()?;
        let result = document.packages("gaming", &Platform::new(OsClass::MacOs));
        match result {
            Err(ConfigError::UnknownProfile { name, available }) => {
                assert_eq!(name, "gaming");
                assert_eq!(available, vec!["default".to_string(), "work".to_string()]);
            }
            other => panic!("expected unknown profile error, got {other:?}"),
        }

        Ok(())
    }

    #[sealed_test]
    fn undefined_variable_fails_expansion() {
        let data = r#"
            [profile.default.windows]
            packages = [{ id = "Git.Git", args = ["$DEVSTRAP_UNDEFINED_VARIABLE"] }]
        "#;
        let result = data.parse::<ProfileDocument>();
        assert!(matches!(result, Err(ConfigError::ShellExpansion(_))));
    }

    #[test]
    fn starter_document_survives_serialization() -> anyhow::Result<()> {
        let starter = ProfileDocument::starter();
        let result: ProfileDocument = starter.to_string().parse()?;
        assert_eq!(result, starter);

        Ok(())
    }

    #[test]
    fn profile_file_reports_missing_document() {
        let file = ProfileFile::new("/devstrap/does/not/exist.toml");
        let result = file.packages("default", &Platform::new(OsClass::MacOs));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
