// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use devstrap::{
    adapter::for_platform,
    config::{ProfileFile, ProfileSource, DEFAULT_PROFILE},
    path::{default_profile_path, prepend_to_path},
    platform::Platform,
    reconcile::{InstallStatus, PlanAction, Reconciler},
    syscall::SystemRunner,
    ProfileDocument,
};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use std::{fs::write, path::PathBuf, process::exit, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "devstrap [options] <devstrap-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<i32> {
        match self.command {
            Command::Install(opts) => run_install(opts),
            Command::Plan(opts) => run_plan(opts),
            Command::Profiles(opts) => run_profiles(opts),
            Command::Doctor => run_doctor(),
            Command::Init(opts) => run_init(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Install missing packages of a profile.
    #[command(override_usage = "devstrap install [options]")]
    Install(InstallOptions),

    /// Show what install would do without installing anything.
    #[command(override_usage = "devstrap plan [options]")]
    Plan(ProfileOptions),

    /// List profiles of profile document.
    #[command(override_usage = "devstrap profiles [options]")]
    Profiles(FileOptions),

    /// Show detected platform and package manager status.
    #[command(override_usage = "devstrap doctor")]
    Doctor,

    /// Write starter profile document.
    #[command(override_usage = "devstrap init [options]")]
    Init(InitOptions),
}

#[derive(Args, Clone, Debug)]
struct FileOptions {
    /// Path to profile document.
    #[arg(short, long, value_name = "path")]
    pub file: Option<PathBuf>,
}

impl FileOptions {
    fn resolve(&self) -> Result<PathBuf> {
        match &self.file {
            Some(path) => Ok(path.clone()),
            None => Ok(default_profile_path()?),
        }
    }
}

#[derive(Args, Clone, Debug)]
struct ProfileOptions {
    #[command(flatten)]
    pub file: FileOptions,

    /// Name of profile to reconcile.
    #[arg(short, long, value_name = "profile", env = "DEVSTRAP_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InstallOptions {
    #[command(flatten)]
    pub target: ProfileOptions,

    /// Do not ask for confirmation before installing.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    #[command(flatten)]
    pub file: FileOptions,

    /// Overwrite existing profile document.
    #[arg(long)]
    pub force: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run() {
        Ok(code) => exit(code),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run() -> Result<i32> {
    Cli::parse().run()
}

fn run_install(opts: InstallOptions) -> Result<i32> {
    let platform = Platform::detect()?;
    let source = ProfileFile::new(opts.target.file.resolve()?);
    let desired = source.packages(&opts.target.profile, &platform)?;
    if desired.is_empty() {
        info!(
            "profile {:?} has no packages for {platform}",
            opts.target.profile
        );
        return Ok(0);
    }

    let adapter = for_platform(&platform, SystemRunner);
    if !opts.yes {
        let proceed = Confirm::new(&format!(
            "Reconcile {} packages of profile {:?} through {}?",
            desired.len(),
            opts.target.profile,
            adapter.name()
        ))
        .with_default(true)
        .prompt()?;

        if !proceed {
            warn!("nothing installed");
            return Ok(0);
        }
    }

    let bar = ProgressBar::new(desired.len() as u64);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    let report = Reconciler::new(&platform, adapter.as_ref())
        .with_progress(bar)
        .reconcile(&desired);

    for outcome in report.iter() {
        println!("{outcome}");
    }

    match prepend_to_path(report.path_entries()) {
        Ok(added) if !added.is_empty() => {
            info!("new shells need these on PATH as well: {added:?}");
        }
        Ok(_) => {}
        Err(error) => warn!("cannot update PATH: {error}"),
    }

    let failed = report.count(InstallStatus::Failed);
    println!("{}", report.summary());
    if failed > 0 {
        error!("{failed} of {} packages failed", report.len());
    }

    Ok(report.exit_code())
}

fn run_plan(opts: ProfileOptions) -> Result<i32> {
    let platform = Platform::detect()?;
    let source = ProfileFile::new(opts.file.resolve()?);
    let desired = source.packages(&opts.profile, &platform)?;
    let adapter = for_platform(&platform, SystemRunner);

    let plan = Reconciler::new(&platform, adapter.as_ref()).plan(&desired);
    for entry in plan.entries() {
        println!("{entry}");
    }

    let blocked = plan
        .entries()
        .iter()
        .filter(|entry| matches!(entry.action, PlanAction::Unavailable | PlanAction::Unknown(_)))
        .count();
    println!(
        "{} packages: {} to install, {} undetermined",
        plan.entries().len(),
        plan.to_install().count(),
        blocked
    );

    Ok(0)
}

fn run_profiles(opts: FileOptions) -> Result<i32> {
    let document = ProfileFile::new(opts.resolve()?).load()?;
    for (name, profile) in &document.profiles {
        match &profile.description {
            Some(description) => println!("{name}\t{description}"),
            None => println!("{name}"),
        }
    }

    Ok(0)
}

fn run_doctor() -> Result<i32> {
    let platform = Platform::detect()?;
    let adapter = for_platform(&platform, SystemRunner);
    println!("platform: {platform}");

    if adapter.is_available() {
        println!("{}: available", adapter.name());
        Ok(0)
    } else {
        println!("{}: unavailable", adapter.name());
        Ok(1)
    }
}

fn run_init(opts: InitOptions) -> Result<i32> {
    let path = opts.file.resolve()?;
    if path.exists() && !opts.force {
        bail!(
            "profile document already exists at {:?}, use --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        mkdirp::mkdirp(parent)?;
    }
    write(&path, ProfileDocument::starter().to_string())?;
    info!("wrote starter profile document to {:?}", path.display());

    Ok(0)
}
