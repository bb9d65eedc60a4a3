use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;

use crate::blocks::mmi::MmiBuilder;
use crate::cli::args::Args;
use crate::cli::progress::StepContext;
use crate::config::{parse_doe_config, DoeConfig, DEFAULT_CONFIG_PATH};
use crate::doe::FailurePolicy;
use crate::plan::{execute_plan, generate_plan, ExecutePlanParams, SweepReport, TaskKey};

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
 __  __ __  __ ___  ___  ___  _  _
|  \/  |  \/  |_ _|/ __|| __|| \| |
| |\/| | |\/| || || (_ || _| | .` |
|_|  |_|_|  |_|___|\___||___||_|\_|

MMIGEN v0.1
";

/// Reads the configuration named by `args`, falling back to `default_path`
/// and then to the built-in sweep.
fn load_config(args: &Args, default_path: &Path) -> Result<DoeConfig> {
    let path = match &args.config {
        Some(path) => path.as_path(),
        None if default_path.exists() => default_path,
        None => {
            info!("No configuration file found, using the default sweep");
            println!("Configuration file: <built-in default>");
            return Ok(DoeConfig::default());
        }
    };
    let config = parse_doe_config(path)
        .with_context(|| format!("failed to read configuration file {path:?}"))?;
    println!("Configuration file: {:?}", path);
    Ok(config)
}

/// Applies command-line overrides on top of the configuration file.
fn apply_args(args: &Args, mut config: DoeConfig) -> DoeConfig {
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if args.fail_fast {
        config.on_failure = FailurePolicy::Abort;
    }
    config
}

/// Paths a sweep would write, without building or touching the filesystem.
fn planned_paths(config: &DoeConfig, builder: &MmiBuilder) -> crate::Result<Vec<PathBuf>> {
    let plan = generate_plan(config, builder)?;
    Ok(plan
        .designs()
        .iter()
        .map(|design| config.output_dir.join(&design.file_name))
        .collect())
}

fn print_summary(report: &SweepReport) {
    println!(
        "Wrote {} of {} designs",
        report.written.len(),
        report.attempted
    );
    if !report.failed.is_empty() {
        println!("{}", "Failed designs:".yellow().bold());
        for failed in report.failed.iter() {
            println!("\t{} ({})", failed.file_name, failed.error);
        }
    }
    if let Some(manifest) = &report.manifest {
        println!("Manifest: {:?}", manifest);
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    println!("{BANNER}");

    println!("Reading configuration file...\n");
    let config = apply_args(&args, load_config(&args, Path::new(DEFAULT_CONFIG_PATH))?);
    let builder = MmiBuilder::new(config.base);

    println!("Sweep parameters:");
    println!("\tPrefix: {}", config.prefix);
    println!("\tOutput directory: {:?}", config.output_dir);
    println!("\tOn failure: {:?}", config.on_failure);
    println!("\tBase: {:?}", builder.base());
    for axis in config.axes.iter() {
        println!("\tAxis: {}", axis.name);
    }

    if args.dry_run {
        let paths = planned_paths(&config, &builder)?;
        println!("\nPlanned designs:");
        for path in paths.iter() {
            println!("\t{}", path.display());
        }
        println!("Total designs: {}", paths.len());
        return Ok(());
    }

    let mut tasks = HashSet::from([TaskKey::GeneratePlan, TaskKey::GenerateLayouts]);
    if config.manifest {
        tasks.insert(TaskKey::WriteManifest);
    }

    let mut ctx = StepContext::new(&tasks);

    let plan = ctx.check(generate_plan(&config, &builder))?;
    ctx.finish(TaskKey::GeneratePlan);

    let res = execute_plan(ExecutePlanParams {
        plan: &plan,
        builder: &builder,
        ctx: Some(&mut ctx),
    });

    let report = ctx.check(res)?;
    print_summary(&report);
    println!("Artifacts saved to: {:?}\n", &plan.output_dir);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("mmigen").chain(argv.iter().copied()))
    }

    #[test]
    fn test_apply_args() {
        let config = apply_args(&args(&[]), DoeConfig::default());
        assert_eq!(config.output_dir, DoeConfig::default().output_dir);
        assert_eq!(config.on_failure, FailurePolicy::Skip);

        let config = apply_args(
            &args(&["--output-dir", "build/sweep", "--fail-fast"]),
            DoeConfig::default(),
        );
        assert_eq!(config.output_dir, PathBuf::from("build/sweep"));
        assert_eq!(config.on_failure, FailurePolicy::Abort);
    }

    #[test]
    fn test_load_config_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let default_path = dir.path().join("mmigen.toml");

        let config = load_config(&args(&[]), &default_path).unwrap();
        assert_eq!(config.axes.len(), 2);
        assert_eq!(config.prefix, "mmi");

        std::fs::write(&default_path, "prefix = \"doe\"\n").unwrap();
        let config = load_config(&args(&[]), &default_path).unwrap();
        assert_eq!(config.prefix, "doe");

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "prefix = \"other\"\n").unwrap();
        let config = load_config(&args(&["-c", explicit.to_str().unwrap()]), &default_path).unwrap();
        assert_eq!(config.prefix, "other");

        let missing = dir.path().join("missing.toml");
        assert!(load_config(&args(&["-c", missing.to_str().unwrap()]), &default_path).is_err());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mmi_doe_gds");
        let config = apply_args(
            &args(&["--output-dir", out.to_str().unwrap(), "--dry-run"]),
            DoeConfig::default(),
        );
        let paths = planned_paths(&config, &MmiBuilder::new(config.base)).unwrap();

        assert_eq!(paths.len(), 9);
        assert_eq!(paths[0], out.join("mmi_w2.00_L20.00.gds"));
        assert_eq!(paths[8], out.join("mmi_w4.00_L40.00.gds"));
        assert!(!out.exists());
    }
}
