use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::cli::progress::StepContext;
use crate::config::DoeConfig;
use crate::doe::{DesignGrid, DesignPoint, FailurePolicy, NamingScheme};
use crate::error::{BuildError, Error};
use crate::layout::{Layout, LayoutBuilder};
use crate::paths::{out_manifest, partial};
use crate::Result;

pub mod manifest;

/// A validated sweep: every design point with the file it will be written to.
pub struct DoePlan {
    pub naming: NamingScheme,
    pub grid: DesignGrid,
    pub output_dir: PathBuf,
    pub on_failure: FailurePolicy,
    pub manifest: bool,
    designs: Vec<PlannedDesign>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDesign {
    pub point: DesignPoint,
    pub file_name: String,
}

impl DoePlan {
    #[inline]
    pub fn designs(&self) -> &[PlannedDesign] {
        &self.designs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TaskKey {
    GeneratePlan,
    GenerateLayouts,
    WriteManifest,
}

/// Validates `config` against `builder` and enumerates the sweep.
///
/// Nothing is written to disk.
pub fn generate_plan<B: LayoutBuilder>(config: &DoeConfig, builder: &B) -> Result<DoePlan> {
    let naming = NamingScheme::new(&config.prefix, config.precision)?;
    let axes = config.axes()?;
    for axis in axes.iter() {
        builder.check_axis(axis.name())?;
        naming.check_axis(axis)?;
    }
    let grid = DesignGrid::new(axes)?;

    let designs: Vec<_> = grid
        .points()
        .map(|point| PlannedDesign {
            file_name: naming.file_name(&point),
            point,
        })
        .collect();
    debug!("planned {} designs", designs.len());

    Ok(DoePlan {
        naming,
        grid,
        output_dir: config.output_dir.clone(),
        on_failure: config.on_failure,
        manifest: config.manifest,
        designs,
    })
}

#[derive(Debug)]
pub struct FailedDesign {
    pub index: usize,
    pub file_name: String,
    pub error: BuildError,
}

/// Outcome of a completed sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub attempted: usize,
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedDesign>,
    pub manifest: Option<PathBuf>,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ExecutePlanParams<'a, B> {
    pub plan: &'a DoePlan,
    pub builder: &'a B,
    pub ctx: Option<&'a mut StepContext>,
}

macro_rules! try_finish_task {
    ( $ctx:expr, $task:expr ) => {
        if let Some(ctx) = $ctx.as_mut() {
            ctx.finish($task);
        }
    };
}

/// Builds and writes one design. The file only appears at its final path
/// once the layout has been built and fully written.
fn write_design<B: LayoutBuilder>(
    builder: &B,
    design: &PlannedDesign,
    work_dir: &Path,
) -> std::result::Result<PathBuf, BuildError> {
    let layout = builder.build(&design.point)?;

    let path = work_dir.join(&design.file_name);
    let scratch = partial(&path);
    if let Err(e) = layout.write_gds(&scratch) {
        let _ = fs::remove_file(&scratch);
        return Err(e);
    }
    fs::rename(&scratch, &path).map_err(|source| {
        let _ = fs::remove_file(&scratch);
        BuildError::Write {
            path: path.clone(),
            source,
        }
    })?;
    Ok(path)
}

/// Removes a file left at `path` by an earlier run, so that a failed design
/// never has an artifact on disk.
fn discard_stale(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed stale {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove stale {:?}: {}", path, e),
    }
}

pub fn execute_plan<B: LayoutBuilder>(params: ExecutePlanParams<'_, B>) -> Result<SweepReport> {
    let ExecutePlanParams {
        plan,
        builder,
        mut ctx,
    } = params;

    let work_dir = plan.output_dir.as_path();
    fs::create_dir_all(work_dir)?;
    info!("Writing {} designs to {:?}", plan.len(), work_dir);

    let mut report = SweepReport::default();

    for design in plan.designs() {
        if let Some(ctx) = ctx.as_mut() {
            ctx.set_detail(format!(
                "{}/{} {}",
                design.point.index() + 1,
                plan.len(),
                design.file_name
            ));
        }
        report.attempted += 1;

        match write_design(builder, design, work_dir) {
            Ok(path) => {
                info!("Wrote {:?}", path);
                report.written.push(path);
            }
            Err(source) => {
                discard_stale(&work_dir.join(&design.file_name));
                match plan.on_failure {
                    FailurePolicy::Abort => {
                        error!("Failed to build {}: {}", design.file_name, source);
                        return Err(Error::Build {
                            design: design.file_name.clone(),
                            source,
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping {}: {}", design.file_name, source);
                        report.failed.push(FailedDesign {
                            index: design.point.index(),
                            file_name: design.file_name.clone(),
                            error: source,
                        });
                    }
                }
            }
        }
    }
    try_finish_task!(ctx, TaskKey::GenerateLayouts);

    if plan.manifest {
        let path = out_manifest(work_dir, plan.naming.prefix());
        manifest::save_manifest(&path, plan, &report)?;
        debug!("Wrote manifest {:?}", path);
        report.manifest = Some(path);
        try_finish_task!(ctx, TaskKey::WriteManifest);
    }

    info!(
        "Total designs: {} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    Ok(report)
}
