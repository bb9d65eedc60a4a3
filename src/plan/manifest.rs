use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use super::{DoePlan, SweepReport};
use crate::doe::{FailurePolicy, Param, ParameterAxis};
use crate::Result;

#[derive(Serialize)]
struct Manifest<'a> {
    prefix: &'a str,
    precision: usize,
    on_failure: FailurePolicy,
    axes: &'a [ParameterAxis],
    designs: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    index: usize,
    file: &'a str,
    params: &'a [Param],
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Writes a JSON description of every planned design and whether it was written.
pub fn save_manifest(path: impl AsRef<Path>, plan: &DoePlan, report: &SweepReport) -> Result<()> {
    let failures: HashMap<usize, String> = report
        .failed
        .iter()
        .map(|f| (f.index, f.error.to_string()))
        .collect();

    let designs = plan
        .designs()
        .iter()
        .map(|design| {
            let index = design.point.index();
            let error = failures.get(&index).cloned();
            ManifestEntry {
                index,
                file: &design.file_name,
                params: design.point.params(),
                status: if error.is_some() { "failed" } else { "written" },
                error,
            }
        })
        .collect();

    let manifest = Manifest {
        prefix: plan.naming.prefix(),
        precision: plan.naming.precision(),
        on_failure: plan.on_failure,
        axes: plan.grid.axes(),
        designs,
    };

    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &manifest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::config::DoeConfig;
    use crate::doe::DesignPoint;
    use crate::error::BuildError;
    use crate::layout::{Cell, LayoutBuilder};
    use crate::plan::{execute_plan, generate_plan, ExecutePlanParams};

    #[test]
    fn test_manifest_contents() {
        let dir = tempfile::tempdir().unwrap();
        let config = DoeConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let builder = |point: &DesignPoint| -> Result<Cell, BuildError> {
            if point.index() == 8 {
                return Err(BuildError::Other("out of area".to_string()));
            }
            crate::blocks::mmi::MmiBuilder::default().build(point)
        };
        let plan = generate_plan(&config, &builder).unwrap();
        let report = execute_plan(ExecutePlanParams {
            plan: &plan,
            builder: &builder,
            ctx: None,
        })
        .unwrap();

        let path = report.manifest.unwrap();
        let manifest: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(manifest["prefix"], "mmi");
        assert_eq!(manifest["on_failure"], "skip");
        assert_eq!(manifest["axes"][0]["label"], "w");
        assert_eq!(manifest["axes"][1]["values"][2], 40.0);

        let designs = manifest["designs"].as_array().unwrap();
        assert_eq!(designs.len(), 9);
        assert_eq!(designs[0]["file"], "mmi_w2.00_L20.00.gds");
        assert_eq!(designs[0]["status"], "written");
        assert_eq!(designs[0]["params"][0]["name"], "width_mmi");
        assert_eq!(designs[0]["params"][1]["value"], 20.0);
        assert!(designs[0].get("error").is_none());
        assert_eq!(designs[8]["status"], "failed");
        assert_eq!(designs[8]["error"], "out of area");
    }
}
