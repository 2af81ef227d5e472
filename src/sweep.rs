//! Batch post-processing over a directory of completed runs.

use crate::config::FieldCatalog;
use crate::error::{Error, Result};
use crate::io::csv::{write_sweep_summary, SweepRecord};
use crate::io::netcdf::RunDataset;
use crate::plot;
use crate::saturation::{saturation_time, GrowthRateParams};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct RunDir {
    pub name: String,
    pub dataset: PathBuf,
}

/// Find run directories beneath `root`: any child directory holding
/// exactly one `*.out.nc` file.
pub fn discover_runs(root: &Path) -> Result<Vec<RunDir>> {
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let mut datasets = Vec::new();
        for child in std::fs::read_dir(&path)? {
            let child = child?.path();
            let is_output = child
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(".out.nc"));
            if is_output {
                datasets.push(child);
            }
        }

        match datasets.len() {
            1 => runs.push(RunDir {
                name: entry.file_name().to_string_lossy().into_owned(),
                dataset: datasets.remove(0),
            }),
            0 => log::debug!("skipping {}: no .out.nc file", path.display()),
            _ => log::warn!("skipping {}: more than one .out.nc file", path.display()),
        }
    }

    runs.sort_by(|a, b| a.name.cmp(&b.name));
    if runs.is_empty() {
        return Err(Error::invalid_input(format!(
            "no runs found under {}",
            root.display()
        )));
    }
    Ok(runs)
}

/// Post-process every run and write the sweep summary table. A run that
/// fails is recorded in the summary and the sweep carries on.
pub fn process_runs(
    runs: &[RunDir],
    out_dir: &Path,
    growth: &GrowthRateParams,
    pb: &ProgressBar,
) -> Result<Vec<SweepRecord>> {
    std::fs::create_dir_all(out_dir)?;

    let mut records = Vec::with_capacity(runs.len());
    for run in runs {
        let record = match process_one(run, out_dir, growth) {
            Ok(tsat) => SweepRecord {
                run: run.name.clone(),
                saturation_time: tsat,
                error: None,
            },
            Err(e) => {
                log::warn!("post-processing failed for {}: {e}", run.name);
                SweepRecord {
                    run: run.name.clone(),
                    saturation_time: None,
                    error: Some(e.to_string()),
                }
            }
        };
        records.push(record);
        pb.inc(1);
    }
    pb.finish();

    write_sweep_summary(&out_dir.join("sweep_summary.csv"), &records)?;
    Ok(records)
}

fn process_one(run: &RunDir, out_dir: &Path, growth: &GrowthRateParams) -> Result<Option<f64>> {
    let ds = RunDataset::open(&run.dataset)?;
    log::debug!("post-processing {}", ds.path().display());
    let run_out = out_dir.join(&run.name);
    let catalog = FieldCatalog::new();

    // Each plot family is optional; a run only writes the diagnostics it
    // was configured with
    if !ds.available(&catalog.traces).is_empty() {
        plot::traces::plot_time_traces(&ds, &[], growth, &run_out, None)?;
    }
    if !ds.available(&catalog.spectra).is_empty() {
        plot::spectrum::plot_mode_spectra(&ds, &[], None, &run_out, None)?;
    }
    if !ds.available(&catalog.transfers).is_empty() {
        plot::transfer::plot_transfer_by_theta(&ds, &[], None, &run_out, None)?;
    }

    if ds.has("phi2") {
        saturation_time(&ds.time()?, &ds.trace("phi2")?, growth)
    } else {
        Ok(None)
    }
}
