use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

mod cli;

use cli::Command;
use gs2tools::config::{FieldCatalog, JobConfig};
use gs2tools::io::csv::write_trace_csv;
use gs2tools::io::netcdf::RunDataset;
use gs2tools::plot;
use gs2tools::saturation::{saturation_index, saturation_time, GrowthRateParams, WindowParams};
use gs2tools::submit;
use gs2tools::sweep;

fn main() -> Result<()> {
    let args = cli::get_args();
    init_logger(args.verbose);

    match args.command {
        Command::Sat {
            dataset,
            field,
            window,
            threshold,
            flatness,
            samples,
            tolerance,
            consecutive,
        } => {
            let ds = open_dataset(&dataset)?;
            let t = ds.time()?;
            let trace = ds.trace(&field)?;
            if flatness {
                let params = WindowParams {
                    window: samples,
                    tolerance,
                    consecutive,
                };
                match saturation_index(&trace, &params)? {
                    Some(idx) => match t.get(idx) {
                        Some(tv) => println!(
                            "Saturation detected at index {idx} (t = {tv:.4}, from {field})"
                        ),
                        None => println!("Saturation detected at index {idx} (from {field})"),
                    },
                    None => println!("Saturation not reached within the run"),
                }
            } else {
                let params = GrowthRateParams { window, threshold };
                match saturation_time(&t, &trace, &params)? {
                    Some(tsat) => println!("Saturation detected at t = {tsat:.4} (from {field})"),
                    None => println!("Saturation not reached within the run"),
                }
            }
        }

        Command::Traces {
            dataset,
            fields,
            out_dir,
            filename,
            csv,
            window,
            threshold,
        } => {
            let ds = open_dataset(&dataset)?;
            let params = GrowthRateParams { window, threshold };
            let path =
                plot::traces::plot_time_traces(&ds, &fields, &params, &out_dir, filename.as_deref())?;
            println!("Time traces written to {}", path.display());

            if let Some(csv_path) = csv {
                let names: Vec<String> = if fields.is_empty() {
                    let catalog = FieldCatalog::new();
                    ds.available(&catalog.traces)
                        .into_iter()
                        .map(String::from)
                        .collect()
                } else {
                    fields.clone()
                };
                let t = ds.time()?;
                let mut traces = Vec::with_capacity(names.len());
                for name in &names {
                    traces.push((name.as_str(), ds.trace(name)?));
                }
                write_trace_csv(&csv_path, &t, &traces)?;
                println!("Trace table written to {}", csv_path.display());
            }
        }

        Command::Spectrum {
            dataset,
            fields,
            time_index,
            out_dir,
            filename,
        } => {
            let ds = open_dataset(&dataset)?;
            let path = plot::spectrum::plot_mode_spectra(
                &ds,
                &fields,
                time_index,
                &out_dir,
                filename.as_deref(),
            )?;
            println!("Mode spectra written to {}", path.display());
        }

        Command::Transfer {
            dataset,
            fields,
            time_index,
            average,
            tstart,
            out_dir,
            filename,
        } => {
            let ds = open_dataset(&dataset)?;
            let path = match average {
                Some(window) => plot::transfer::plot_transfer_by_theta_averaged(
                    &ds,
                    &fields,
                    window,
                    tstart,
                    &out_dir,
                    filename.as_deref(),
                )?,
                None => plot::transfer::plot_transfer_by_theta(
                    &ds,
                    &fields,
                    time_index,
                    &out_dir,
                    filename.as_deref(),
                )?,
            };
            println!("Transfer structure written to {}", path.display());
        }

        Command::Sweep {
            root,
            out_dir,
            window,
            threshold,
        } => {
            println!("Scanning {} for completed runs...", root.display());
            let runs = sweep::discover_runs(&root)?;
            println!("Found {} runs", runs.len());

            let pb = ProgressBar::new(runs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs ({eta})",
                    )?
                    .progress_chars("#>-"),
            );

            let params = GrowthRateParams { window, threshold };
            let records = sweep::process_runs(&runs, &out_dir, &params, &pb)?;

            let failed = records.iter().filter(|r| r.error.is_some()).count();
            println!(
                "\nSweep complete: {} runs processed, {} failed",
                records.len() - failed,
                failed
            );
            println!(
                "Summary written to {}",
                out_dir.join("sweep_summary.csv").display()
            );
        }

        Command::Submit {
            config,
            run_dir,
            dry_run,
        } => {
            let cfg = JobConfig::from_file(&config)
                .with_context(|| format!("Failed to read job config: {:?}", config))?;

            let run_dir = match run_dir {
                Some(dir) => dir,
                None => {
                    let parent = config.parent().unwrap_or(Path::new(""));
                    if parent.as_os_str().is_empty() {
                        PathBuf::from(".")
                    } else {
                        parent.to_path_buf()
                    }
                }
            };

            let script = submit::write_job_script(&cfg, &run_dir)?;
            println!("Job script written to {}", script.display());
            if dry_run {
                println!("Dry run requested, not submitting");
            } else {
                let job_id = submit::submit_job(&script)?;
                println!("Submitted batch job {job_id}");
            }
        }
    }

    Ok(())
}

fn open_dataset(path: &Path) -> Result<RunDataset> {
    RunDataset::open(path).with_context(|| format!("Failed to open dataset: {:?}", path))
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto);
}
