//! Poloidal structure of the zonal-flow transfer diagnostics.

use crate::config::FieldCatalog;
use crate::error::{Error, Result};
use crate::io::netcdf::RunDataset;
use crate::plot::{ensure_output_dir, render_error, resolve_fields};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const DIAG_COLORS: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

/// Plot each requested transfer diagnostic against the poloidal angle at
/// one time step (default: the last). Returns the path of the written image.
pub fn plot_transfer_by_theta(
    ds: &RunDataset,
    requested: &[String],
    time_index: Option<usize>,
    out_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let catalog = FieldCatalog::new();
    let diags = resolve_fields(ds, requested, &catalog.transfers)?;
    let tidx = ds.resolve_time_index(time_index)?;

    let theta = ds.axis("theta")?;
    let mut profiles = Vec::with_capacity(diags.len());
    for name in &diags {
        let profile = ds.theta_profile_at(name, tidx)?;
        check_profile(name, &profile, theta.len())?;
        profiles.push((name.clone(), profile));
    }

    ensure_output_dir(out_dir)?;
    let out_path = out_dir.join(filename.unwrap_or("transfer_by_theta.png"));
    draw(&out_path, &theta, &profiles, None).map_err(render_error)?;
    Ok(out_path)
}

/// As [`plot_transfer_by_theta`], but with each diagnostic averaged over a
/// time window of the given duration. With no explicit start the window
/// covers the last `window` time units of the run.
pub fn plot_transfer_by_theta_averaged(
    ds: &RunDataset,
    requested: &[String],
    window: f64,
    tstart: Option<f64>,
    out_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let catalog = FieldCatalog::new();
    let diags = resolve_fields(ds, requested, &catalog.transfers)?;

    let t = ds.time()?;
    let t_end = *t
        .last()
        .ok_or_else(|| Error::invalid_input("dataset has no time steps"))?;
    let tstart = tstart.unwrap_or(t_end - window);
    let tend = tstart + window;

    let theta = ds.axis("theta")?;
    let mut profiles = Vec::with_capacity(diags.len());
    for name in &diags {
        let profile = ds.theta_profile_avg(name, tstart, tend)?;
        check_profile(name, &profile, theta.len())?;
        profiles.push((name.clone(), profile));
    }

    ensure_output_dir(out_dir)?;
    let out_path = out_dir.join(filename.unwrap_or("transfer_by_theta_averaged.png"));
    let title = format!("averaged over t = [{tstart:.1}, {tend:.1}]");
    draw(&out_path, &theta, &profiles, Some(&title)).map_err(render_error)?;
    Ok(out_path)
}

fn check_profile(name: &str, profile: &[f64], ntheta: usize) -> Result<()> {
    if ntheta < 2 {
        return Err(Error::invalid_input("theta grid has fewer than two points"));
    }
    if profile.len() != ntheta {
        return Err(Error::invalid_input(format!(
            "`{name}` does not match the theta grid"
        )));
    }
    Ok(())
}

fn diag_label(diag: &str) -> String {
    match diag {
        "kinetic_energy_transfer_theta" => "T_v (ZF)".to_string(),
        "entropy_transfer_phi_theta" => "T_S,phi (ZF)".to_string(),
        "entropy_transfer_apar_theta" => "T_S,A_par (ZF)".to_string(),
        "entropy_transfer_bpar_theta" => "T_S,B_par (ZF)".to_string(),
        other => other.to_string(),
    }
}

fn draw(
    path: &Path,
    theta: &[f64],
    profiles: &[(String, Vec<f64>)],
    title: Option<&str>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let xmin = theta[0];
    let xmax = *theta.last().unwrap();

    let mut ylo = f64::INFINITY;
    let mut yhi = f64::NEG_INFINITY;
    for (_, profile) in profiles {
        for &v in profile.iter().filter(|v| v.is_finite()) {
            ylo = ylo.min(v);
            yhi = yhi.max(v);
        }
    }
    if !ylo.is_finite() || !yhi.is_finite() {
        return Err("transfer profiles contain no finite values".into());
    }
    if (yhi - ylo).abs() < 1e-300 {
        ylo -= 1.0;
        yhi += 1.0;
    }
    let pad = 0.05 * (yhi - ylo);

    let root = BitMapBackend::new(path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 20));
    }
    let mut chart = builder.build_cartesian_2d(xmin..xmax, (ylo - pad)..(yhi + pad))?;

    chart
        .configure_mesh()
        .x_desc("theta")
        .y_desc("transfer")
        .draw()?;

    for (i, (name, profile)) in profiles.iter().enumerate() {
        let color = DIAG_COLORS[i % DIAG_COLORS.len()];
        let points: Vec<(f64, f64)> = theta
            .iter()
            .copied()
            .zip(profile.iter().copied())
            .filter(|(_, v)| v.is_finite())
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(diag_label(name))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.85))
        .border_style(BLACK.mix(0.4))
        .draw()?;

    root.present()?;
    Ok(())
}
