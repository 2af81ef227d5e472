//! kx-ky spectra of the mode-resolved fields at a single time step.

use crate::config::FieldCatalog;
use crate::error::{Error, Result};
use crate::io::netcdf::{fftshift, fftshift_columns, RunDataset};
use crate::plot::{ensure_output_dir, render_error, resolve_fields};
use ndarray::Array2;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Render one heat-map panel per requested field over the (kx, ky) grid,
/// with kx shifted out of FFT layout and a logarithmic colour scale.
/// Defaults to the final time step. Returns the path of the written image.
pub fn plot_mode_spectra(
    ds: &RunDataset,
    requested: &[String],
    time_index: Option<usize>,
    out_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let catalog = FieldCatalog::new();
    let fields = resolve_fields(ds, requested, &catalog.spectra)?;
    let tidx = ds.resolve_time_index(time_index)?;

    let kx = fftshift(&ds.axis("kx")?);
    let ky = ds.axis("ky")?;
    if kx.is_empty() || ky.is_empty() {
        return Err(Error::invalid_input("wavenumber grids are empty"));
    }

    let mut panels = Vec::with_capacity(fields.len());
    for name in &fields {
        let spec = fftshift_columns(&ds.spectrum_at(name, tidx)?);
        if spec.dim() != (ky.len(), kx.len()) {
            return Err(Error::invalid_input(format!(
                "`{name}` does not match the (ky, kx) grid"
            )));
        }
        panels.push((name.clone(), spec));
    }

    ensure_output_dir(out_dir)?;
    let out_path = out_dir.join(filename.unwrap_or("fields_by_mode.png"));
    draw(&out_path, &kx, &ky, &panels).map_err(render_error)?;
    Ok(out_path)
}

fn panel_label(field: &str) -> String {
    match field {
        "phi2_by_mode" => "|phi|^2".to_string(),
        "apar2_by_mode" => "|A_par|^2".to_string(),
        "bpar2_by_mode" => "|B_par|^2".to_string(),
        other => other.to_string(),
    }
}

fn heat_color(u: f64) -> HSLColor {
    // Dark blue through to warm red as the (log-scaled) amplitude rises
    HSLColor(0.66 * (1.0 - u), 0.85, 0.15 + 0.45 * u)
}

fn draw(
    path: &Path,
    kx: &[f64],
    ky: &[f64],
    panels: &[(String, Array2<f64>)],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let n = panels.len().max(1);
    let root = BitMapBackend::new(path, (480 * n as u32, 420)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, n));

    let dx = if kx.len() > 1 { kx[1] - kx[0] } else { 1.0 };
    let dy = if ky.len() > 1 { ky[1] - ky[0] } else { 1.0 };

    for (area, (name, spec)) in areas.iter().zip(panels) {
        let (nky, nkx) = spec.dim();

        // Normalise on a log scale across the positive part of the panel
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in spec.iter().filter(|v| **v > 0.0 && v.is_finite()) {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let flat = !lo.is_finite() || !hi.is_finite() || lo == hi;
        let span = if flat { 1.0 } else { (hi / lo).ln() };

        let mut chart = ChartBuilder::on(area)
            .caption(panel_label(name), ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(45)
            .build_cartesian_2d(
                (kx[0] - dx / 2.0)..(kx[nkx - 1] + dx / 2.0),
                (ky[0] - dy / 2.0)..(ky[nky - 1] + dy / 2.0),
            )?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("kx rho_ref")
            .y_desc("ky rho_ref")
            .draw()?;

        chart.draw_series(
            (0..nky)
                .flat_map(|iy| (0..nkx).map(move |ix| (iy, ix)))
                .map(|(iy, ix)| {
                    let v = spec[[iy, ix]];
                    let u = if flat || v <= 0.0 {
                        0.0
                    } else {
                        ((v / lo).ln() / span).clamp(0.0, 1.0)
                    };
                    Rectangle::new(
                        [
                            (kx[ix] - dx / 2.0, ky[iy] - dy / 2.0),
                            (kx[ix] + dx / 2.0, ky[iy] + dy / 2.0),
                        ],
                        heat_color(u).filled(),
                    )
                }),
        )?;
    }

    root.present()?;
    Ok(())
}
