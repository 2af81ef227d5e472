//! Time traces of the volume-integrated fields, with the saturated region
//! highlighted.

use crate::config::FieldCatalog;
use crate::error::{Error, Result};
use crate::io::netcdf::RunDataset;
use crate::plot::{ensure_output_dir, render_error, resolve_fields};
use crate::saturation::{saturation_time, GrowthRateParams};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const TRACE_COLORS: [RGBColor; 3] = [BLUE, RED, MAGENTA];

/// Plot each requested trace from `{phi2, apar2, bpar2}` on a log-scale
/// time axis. With no explicit request, every trace the run wrote is drawn.
/// Returns the path of the written image.
pub fn plot_time_traces(
    ds: &RunDataset,
    requested: &[String],
    growth: &GrowthRateParams,
    out_dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let catalog = FieldCatalog::new();
    let fields = resolve_fields(ds, requested, &catalog.traces)?;

    let t = ds.time()?;
    if t.len() < 2 {
        return Err(Error::invalid_input("dataset has fewer than two time steps"));
    }

    let mut traces = Vec::with_capacity(fields.len());
    for name in &fields {
        traces.push((name.clone(), ds.trace(name)?));
    }

    // Log-scale axis bounds from the positive part of the data
    let mut ylo = f64::INFINITY;
    let mut yhi = f64::NEG_INFINITY;
    for (_, series) in &traces {
        for &v in series.iter().filter(|v| **v > 0.0 && v.is_finite()) {
            ylo = ylo.min(v);
            yhi = yhi.max(v);
        }
    }
    if !ylo.is_finite() || !yhi.is_finite() {
        return Err(Error::invalid_input(
            "traces contain no positive values to draw on a log scale",
        ));
    }

    // The saturation marker always comes from phi2, when the run wrote it
    let tsat = if ds.has("phi2") {
        match saturation_time(&t, &ds.trace("phi2")?, growth) {
            Ok(ts) => ts,
            Err(e) => {
                log::debug!("saturation detection skipped: {e}");
                None
            }
        }
    } else {
        None
    };

    ensure_output_dir(out_dir)?;
    let out_path = out_dir.join(filename.unwrap_or("field_time_traces.png"));
    draw(&out_path, &t, &traces, tsat, (ylo, yhi)).map_err(render_error)?;
    Ok(out_path)
}

fn draw(
    path: &Path,
    t: &[f64],
    traces: &[(String, Vec<f64>)],
    tsat: Option<f64>,
    (ylo, yhi): (f64, f64),
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let tmin = t[0];
    let tmax = *t.last().unwrap();

    // Pad the log axis by half a decade either side
    let ylo = ylo / 3.0;
    let yhi = yhi * 3.0;

    let root = BitMapBackend::new(path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(tmin..tmax, (ylo..yhi).log_scale())?;

    chart
        .configure_mesh()
        .x_desc("t")
        .y_desc("field^2")
        .draw()?;

    if let Some(ts) = tsat {
        // Shade the saturated part of the run
        chart.draw_series(std::iter::once(Rectangle::new(
            [(ts, ylo), (tmax, yhi)],
            GREEN.mix(0.12).filled(),
        )))?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(ts, ylo), (ts, yhi)],
                GREEN.stroke_width(2),
            )))?
            .label(format!("saturation (t = {ts:.2})"))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], GREEN.stroke_width(2)));
    }

    for (i, (name, series)) in traces.iter().enumerate() {
        let color = TRACE_COLORS[i % TRACE_COLORS.len()];
        let points: Vec<(f64, f64)> = t
            .iter()
            .copied()
            .zip(series.iter().copied())
            .filter(|(_, v)| *v > 0.0 && v.is_finite())
            .collect();
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(name.clone())
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
