use crate::error::Result;
use csv::WriterBuilder;
use std::path::Path;

// One row of the sweep summary table
#[derive(Debug, Clone)]
pub struct SweepRecord {
    pub run: String,
    pub saturation_time: Option<f64>,
    pub error: Option<String>,
}

/// Export the plotted time traces as a table, one column per field.
pub fn write_trace_csv(path: &Path, t: &[f64], traces: &[(&str, Vec<f64>)]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["t".to_string()];
    header.extend(traces.iter().map(|(name, _)| name.to_string()));
    wtr.write_record(&header)?;

    for (i, tv) in t.iter().enumerate() {
        let mut record = vec![tv.to_string()];
        for (_, series) in traces {
            record.push(series.get(i).map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the per-run saturation summary produced by a sweep.
pub fn write_sweep_summary(path: &Path, records: &[SweepRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["run", "saturation_time", "status"])?;

    for rec in records {
        let tsat = rec
            .saturation_time
            .map(|v| format!("{v:.6}"))
            .unwrap_or_default();
        let status = rec.error.as_deref().unwrap_or("ok");
        wtr.write_record([rec.run.as_str(), tsat.as_str(), status])?;
    }

    wtr.flush()?;
    Ok(())
}
