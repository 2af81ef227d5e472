//! Figure rendering for the post-processing diagnostics.
//!
//! Every plot call is read-compute-render: all dataset access and
//! validation happens before the image backend is opened, so a failed
//! request leaves no file behind.

pub mod spectrum;
pub mod traces;
pub mod transfer;

use crate::error::{Error, Result};
use crate::io::netcdf::RunDataset;
use std::path::Path;

pub(crate) fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

pub(crate) fn render_error(e: impl std::fmt::Display) -> Error {
    Error::Render(e.to_string())
}

// Resolve an explicit field request against the dataset, or fall back to
// whichever of the known variables the run wrote
pub(crate) fn resolve_fields(
    ds: &RunDataset,
    requested: &[String],
    known: &[&'static str],
) -> Result<Vec<String>> {
    if requested.is_empty() {
        let available = ds.available(known);
        if available.is_empty() {
            return Err(Error::DataMissing(format!("any of {}", known.join(", "))));
        }
        Ok(available.into_iter().map(String::from).collect())
    } else {
        for name in requested {
            if !ds.has(name) {
                return Err(Error::DataMissing(name.clone()));
            }
        }
        Ok(requested.to_vec())
    }
}
