//! Reader for GS2 `.out.nc` output files.
//!
//! The dataset is produced by the simulation and is read-only here. Only the
//! variables the diagnostics consume are touched: the `t`, `kx`, `ky` and
//! `theta` axes, the volume-integrated traces over `(t)`, the mode-resolved
//! spectra over `(t, ky, kx)` and the transfer diagnostics over `(t, theta)`.

use crate::error::{Error, Result};
use ndarray::Array2;
use std::path::{Path, PathBuf};

pub struct RunDataset {
    file: netcdf::File,
    path: PathBuf,
}

impl RunDataset {
    pub fn open(path: &Path) -> Result<Self> {
        let file = netcdf::open(path)?;
        let ds = RunDataset {
            file,
            path: path.to_path_buf(),
        };
        // Every GS2 output carries a time axis
        ds.var("t")?;
        Ok(ds)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    /// Filter a candidate list down to the variables this run actually wrote.
    pub fn available<'a>(&self, candidates: &[&'a str]) -> Vec<&'a str> {
        candidates.iter().copied().filter(|n| self.has(n)).collect()
    }

    pub fn ntime(&self) -> Result<usize> {
        let var = self.var("t")?;
        let dims = var.dimensions();
        if dims.len() != 1 {
            return Err(Error::invalid_input("time variable `t` is not one dimensional"));
        }
        Ok(dims[0].len())
    }

    /// Map an optional user-supplied time index onto the dataset, defaulting
    /// to the final step.
    pub fn resolve_time_index(&self, requested: Option<usize>) -> Result<usize> {
        let len = self.ntime()?;
        if len == 0 {
            return Err(Error::invalid_input("dataset has no time steps"));
        }
        match requested {
            None => Ok(len - 1),
            Some(index) if index < len => Ok(index),
            Some(index) => Err(Error::IndexOutOfRange { index, len }),
        }
    }

    pub fn time(&self) -> Result<Vec<f64>> {
        self.series_1d("t")
    }

    /// Volume-integrated trace of a field, one value per time step.
    pub fn trace(&self, name: &str) -> Result<Vec<f64>> {
        self.series_1d(name)
    }

    /// Coordinate axis such as `kx`, `ky` or `theta`.
    pub fn axis(&self, name: &str) -> Result<Vec<f64>> {
        self.series_1d(name)
    }

    /// Mode-resolved spectrum of a field at one time step, shaped `(ky, kx)`
    /// with `kx` still in FFT layout.
    pub fn spectrum_at(&self, name: &str, tidx: usize) -> Result<Array2<f64>> {
        let tidx = self.resolve_time_index(Some(tidx))?;
        let var = self.var(name)?;
        let dims = var.dimensions();
        if dims.len() != 3 {
            return Err(Error::invalid_input(format!(
                "`{name}` is not a (t, ky, kx) variable"
            )));
        }
        let (nky, nkx) = (dims[1].len(), dims[2].len());
        let flat = var.get_values::<f64, _>((tidx, .., ..))?;
        Array2::from_shape_vec((nky, nkx), flat).map_err(|e| Error::invalid_input(e.to_string()))
    }

    /// Poloidal profile of a transfer diagnostic at one time step.
    pub fn theta_profile_at(&self, name: &str, tidx: usize) -> Result<Vec<f64>> {
        let tidx = self.resolve_time_index(Some(tidx))?;
        let var = self.var(name)?;
        let dims = var.dimensions();
        if dims.len() != 2 {
            return Err(Error::invalid_input(format!(
                "`{name}` is not a (t, theta) variable"
            )));
        }
        Ok(var.get_values::<f64, _>((tidx, ..))?)
    }

    /// Poloidal profile of a transfer diagnostic averaged over `[tstart, tend]`.
    pub fn theta_profile_avg(&self, name: &str, tstart: f64, tend: f64) -> Result<Vec<f64>> {
        let t = self.time()?;
        let var = self.var(name)?;
        let dims = var.dimensions();
        if dims.len() != 2 {
            return Err(Error::invalid_input(format!(
                "`{name}` is not a (t, theta) variable"
            )));
        }
        let (nt, ntheta) = (dims[0].len(), dims[1].len());
        if nt != t.len() {
            return Err(Error::invalid_input(format!(
                "`{name}` does not match the time axis"
            )));
        }
        let flat = var.get_values::<f64, _>(..)?;
        let arr = Array2::from_shape_vec((nt, ntheta), flat)
            .map_err(|e| Error::invalid_input(e.to_string()))?;

        let rows: Vec<usize> = t
            .iter()
            .enumerate()
            .filter(|(_, &tv)| tv >= tstart && tv <= tend)
            .map(|(i, _)| i)
            .collect();
        if rows.is_empty() {
            return Err(Error::invalid_input(format!(
                "no samples in averaging window [{tstart}, {tend}]"
            )));
        }

        let mut avg = vec![0.0; ntheta];
        for &i in &rows {
            for (j, v) in avg.iter_mut().enumerate() {
                *v += arr[[i, j]];
            }
        }
        for v in &mut avg {
            *v /= rows.len() as f64;
        }
        Ok(avg)
    }

    fn series_1d(&self, name: &str) -> Result<Vec<f64>> {
        let var = self.var(name)?;
        if var.dimensions().len() != 1 {
            return Err(Error::invalid_input(format!(
                "`{name}` is not a one dimensional variable"
            )));
        }
        Ok(var.get_values::<f64, _>(..)?)
    }

    fn var(&self, name: &str) -> Result<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| Error::DataMissing(name.to_string()))
    }
}

/// Reorder an FFT-layout axis so the zero mode sits in the middle and the
/// values run monotonically, matching how GS2 stores `kx`.
pub fn fftshift(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let split = (n + 1) / 2;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&values[split..]);
    out.extend_from_slice(&values[..split]);
    out
}

/// Apply [`fftshift`] along the kx axis (columns) of a `(ky, kx)` spectrum.
pub fn fftshift_columns(arr: &Array2<f64>) -> Array2<f64> {
    let (_, cols) = arr.dim();
    let split = (cols + 1) / 2;
    let mut out = arr.clone();
    for (dst, src) in (split..cols).chain(0..split).enumerate() {
        out.column_mut(dst).assign(&arr.column(src));
    }
    out
}
