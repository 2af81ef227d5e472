//! SLURM job-script generation and submission.
//!
//! Submission is fire and forget: the script is rendered from the TOML job
//! description, written into the run directory and handed to `sbatch`.
//! Queueing, scheduling and resource allocation are entirely the
//! scheduler's business; nothing is polled or retried here.

use crate::config::JobConfig;
use crate::error::{Error, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn render_job_script(cfg: &JobConfig) -> String {
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        format!("#SBATCH --job-name={}", cfg.name),
        format!("#SBATCH --partition={}", cfg.partition),
        format!("#SBATCH --nodes={}", cfg.nodes),
        format!("#SBATCH --ntasks={}", cfg.ntasks),
        format!("#SBATCH --time={}", cfg.walltime),
    ];
    if let Some(account) = &cfg.account {
        lines.push(format!("#SBATCH --account={account}"));
    }
    if let Some(qos) = &cfg.qos {
        lines.push(format!("#SBATCH --qos={qos}"));
    }
    for extra in &cfg.extra_sbatch {
        lines.push(format!("#SBATCH {extra}"));
    }

    lines.push(String::new());
    for module in &cfg.modules {
        lines.push(format!("module load {module}"));
    }
    if !cfg.modules.is_empty() {
        lines.push(String::new());
    }

    lines.push(format!(
        "srun {} {}",
        cfg.executable.display(),
        cfg.input_file.display()
    ));
    lines.push(String::new());
    lines.join("\n")
}

/// Write the rendered script into the run directory under a timestamped name.
pub fn write_job_script(cfg: &JobConfig, run_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(run_dir)?;
    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let path = run_dir.join(format!("{}_{}.sh", cfg.name, stamp));
    std::fs::write(&path, render_job_script(cfg))?;
    Ok(path)
}

/// Hand the script to `sbatch` and return the scheduler's job id.
pub fn submit_job(script: &Path) -> Result<String> {
    let output = Command::new("sbatch").arg(script).output()?;
    if !output.status.success() {
        return Err(Error::Scheduler(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    // sbatch prints "Submitted batch job <id>"
    let stdout = String::from_utf8_lossy(&output.stdout);
    let job_id = stdout
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .to_string();
    if job_id.is_empty() {
        return Err(Error::Scheduler(format!(
            "could not parse sbatch output: {stdout}"
        )));
    }
    Ok(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JobConfig {
        JobConfig::from_toml(
            r#"
            name = "cyclone_base"
            partition = "standard"
            ntasks = 128
            nodes = 2
            walltime = "12:00:00"
            account = "plasma-uk"
            modules = ["netcdf-fortran", "fftw/3.3.10"]
            executable = "/opt/gs2/bin/gs2"
            input_file = "cyclone.in"
            extra_sbatch = ["--exclusive"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn script_carries_the_sbatch_directives() {
        let script = render_job_script(&config());
        assert!(script.starts_with("#!/bin/bash\n"));
        for line in [
            "#SBATCH --job-name=cyclone_base",
            "#SBATCH --partition=standard",
            "#SBATCH --nodes=2",
            "#SBATCH --ntasks=128",
            "#SBATCH --time=12:00:00",
            "#SBATCH --account=plasma-uk",
            "#SBATCH --exclusive",
        ] {
            assert!(script.contains(line), "missing {line}");
        }
    }

    #[test]
    fn script_loads_modules_before_running() {
        let script = render_job_script(&config());
        let modules = script.find("module load netcdf-fortran").unwrap();
        let srun = script.find("srun /opt/gs2/bin/gs2 cyclone.in").unwrap();
        assert!(modules < srun);
        assert!(script.contains("module load fftw/3.3.10"));
    }

    #[test]
    fn script_omits_unset_directives() {
        let mut cfg = config();
        cfg.account = None;
        cfg.qos = None;
        let script = render_job_script(&cfg);
        assert!(!script.contains("--account"));
        assert!(!script.contains("--qos"));
    }
}
