use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gs2tools",
    version,
    about = "Job submission and post-processing for GS2 gyrokinetic runs"
)]
pub struct Cli {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect the saturation time of a completed run
    Sat {
        /// Path to the run's .out.nc file
        dataset: PathBuf,
        /// Trace used for detection
        #[arg(long, default_value = "phi2")]
        field: String,
        /// Time interval for the rolling growth rate
        #[arg(long, default_value_t = 20.0)]
        window: f64,
        /// Growth rate below which the run counts as saturated
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,
        /// Use the windowed flatness test on raw samples instead of the
        /// growth-rate test
        #[arg(long)]
        flatness: bool,
        /// Samples per window for the flatness test
        #[arg(long, default_value_t = 10)]
        samples: usize,
        /// Relative change below which a window counts as flat
        #[arg(long, default_value_t = 0.05)]
        tolerance: f64,
        /// Flat windows in a row required by the flatness test
        #[arg(long, default_value_t = 2)]
        consecutive: usize,
    },

    /// Plot time traces of the volume-integrated fields
    Traces {
        /// Path to the run's .out.nc file
        dataset: PathBuf,
        /// Fields to plot (defaults to every trace the run wrote)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(short, long, default_value = "outputs")]
        out_dir: PathBuf,
        #[arg(long)]
        filename: Option<String>,
        /// Also export the plotted traces to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Time interval for the rolling growth rate
        #[arg(long, default_value_t = 20.0)]
        window: f64,
        /// Growth rate below which the run counts as saturated
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,
    },

    /// Plot kx-ky spectra of the mode-resolved fields
    Spectrum {
        /// Path to the run's .out.nc file
        dataset: PathBuf,
        /// Fields to plot (defaults to every spectrum the run wrote)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Time index (defaults to the final step)
        #[arg(short = 't', long)]
        time_index: Option<usize>,
        #[arg(short, long, default_value = "outputs")]
        out_dir: PathBuf,
        #[arg(long)]
        filename: Option<String>,
    },

    /// Plot the poloidal structure of the transfer diagnostics
    Transfer {
        /// Path to the run's .out.nc file
        dataset: PathBuf,
        /// Diagnostics to plot (defaults to every one the run wrote)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Time index (defaults to the final step)
        #[arg(short = 't', long)]
        time_index: Option<usize>,
        /// Average over a time window of this duration instead of using a
        /// single step
        #[arg(long)]
        average: Option<f64>,
        /// Start of the averaging window (defaults to the end of the run
        /// minus the window)
        #[arg(long)]
        tstart: Option<f64>,
        #[arg(short, long, default_value = "outputs")]
        out_dir: PathBuf,
        #[arg(long)]
        filename: Option<String>,
    },

    /// Post-process every run directory beneath a sweep root
    Sweep {
        /// Directory whose children each hold one completed run
        root: PathBuf,
        #[arg(short, long, default_value = "outputs")]
        out_dir: PathBuf,
        /// Time interval for the rolling growth rate
        #[arg(long, default_value_t = 20.0)]
        window: f64,
        /// Growth rate below which a run counts as saturated
        #[arg(long, default_value_t = 0.1)]
        threshold: f64,
    },

    /// Render a SLURM job script from a TOML description and submit it
    Submit {
        /// Path to the job description TOML
        config: PathBuf,
        /// Directory the script is written into (defaults to the config's
        /// directory)
        #[arg(long)]
        run_dir: Option<PathBuf>,
        /// Write the script without calling sbatch
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn get_args() -> Cli {
    Cli::parse()
}
