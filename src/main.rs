use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use metal_insert::{run, Config, InsertRequest, Placement, TransformParams};

/// Paste the metal of one CT slice into another.
#[derive(Debug, Parser)]
#[command(name = "metal-insert", version)]
struct Cli {
    /// DICOM slice containing metal.
    #[arg(long)]
    metal: PathBuf,

    /// DICOM slice without metal, receives the insertion.
    #[arg(long)]
    base: PathBuf,

    /// Top-left "ROW COL" of the (left) metal patch.
    #[arg(long, default_value = "0 0")]
    at: Placement,

    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Rotation in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle: f64,

    /// Top-left "ROW COL" of the right metal patch, when there are two.
    #[arg(long, default_value = "0 0")]
    at2: Placement,

    #[arg(long, default_value_t = 1.0)]
    zoom2: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    angle2: f64,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the .npy/.png pair (overrides the configuration).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Only composite, write nothing.
    #[arg(long)]
    no_save: bool,
}

impl Cli {
    fn request(&self) -> InsertRequest {
        InsertRequest {
            base: self.base.clone(),
            metal: self.metal.clone(),
            first: self.at,
            first_transform: TransformParams::new(self.zoom, self.angle),
            second: self.at2,
            second_transform: TransformParams::new(self.zoom2, self.angle2),
            save: !self.no_save,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = &cli.out_dir {
        config.output_dir = dir.clone();
    }

    match run(&cli.request(), &config) {
        Ok(outcome) => {
            info!(
                "composited {} metal region(s) into a {:?} image",
                outcome.regions,
                outcome.composite.dim()
            );
            if let Some(saved) = outcome.saved {
                info!("array: {}", saved.array.display());
                info!("image: {}", saved.image.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
