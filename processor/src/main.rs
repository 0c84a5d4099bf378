use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;

/// Analyse a recorded match and write the result as JSON.
#[derive(Debug, Parser)]
#[command(name = "processor")]
struct Cli {
    /// Recording to analyse, one JSON frame per line
    recording: PathBuf,

    /// Steam id of a player to produce a detailed analysis for
    #[arg(long)]
    player: Option<u64>,

    /// Also extract dense per-tick frames
    #[arg(long, default_value_t = false)]
    frames: bool,

    #[arg(long, default_value_t = 512)]
    snapshot_interval: i32,

    #[arg(long, default_value_t = 2)]
    frame_stride: i32,

    #[arg(long, default_value_t = 64.0)]
    tick_rate: f64,

    /// Heatmap quantisation in world units
    #[arg(long, default_value_t = 0.1)]
    cell_size: f64,

    #[arg(long, default_value = "unknown")]
    map: String,

    /// Render the heatmap to this PNG file
    #[arg(long)]
    heatmap_png: Option<PathBuf>,

    /// World units per pixel of the rendered heatmap
    #[arg(long, default_value_t = 25.0)]
    heatmap_grid: f64,

    /// Output file, stdout if missing
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> analysis::Config {
        analysis::Config {
            heatmap: analysis::heatmap::Config {
                cell_size: self.cell_size,
            },
            frames: analysis::frames::Config {
                stride: self.frame_stride,
                tick_rate: self.tick_rate,
                ..Default::default()
            },
            snapshot_interval: self.snapshot_interval,
            extract_frames: self.frames,
            target_player: self.player,
            map_name: self.map.clone(),
        }
    }

    fn level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = args.level();
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::filter_fn(move |meta| {
            (meta.target().contains("processor") || meta.target().contains("analysis"))
                && meta.level() <= &level
        }));
    tracing::subscriber::set_global_default(registry).context("Installing tracing subscriber")?;

    tracing::info!("Analysing {}", args.recording.display());

    let config = args.config();
    let recording = analysis::recording::JsonLinesFile::new(&args.recording);

    let (result, heatmap) = analysis::engine::analyse_with_heatmap(&recording, &config)
        .with_context(|| format!("Analysing {}", args.recording.display()))?;

    if let Some(path) = args.heatmap_png.as_ref() {
        let raster = heatmap.rasterize(args.heatmap_grid, &[]);
        tracing::debug!("Heatmap raster {}x{}", raster.width(), raster.height());

        raster
            .as_image()
            .save(path)
            .with_context(|| format!("Writing heatmap to {}", path.display()))?;
    }

    if result.metadata.truncated {
        tracing::warn!("Recording ended early, the result is partial");
    }

    match args.output.as_ref() {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Creating {}", path.display()))?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), &result)
                .context("Serializing analysis")?;
            tracing::info!("Wrote analysis to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &result).context("Serializing analysis")?;
            println!();
        }
    }

    Ok(())
}
