use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fpa_store::{
    Eye, Processor, ProcessorConfig, Store, load_gaze_csv, segments_to_csv, segments_to_json,
    write_csv, write_json,
};

#[derive(Parser)]
#[command(name = "fpa", about = "Streaming fractal path analysis for movement recordings")]
struct Cli {
    /// Segment database path
    #[arg(long, global = true, default_value = "fpa.db")]
    db: PathBuf,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process gaze recording CSV files and store the finished segments
    Analyze {
        /// Recording file path(s); the file stem becomes the subject id
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Which eye's coordinate columns to read
        #[arg(long, default_value = "left")]
        eye: Eye,

        /// Multiply coordinates after clipping (e.g. 1920 for screen pixels)
        #[arg(long, default_value_t = 1.0)]
        scale_factor: f64,

        /// Clamp raw coordinates to LO:HI before scaling
        #[arg(long)]
        clip: Option<String>,

        /// TOML config file; explicit flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fine measurement scale as a multiple of the mean step size
        #[arg(long)]
        min_mult: Option<f64>,

        /// Coarse measurement scale as a multiple of the mean step size
        #[arg(long)]
        max_mult: Option<f64>,

        /// Segment timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Normalize measurement scales by step time
        #[arg(long)]
        velocity: bool,

        /// Measure in full 3D instead of the XY plane
        #[arg(long)]
        no_plane: bool,

        /// Stop after this many samples
        #[arg(long)]
        max_points: Option<usize>,

        /// Also write a summary CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write full segment state as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Print stored segments
    Report {
        /// Restrict to one subject
        #[arg(long)]
        subject: Option<String>,

        /// Emit full segment state as JSON instead of a summary table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Analyze {
            files,
            eye,
            scale_factor,
            clip,
            config,
            min_mult,
            max_mult,
            timeout,
            velocity,
            no_plane,
            max_points,
            csv,
            json,
        } => {
            let config = resolve_config(
                config.as_deref(),
                *min_mult,
                *max_mult,
                *timeout,
                *velocity,
                *no_plane,
                *max_points,
            )?;
            let clip = clip.as_deref().map(parse_clip).transpose()?;
            cmd_analyze(
                &cli,
                files,
                *eye,
                *scale_factor,
                clip,
                config,
                csv.as_deref(),
                json.as_deref(),
            )
        }
        Commands::Report { subject, json } => cmd_report(&cli, subject.as_deref(), *json),
    }
}

/// Start from the TOML file (or defaults) and layer explicit flags on top.
fn resolve_config(
    config_path: Option<&Path>,
    min_mult: Option<f64>,
    max_mult: Option<f64>,
    timeout: Option<f64>,
    velocity: bool,
    no_plane: bool,
    max_points: Option<usize>,
) -> Result<ProcessorConfig> {
    let mut config = match config_path {
        Some(path) => ProcessorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ProcessorConfig::default(),
    };

    if let Some(m) = min_mult {
        config.min_multiplier = m;
    }
    if let Some(m) = max_mult {
        config.max_multiplier = m;
    }
    if let Some(t) = timeout {
        config.path_timeout_secs = t;
    }
    if velocity {
        config.velocity_mode = true;
    }
    if no_plane {
        config.constrain_to_plane = false;
    }
    if let Some(n) = max_points {
        config.max_points = Some(n);
    }

    if config.min_multiplier <= 0.0 || config.max_multiplier <= config.min_multiplier {
        anyhow::bail!(
            "multipliers must satisfy 0 < min < max (got {} and {})",
            config.min_multiplier,
            config.max_multiplier
        );
    }
    Ok(config)
}

/// Parse `LO:HI` into a clip range.
fn parse_clip(s: &str) -> Result<(f64, f64)> {
    let (lo, hi) = s
        .split_once(':')
        .with_context(|| format!("clip range must be LO:HI, got '{s}'"))?;
    let lo: f64 = lo.trim().parse().context("invalid clip lower bound")?;
    let hi: f64 = hi.trim().parse().context("invalid clip upper bound")?;
    if lo > hi {
        anyhow::bail!("clip lower bound {lo} exceeds upper bound {hi}");
    }
    Ok((lo, hi))
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    cli: &Cli,
    files: &[PathBuf],
    eye: Eye,
    scale_factor: f64,
    clip: Option<(f64, f64)>,
    config: ProcessorConfig,
    csv_out: Option<&Path>,
    json_out: Option<&Path>,
) -> Result<()> {
    let mut processor = Processor::new(config);

    for path in files {
        let recording = load_gaze_csv(path, eye, scale_factor, clip)
            .with_context(|| format!("failed to load {}", path.display()))?;
        let consumed = processor.process_recording(&recording);
        println!(
            "analyzed {} → subject {}, {consumed} samples",
            path.display(),
            recording.subject_id
        );
    }

    let segments = processor.finish();
    for segment in &segments {
        println!(
            "  {}: D={:.4}, steps={}, length={:.2}",
            segment.subject_id, segment.dimension, segment.step_count, segment.total_path_length
        );
    }

    let store = Store::open(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;
    store
        .save_segments(&segments)
        .context("failed to save segments")?;

    if let Some(path) = csv_out {
        write_csv(path, &segments)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    if let Some(path) = json_out {
        write_json(path, &segments)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    println!(
        "done. {} segments saved to {}",
        segments.len(),
        cli.db.display()
    );
    Ok(())
}

fn cmd_report(cli: &Cli, subject: Option<&str>, json: bool) -> Result<()> {
    let store = Store::open(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;

    let records = match subject {
        Some(id) => store.load_segments_for(id),
        None => store.load_segments(),
    }
    .context("failed to load segments")?;

    if records.is_empty() {
        println!("(no segments stored)");
        return Ok(());
    }

    let segments: Vec<_> = records.into_iter().map(|r| r.compass).collect();
    if json {
        println!(
            "{}",
            segments_to_json(&segments).context("failed to serialize segments")?
        );
    } else {
        print!("{}", segments_to_csv(&segments));
    }
    Ok(())
}
