use clap::Parser;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uwb_positioning::{
    ConfigurationManager, LineFramer, PipelineConfig, PositioningPipeline, StatusFormatter,
    TagStatusBoard,
};

/// Replay UWB ranging lines and print tag positions
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration with pipeline settings and the anchor table
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Raw serial capture to read, `-` for stdin
    #[arg(long, short, value_name = "FILE", default_value = "-")]
    input: String,

    /// Override the fluctuation threshold (cm, 0-100)
    #[arg(long, value_name = "CM")]
    threshold: Option<f64>,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_config: Option<PathBuf>,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(path) = &cli.write_default_config {
        ConfigurationManager::new().save_to_file(path)?;
        info!(path = %path.display(), "default configuration written");
        return Ok(());
    }

    let mut manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    if let Some(threshold) = cli.threshold {
        manager.set_fluctuation_threshold(threshold)?;
    }

    let config: PipelineConfig = manager.pipeline_config().clone();
    let anchors = manager.anchor_table();
    info!(
        anchors = anchors.len(),
        threshold_cm = config.fluctuation_threshold_cm,
        "positioning pipeline ready"
    );

    let mut pipeline = PositioningPipeline::new(config)?;
    let mut framer = LineFramer::new();
    let formatter = StatusFormatter::new();
    let mut board = TagStatusBoard::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut input: Box<dyn Read> = if cli.input == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(&cli.input)?)
    };

    let mut chunk = [0u8; 1024];
    loop {
        let read = input.read(&mut chunk)?;
        let data: &[u8] = if read == 0 { b"\n" } else { &chunk[..read] };
        if let Err(e) = framer.push(data) {
            warn!("{}", e);
        }

        for line in framer.lines() {
            let mut sink = |tag_id: u32, x: f64, y: f64, anchors_used: &[u32]| {
                debug!(tag_id, x, y, anchors = ?anchors_used, "position update");
            };

            match pipeline.process_line_with(&line, &anchors, &mut sink) {
                Ok(estimate) => {
                    let rounding = pipeline.config().format(estimate.format).rounding;
                    let status = formatter.format_position(&estimate, rounding);
                    info!("{}", formatter.format_detail(&estimate, rounding));
                    writeln!(out, "{}", status)?;
                    board.update(estimate.tag_id, status);
                }
                Err(diagnostic) => match (diagnostic.tag_id(), formatter.format_diagnostic(&diagnostic)) {
                    (Some(tag_id), Some(status)) => {
                        warn!("{}", status);
                        writeln!(out, "{}", status)?;
                        board.update(tag_id, status);
                    }
                    _ => debug!(line = %line, "ignored: {}", diagnostic),
                },
            }
        }

        if read == 0 {
            break;
        }
    }

    if !board.is_empty() {
        writeln!(out, "--- tag status ---")?;
        writeln!(out, "{}", board.render())?;
    }
    Ok(())
}

/// Log to stderr so stdout carries only status lines
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
