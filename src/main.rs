//! uik-demo: two swatches inside a nested foundation on the terminal
//!
//! Press a swatch to highlight it until the button is released, even when
//! the release happens elsewhere. `q` or Ctrl-C quits.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use uik::block::BlockInput;
use uik::surface::{pixel_size, TerminalSurface};
use uik::{
    fill_paint, Block, BlockHandle, Coord, DisplayFoundation, Event, Foundation, Rect, Rgba,
    UikConfig,
};

/// Terminal demo of uik's event routing and compositing
#[derive(Parser)]
#[command(name = "uik-demo", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Surface width in pixels (defaults to the terminal width)
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels (defaults to twice the terminal rows)
    #[arg(long)]
    height: Option<u32>,

    /// Minimum time between two flushes
    #[arg(long, value_name = "MS")]
    frame_delay_ms: Option<u64>,

    /// Where log output goes while the terminal is in use
    #[arg(long, value_name = "PATH", default_value = "uik-demo.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => UikConfig::load_from_file(path)?,
        None => UikConfig::load()?,
    };
    config.apply_env_overrides();
    if let Some(delay) = cli.frame_delay_ms {
        config.display.frame_delay_ms = delay;
    }
    config.validate()?;

    init_logging(&config, &cli.log_file)?;
    debug!("{}", config.summary());

    let (term_width, term_height) =
        pixel_size().unwrap_or((config.display.width, config.display.height));
    let width = cli.width.unwrap_or(term_width);
    let height = cli.height.unwrap_or(term_height);

    let mut display = DisplayFoundation::new(TerminalSurface::open, width, height, &config)
        .context("Failed to open terminal display")?;

    let size = display.size();
    let mut pane = Foundation::with_config(size, fill_paint(Rgba::opaque(24, 24, 32)), &config);
    let swatch_size = Coord::new(size.x / 4.0, size.y / 2.0);
    let swatches = [
        (Coord::new(size.x / 8.0, size.y / 4.0), Rgba::opaque(200, 60, 60)),
        (Coord::new(size.x * 5.0 / 8.0, size.y / 4.0), Rgba::opaque(60, 160, 220)),
    ];
    for (pos, color) in swatches {
        let swatch = spawn_swatch(swatch_size, color);
        pane.place_block(swatch, Rect::from_pos_size(pos, swatch_size));
    }
    let (pane, _pane_task) = pane.spawn();

    display.set_pane(pane.block().clone()).await;
    display.show().await;
    info!("demo running");

    display.wait_closed().await;
    info!("display closed");
    Ok(())
}

/// Logging goes to a file: the terminal itself is the display
fn init_logging(config: &UikConfig, log_file: &Path) -> Result<()> {
    let default_directive = format!("uik={}", config.logging.level.to_lowercase());
    let env_override = env::var("RUST_LOG").unwrap_or_default();
    let combined_filter = if env_override.trim().is_empty() {
        default_directive.clone()
    } else if env_override.contains("uik") {
        env_override
    } else {
        format!("{},{}", env_override, default_directive)
    };

    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(combined_filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// A block painted in `color` that lights up while pressed
fn spawn_swatch(size: Coord, color: Rgba) -> BlockHandle {
    let highlight = Rgba::straight(255, 255, 255, 96).over(color);
    let mut block = Block::new(size, fill_paint(color));
    let handle = block.handle().clone();
    tokio::spawn(async move {
        while let Some(input) = block.next_input().await {
            match input {
                BlockInput::Event(Event::MouseDown(_)) => {
                    block.set_paint(fill_paint(highlight));
                    block.handle().stack_redraw(block.bounds());
                }
                BlockInput::Event(Event::MouseUp(_)) => {
                    block.set_paint(fill_paint(color));
                    block.handle().stack_redraw(block.bounds());
                }
                BlockInput::Event(Event::Resize(size)) => {
                    block.handle_resize(size);
                }
                BlockInput::Event(Event::Close) => break,
                BlockInput::Event(_) => {}
                BlockInput::Redraw(_) => {
                    block.do_paint();
                    block.composite().await;
                }
            }
        }
        debug!("swatch stopped");
    });
    handle
}
