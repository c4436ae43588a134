//! lab-ngin - runs one of the interactive scenes in a window

use std::path::PathBuf;

use clap::Parser;
use lab_ngin::{config::EngineConfig, logging::LoggingConfig, scenes::Scene};

#[derive(Parser)]
#[command(name = "lab-ngin")]
#[command(about = "Procedural meshes, picking, lighting and pose animation on wgpu", long_about = None)]
#[command(version)]
struct Cli {
    /// Scene to open
    #[arg(long, value_enum, default_value_t = Scene::Fractal)]
    scene: Scene,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Milliseconds between two ticks
    #[arg(long = "tick-ms", default_value_t = 1000)]
    tick_ms: u64,

    /// Log filter (e.g. "info" or "lab_ngin=debug"), overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,

    /// Directory for screenshots taken with P
    #[arg(long, default_value = "captures")]
    capture_dir: PathBuf,
}

impl Cli {
    fn into_config(self) -> EngineConfig {
        let mut logging = LoggingConfig::default();
        if let Some(filter) = self.log {
            logging = logging.with_filter(filter);
        }
        EngineConfig::default()
            .with_title(self.scene.title())
            .with_size(self.width, self.height)
            .with_tick_millis(self.tick_ms)
            .with_capture_dir(self.capture_dir)
            .with_logging(logging)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let scene = cli.scene;
    lab_ngin::flow::run(cli.into_config(), scene.constructors())
}

// The web build starts through the library's wasm entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_the_fractal_scene() {
        let cli = Cli::parse_from(["lab-ngin"]);
        assert_eq!(cli.scene, Scene::Fractal);
        let config = cli.into_config();
        assert_eq!((config.width, config.height), (800, 800));
        assert_eq!(config.tick_millis, 1000);
    }

    #[test]
    fn flags_reach_the_config() {
        let cli = Cli::parse_from([
            "lab-ngin", "--scene", "solar", "--width", "640", "--height", "480", "--tick-ms", "50", "--log", "debug",
        ]);
        assert_eq!(cli.scene, Scene::Solar);
        let config = cli.into_config();
        assert_eq!(config.title, Scene::Solar.title());
        assert_eq!((config.width, config.height, config.tick_millis), (640, 480, 50));
        assert_eq!(config.logging.env_filter.as_deref(), Some("debug"));
    }
}
