//! Start-up configuration for the window, renderer and logger.

use std::path::PathBuf;

use crate::logging::LoggingConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_colour: wgpu::Color,
    /// Interval between two `on_tick` calls.
    pub tick_millis: u64,
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Where `P` screenshots are written.
    pub capture_dir: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "lab-ngin".to_string(),
            width: 800,
            height: 800,
            clear_colour: wgpu::Color {
                r: 0.5,
                g: 0.5,
                b: 0.5,
                a: 1.0,
            },
            tick_millis: 1000,
            fovy_deg: 45.0,
            znear: 0.01,
            zfar: 100.0,
            capture_dir: PathBuf::from("captures"),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Zero sizes are bumped to one pixel; wgpu rejects empty surfaces.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_clear_colour(mut self, clear_colour: wgpu::Color) -> Self {
        self.clear_colour = clear_colour;
        self
    }

    pub fn with_tick_millis(mut self, tick_millis: u64) -> Self {
        self.tick_millis = tick_millis.max(1);
        self
    }

    pub fn with_projection(mut self, fovy_deg: f32, znear: f32, zfar: f32) -> Self {
        self.fovy_deg = fovy_deg;
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = dir.into();
        self
    }

    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_coursework_canvas() {
        let config = EngineConfig::default();
        assert_eq!((config.width, config.height), (800, 800));
        assert_eq!(config.fovy_deg, 45.0);
        assert!(config.znear < config.zfar);
    }

    #[test]
    fn setters_guard_against_zero() {
        let config = EngineConfig::default().with_size(0, 600).with_tick_millis(0);
        assert_eq!(config.width, 1);
        assert_eq!(config.height, 600);
        assert_eq!(config.tick_millis, 1);
    }
}
