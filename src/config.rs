//! Command-line configuration.

use clap::Parser;
use gfx_hal::window;
use std::path::PathBuf;

use crate::animation::DEFAULT_STEP;
use crate::error::{Error, Result};

#[derive(Parser, Debug, Clone)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Draws a triangle with oscillating vertex colors")]
pub struct Config {
    /// Initial window width in physical pixels.
    #[arg(long, default_value_t = 400)]
    pub width: u32,

    /// Initial window height in physical pixels.
    #[arg(long, default_value_t = 400)]
    pub height: u32,

    #[arg(long, default_value = "--- gfx-hal triangle ---")]
    pub title: String,

    /// Directory holding `shader.vert` and `shader.frag`.
    #[arg(long, default_value = ".")]
    pub shader_dir: PathBuf,

    /// Present without waiting for vblank when the surface allows it.
    #[arg(long)]
    pub no_vsync: bool,

    /// How far each animated color channel moves per frame.
    #[arg(long, default_value_t = DEFAULT_STEP)]
    pub color_step: f32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.color_step > 0.0 && self.color_step <= 1.0) {
            return Err(Error::Config(format!(
                "color step must be in (0, 1], got {}",
                self.color_step
            )));
        }
        Ok(())
    }

    pub fn extent(&self) -> window::Extent2D {
        window::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    pub fn vsync(&self) -> bool {
        !self.no_vsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("color-triangle").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.extent(), window::Extent2D { width: 400, height: 400 });
        assert_eq!(config.title, "--- gfx-hal triangle ---");
        assert_eq!(config.shader_dir, PathBuf::from("."));
        assert!(config.vsync());
        assert_eq!(config.color_step, 0.005);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--width",
            "800",
            "--height",
            "600",
            "--shader-dir",
            "assets",
            "--no-vsync",
            "--color-step",
            "0.01",
        ]);
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.shader_dir, PathBuf::from("assets"));
        assert!(!config.vsync());
        assert_eq!(config.color_step, 0.01);
    }

    #[test]
    fn rejects_zero_size() {
        let config = parse(&["--width", "0"]);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejection_names_the_offending_value() {
        let config = parse(&["--height", "0"]);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: window size must be non-zero, got 400x0"
        );
    }

    #[test]
    fn rejects_out_of_range_step() {
        for step in &["0", "-0.1", "1.5", "NaN"] {
            let arg = format!("--color-step={}", step);
            let config = parse(&[arg.as_str()]);
            assert!(config.validate().is_err(), "step {} accepted", step);
        }
    }
}
