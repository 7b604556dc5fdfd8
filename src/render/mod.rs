//! Summary image rendering.
//!
//! Draws the comparison table as white text on a black canvas and writes it
//! as a PNG for the publisher to upload.

mod layout;

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use crate::error::{AppError, Result};
use crate::models::{ComparisonTable, RenderConfig};

pub use layout::{TableLayout, TextPlacement, caption_text, layout_rows, value_text};

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const FOREGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Turns a comparison into an image file.
pub trait SummaryRenderer: Send + Sync {
    /// Render the table and return the path of the written image.
    fn render(&self, table: &ComparisonTable) -> Result<PathBuf>;
}

/// PNG renderer. The font is read from `font_path` on first draw unless one
/// was supplied up front.
pub struct ImageRenderer {
    font: Option<FontVec>,
    config: RenderConfig,
    layout: TableLayout,
}

impl ImageRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            font: None,
            config: config.clone(),
            layout: TableLayout::from_config(config),
        }
    }

    pub fn with_font(config: &RenderConfig, font: FontVec) -> Self {
        Self {
            font: Some(font),
            ..Self::new(config)
        }
    }

    /// Draw the table onto a fresh canvas.
    pub fn draw(&self, table: &ComparisonTable) -> Result<RgbImage> {
        match &self.font {
            Some(font) => Ok(self.draw_with(font, table)),
            None => {
                let font = load_font(Path::new(&self.config.font_path))?;
                Ok(self.draw_with(&font, table))
            }
        }
    }

    fn draw_with(&self, font: &FontVec, table: &ComparisonTable) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(self.config.width, self.config.height, BACKGROUND);
        let scale = PxScale::from(self.config.font_size);

        for placement in layout_rows(&table.rows, &self.layout) {
            draw_text_mut(
                &mut canvas,
                FOREGROUND,
                placement.x,
                placement.y,
                scale,
                font,
                &placement.text,
            );
        }

        draw_text_mut(
            &mut canvas,
            FOREGROUND,
            self.config.caption_x,
            self.config.caption_y,
            scale,
            font,
            &caption_text(table),
        );

        canvas
    }
}

impl SummaryRenderer for ImageRenderer {
    fn render(&self, table: &ComparisonTable) -> Result<PathBuf> {
        let canvas = self.draw(table)?;

        let path = PathBuf::from(&self.config.output_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        canvas.save(&path)?;
        log::info!(
            "Rendered {} rows to {}",
            table.rows.len().min(self.layout.capacity()),
            path.display()
        );
        Ok(path)
    }
}

/// Read a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| AppError::font(path.display().to_string(), e))?;
    FontVec::try_from_vec(bytes).map_err(|e| AppError::font(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComparisonRow;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/Library/Fonts/Arial Unicode.ttf",
    ];

    fn system_font() -> Option<FontVec> {
        SYSTEM_FONTS
            .iter()
            .find_map(|path| load_font(Path::new(path)).ok())
    }

    fn table(rows: Vec<ComparisonRow>) -> ComparisonTable {
        ComparisonTable {
            rows,
            previous_date: NaiveDate::from_ymd_opt(2022, 1, 4).unwrap(),
            current_date: NaiveDate::from_ymd_opt(2022, 1, 5).unwrap(),
            dropped: Vec::new(),
        }
    }

    fn lit_pixels(canvas: &RgbImage, x: std::ops::Range<u32>, y: std::ops::Range<u32>) -> usize {
        y.flat_map(|py| x.clone().map(move |px| (px, py)))
            .filter(|&(px, py)| *canvas.get_pixel(px, py) != BACKGROUND)
            .count()
    }

    #[test]
    fn test_missing_font_fails_on_render_not_construction() {
        let tmp = TempDir::new().unwrap();
        let mut config = RenderConfig::default();
        config.font_path = "/nonexistent/NotoSerifJP-Regular.otf".to_string();
        config.output_path = tmp.path().join("pic.png").display().to_string();

        let renderer = ImageRenderer::new(&config);
        let result = renderer.render(&table(Vec::new()));

        assert!(matches!(result, Err(AppError::Font { .. })));
        assert!(!tmp.path().join("pic.png").exists());
    }

    #[test]
    fn test_invalid_font_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.otf");
        std::fs::write(&path, b"not a font").unwrap();

        let result = load_font(&path);
        assert!(matches!(result, Err(AppError::Font { .. })));
    }

    #[test]
    fn test_empty_table_draws_only_caption() {
        let Some(font) = system_font() else {
            eprintln!("no system font found; skipping");
            return;
        };
        let config = RenderConfig::default();
        let renderer = ImageRenderer::with_font(&config, font);

        let canvas = renderer.draw(&table(Vec::new())).unwrap();

        assert_eq!(canvas.dimensions(), (1280, 720));
        assert_eq!(*canvas.get_pixel(0, 0), BACKGROUND);
        let caption_top = config.caption_y as u32;
        assert_eq!(lit_pixels(&canvas, 0..1280, 0..caption_top), 0);
        assert!(lit_pixels(&canvas, config.caption_x as u32..1280, caption_top..720) > 0);
    }

    #[test]
    fn test_rows_are_drawn_in_grid() {
        let Some(font) = system_font() else {
            eprintln!("no system font found; skipping");
            return;
        };
        let config = RenderConfig::default();
        let renderer = ImageRenderer::with_font(&config, font);
        let rows = vec![ComparisonRow::new("Nara", 10, 15).unwrap()];

        let canvas = renderer.draw(&table(rows)).unwrap();

        // first grid cell, top-left column
        assert!(lit_pixels(&canvas, 0..440, 40..80) > 0);
        // second column is empty
        assert_eq!(lit_pixels(&canvas, 450..850, 0..600), 0);
    }

    #[test]
    fn test_render_writes_png() {
        let Some(font) = system_font() else {
            eprintln!("no system font found; skipping");
            return;
        };
        let tmp = TempDir::new().unwrap();
        let mut config = RenderConfig::default();
        config.output_path = tmp.path().join("out/pic.png").display().to_string();
        let renderer = ImageRenderer::with_font(&config, font);

        let path = renderer.render(&table(Vec::new())).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (1280, 720));
    }
}
