//! Height measurement for markup fragments

use crate::error::MeasureError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TABLE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static MEDIA: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img, image").expect("valid media selector"));

/// Measures the rendered height of a markup fragment at a given width.
///
/// Implementations must be deterministic and must not mutate anything the
/// pagination engine can observe. A headless layout engine, a font-metrics
/// estimator or a test stub all fit.
pub trait Measure: Send + Sync {
    fn measure(&self, markup: &str, available_width: f32) -> Result<f32, MeasureError>;
}

impl<F> Measure for F
where
    F: Fn(&str, f32) -> Result<f32, MeasureError> + Send + Sync,
{
    fn measure(&self, markup: &str, available_width: f32) -> Result<f32, MeasureError> {
        self(markup, available_width)
    }
}

/// Font-metrics estimator.
///
/// Word-wraps plain text greedily using an average character width, so the
/// result is consistent and grows monotonically with content, without being
/// typographically exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextMetrics {
    /// Body font size in pixels
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_height: f32,

    /// Average glyph advance as a fraction of the font size
    pub average_char_width: f32,

    /// Vertical margin added below every block
    pub block_spacing: f32,

    /// Font size multipliers for h1..h6
    pub heading_scale: [f32; 6],

    /// Height/width ratio for images without dimensions
    pub default_image_aspect: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_height: 1.5,
            average_char_width: 0.5,
            block_spacing: 16.0,
            heading_scale: [2.0, 1.5, 1.17, 1.0, 0.83, 0.67],
            default_image_aspect: 0.75,
        }
    }
}

impl TextMetrics {
    /// Number of lines `text` wraps to at the given font size and width
    pub fn line_count(&self, text: &str, font_size: f32, available_width: f32) -> usize {
        let char_width = (self.average_char_width * font_size).max(f32::EPSILON);
        let per_line = ((available_width / char_width).floor() as usize).max(1);

        let mut lines = 0usize;
        let mut current = 0usize;
        for word in text.split_whitespace() {
            let len = word.chars().count();
            if current == 0 {
                lines += 1;
                current = len;
            } else if current + 1 + len <= per_line {
                current += 1 + len;
            } else {
                lines += 1;
                current = len;
            }
            // A word longer than a line breaks across lines
            if current > per_line {
                lines += (current - 1) / per_line;
                current = match current % per_line {
                    0 => per_line,
                    rest => rest,
                };
            }
        }
        lines
    }

    fn text_height(&self, text: &str, font_size: f32, available_width: f32) -> f32 {
        let lines = self.line_count(text, font_size, available_width);
        lines as f32 * font_size * self.line_height + self.block_spacing
    }

    fn image_height(&self, image: ElementRef, available_width: f32) -> f32 {
        let el = image.value();
        let width = dimension(el.attr("width"));
        let height = dimension(el.attr("height"));
        let rendered_width = width
            .filter(|w| *w > 0.0)
            .map(|w| w.min(available_width))
            .unwrap_or(available_width);
        let aspect = match (width, height) {
            (Some(w), Some(h)) if w > 0.0 => h / w,
            _ => self.default_image_aspect,
        };
        rendered_width * aspect + self.block_spacing
    }

    fn table_height(&self, table: ElementRef, available_width: f32) -> f32 {
        let row_height: f32 = table
            .select(&TABLE_ROW)
            .map(|row| {
                let text = row.text().collect::<Vec<_>>().join(" ");
                self.line_count(&text, self.font_size, available_width).max(1) as f32
                    * self.font_size
                    * self.line_height
            })
            .sum();
        row_height + self.block_spacing
    }
}

impl Measure for TextMetrics {
    fn measure(&self, markup: &str, available_width: f32) -> Result<f32, MeasureError> {
        if !available_width.is_finite() || available_width <= 0.0 {
            return Err(MeasureError::new(format!(
                "available width must be positive, got {available_width}"
            )));
        }

        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();
        let Some(block) = root.children().find_map(ElementRef::wrap) else {
            // Bare text
            let text = root.text().collect::<String>();
            return Ok(self.text_height(&text, self.font_size, available_width));
        };

        let tag = block.value().name().to_ascii_lowercase();
        let text = block.text().collect::<Vec<_>>().join(" ");
        let height = match tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1).clamp(1, 6);
                let size = self.font_size * self.heading_scale[level - 1];
                self.text_height(&text, size, available_width)
            }
            "table" => self.table_height(block, available_width),
            "img" | "image" => self.image_height(block, available_width),
            _ => {
                // Inline images stack below the text, one block each
                let images: f32 = block
                    .select(&MEDIA)
                    .map(|image| self.image_height(image, available_width))
                    .sum();
                if text.trim().is_empty() {
                    images.max(self.block_spacing)
                } else {
                    self.text_height(&text, self.font_size, available_width) + images
                }
            }
        };
        Ok(height)
    }
}

fn dimension(value: Option<&str>) -> Option<f32> {
    value?.trim().trim_end_matches("px").trim().parse::<f32>().ok()
}
