//! Reader configuration

use crate::error::ConfigError;
use crate::paginate::{PaginationConfig, TextMetrics};
use crate::types::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Page geometry, mirroring the paged view's CSS variables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Margin around the page on every side
    pub page_margin: f32,
    pub min_page_width: f32,
    pub min_page_height: f32,
    pub max_page_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_margin: 20.0,
            min_page_width: 300.0,
            min_page_height: 400.0,
            max_page_width: 800.0,
        }
    }
}

impl LayoutConfig {
    /// Width and height budget of a page inside `viewport`
    pub fn page_box(&self, viewport: Viewport) -> (f32, f32) {
        let width = (viewport.width - 2.0 * self.page_margin)
            .min(self.max_page_width)
            .max(self.min_page_width);
        let height = (viewport.height - 2.0 * self.page_margin).max(self.min_page_height);
        (width, height)
    }
}

/// Everything the reader pipeline can be tuned with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    pub pagination: PaginationConfig,
    pub layout: LayoutConfig,
    pub metrics: TextMetrics,

    /// Quiet period before a burst of resize events triggers re-pagination
    pub resize_debounce_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            pagination: PaginationConfig::default(),
            layout: LayoutConfig::default(),
            metrics: TextMetrics::default(),
            resize_debounce_ms: 250,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from a JSON file; a missing file yields defaults
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Self::from_json(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Reject values that would make pagination meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pagination;
        if !(p.overflow_tolerance_factor >= 1.0) {
            return Err(ConfigError::Invalid {
                field: "pagination.overflow_tolerance_factor",
                reason: format!("must be at least 1.0, got {}", p.overflow_tolerance_factor),
            });
        }
        if !(p.horizontal_inset >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "pagination.horizontal_inset",
                reason: "must not be negative".to_string(),
            });
        }

        let m = &self.metrics;
        for (field, value) in [
            ("metrics.font_size", m.font_size),
            ("metrics.line_height", m.line_height),
            ("metrics.average_char_width", m.average_char_width),
            ("metrics.default_image_aspect", m.default_image_aspect),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }

        let l = &self.layout;
        if l.min_page_width > l.max_page_width {
            return Err(ConfigError::Invalid {
                field: "layout.min_page_width",
                reason: "must not exceed layout.max_page_width".to_string(),
            });
        }
        Ok(())
    }
}
