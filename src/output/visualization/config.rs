//! Plot configuration for titration charts

use plotters::prelude::*;

/// Configuration for customizing titration curve charts
///
/// # Fields
///
/// - `width`, `height`: Dimensions in pixels
/// - `title`: Chart title (empty: use the curve's own title)
/// - `xlabel`, `ylabel`: Axis labels (empty: derived from the curve labels)
/// - `curve_color`: Theoretical curve
/// - `equivalence_color`: Equivalence line, marker and tolerance band
/// - `reading_color`: Student reading line and error annotation
/// - `background`: Background color
/// - `line_width`: Line thickness in pixels
/// - `show_grid`: Whether to show grid lines
/// - `show_legend`: Whether to draw the series legend
///
/// # Example
///
/// ```rust,ignore
/// use titra_rs::output::visualization::PlotConfig;
///
/// let mut config = PlotConfig::titration_curve("Volhard, group B");
/// config.width = 1920;
/// config.height = 1080;
/// ```
#[derive(Clone, Debug)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1020)
    pub width: u32,

    /// Image height in pixels (default: 600)
    pub height: u32,

    pub title: String,

    pub xlabel: String,

    pub ylabel: String,

    /// Theoretical curve color (default: #2563EB)
    pub curve_color: RGBColor,

    /// Equivalence color (default: #16A34A)
    pub equivalence_color: RGBColor,

    /// Reading color (default: #DC2626)
    pub reading_color: RGBColor,

    /// Opacity of the tolerance band fill (default: 0.13)
    pub band_opacity: f64,

    /// Background color (default: WHITE)
    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    /// Show grid lines (default: true)
    pub show_grid: bool,

    /// Show legend (default: true)
    pub show_legend: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1020,
            height: 600,
            title: String::new(),
            xlabel: String::new(),
            ylabel: String::new(),
            curve_color: RGBColor(0x25, 0x63, 0xEB),
            equivalence_color: RGBColor(0x16, 0xA3, 0x4A),
            reading_color: RGBColor(0xDC, 0x26, 0x26),
            band_opacity: 0.13,
            background: WHITE,
            line_width: 2,
            show_grid: true,
            show_legend: true,
        }
    }
}

/// Helper trait to accept both `String` and `None` for optional titles
pub trait IntoOptionalTitle {
    fn into_optional_title(self) -> Option<String>;
}

impl IntoOptionalTitle for &str {
    fn into_optional_title(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoOptionalTitle for String {
    fn into_optional_title(self) -> Option<String> {
        Some(self)
    }
}

impl<T: IntoOptionalTitle> IntoOptionalTitle for Option<T> {
    fn into_optional_title(self) -> Option<String> {
        self.and_then(|t| t.into_optional_title())
    }
}

/// Constant for no title (the curve's title will be used)
///
/// # Example
///
/// ```rust,ignore
/// let config = PlotConfig::titration_curve(NO_TITLE);
/// ```
pub const NO_TITLE: Option<&str> = None;

impl PlotConfig {
    /// Create config for a titration curve with optional custom title
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let config = PlotConfig::titration_curve("Water hardness");
    /// let config = PlotConfig::titration_curve(format!("Session {}", id));
    ///
    /// // With the curve's own title
    /// let config = PlotConfig::titration_curve(NO_TITLE);
    /// ```
    pub fn titration_curve(title: impl IntoOptionalTitle) -> Self {
        Self {
            title: title.into_optional_title().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Builder pattern: set the image size
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "image size must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        if !(0.0..=1.0).contains(&self.band_opacity) {
            return Err(format!("band opacity must be in [0, 1], got {}", self.band_opacity));
        }
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_config_default() {
        let config = PlotConfig::default();
        assert_eq!(config.width, 1020);
        assert_eq!(config.height, 600);
        assert!(config.show_grid);
        assert!(config.title.is_empty());
    }

    #[test]
    fn test_titration_curve_title() {
        assert_eq!(PlotConfig::titration_curve("Volhard").title, "Volhard");
        assert_eq!(PlotConfig::titration_curve(String::from("EDTA")).title, "EDTA");
        assert!(PlotConfig::titration_curve(NO_TITLE).title.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(PlotConfig::default().validate().is_ok());
        assert!(PlotConfig::default().size(0, 10).validate().is_err());
        let mut config = PlotConfig::default();
        config.band_opacity = 1.5;
        assert!(config.validate().is_err());
    }
}
