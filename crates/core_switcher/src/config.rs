//! Switcher configuration.
//!
//! A [`SwitcherConfig`] is built once (usually from the daemon's TOML file) and
//! handed to a switcher as `Arc<SwitcherConfig>` at open time. A live switcher
//! never observes later changes; they take effect on the next open.

use serde::{Deserialize, Serialize};

use crate::tween::Easing;

/// Which layout family to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitcherStyle {
    /// Stacked 3D cover flow.
    #[default]
    #[serde(alias = "Coverflow")]
    Coverflow,
    /// Previews receding along a tilted line.
    #[serde(alias = "Timeline")]
    Timeline,
}

/// How the coverflow style crosses the ends of the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopingMethod {
    /// Two-phase flip of the whole stack at the boundary.
    #[default]
    #[serde(alias = "Flip Stack")]
    FlipStack,
    /// Fixed ring; no boundary exists.
    #[serde(alias = "Carousel")]
    Carousel,
}

/// Which workspaces contribute navigable windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceFilter {
    AllWorkspaces,
    #[default]
    CurrentWorkspace,
    /// All workspaces, windows of the current workspace ordered first.
    CurrentWorkspaceFirst,
}

/// Application icon placement on a preview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconStyle {
    /// No overlay icon.
    #[default]
    Classic,
    /// Icon drawn over the preview center.
    Overlay,
    /// Icon attached to the preview's bottom edge.
    Attached,
}

/// Where the selected window's title is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePosition {
    Top,
    #[default]
    Bottom,
    Hidden,
}

/// Complete switcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// Layout family.
    pub switcher_style: SwitcherStyle,
    /// Boundary behavior for the coverflow family.
    pub switcher_looping_method: LoopingMethod,
    /// Base animation duration in seconds.
    pub animation_time: f64,
    /// Per-step scale multiplier for previews away from the selection (0..1).
    pub preview_scaling_factor: f64,
    /// Size of a preview relative to the monitor (0..1).
    pub preview_to_monitor_ratio: f64,
    /// Workspace filtering applied at launch.
    pub current_workspace_only: WorkspaceFilter,
    /// Only offer windows on the active monitor.
    pub switch_per_monitor: bool,
    /// Randomize each preview's duration within [0.5x, 1x].
    pub randomize_animation_times: bool,
    /// Overlay icon style.
    pub icon_style: IconStyle,
    /// Overlay icon size in pixels.
    pub overlay_icon_size: u32,
    /// Brightness of non-selected previews (1.0 disables dimming).
    pub dim_factor: f64,
    /// Title label placement.
    pub title_position: TitlePosition,
    /// Vertical offset of the preview center in pixels.
    pub offset: i32,
    /// Mirror gesture progress.
    pub invert_swipes: bool,
    /// Application launches list every window instead of one per application.
    pub switch_application_behaves_like_switch_windows: bool,
    /// Easing curve name, e.g. `ease_out_quad`.
    pub easing: String,
    /// Seed for randomized durations; random when unset.
    pub random_seed: Option<u64>,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            switcher_style: SwitcherStyle::default(),
            switcher_looping_method: LoopingMethod::default(),
            animation_time: 0.2,
            preview_scaling_factor: 0.8,
            preview_to_monitor_ratio: 0.5,
            current_workspace_only: WorkspaceFilter::default(),
            switch_per_monitor: false,
            randomize_animation_times: false,
            icon_style: IconStyle::default(),
            overlay_icon_size: 128,
            dim_factor: 1.0,
            title_position: TitlePosition::default(),
            offset: 0,
            invert_swipes: false,
            switch_application_behaves_like_switch_windows: false,
            easing: "ease_out_quad".to_string(),
            random_seed: None,
        }
    }
}

/// A problem found (and corrected) while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    fn new(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
        }
    }
}

impl SwitcherConfig {
    /// Clamp out-of-range values to safe defaults.
    ///
    /// Returns one warning per corrected field; an empty list means the
    /// configuration was already valid.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !self.animation_time.is_finite() || self.animation_time < 0.0 {
            warnings.push(ConfigWarning::new(
                "switcher.animation_time",
                format!("{} is not a valid duration, using 0.2", self.animation_time),
            ));
            self.animation_time = 0.2;
        } else if self.animation_time > 5.0 {
            warnings.push(ConfigWarning::new(
                "switcher.animation_time",
                format!("{} exceeds 5 seconds, clamped", self.animation_time),
            ));
            self.animation_time = 5.0;
        }

        for (field, value) in [
            ("switcher.preview_scaling_factor", &mut self.preview_scaling_factor),
            ("switcher.preview_to_monitor_ratio", &mut self.preview_to_monitor_ratio),
            ("switcher.dim_factor", &mut self.dim_factor),
        ] {
            let current = *value;
            if !current.is_finite() {
                warnings.push(ConfigWarning::new(field, "not a number, using 1.0".to_string()));
                *value = 1.0;
            } else if !(0.0..=1.0).contains(&current) {
                let clamped = current.clamp(0.0, 1.0);
                warnings.push(ConfigWarning::new(
                    field,
                    format!("{} is outside 0..1, clamped to {}", current, clamped),
                ));
                *value = clamped;
            }
        }

        if self.overlay_icon_size == 0 {
            warnings.push(ConfigWarning::new(
                "switcher.overlay_icon_size",
                "must be positive, using 128".to_string(),
            ));
            self.overlay_icon_size = 128;
        }

        if Easing::parse(&self.easing).is_none() {
            warnings.push(ConfigWarning::new(
                "switcher.easing",
                format!("unknown easing '{}', using ease_out_quad", self.easing),
            ));
            self.easing = "ease_out_quad".to_string();
        }

        warnings
    }

    /// Base animation duration in milliseconds.
    pub fn animation_ms(&self) -> u32 {
        (self.animation_time.max(0.0) * 1000.0).round() as u32
    }

    /// Resolved easing curve; unknown names fall back with a warning.
    pub fn easing(&self) -> Easing {
        Easing::parse_or_default(&self.easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SwitcherConfig::default();
        assert_eq!(config.switcher_style, SwitcherStyle::Coverflow);
        assert_eq!(config.switcher_looping_method, LoopingMethod::FlipStack);
        assert_eq!(config.animation_ms(), 200);
        assert_eq!(config.current_workspace_only, WorkspaceFilter::CurrentWorkspace);
        assert!(!config.randomize_animation_times);
    }

    #[test]
    fn test_partial_parse_uses_defaults() {
        let config: SwitcherConfig = toml::from_str(
            r#"
            switcher_style = "timeline"
            animation_time = 0.5
        "#,
        )
        .unwrap();
        assert_eq!(config.switcher_style, SwitcherStyle::Timeline);
        assert_eq!(config.animation_ms(), 500);
        assert_eq!(config.preview_scaling_factor, 0.8);
    }

    #[test]
    fn test_settings_names_are_accepted() {
        let config: SwitcherConfig = toml::from_str(
            r#"
            switcher_style = "Coverflow"
            switcher_looping_method = "Flip Stack"
        "#,
        )
        .unwrap();
        assert_eq!(config.switcher_looping_method, LoopingMethod::FlipStack);

        let config: SwitcherConfig =
            toml::from_str(r#"switcher_looping_method = "Carousel""#).unwrap();
        assert_eq!(config.switcher_looping_method, LoopingMethod::Carousel);
    }

    #[test]
    fn test_validate_clamps_ratios() {
        let mut config = SwitcherConfig {
            preview_scaling_factor: 1.5,
            dim_factor: -0.2,
            ..Default::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 2);
        assert_eq!(config.preview_scaling_factor, 1.0);
        assert_eq!(config.dim_factor, 0.0);
    }

    #[test]
    fn test_validate_unknown_easing() {
        let mut config = SwitcherConfig {
            easing: "wobbly".to_string(),
            ..Default::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "switcher.easing");
        assert_eq!(config.easing, "ease_out_quad");
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let mut config = SwitcherConfig::default();
        assert!(config.validate().is_empty());
    }
}
