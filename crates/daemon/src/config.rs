//! Configuration management for the coverswitch daemon.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. The platform config directory, e.g. `$XDG_CONFIG_HOME/coverswitch/config.toml`
//! 2. `~/.config/coverswitch/config.toml`
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use coverswitch_core::{ConfigWarning, SwitcherConfig};
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log levels accepted by `behavior.log_level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Switcher appearance and behavior.
    pub switcher: SwitcherConfig,
    /// Daemon behavior.
    pub behavior: BehaviorConfig,
    /// IPC endpoint.
    pub ipc: IpcConfig,
    /// Rules excluding windows from the switcher.
    #[serde(default)]
    pub window_rules: Vec<WindowRule>,
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// IPC configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Socket path; defaults to `$XDG_RUNTIME_DIR/coverswitch.sock`.
    pub socket_path: Option<PathBuf>,
}

impl IpcConfig {
    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(coverswitch_ipc::default_socket_path)
    }
}

// ============================================================================
// Window Rules
// ============================================================================

/// A rule for per-window behavior.
///
/// Window rules are evaluated in order; the first matching rule wins.
///
/// # Example Config
///
/// ```toml
/// [[window_rules]]
/// match_title = ".*Picture-in-Picture.*"
/// action = "ignore"
///
/// [[window_rules]]
/// match_app = "org.gnome.Shell.Extensions"
/// action = "ignore"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRule {
    /// Regex pattern to match the window title.
    #[serde(default)]
    pub match_title: Option<String>,

    /// Application identifier to match exactly.
    #[serde(default)]
    pub match_app: Option<String>,

    /// Action to take when the rule matches.
    #[serde(default)]
    pub action: WindowAction,
}

/// Action to take for a matching window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAction {
    /// Offer the window normally.
    #[default]
    Show,
    /// Keep the window out of the switcher.
    Ignore,
}

/// A window rule with its title pattern compiled.
#[derive(Debug, Clone)]
struct CompiledRule {
    title: Option<Regex>,
    app: Option<String>,
    action: WindowAction,
}

impl CompiledRule {
    /// All specified criteria must match; a rule without criteria matches nothing.
    fn matches(&self, title: &str, app: &str) -> bool {
        if self.title.is_none() && self.app.is_none() {
            return false;
        }
        if let Some(ref re) = self.title {
            if !re.is_match(title) {
                return false;
            }
        }
        if let Some(ref expected) = self.app {
            if expected != app {
                return false;
            }
        }
        true
    }
}

/// Ordered, compiled window rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile rules, skipping those with an invalid title pattern.
    pub fn compile(rules: &[WindowRule]) -> (Self, Vec<ConfigWarning>) {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut warnings = Vec::new();

        for (i, rule) in rules.iter().enumerate() {
            let title = match rule.match_title.as_deref().map(Regex::new).transpose() {
                Ok(title) => title,
                Err(e) => {
                    warnings.push(ConfigWarning {
                        field: format!("window_rules[{}].match_title", i),
                        message: format!("invalid regex, rule skipped: {}", e),
                    });
                    continue;
                }
            };
            compiled.push(CompiledRule {
                title,
                app: rule.match_app.clone(),
                action: rule.action,
            });
        }

        (Self { rules: compiled }, warnings)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Action of the first rule matching the window, if any.
    pub fn action_for(&self, title: &str, app: &str) -> Option<WindowAction> {
        self.rules
            .iter()
            .find(|rule| rule.matches(title, app))
            .map(|rule| rule.action)
    }

    pub fn is_ignored(&self, title: &str, app: &str) -> bool {
        self.action_for(title, app) == Some(WindowAction::Ignore)
    }
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Correct invalid values in place and report what was changed.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = self.switcher.validate();

        let level = self.behavior.log_level.to_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.behavior.log_level = level;
        } else {
            warnings.push(ConfigWarning {
                field: "behavior.log_level".to_string(),
                message: format!(
                    "unknown level '{}', using 'info'",
                    self.behavior.log_level
                ),
            });
            self.behavior.log_level = default_log_level();
        }

        warnings
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("org", "coverswitch", "coverswitch") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    if let Some(home) = dirs_home() {
        let unix_style = home.join(".config").join("coverswitch").join("config.toml");
        if !paths.contains(&unix_style) {
            paths.push(unix_style);
        }
    }

    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverswitch_core::{LoopingMethod, SwitcherStyle, WorkspaceFilter};

    fn rule(title: Option<&str>, app: Option<&str>, action: WindowAction) -> WindowRule {
        WindowRule {
            match_title: title.map(str::to_string),
            match_app: app.map(str::to_string),
            action,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.behavior.log_level, "info");
        assert_eq!(config.switcher, SwitcherConfig::default());
        assert!(config.ipc.socket_path.is_none());
        assert!(config.window_rules.is_empty());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.switcher, config.switcher);
        assert_eq!(parsed.behavior.log_level, config.behavior.log_level);
    }

    #[test]
    fn test_config_partial_parse() {
        let toml_str = r#"
            [switcher]
            switcher_style = "timeline"
            animation_time = 0.35

            [behavior]
            log_level = "debug"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.switcher.switcher_style, SwitcherStyle::Timeline);
        assert_eq!(config.switcher.animation_time, 0.35);
        assert_eq!(config.switcher.switcher_looping_method, LoopingMethod::default());
        assert_eq!(config.switcher.current_workspace_only, WorkspaceFilter::default());
        assert_eq!(config.behavior.log_level, "debug");
    }

    #[test]
    fn test_socket_path_override() {
        let config: Config = toml::from_str(
            r#"
            [ipc]
            socket_path = "/tmp/custom.sock"
        "#,
        )
        .unwrap();
        assert_eq!(config.ipc.socket_path(), PathBuf::from("/tmp/custom.sock"));

        let default = IpcConfig::default().socket_path();
        assert!(default.ends_with(coverswitch_ipc::SOCKET_NAME));
    }

    #[test]
    fn test_validate_resets_unknown_log_level() {
        let mut config = Config::default();
        config.behavior.log_level = "LOUD".to_string();
        let warnings = config.validate();
        assert_eq!(config.behavior.log_level, "info");
        assert!(warnings.iter().any(|w| w.field == "behavior.log_level"));
    }

    #[test]
    fn test_validate_normalizes_log_level_case() {
        let mut config = Config::default();
        config.behavior.log_level = "DEBUG".to_string();
        assert!(config.validate().is_empty());
        assert_eq!(config.behavior.log_level, "debug");
    }

    #[test]
    fn test_validate_includes_switcher_warnings() {
        let mut config = Config::default();
        config.switcher.animation_time = -1.0;
        let warnings = config.validate();
        assert!(!warnings.is_empty());
        assert!(config.switcher.animation_time >= 0.0);
    }

    #[test]
    fn test_config_paths_not_empty() {
        let paths = config_paths();
        assert!(!paths.is_empty());
        assert_eq!(paths.last(), Some(&PathBuf::from("config.toml")));
    }

    #[test]
    fn test_window_rule_matches_title_regex() {
        let (rules, warnings) =
            RuleSet::compile(&[rule(Some(".*Picture-in-Picture.*"), None, WindowAction::Ignore)]);
        assert!(warnings.is_empty());

        assert!(rules.is_ignored("Picture-in-Picture", "firefox"));
        assert!(!rules.is_ignored("Mozilla Firefox", "firefox"));
    }

    #[test]
    fn test_window_rule_matches_app_exactly() {
        let (rules, _) =
            RuleSet::compile(&[rule(None, Some("org.gnome.Nautilus"), WindowAction::Ignore)]);

        assert!(rules.is_ignored("Home", "org.gnome.Nautilus"));
        assert!(!rules.is_ignored("Home", "org.gnome.nautilus"));
        assert!(!rules.is_ignored("Home", "org.gnome.Nautilus.Preview"));
    }

    #[test]
    fn test_window_rule_matches_combined() {
        let (rules, _) = RuleSet::compile(&[rule(
            Some("^DevTools"),
            Some("chromium"),
            WindowAction::Ignore,
        )]);

        assert!(rules.is_ignored("DevTools - localhost", "chromium"));
        assert!(!rules.is_ignored("DevTools - localhost", "firefox"));
        assert!(!rules.is_ignored("Chromium", "chromium"));
    }

    #[test]
    fn test_window_rule_no_criteria_matches_nothing() {
        let (rules, _) = RuleSet::compile(&[rule(None, None, WindowAction::Ignore)]);
        assert_eq!(rules.len(), 1);
        assert!(!rules.is_ignored("Any Title", "any"));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let (rules, _) = RuleSet::compile(&[
            rule(None, Some("mail"), WindowAction::Show),
            rule(Some(".*"), None, WindowAction::Ignore),
        ]);

        assert_eq!(rules.action_for("Inbox", "mail"), Some(WindowAction::Show));
        assert!(!rules.is_ignored("Inbox", "mail"));
        assert!(rules.is_ignored("Terminal", "terminal"));
    }

    #[test]
    fn test_invalid_regex_is_skipped_with_warning() {
        let (rules, warnings) = RuleSet::compile(&[
            rule(Some("([unclosed"), None, WindowAction::Ignore),
            rule(None, Some("chat"), WindowAction::Ignore),
        ]);

        assert_eq!(rules.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "window_rules[0].match_title");
        assert!(rules.is_ignored("Chat", "chat"));
    }

    #[test]
    fn test_window_rule_config_parse() {
        let toml_str = r#"
            [[window_rules]]
            match_title = ".*dialog.*"
            action = "ignore"

            [[window_rules]]
            match_app = "mail"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.window_rules.len(), 2);

        assert_eq!(config.window_rules[0].match_title, Some(".*dialog.*".to_string()));
        assert_eq!(config.window_rules[0].action, WindowAction::Ignore);

        assert_eq!(config.window_rules[1].match_app, Some("mail".to_string()));
        assert_eq!(config.window_rules[1].action, WindowAction::Show);
    }

    #[test]
    fn test_load_from_path() {
        let path =
            std::env::temp_dir().join(format!("coverswitch-config-{}.toml", std::process::id()));
        fs::write(&path, "[switcher]\ndim_factor = 0.6\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.switcher.dim_factor, 0.6);

        fs::remove_file(&path).unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }
}
