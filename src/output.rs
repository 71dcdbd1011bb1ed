//! # Output Styling
//!
//! Decides whether the CLI styles its output and applies `console` styles
//! accordingly.
//!
//! Honoured, in order:
//! - `--color=always|never` on the command line
//! - `NO_COLOR` (any value, see https://no-color.org/)
//! - `CLICOLOR=0` and `CLICOLOR_FORCE=1`
//! - `TERM=dumb`
//! - whether stdout is a terminal

use std::env;
use std::fmt::Display;

use console::Style;

/// Output configuration for one CLI invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Builds the configuration from the `--color` flag value and the
    /// environment. Unknown flag values behave like `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_ascii_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => color_from_env(),
        };
        Self { use_color }
    }

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Section headings.
    pub fn heading(&self, text: impl Display) -> String {
        self.paint(Style::new().bold(), text)
    }

    /// Names of units, recipes and bundles.
    pub fn name(&self, text: impl Display) -> String {
        self.paint(Style::new().cyan(), text)
    }

    /// Secondary detail such as versions and paths.
    pub fn detail(&self, text: impl Display) -> String {
        self.paint(Style::new().dim(), text)
    }

    pub fn success(&self, text: impl Display) -> String {
        self.paint(Style::new().green(), text)
    }

    fn paint(&self, style: Style, text: impl Display) -> String {
        style.force_styling(self.use_color).apply_to(text).to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

fn color_from_env() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
        return false;
    }
    if env::var("CLICOLOR_FORCE").is_ok_and(|v| !v.is_empty() && v != "0") {
        return true;
    }
    if env::var("TERM").is_ok_and(|v| v == "dumb") {
        return false;
    }
    console::Term::stdout().features().colors_supported()
}
