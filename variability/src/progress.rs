use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

const BAR_TEMPLATE: &str = "{msg:<30} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

///
/// Options for the progress bars shown while computing metrics
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressOptions {
    /// Do not draw any progress bars
    pub hidden: bool,
}

impl ProgressOptions {
    /// Progress options that never draw anything
    pub fn hidden() -> Self {
        ProgressOptions { hidden: true }
    }

    ///
    /// Create a progress bar with `len` steps, labelled with `message`
    ///
    /// Returns a hidden bar if progress output is disabled
    ///
    pub fn bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.hidden {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .map(|style| style.progress_chars("█▓▒░  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(len)
            .with_style(style)
            .with_message(message.to_string())
    }
}
