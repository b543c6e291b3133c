//! Terminal styling utilities
//!
//! Consistent colors for `datasync status` output.
//! Uses crossterm for cross-platform terminal colors.

use crate::capture::Disposition;
use crossterm::style::{StyledContent, Stylize};

/// Disposition colors
/// - incomplete: Dim (still recording)
/// - completed_normal: Green
/// - completed_critical: Red
pub fn disposition_style(disposition: Disposition) -> StyledContent<String> {
    let label = disposition.to_string();
    match disposition {
        Disposition::Incomplete => label.dark_grey(),
        Disposition::CompletedNormal => label.green(),
        Disposition::CompletedCritical => label.red().bold(),
    }
}

/// Disposition indicator (circle)
pub fn disposition_indicator(disposition: Disposition) -> StyledContent<&'static str> {
    match disposition {
        Disposition::Incomplete => "◐".dark_grey(),
        Disposition::CompletedNormal => "○".green(),
        Disposition::CompletedCritical => "●".red(),
    }
}

/// Count styling
/// - Zero: Dim
/// - Positive: Yellow (needs attention)
pub fn count_warning(n: usize) -> StyledContent<String> {
    if n == 0 {
        n.to_string().dark_grey()
    } else {
        n.to_string().yellow()
    }
}

/// Section header style
pub fn header(text: &str) -> StyledContent<String> {
    text.to_string().cyan().bold()
}

/// Dim text for secondary info
pub fn dim(text: &str) -> StyledContent<String> {
    text.to_string().dark_grey()
}
