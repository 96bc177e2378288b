use askama::Result;

use crate::format::MISSING;

// Renders the placeholder for blank cells. Usable as `|or_dash` in templates.
#[allow(clippy::unnecessary_wraps)]
pub fn or_dash<T: std::fmt::Display>(value: T) -> Result<String> {
    let text = value.to_string();
    if text.trim().is_empty() {
        Ok(MISSING.to_string())
    } else {
        Ok(text)
    }
}
