//! Helpers for rendering answer text

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Legacy citation marker, e.g. `##3$$`
static OLD_REFERENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#{2}(\d+)\${2}").unwrap());

/// Rewrite legacy citation markers `##N$$` into the current `~~N==` form.
pub fn replace_text_by_old_reg(text: &str) -> Cow<'_, str> {
    OLD_REFERENCE_MARKER.replace_all(text, |caps: &Captures| format!("~~{}==", &caps[1]))
}
