use std::fmt;

/// How a page object finds one of its elements
///
/// Locators are resolved against the live DOM on every use, so a handle never
/// outlives a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Element `id` attribute
    Id(&'static str),
    /// Any CSS selector
    Css(&'static str),
}

impl Locator {
    /// CSS selector passed to the browser
    pub fn selector(&self) -> String {
        match self {
            Locator::Id(id) => format!("[id=\"{}\"]", id),
            Locator::Css(css) => css.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Css(css) => write!(f, "css={}", css),
        }
    }
}
