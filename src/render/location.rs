//! Location-block rendering.

use std::fmt;

/// Location selector modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationModifier {
    /// `=`: exact match.
    Exact,
    /// `~`: case-sensitive regex match.
    Regex,
}

impl fmt::Display for LocationModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationModifier::Exact => f.write_str("="),
            LocationModifier::Regex => f.write_str("~"),
        }
    }
}

/// The single directive inside a routing block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationDirective {
    /// `proxy_pass <endpoint>;`
    ProxyPass(String),
    /// `return <code>;`
    Return(u16),
    /// `return <code> <url>;`
    ReturnUrl { code: u16, url: String },
}

impl fmt::Display for LocationDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationDirective::ProxyPass(endpoint) => write!(f, "proxy_pass {endpoint};"),
            LocationDirective::Return(code) => write!(f, "return {code};"),
            LocationDirective::ReturnUrl { code, url } => write!(f, "return {code} {url};"),
        }
    }
}

/// A `location` block holding exactly one directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationBlock {
    pub modifier: Option<LocationModifier>,
    pub path: String,
    pub directive: LocationDirective,
}

impl LocationBlock {
    /// The selector between `location` and `{`, e.g. `= /health`.
    pub fn key(&self) -> String {
        match self.modifier {
            Some(modifier) => format!("{modifier} {}", self.path),
            None => self.path.clone(),
        }
    }

    pub fn render(&self) -> String {
        format!("location {} {{\n    {}\n}}\n", self.key(), self.directive)
    }
}
