//! Pre-assembly content checks on raw component markup.
//!
//! Both gates are shallow text patterns rather than a markup parse, so they
//! trigger on the same inputs regardless of how well-formed the HTML is.

use regex::Regex;
use std::sync::OnceLock;

/// Message shown when markup references an external script file.
pub const EXTERNAL_SCRIPT_MESSAGE: &str = concat!(
    "<h2>Script tags to external files are not allowed</h2>",
    "<p>Script tags to external files cannot be placed in your templates. ",
    "If you need to reference some assets, please list them in the \"assets\" ",
    "array of the widget.json file.</p>"
);

/// Message shown when markup declares an `id` attribute.
pub const ID_ATTRIBUTE_MESSAGE: &str = concat!(
    "<h2>ID attributes are not allowed</h2>",
    "<p>HTML tags cannot contain the \"id\" attribute, because it might conflict ",
    "if your widget gets added twice to a page. Please consider using classes instead.</p>"
);

/// A content check that rejected some markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateViolation {
    /// A `<script>` tag with a `src` attribute.
    ExternalScript,
    /// A tag carrying an `id` attribute.
    IdAttribute,
}

impl GateViolation {
    /// The explanatory HTML returned to the browser.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ExternalScript => EXTERNAL_SCRIPT_MESSAGE,
            Self::IdAttribute => ID_ATTRIBUTE_MESSAGE,
        }
    }
}

fn external_script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<script.+src=".+".+>"#).expect("valid regex"))
}

fn id_attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<.+ id=".+".*>"#).expect("valid regex"))
}

/// Reject markup containing a script tag that loads an external file.
pub fn check_external_scripts(markup: &str) -> Result<(), GateViolation> {
    if external_script_pattern().is_match(markup) {
        return Err(GateViolation::ExternalScript);
    }
    Ok(())
}

/// Reject markup containing a tag with an `id` attribute.
pub fn check_id_attributes(markup: &str) -> Result<(), GateViolation> {
    if id_attribute_pattern().is_match(markup) {
        return Err(GateViolation::IdAttribute);
    }
    Ok(())
}

/// Run both gates, external scripts first.
pub fn check_all(markup: &str) -> Result<(), GateViolation> {
    check_external_scripts(markup)?;
    check_id_attributes(markup)
}
