//! String template rendering utilities.
//!
//! Placeholders use the `{{key}}` form. Keys may contain dots (`{{user.name}}`).

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("Invalid placeholder pattern")
    })
}

/// Replace every known `{{key}}` in a single pass.
///
/// Substituted values are not scanned again, and unknown keys are left verbatim.
pub fn render_map(template: &str, variables: &BTreeMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| match variables.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Keys of all `{{key}}` markers in the template, in order of appearance, deduplicated.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in placeholder_pattern().captures_iter(template) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Keys still present as `{{key}}` markers after rendering.
pub fn unresolved(rendered: &str) -> Vec<String> {
    placeholders(rendered)
}
