//! Selection-set composition and query template rendering.

use std::collections::HashMap;

/// Placeholder for the composed selection inside a template.
pub const FIELDS_PLACEHOLDER: &str = "${fields}";

const FIELDS_NAME: &str = "fields";

/// Build the comma-separated selection for a query.
///
/// With no requested fields (or an empty list) the whole whitelist is used
/// in declared order. Otherwise requested fields keep the caller's order and
/// names outside the whitelist are dropped. A field with an entry in
/// `fragments` is followed directly by that sub-selection.
pub fn compose_selection(
    requested: Option<&[&str]>,
    whitelist: &[String],
    fragments: &HashMap<String, String>,
) -> String {
    let selected: Vec<&str> = match requested {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .copied()
            .filter(|f| whitelist.iter().any(|w| w == f))
            .collect(),
        _ => whitelist.iter().map(String::as_str).collect(),
    };

    selected
        .into_iter()
        .map(|field| match fragments.get(field) {
            Some(fragment) => format!("{}{}", field, fragment),
            None => field.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Fixed outer query text with `${name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate<'a> {
    text: &'a str,
}

impl<'a> QueryTemplate<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Substitute identifiers and the selection, then strip line breaks so the
    /// query fits on one line of the JSON envelope.
    ///
    /// The template is scanned once; substituted text is never expanded
    /// again. Unknown placeholders are kept verbatim.
    pub fn render(&self, vars: &[(&str, String)], selection: &str) -> String {
        let mut query = String::with_capacity(self.text.len() + selection.len());
        let mut rest = self.text;
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                break;
            };
            let name = &after[..end];
            query.push_str(&rest[..start]);
            if name == FIELDS_NAME {
                query.push_str(selection);
            } else if let Some((_, value)) = vars.iter().find(|(n, _)| *n == name) {
                query.push_str(&escape_string(value));
            } else {
                query.push_str(&rest[start..start + end + 3]);
            }
            rest = &after[end + 1..];
        }
        query.push_str(rest);
        query.retain(|c| c != '\n' && c != '\r');
        query
    }

    pub fn placeholders(&self) -> Vec<&'a str> {
        let mut names = Vec::new();
        let mut rest = self.text;
        while let Some(start) = rest.find("${") {
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    names.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        names
    }
}

/// Escape a value for use inside a GraphQL string literal.
fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
