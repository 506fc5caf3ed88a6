//! Documentation-text parsing for schema derivation.
//!
//! Extracts a tool description and per-parameter descriptions from the doc
//! text attached to a callable. Three layouts are understood:
//!
//! ```text
//! Rustdoc:                 Sphinx:                  Google:
//! Get the weather.         Get the weather.         Get the weather.
//!
//! # Arguments              :param location: City    Args:
//!                                                       location (str): City
//! * `location` - City
//! ```

use indexmap::IndexMap;

/// Descriptions extracted from documentation text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocs {
    /// Leading paragraph(s), before any section or tag.
    pub description: String,
    /// Parameter name to description, in the order documented.
    pub params: IndexMap<String, String>,
}

impl ParsedDocs {
    /// Description for a parameter, empty if undocumented.
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    RustArgs,
    GoogleArgs,
    Other,
}

/// Parse documentation text.
#[must_use]
pub fn parse_docs(text: &str) -> ParsedDocs {
    let mut docs = ParsedDocs::default();
    let mut summary: Vec<Vec<&str>> = vec![Vec::new()];
    let mut section = Section::Summary;
    let mut last_param: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim();

        if let Some(heading) = rust_heading(line) {
            section = match heading.to_ascii_lowercase().as_str() {
                "arguments" | "parameters" | "args" | "params" => Section::RustArgs,
                _ => Section::Other,
            };
            last_param = None;
            continue;
        }
        if is_google_header(raw) {
            section = match line.trim_end_matches(':').to_ascii_lowercase().as_str() {
                "args" | "arguments" | "parameters" => Section::GoogleArgs,
                _ => Section::Other,
            };
            last_param = None;
            continue;
        }
        if let Some((name, desc)) = sphinx_param(line) {
            section = Section::Other;
            docs.params.insert(name.to_string(), desc.to_string());
            last_param = Some(name.to_string());
            continue;
        }
        if line.starts_with(':') {
            // Some other Sphinx field (:returns:, :raises:, ...)
            section = Section::Other;
            last_param = None;
            continue;
        }

        match section {
            Section::Summary => {
                if line.is_empty() {
                    if summary.last().is_some_and(|p| !p.is_empty()) {
                        summary.push(Vec::new());
                    }
                } else if let Some(current) = summary.last_mut() {
                    current.push(line);
                }
            }
            Section::RustArgs => {
                if let Some((name, desc)) = rust_bullet(line) {
                    docs.params.insert(name.to_string(), desc.to_string());
                    last_param = Some(name.to_string());
                } else if !line.is_empty() {
                    append(&mut docs.params, last_param.as_deref(), line);
                } else {
                    last_param = None;
                }
            }
            Section::GoogleArgs => {
                let indented = raw.starts_with(' ') || raw.starts_with('\t');
                if line.is_empty() {
                    continue;
                }
                if !indented {
                    section = Section::Other;
                    last_param = None;
                    continue;
                }
                match google_param(line) {
                    Some((name, desc)) if last_param.is_none() || !is_deeper(raw, text) => {
                        docs.params.insert(name.to_string(), desc.to_string());
                        last_param = Some(name.to_string());
                    }
                    _ => append(&mut docs.params, last_param.as_deref(), line),
                }
            }
            Section::Other => {
                if !line.is_empty() {
                    append(&mut docs.params, last_param.as_deref(), line);
                } else {
                    last_param = None;
                }
            }
        }
    }

    docs.description = summary
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n");
    docs
}

/// Whether `raw` is indented deeper than the first entry of its block, which
/// marks a continuation line rather than a new parameter.
fn is_deeper(raw: &str, text: &str) -> bool {
    let indent = |s: &str| s.len() - s.trim_start().len();
    let mut in_block = false;
    for line in text.lines() {
        if is_google_header(line) {
            in_block = true;
            continue;
        }
        if in_block && !line.trim().is_empty() {
            return indent(raw) > indent(line);
        }
    }
    false
}

fn append(params: &mut IndexMap<String, String>, name: Option<&str>, line: &str) {
    if let Some(desc) = name.and_then(|n| params.get_mut(n)) {
        if !desc.is_empty() {
            desc.push(' ');
        }
        desc.push_str(line);
    }
}

fn rust_heading(line: &str) -> Option<&str> {
    let stripped = line.trim_start_matches('#');
    if stripped.len() == line.len() || !stripped.starts_with(' ') {
        return None;
    }
    Some(stripped.trim())
}

fn is_google_header(raw: &str) -> bool {
    if raw.starts_with(' ') || raw.starts_with('\t') {
        return false;
    }
    let line = raw.trim();
    matches!(
        line,
        "Args:"
            | "Arguments:"
            | "Parameters:"
            | "Returns:"
            | "Raises:"
            | "Yields:"
            | "Examples:"
            | "Example:"
            | "Note:"
            | "Notes:"
    )
}

/// `:param name: text` or `:param type name: text`.
fn sphinx_param(line: &str) -> Option<(&str, &str)> {
    let rest = line
        .strip_prefix(":param ")
        .or_else(|| line.strip_prefix(":parameter "))?;
    let (head, desc) = rest.split_once(':')?;
    let name = head.split_whitespace().last()?;
    Some((name, desc.trim()))
}

/// `* `name` - text`, `- name: text` and similar bullet forms.
fn rust_bullet(line: &str) -> Option<(&str, &str)> {
    let rest = line
        .strip_prefix("* ")
        .or_else(|| line.strip_prefix("- "))?
        .trim_start();

    let (name, tail) = if let Some(inner) = rest.strip_prefix('`') {
        let end = inner.find('`')?;
        (&inner[..end], &inner[end + 1..])
    } else {
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (&rest[..end], &rest[end..])
    };
    if name.is_empty() {
        return None;
    }

    let desc = tail
        .trim_start()
        .trim_start_matches(['-', ':', '\u{2013}'])
        .trim();
    Some((name, desc))
}

/// `name: text` or `name (type): text`.
fn google_param(line: &str) -> Option<(&str, &str)> {
    let (head, desc) = line.split_once(':')?;
    let name = head.split('(').next()?.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '*') {
        return None;
    }
    Some((name.trim_start_matches('*'), desc.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rustdoc_arguments() {
        let docs = parse_docs(
            "Get the current weather.\n\
             \n\
             # Arguments\n\
             \n\
             * `location` - City and country\n\
             * `units` - Unit system,\n  metric or imperial\n\
             \n\
             # Errors\n\
             Fails when offline.",
        );

        assert_eq!(docs.description, "Get the current weather.");
        assert_eq!(docs.param("location"), "City and country");
        assert_eq!(docs.param("units"), "Unit system, metric or imperial");
        assert_eq!(docs.params.len(), 2);
    }

    #[test]
    fn test_sphinx_params() {
        let docs = parse_docs(
            "Search the index.\n\n:param query: Search text\n:param int limit: Max hits\n:returns: hits",
        );

        assert_eq!(docs.description, "Search the index.");
        assert_eq!(docs.param("query"), "Search text");
        assert_eq!(docs.param("limit"), "Max hits");
    }

    #[test]
    fn test_google_args() {
        let docs = parse_docs(
            "Send a message.\n\nArgs:\n    to (str): Recipient\n    body: Message text\n        spanning lines\n\nReturns:\n    Delivery id",
        );

        assert_eq!(docs.description, "Send a message.");
        assert_eq!(docs.param("to"), "Recipient");
        assert_eq!(docs.param("body"), "Message text spanning lines");
        assert_eq!(docs.params.len(), 2);
    }

    #[test]
    fn test_multi_paragraph_description() {
        let docs = parse_docs("First line\ncontinues.\n\nSecond paragraph.");
        assert_eq!(docs.description, "First line continues.\n\nSecond paragraph.");
        assert!(docs.params.is_empty());
    }

    #[test]
    fn test_empty_docs() {
        let docs = parse_docs("");
        assert_eq!(docs, ParsedDocs::default());
        assert_eq!(docs.param("anything"), "");
    }
}
