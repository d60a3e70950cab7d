//! # Prompt
//!
//! Lays out injected knowledge entries as text for a prompt assembler.
//!
//! ## Format
//!
//! - **Entry block**: optional timestamp line, `## {title}`, optional detail lines
//!   (keywords, synonyms), then the body
//! - **Section**: blocks of the same kind joined with a separator (default a horizontal rule)
//! - **Grouped section**: blocks grouped under `### {label}` subsection headings
//! - **Template**: `{{name}}` placeholders substituted; unknown placeholders become empty
//!
//! ## Usage
//!
//! Used by the `trigger` crate's injection builder. Pure functions; no I/O.
//!
//! ## External interactions
//!
//! - **Prompt assembly**: Output is spliced into the system prompt of an LLM call.

/// Default separator between blocks of the same kind.
pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// Placeholder for all injected content (constant then triggered).
pub const PLACEHOLDER_CONTENT: &str = "content";
/// Placeholder for constant content only.
pub const PLACEHOLDER_CONSTANT: &str = "constantContent";
/// Placeholder for triggered content only.
pub const PLACEHOLDER_TRIGGERED: &str = "triggeredContent";

/// Parts of one rendered entry.
#[derive(Debug, Clone, Default)]
pub struct EntryBlock<'a> {
    /// Already formatted timestamp; rendered as `[timestamp]`.
    pub timestamp: Option<&'a str>,
    pub title: &'a str,
    /// Lines between title and body (e.g. "Keywords: a, b").
    pub details: Vec<String>,
    pub body: &'a str,
}

/// Renders an entry block.
///
/// Empty parts are omitted; the body is trimmed.
pub fn format_entry_block(block: &EntryBlock<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(ts) = block.timestamp.filter(|t| !t.trim().is_empty()) {
        lines.push(format!("[{}]", ts.trim()));
    }
    if !block.title.trim().is_empty() {
        lines.push(format!("## {}", block.title.trim()));
    }
    lines.extend(
        block
            .details
            .iter()
            .filter(|d| !d.trim().is_empty())
            .cloned(),
    );
    let body = block.body.trim();
    if !body.is_empty() {
        lines.push(body.to_string());
    }
    lines.join("\n")
}

/// Formats a labelled list line, e.g. `Keywords: a, b`. Returns `None` for an empty list.
pub fn format_list_line<I, S>(label: &str, items: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(format!("{}: {}", label, items.join(", ")))
    }
}

/// Joins non-empty sections with `separator`.
pub fn join_sections<I, S>(sections: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    sections
        .into_iter()
        .filter(|s| !s.as_ref().trim().is_empty())
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Renders groups as `### {label}` subsections, each group's blocks joined with
/// `separator`, and the subsections themselves joined with `separator`.
///
/// Groups keep the given order; empty groups are skipped.
pub fn format_grouped<S: AsRef<str>>(groups: &[(String, Vec<S>)], separator: &str) -> String {
    let subsections: Vec<String> = groups
        .iter()
        .filter_map(|(label, blocks)| {
            let body = join_sections(blocks.iter().map(|b| b.as_ref()), separator);
            if body.is_empty() {
                None
            } else {
                Some(format!("### {}\n\n{}", label, body))
            }
        })
        .collect();
    join_sections(&subsections, separator)
}

/// Substitutes `{{name}}` placeholders from `values`.
///
/// A `{{name}}` with no value becomes the empty string. An unterminated `{{` is kept
/// verbatim.
pub fn apply_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let name = after_open[..end].trim();
                if let Some((_, value)) = values.iter().find(|(k, _)| *k == name) {
                    out.push_str(value);
                }
                rest = &after_open[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
