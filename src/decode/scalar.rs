//! Scalar coercers for export cells
//!
//! Blank cells are always `None`, never an empty string. Numbers accept both
//! comma and dot decimal separators.

/// Tokens read as "yes" in boolean columns (compared case-insensitively)
pub const TRUTHY_TOKENS: &[&str] = &["yes", "y", "1", "true", "on", "oui"];

/// Leading signatures of page-builder payloads stored in description fields
pub const PAGE_BUILDER_SIGNATURES: &[&str] = &["[{\"id\":", "{\"elements\":", "{\"content\":["];

/// Trimmed cell content, `None` when blank
pub fn text(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Cell content kept verbatim (inner newlines and indentation preserved),
/// `None` when blank
pub fn verbatim(cell: Option<&str>) -> Option<String> {
    cell.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

/// Parse a locale-tolerant decimal: `12,5`, `12.5`, `1 234,50`, `1.234,50`
pub fn decimal(cell: Option<&str>) -> Option<f64> {
    let raw: String = cell?
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\u{202f}')
        .collect();
    if raw.is_empty() {
        return None;
    }

    // With both separators present, the last one is the decimal separator
    let normalized = match (raw.rfind(','), raw.rfind('.')) {
        (Some(c), Some(d)) if c > d => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(_), None) => raw.replace(',', "."),
        _ => raw,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer cell; decimals are truncated toward zero (`"12,0"` -> 12)
pub fn integer(cell: Option<&str>) -> Option<i64> {
    let value = decimal(cell)?;
    if value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Boolean token: true only for a recognized affirmative token
pub fn boolean(cell: Option<&str>) -> bool {
    match cell {
        Some(s) => {
            let token = s.trim().to_lowercase();
            TRUTHY_TOKENS.contains(&token.as_str())
        }
        None => false,
    }
}

/// Whether a description holds page-builder structured markup instead of prose
pub fn is_page_builder_markup(content: &str) -> bool {
    let trimmed = content.trim_start();
    PAGE_BUILDER_SIGNATURES
        .iter()
        .any(|sig| trimmed.starts_with(sig))
}

/// Decode the HTML entities an export uses to escape quotes, angle brackets,
/// apostrophes and ampersands. `&amp;` goes last so `&amp;quot;` stays `&quot;`.
pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    const ENTITIES: &[(&str, &str)] = &[
        ("&quot;", "\""),
        ("&#34;", "\""),
        ("&#034;", "\""),
        ("&#39;", "'"),
        ("&#039;", "'"),
        ("&apos;", "'"),
        ("&lt;", "<"),
        ("&#60;", "<"),
        ("&gt;", ">"),
        ("&#62;", ">"),
    ];
    let mut out = input.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    out.replace("&#38;", "&").replace("&amp;", "&")
}

/// Description field: verbatim prose, or `None` for blanks and builder payloads
pub fn description(cell: Option<&str>) -> Option<String> {
    verbatim(cell).filter(|s| !is_page_builder_markup(s))
}
