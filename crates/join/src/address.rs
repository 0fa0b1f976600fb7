//! Address normalization into a comparable join key.
//!
//! The key is uppercase, single-spaced, with street suffixes abbreviated and
//! the first unit designator moved to the end as `UNIT <value>`:
//!
//! ```
//! use parceljoin_join::address::normalize_address;
//!
//! assert_eq!(normalize_address("123 Main Street Apt 4"), "123 MAIN ST UNIT 4");
//! assert_eq!(normalize_address("123 MAIN ST #4"), "123 MAIN ST UNIT 4");
//! ```
//!
//! Normalization is total and idempotent. Two addresses denote the same
//! location iff their keys are byte-equal.

/// Canonical suffix → accepted spellings (canonical included).
const SUFFIXES: &[(&str, &[&str])] = &[
    ("ST", &["STREET", "STR", "ST"]),
    ("AVE", &["AVENUE", "AV", "AVE"]),
    ("BLVD", &["BOULEVARD", "BLVD"]),
    ("DR", &["DRIVE", "DRV", "DR"]),
    ("LN", &["LANE", "LN"]),
    ("RD", &["ROAD", "RD"]),
    ("CT", &["COURT", "CRT", "CT"]),
    ("PL", &["PLACE", "PL"]),
    ("TER", &["TERRACE", "TERR", "TER"]),
    ("WAY", &["WAY", "WY"]),
    ("CIR", &["CIRCLE", "CIRC", "CIR"]),
];

const UNIT_MARKERS: &[&str] = &["APT", "APARTMENT", "UNIT", "#", "SUITE", "STE"];

const UNIT_TOKEN: &str = "UNIT";

fn canonical_suffix(token: &str) -> Option<&'static str> {
    SUFFIXES
        .iter()
        .find(|(_, spellings)| spellings.contains(&token))
        .map(|(canonical, _)| *canonical)
}

fn is_unit_marker(token: &str) -> bool {
    UNIT_MARKERS.contains(&token)
}

/// Unit value of a marker glued to its number (`APT4`, `STE200`, `UNIT4B`).
fn glued_unit_value(token: &str) -> Option<&str> {
    // Longest first, so APARTMENT is not read as APT + "ARTMENT".
    const GLUED: &[&str] = &["APARTMENT", "SUITE", "UNIT", "APT", "STE"];
    GLUED.iter().find_map(|marker| {
        token
            .strip_prefix(marker)
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
    })
}

/// Delete periods and apostrophes, split `#` into its own token, keep `-` and
/// `/` only between alphanumerics. Everything else non-alphanumeric becomes
/// whitespace.
fn clean_punctuation(upper: &str) -> String {
    let chars: Vec<char> = upper.chars().filter(|c| !matches!(c, '.' | '\'')).collect();
    let mut out = String::with_capacity(chars.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        match c {
            c if c.is_alphanumeric() || c.is_whitespace() => out.push(c),
            '#' => out.push_str(" # "),
            '-' | '/' => {
                let prev = i.checked_sub(1).and_then(|p| chars.get(p));
                let next = chars.get(i + 1);
                let joined = prev.is_some_and(|p| p.is_alphanumeric())
                    && next.is_some_and(|n| n.is_alphanumeric());
                out.push(if joined { c } else { ' ' });
            }
            _ => out.push(' '),
        }
    }
    out
}

pub fn normalize_address(raw: &str) -> String {
    let cleaned = clean_punctuation(&raw.to_uppercase());

    let mut tokens: Vec<&str> = Vec::new();
    let mut unit: Option<&str> = None;
    let mut iter = cleaned.split_whitespace().peekable();

    while let Some(token) = iter.next() {
        if let Some(value) = glued_unit_value(token) {
            if unit.is_none() {
                unit = Some(value);
            }
            continue;
        }
        if is_unit_marker(token) {
            // "APT # 4" carries two markers before the value.
            while iter.peek().is_some_and(|t| is_unit_marker(t)) {
                iter.next();
            }
            if let Some(value) = iter.next() {
                if unit.is_none() {
                    unit = Some(value);
                }
            }
            continue;
        }
        tokens.push(canonical_suffix(token).unwrap_or(token));
    }

    if let Some(value) = unit {
        tokens.push(UNIT_TOKEN);
        tokens.push(value);
    }
    tokens.join(" ")
}
