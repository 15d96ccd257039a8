use std::sync::OnceLock;

use regex::Regex;

fn numeric_citation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[0-9]+\]").expect("valid numeric citation regex"))
}

fn year_citation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\d{4}[^)]*\)").expect("valid year citation regex"))
}

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Strip reference noise and collapse whitespace.
///
/// Removes `[12]`-style markers and parentheticals containing a four-digit
/// year such as `(Smith, 2019)`, then collapses every whitespace run to one
/// space and trims both ends. Citations go first so their removal never
/// leaves double spaces behind.
pub fn normalize(text: &str) -> String {
    let text = numeric_citation().replace_all(text, "");
    let text = year_citation().replace_all(&text, "");
    whitespace_run().replace_all(&text, " ").trim().to_string()
}
