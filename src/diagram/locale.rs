use serde::{Deserialize, Serialize};

/// Languages descriptions can be generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Nl,
}

impl Locale {
    /// Matches on the primary language subtag, so `en-US` and `EN` are both English.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "nl" => Some(Locale::Nl),
            _ => None,
        }
    }

    /// Resolves `code`, falling back to `default` for unknown locales.
    pub fn resolve(code: &str, default: Locale) -> Self {
        Self::from_code(code).unwrap_or(default)
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Nl => "nl",
        }
    }

    /// Picks the entry of a `[en, nl]` pair.
    pub fn pick<T>(self, en: T, nl: T) -> T {
        match self {
            Locale::En => en,
            Locale::Nl => nl,
        }
    }
}

/// Replaces every `{key}` placeholder in `template`.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Picks the singular or plural template by count and fills in `{count}`.
pub fn count_phrase(count: usize, singular: &str, plural: &str) -> String {
    let template = if count == 1 { singular } else { plural };
    fill(template, &[("count", &count.to_string())])
}

/// Joins names as `a, b and c` with the localized conjunction.
pub fn join_names(names: &[String], and: &str) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} {and} {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_codes_match_on_primary_subtag() {
        assert_eq!(Locale::from_code("en"), Some(Locale::En));
        assert_eq!(Locale::from_code("en-US"), Some(Locale::En));
        assert_eq!(Locale::from_code("NL_be"), Some(Locale::Nl));
        assert_eq!(Locale::from_code("xx"), None);
        assert_eq!(Locale::resolve("de", Locale::Nl), Locale::Nl);
    }

    #[test]
    fn fill_replaces_all_placeholders() {
        assert_eq!(
            fill("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]),
            "x and y and x"
        );
    }

    #[test]
    fn join_names_uses_conjunction_for_last_pair() {
        let names: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_names(&names, "and"), "A, B and C");
        assert_eq!(join_names(&names[..2], "en"), "A en B");
        assert_eq!(join_names(&names[..1], "en"), "A");
        assert_eq!(join_names(&[], "en"), "");
    }
}
