use url::Url;

/// Builds the quoted, `AND`-joined query label from a comma-separated input.
///
/// Blank terms are dropped; an input with no usable terms yields an empty
/// string, which callers treat as "nothing to search for".
pub fn compose_query(raw: &str) -> String {
    let terms: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .collect();

    if terms.is_empty() {
        return String::new();
    }

    terms
        .iter()
        .map(|term| format!("\"{term}\""))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Reads the `keywords` query parameter from a target URL, if present.
///
/// Used to decide whether the page a target currently shows already matches
/// the query the user asked for.
pub fn query_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "keywords")
        .map(|(_, value)| value.into_owned())
}
