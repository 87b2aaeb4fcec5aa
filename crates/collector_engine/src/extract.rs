use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

/// Addresses surfaced by earlier unique-mode collections, persisted across
/// runs. Grows monotonically until the user clears it.
pub type SeenCache = BTreeSet<String>;

/// Scans rendered document snapshots for contact addresses.
///
/// Candidates come from two sources: explicit `mailto:` link targets and a
/// permissive pattern over the visible text. A stricter shape check then
/// re-validates every candidate, which also catches malformed link payloads
/// the permissive pattern never saw.
pub struct AddressScanner {
    scan: Regex,
    strict: Regex,
    mailto: Selector,
    body: Selector,
}

impl AddressScanner {
    pub fn new() -> Self {
        let scan = RegexBuilder::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .case_insensitive(true)
            .build()
            .expect("scan pattern is valid");
        let strict = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("strict pattern is valid");
        let mailto = Selector::parse(r#"a[href^="mailto:"]"#).expect("mailto selector is valid");
        let body = Selector::parse("body").expect("body selector is valid");
        Self {
            scan,
            strict,
            mailto,
            body,
        }
    }

    /// Extracts the deduplicated, ascending-sorted addresses of one snapshot.
    ///
    /// `seen` is only consulted and extended when `unique_only` is set; the
    /// caller is responsible for persisting it afterwards.
    pub fn scan(
        &self,
        html: &str,
        exclude_terms: &[String],
        unique_only: bool,
        seen: &mut SeenCache,
    ) -> Vec<String> {
        let doc = Html::parse_document(html);
        let mut found = BTreeSet::new();

        for link in doc.select(&self.mailto) {
            if let Some(href) = link.value().attr("href") {
                let address = href
                    .trim_start_matches("mailto:")
                    .split('?')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                found.insert(address);
            }
        }

        let text = self.visible_text(&doc);
        for candidate in self.scan.find_iter(&text) {
            found.insert(candidate.as_str().to_ascii_lowercase());
        }

        let mut result: Vec<String> = found
            .into_iter()
            .filter(|address| self.strict.is_match(address))
            .filter(|address| !is_excluded(address, exclude_terms))
            .collect();

        if unique_only {
            result.retain(|address| !seen.contains(address));
            for address in &result {
                seen.insert(address.clone());
            }
        }

        result
    }

    /// Collects the document's rendered text, skipping subtrees that never
    /// produce visible output.
    fn visible_text(&self, doc: &Html) -> String {
        let mut out = String::new();
        match doc.select(&self.body).next() {
            Some(body) => push_visible_text(body, &mut out),
            None => push_visible_text(doc.root_element(), &mut out),
        }
        out
    }
}

impl Default for AddressScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn push_visible_text(element: ElementRef, out: &mut String) {
    const SKIPPED: [&str; 5] = ["script", "style", "noscript", "template", "iframe"];
    if SKIPPED.contains(&element.value().name()) {
        return;
    }
    for child in element.children() {
        match child.value() {
            scraper::node::Node::Text(text) => {
                out.push_str(text);
                // Element boundaries never glue adjacent words together.
                out.push(' ');
            }
            scraper::node::Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_visible_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn is_excluded(address: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| {
        let term = term.trim();
        !term.is_empty() && address.contains(term)
    })
}
