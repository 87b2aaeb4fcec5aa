use collector_engine::{AddressScanner, SeenCache};
use pretty_assertions::assert_eq;

fn scan(html: &str, exclude: &[&str], unique: bool, seen: &mut SeenCache) -> Vec<String> {
    let exclude: Vec<String> = exclude.iter().map(|term| term.to_string()).collect();
    AddressScanner::new().scan(html, &exclude, unique, seen)
}

#[test]
fn merges_link_and_text_sources_lowercased_and_deduplicated() {
    let html = r#"
        <html><body>
          <a href="mailto:Jane.Doe@Example.com?subject=Hi">write Jane</a>
          <p>reach me at john@x.co or JOHN@X.CO</p>
        </body></html>
    "#;

    let mut seen = SeenCache::new();
    let result = scan(html, &[], false, &mut seen);

    assert_eq!(
        result,
        vec!["jane.doe@example.com".to_string(), "john@x.co".to_string()]
    );
}

#[test]
fn exclusion_term_drops_matching_candidates() {
    let html = r#"
        <html><body>
          <a href="mailto:Jane.Doe@Example.com?subject=Hi">Jane</a>
          <p>reach me at john@x.co or john@x.co</p>
        </body></html>
    "#;

    let mut seen = SeenCache::new();
    let result = scan(html, &["x.co"], false, &mut seen);

    assert_eq!(result, vec!["jane.doe@example.com".to_string()]);
}

#[test]
fn blank_exclusion_terms_never_exclude() {
    let html = "<body><p>keep me: someone@example.org</p></body>";

    let mut seen = SeenCache::new();
    let result = scan(html, &["", "   "], false, &mut seen);

    assert_eq!(result, vec!["someone@example.org".to_string()]);
}

#[test]
fn strict_pass_drops_malformed_link_payloads() {
    // The permissive text pattern never saw these; only the mailto source
    // produces them, and the strict shape check has to catch each one.
    let html = r#"
        <body>
          <a href="mailto:">empty</a>
          <a href="mailto:not-an-address">broken</a>
          <a href="mailto:missing@dot">no tld</a>
          <a href="mailto:ok@example.com">fine</a>
        </body>
    "#;

    let mut seen = SeenCache::new();
    let result = scan(html, &[], false, &mut seen);

    assert_eq!(result, vec!["ok@example.com".to_string()]);
}

#[test]
fn script_and_style_text_is_invisible() {
    let html = r#"
        <body>
          <script>var leaked = "hidden@script.example";</script>
          <style>/* css@style.example */</style>
          <p>visible@page.example</p>
        </body>
    "#;

    let mut seen = SeenCache::new();
    let result = scan(html, &[], false, &mut seen);

    assert_eq!(result, vec!["visible@page.example".to_string()]);
}

#[test]
fn results_are_sorted_ascending() {
    let html = "<body>zeta@example.com alpha@example.com mid@example.com</body>";

    let mut seen = SeenCache::new();
    let result = scan(html, &[], false, &mut seen);

    assert_eq!(
        result,
        vec![
            "alpha@example.com".to_string(),
            "mid@example.com".to_string(),
            "zeta@example.com".to_string(),
        ]
    );
}

#[test]
fn unique_mode_returns_only_unseen_and_grows_the_cache() {
    let html = "<body>first@example.com second@example.com</body>";
    let mut seen = SeenCache::new();

    let first_pass = scan(html, &[], true, &mut seen);
    assert_eq!(
        first_pass,
        vec!["first@example.com".to_string(), "second@example.com".to_string()]
    );
    assert_eq!(seen.len(), 2);

    // Same document again: everything is cached now.
    let second_pass = scan(html, &[], true, &mut seen);
    assert!(second_pass.is_empty());
    assert_eq!(seen.len(), 2);

    // A later page only surfaces the genuinely new address.
    let later = "<body>first@example.com third@example.com</body>";
    let third_pass = scan(later, &[], true, &mut seen);
    assert_eq!(third_pass, vec!["third@example.com".to_string()]);
    assert_eq!(seen.len(), 3);
}

#[test]
fn non_unique_mode_leaves_the_cache_untouched() {
    let html = "<body>plain@example.com</body>";
    let mut seen = SeenCache::new();
    seen.insert("plain@example.com".to_string());

    let result = scan(html, &[], false, &mut seen);

    // Cached addresses still show up, and nothing new is recorded.
    assert_eq!(result, vec!["plain@example.com".to_string()]);
    assert_eq!(seen.len(), 1);
}
