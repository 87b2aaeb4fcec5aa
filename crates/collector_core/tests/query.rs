use collector_core::{compose_query, query_from_url};

#[test]
fn compose_quotes_terms_and_joins_with_and() {
    assert_eq!(
        compose_query("python, mumbai, hiring"),
        "\"python\" AND \"mumbai\" AND \"hiring\""
    );
}

#[test]
fn compose_drops_blank_terms() {
    assert_eq!(compose_query(" rust ,, ,  berlin "), "\"rust\" AND \"berlin\"");
}

#[test]
fn compose_of_empty_input_is_empty() {
    assert_eq!(compose_query(""), "");
    assert_eq!(compose_query(" , , "), "");
}

#[test]
fn query_from_url_reads_keywords_parameter() {
    let url = "https://example.com/search?keywords=%22rust%22%20AND%20%22berlin%22&sort=date";
    assert_eq!(
        query_from_url(url),
        Some("\"rust\" AND \"berlin\"".to_string())
    );
}

#[test]
fn query_from_url_without_parameter_is_none() {
    assert_eq!(query_from_url("https://example.com/search?sort=date"), None);
}

#[test]
fn query_from_unparsable_url_is_none() {
    assert_eq!(query_from_url("not a url"), None);
}
