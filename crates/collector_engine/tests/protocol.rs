use collector_engine::{Request, Response};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};

#[test]
fn collect_emails_round_trips_exactly() {
    let request = Request::CollectEmails {
        scroll_count: 20,
        scroll_speed: 2000,
        exclude_keywords: vec!["noreply".to_string()],
        include_unique: true,
    };

    let wire = serde_json::to_string(&request).unwrap();
    assert_eq!(
        wire,
        r#"{"action":"collectEmails","scrollCount":20,"scrollSpeed":2000,"excludeKeywords":["noreply"],"includeUnique":true}"#
    );
    assert_eq!(serde_json::from_str::<Request>(&wire).unwrap(), request);
}

#[test]
fn clear_cache_is_a_bare_action() {
    let wire = serde_json::to_string(&Request::ClearCache).unwrap();
    assert_eq!(wire, r#"{"action":"clearCache"}"#);
    assert_eq!(
        serde_json::from_str::<Request>(&wire).unwrap(),
        Request::ClearCache
    );
}

#[test]
fn update_search_input_round_trips() {
    let request = Request::UpdateSearchInput {
        keywords: "\"rust\" AND \"berlin\"".to_string(),
    };

    let wire = serde_json::to_string(&request).unwrap();
    assert_eq!(
        wire,
        r#"{"action":"updateSearchInput","keywords":"\"rust\" AND \"berlin\""}"#
    );
    assert_eq!(serde_json::from_str::<Request>(&wire).unwrap(), request);
}

#[test]
fn open_popup_on_tab_ready_round_trips() {
    let request = Request::OpenPopupOnTabReady { tab_id: 7 };

    let wire = serde_json::to_string(&request).unwrap();
    assert_eq!(wire, r#"{"action":"openPopupOnTabReady","tabId":7}"#);
    assert_eq!(serde_json::from_str::<Request>(&wire).unwrap(), request);
}

#[test]
fn state_proxy_requests_round_trip() {
    let mut data = Map::new();
    data.insert("keywords".to_string(), json!("python"));
    let update = Request::UpdateState { data };
    let wire = serde_json::to_string(&update).unwrap();
    assert_eq!(wire, r#"{"action":"updateState","data":{"keywords":"python"}}"#);
    assert_eq!(serde_json::from_str::<Request>(&wire).unwrap(), update);

    let get = Request::GetState {
        keys: vec!["history".to_string()],
    };
    let wire = serde_json::to_string(&get).unwrap();
    assert_eq!(wire, r#"{"action":"getState","keys":["history"]}"#);
    assert_eq!(serde_json::from_str::<Request>(&wire).unwrap(), get);
}

#[test]
fn responses_serialize_to_their_bare_shapes() {
    let emails = Response::Emails {
        emails: vec!["a@example.com".to_string()],
    };
    assert_eq!(
        serde_json::to_string(&emails).unwrap(),
        r#"{"emails":["a@example.com"]}"#
    );

    assert_eq!(serde_json::to_string(&Response::ok()).unwrap(), r#"{"success":true}"#);
    assert_eq!(
        serde_json::to_string(&Response::failed()).unwrap(),
        r#"{"success":false}"#
    );
}

#[test]
fn untagged_responses_deserialize_by_shape() {
    assert_eq!(
        serde_json::from_str::<Response>(r#"{"emails":[]}"#).unwrap(),
        Response::Emails { emails: Vec::new() }
    );
    assert_eq!(
        serde_json::from_str::<Response>(r#"{"success":false}"#).unwrap(),
        Response::failed()
    );

    let mut state = Map::new();
    state.insert("theme".to_string(), json!("dark"));
    assert_eq!(
        serde_json::from_str::<Response>(r#"{"theme":"dark"}"#).unwrap(),
        Response::State(state)
    );
}
