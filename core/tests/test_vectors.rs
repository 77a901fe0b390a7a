//! Check URL classification and request building against the JSON vectors
//! in `test-vectors/`.

use photo_api::{ApiClient, ApiError, ClientConfig, HttpMethod, Params, ResourceKind, ResourceUrl};
use photo_api::testing::FixtureTransport;

fn parse_kind(s: &str) -> ResourceKind {
    serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap()
}

#[test]
fn url_test_vectors() {
    let raw = include_str!("../../test-vectors/urls.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let result = ResourceUrl::parse(case["url"].as_str().unwrap());

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "UnresolvableUrl" => assert!(matches!(err, ApiError::UnresolvableUrl(_)), "{name}: expected UnresolvableUrl"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
            continue;
        }

        let url = result.unwrap();
        let expected = &case["expected"];
        assert_eq!(url.kind(), parse_kind(expected["kind"].as_str().unwrap()), "{name}: kind");
        assert_eq!(url.path(), expected["path"].as_str().unwrap(), "{name}: path");
        assert_eq!(url.user_identifier(), expected["user"].as_str(), "{name}: user");
        assert_eq!(url.resource_identifier(), expected["id"].as_str(), "{name}: id");
        assert_eq!(url.is_collection(), expected["collection"].as_bool().unwrap(), "{name}: collection");
        assert_eq!(url.is_short(), expected["short"].as_bool().unwrap(), "{name}: short");
    }
}

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let config = ClientConfig::new(vectors["api_key"].as_str().unwrap())
        .with_base_url(vectors["base_url"].as_str().unwrap());
    let client = ApiClient::new(config, FixtureTransport::new());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params: Params = case["params"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (pair[0].as_str().unwrap(), pair[1].as_str().unwrap())
            })
            .collect();

        let req = client.build_call(case["method"].as_str().unwrap(), &params);
        assert_eq!(req.method, HttpMethod::Get, "{name}: method");
        assert_eq!(req.url, case["expected_url"].as_str().unwrap(), "{name}: url");
        assert!(req.body.is_none(), "{name}: body should be None");
    }
}
