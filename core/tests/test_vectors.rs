//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Expected results are decoded into
//! the same types the client returns, so timestamp formatting differences
//! (`.000Z` vs `Z`) do not matter.

use miaujuda_core::{
    ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, PetClient, PetPost,
    PetPostAndUser, PostStatus, RawObject, Session,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> PetClient {
    PetClient::new(ClientConfig::new(BASE_URL).unwrap(), Session::anonymous())
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn cases(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Compare a built request with `expected_request`.
fn check_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated_response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn check_error(name: &str, err: ApiError, expected: &str) {
    let matched = match expected {
        "NotFound" => matches!(err, ApiError::NotFound),
        "NothingDeleted" => matches!(err, ApiError::NothingDeleted),
        "Decode" => matches!(err, ApiError::Decode(_)),
        "Http" => matches!(err, ApiError::Http { .. }),
        other => panic!("{name}: unknown expected_error: {other}"),
    };
    assert!(matched, "{name}: expected {expected}, got {err:?}");
}

// ---------------------------------------------------------------------------
// List posts
// ---------------------------------------------------------------------------

#[test]
fn list_posts_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/list_posts.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_list_posts().unwrap();
        check_request(name, &req, &case["expected_request"]);

        let posts = c.parse_list_posts(simulated_response(&case)).unwrap();
        let expected: Vec<PetPost> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(posts, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Latest post
// ---------------------------------------------------------------------------

#[test]
fn latest_post_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/latest_post.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_latest_post().unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_latest_post(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let latest = result.unwrap();
            let expected: PetPostAndUser =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(latest, expected, "{name}: parsed result");
            assert_eq!(latest.pet_post.user_id, latest.user.id, "{name}: author");
        }
    }
}

// ---------------------------------------------------------------------------
// Update post status
// ---------------------------------------------------------------------------

#[test]
fn update_post_status_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/update_post_status.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();
        let status = PostStatus::from(case["input_status"].as_str().unwrap().to_string());

        let req = c.build_update_post_status(id, status).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_post_status(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let post = result.unwrap();
            let expected: PetPost = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(post, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete post
// ---------------------------------------------------------------------------

#[test]
fn delete_post_test_vectors() {
    let c = client();
    for case in cases(include_str!("../../test-vectors/delete_post.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_delete_post(id).unwrap();
        check_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_post(simulated_response(&case));
        if let Some(expected_error) = case.get("expected_error") {
            check_error(name, result.unwrap_err(), expected_error.as_str().unwrap());
        } else {
            let ack = result.unwrap();
            let expected: RawObject = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(ack, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Re-encoding
// ---------------------------------------------------------------------------

/// Objects keep the same keys at every depth; scalar values may be
/// normalised (`.000Z` becomes `Z`).
fn assert_same_shape(name: &str, sent: &Value, encoded: &Value) {
    match (sent, encoded) {
        (Value::Object(a), Value::Object(b)) => {
            let mut keys_a: Vec<_> = a.keys().collect();
            let mut keys_b: Vec<_> = b.keys().collect();
            keys_a.sort();
            keys_b.sort();
            assert_eq!(keys_a, keys_b, "{name}: object keys");
            for (key, value) in a {
                assert_same_shape(name, value, &b[key]);
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            assert_eq!(a.len(), b.len(), "{name}: array length");
            for (x, y) in a.iter().zip(b) {
                assert_same_shape(name, x, y);
            }
        }
        (Value::String(_), Value::String(_)) => {}
        (x, y) => assert_eq!(x, y, "{name}: scalar"),
    }
}

/// Decode the body, encode it again, decode that, and compare.
fn assert_lossless<T>(name: &str, body: &str)
where
    T: DeserializeOwned + Serialize + PartialEq + std::fmt::Debug,
{
    let first: T = serde_json::from_str(body).unwrap();
    let encoded = serde_json::to_value(&first).unwrap();
    let second: T = serde_json::from_value(encoded.clone()).unwrap();
    assert_eq!(first, second, "{name}: decode after encode");

    let sent: Value = serde_json::from_str(body).unwrap();
    assert_same_shape(name, &sent, &encoded);
}

#[test]
fn vector_bodies_survive_reencoding() {
    let sources = [
        ("list_posts", include_str!("../../test-vectors/list_posts.json")),
        ("latest_post", include_str!("../../test-vectors/latest_post.json")),
        ("update_post_status", include_str!("../../test-vectors/update_post_status.json")),
    ];
    let mut checked = 0;
    for (file, raw) in sources {
        for case in cases(raw) {
            if case.get("expected_error").is_some() {
                continue;
            }
            let name = format!("{file}: {}", case["name"].as_str().unwrap());
            let body = case["simulated_response"]["body"].as_str().unwrap();
            match file {
                "list_posts" => assert_lossless::<Vec<PetPost>>(&name, body),
                "latest_post" => assert_lossless::<PetPostAndUser>(&name, body),
                _ => assert_lossless::<PetPost>(&name, body),
            }
            checked += 1;
        }
    }
    assert!(checked >= 4);
}
