use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bind_rest_api::{http::API_KEY_HEADER, router};
use bindapi::audit::Outcome;
use bindapi::proto::op::ResponseCode;
use bindapi::proto::rr::{self, Name};
use bindapi::zone::ZoneValidator;
use bindapi::DnsApi;
use serde_json::{json, Value};
use test_support::{subscribe, test_keys, InMemoryServer, MemoryAuditSink};
use tower::ServiceExt;

const ALICE: &str = "alice-secret";

fn setup() -> (Router, Arc<InMemoryServer>, Arc<MemoryAuditSink>) {
    subscribe();

    let server = InMemoryServer::new(&["example.org."]);
    let (audit, trail) = MemoryAuditSink::trail();
    let api = DnsApi::new(
        ZoneValidator::new([Name::from_ascii("example.org.").unwrap()]),
        test_keys(),
        server.clone(),
        trail,
    );

    (router(api), server, audit)
}

fn request(method: &str, uri: &str, key: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    // framework rejections answer in plain text
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

fn a_record(value: &str) -> Option<Value> {
    Some(json!({ "response": value, "rrtype": "A", "ttl": 300 }))
}

#[tokio::test]
async fn test_create_then_get() {
    let (app, _server, audit) = setup();

    let (status, body) = send(
        &app,
        request("POST", "/dns/record/test.example.org.", Some(ALICE), a_record("10.0.0.1")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(
        &app,
        request("GET", "/dns/record/test.example.org?record_type=A", Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "A": ["10.0.0.1"] }));
    assert_eq!(audit.outcomes(), [Outcome::Succeeded]);
}

#[tokio::test]
async fn test_delete_then_get() {
    let (app, _server, _audit) = setup();

    send(
        &app,
        request("POST", "/dns/record/test.example.org.", Some(ALICE), a_record("10.0.0.1")),
    )
    .await;

    let (status, _) = send(
        &app,
        request("DELETE", "/dns/record/test.example.org.", Some(ALICE), a_record("10.0.0.1")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        request("GET", "/dns/record/test.example.org.?record_type=A", Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("A").map_or(true, |a| a == &json!([])));
}

#[tokio::test]
async fn test_replace() {
    let (app, server, _audit) = setup();

    for value in ["192.0.2.1", "192.0.2.2"] {
        send(
            &app,
            request("POST", "/dns/record/www.example.org", Some(ALICE), a_record(value)),
        )
        .await;
    }

    let (status, _) = send(
        &app,
        request("PUT", "/dns/record/www.example.org", Some(ALICE), a_record("192.0.2.3")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(server.records("www.example.org.", rr::RecordType::A).len(), 1);
}

#[tokio::test]
async fn test_invalid_key_checked_first() {
    let (app, server, audit) = setup();

    for key in [None, Some("wrong")] {
        for request in [
            request("GET", "/dns/zone/example.net", key, None),
            request("GET", "/dns/record/www.example.net", key, None),
            request("POST", "/dns/record/www.example.net", key, a_record("10.0.0.1")),
            request("PUT", "/dns/record/www.example.net", key, a_record("10.0.0.1")),
            request("DELETE", "/dns/record/www.example.net", key, a_record("10.0.0.1")),
            request("DELETE", "/dns/allrecords/www.example.net", key, None),
        ] {
            let (status, body) = send(&app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "detail": "invalid api key" }));
        }
    }

    assert_eq!(server.calls(), 0);
    assert!(audit.entries().is_empty());
}

#[tokio::test]
async fn test_not_permitted() {
    let (app, server, _audit) = setup();

    let cases = [
        (
            request("GET", "/dns/zone/example.net", Some(ALICE), None),
            "zone file not permitted",
        ),
        (
            request("GET", "/dns/zone/www.example.org", Some(ALICE), None),
            "zone file not permitted",
        ),
        (
            request("GET", "/dns/record/www.example.net", Some(ALICE), None),
            "domain not permitted",
        ),
        (
            request("POST", "/dns/record/www.example.net", Some(ALICE), a_record("10.0.0.1")),
            "domain zone not permitted",
        ),
        (
            request("DELETE", "/dns/allrecords/www.badexample.org", Some(ALICE), None),
            "domain zone not permitted",
        ),
    ];

    for (request, detail) in cases {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": detail }));
    }

    assert_eq!(server.calls(), 0);
}

#[tokio::test]
async fn test_invalid_record_data() {
    let (app, server, audit) = setup();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/dns/record/www.example.org",
            Some(ALICE),
            Some(json!({ "response": "not-an-address", "rrtype": "AAAA" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "invalid record data" }));
    assert_eq!(server.updates(), 0);
    assert_eq!(audit.outcomes(), [Outcome::Failed]);
}

#[tokio::test]
async fn test_invalid_record_type() {
    let (app, server, _audit) = setup();

    let (status, body) = send(
        &app,
        request("GET", "/dns/record/www.example.org?record_type=SRV", Some(ALICE), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "invalid record type" }));

    // the body is rejected by the JSON extractor before reaching the handler
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/dns/record/www.example.org",
            Some(ALICE),
            Some(json!({ "response": "x", "rrtype": "SRV" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.is_string(), "{body:?}");

    assert_eq!(server.calls(), 0);
}

#[tokio::test]
async fn test_rejected_update() {
    let (app, server, audit) = setup();
    server.respond_to_updates_with(ResponseCode::Refused);

    let (status, body) = send(
        &app,
        request("POST", "/dns/record/www.example.org", Some("bob-secret"), a_record("10.0.0.1")),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "detail": "DNS transaction failed - check logs" }));

    let entries = audit.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, Outcome::Failed);
    assert_eq!(entries[0].context.identity, "bob");
}

#[tokio::test]
async fn test_repeated_record_types() {
    let (app, _server, _audit) = setup();

    send(
        &app,
        request("POST", "/dns/record/mail.example.org", Some(ALICE), a_record("192.0.2.25")),
    )
    .await;
    send(
        &app,
        request(
            "POST",
            "/dns/record/mail.example.org",
            Some(ALICE),
            Some(json!({ "response": "10 mail", "rrtype": "MX" })),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            "GET",
            "/dns/record/mail.example.org?record_type=A&record_type=MX&record_type=TXT",
            Some(ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "A": ["192.0.2.25"], "MX": ["10 mail.example.org."] })
    );

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            "/dns/allrecords/mail.example.org?recordtypes=A&recordtypes=MX",
            Some(ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        request("GET", "/dns/record/mail.example.org", Some(ALICE), None),
    )
    .await;
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn test_zone() {
    let (app, _server, _audit) = setup();

    send(
        &app,
        request("POST", "/dns/record/www.example.org", Some(ALICE), a_record("192.0.2.10")),
    )
    .await;

    let (status, body) = send(&app, request("GET", "/dns/zone/example.org", Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["SOA"]["serial"], json!(2));
    assert_eq!(body["SOA"]["mname"], json!("ns1.example.org."));
    assert_eq!(
        body["records"]["www"],
        json!([{ "response": "192.0.2.10", "rrtype": "A", "ttl": 300 }])
    );
}
