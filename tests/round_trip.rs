mod common;

use common::*;
use dbwire::{Authentication, Context, Fragment, Protocol, RawPayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    name: String,
    age: u32,
}

#[tokio::test]
async fn test_json_request_reaches_the_wire() {
    let backend = start_programmable_backend(MockReply::echo).await;
    let conn = connect(vec![backend.endpoint()], Protocol::Http1Json)
        .with_authentication(Authentication::bearer("jwt-token"))
        .unwrap();

    let user = User {
        name: "alice".into(),
        age: 30,
    };
    let defaults = json!({"age": 99, "active": true});
    let mut req = conn.new_request("POST", "_api/document/users").unwrap();
    req.set_query("waitForSync", "true")
        .set_header("X-Request-Id", "it-1");
    req.set_body_fragments(&[Fragment::value(&user), Fragment::value(&defaults)])
        .unwrap();

    let (resp, echoed): (_, Value) = conn
        .execute_decode(&Context::background(), &req)
        .await
        .unwrap();
    assert_eq!(echoed, json!({"name": "alice", "age": 30, "active": true}));
    assert!(resp.check_status(&[200]).is_ok());
    assert!(req.written());

    let seen = &backend.requests()[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.target, "/_api/document/users?waitForSync=true");
    assert_eq!(seen.header("content-type"), Some("application/json"));
    assert_eq!(seen.header("accept"), Some("application/json"));
    assert_eq!(seen.header("authorization"), Some("Bearer jwt-token"));
    assert_eq!(seen.header("x-request-id"), Some("it-1"));
    assert!(req.header("authorization").is_none());
}

#[tokio::test]
async fn test_raw_payload_passes_through_unchanged() {
    let backend = start_programmable_backend(MockReply::echo).await;
    let conn = connect(vec![backend.endpoint()], Protocol::Http1Json);

    let text: &[u8] = b"{ \"z\" : 1,\n  \"a\" : [ 1 , 2 ] }";
    let mut req = conn.new_request("PUT", "/_api/document/c/k").unwrap();
    req.set_raw_body(RawPayload::from_bytes(text));

    let resp = conn.execute(&Context::background(), &req).await.unwrap();
    assert_eq!(backend.requests()[0].body, text);

    let mut copy = RawPayload::new();
    resp.parse_raw_body("", Some(&mut copy)).unwrap();
    assert_eq!(copy.as_bytes(), text);

    let mut field = RawPayload::new();
    resp.parse_raw_body("a", Some(&mut field)).unwrap();
    assert_eq!(field.as_bytes(), b"[ 1 , 2 ]");
}

#[tokio::test]
async fn test_cbor_round_trip() {
    let backend = start_programmable_backend(MockReply::echo).await;
    let conn = connect(vec![backend.endpoint()], Protocol::Http1Cbor);

    let user = User {
        name: "bob".into(),
        age: 41,
    };
    let mut req = conn.new_request("POST", "/_api/document/users").unwrap();
    req.set_body(&user).unwrap();

    let (resp, echoed): (_, User) = conn
        .execute_decode(&Context::background(), &req)
        .await
        .unwrap();
    assert_eq!(echoed, user);
    assert_eq!(resp.header("content-type"), "application/cbor");

    let seen = &backend.requests()[0];
    assert_eq!(seen.header("content-type"), Some("application/cbor"));
    let decoded: User = ciborium::from_reader(seen.body.as_slice()).unwrap();
    assert_eq!(decoded, user);
}

#[tokio::test]
async fn test_batch_reply_children() {
    let reply = json!([
        {"_key": "a", "_rev": "_r1"},
        {"error": true, "code": 409, "errorNum": 1210, "errorMessage": "unique constraint violated"}
    ]);
    for protocol in [Protocol::Http1Json, Protocol::Http1Cbor] {
        let body = reply.clone();
        let backend = start_programmable_backend(move |_| match protocol {
            Protocol::Http1Json => MockReply::json(202, &body),
            _ => MockReply::cbor(202, &body),
        })
        .await;
        let conn = connect(vec![backend.endpoint()], protocol);

        let docs = vec![json!({"_key": "a"}), json!({"_key": "b"})];
        let mut req = conn.new_request("POST", "/_api/document/users").unwrap();
        req.set_body_array(&docs, None).unwrap();

        let resp = conn.execute(&Context::background(), &req).await.unwrap();
        let children = resp.parse_array_body().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].status_code(), 202);
        assert_eq!(children[1].status_code(), 409);
        assert_eq!(children[1].header("x-mock"), "");
        assert_eq!(children[1].endpoint(), backend.endpoint());

        let key: String = children[0].parse_body("_key").unwrap();
        assert_eq!(key, "a");
    }
}

#[tokio::test]
async fn test_import_body_framing_on_the_wire() {
    let backend = start_mock_backend(201, json!({"created": 2})).await;
    let conn = connect(vec![backend.endpoint()], Protocol::Http1Json);

    let docs = vec![json!({"a": 1}), json!({"b": 2})];
    let mut req = conn.new_request("POST", "/_api/import").unwrap();
    req.set_query("collection", "users");
    req.set_body_import_array(&docs).unwrap();

    let resp = conn.execute(&Context::background(), &req).await.unwrap();
    assert!(resp.check_status(&[201]).is_ok());
    let created: u32 = resp.parse_body("created").unwrap();
    assert_eq!(created, 2);

    let seen = &backend.requests()[0];
    assert_eq!(seen.header("content-type"), Some("application/x-ndjson"));
    assert_eq!(seen.body, b"{\"a\":1}\n{\"b\":2}\n");
}
