//! HTTP integration tests against a mock Rita server.

use mockito::Matcher;
use rita_client::{Error, RitaClient, RitaConfig, LAST_EVENT};

fn client_for(server: &mockito::ServerGuard) -> RitaClient {
    RitaClient::new(&RitaConfig::new(server.url(), "secret")).expect("build client")
}

#[tokio::test]
async fn get_cursor_decodes_the_event_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/event/test/last")
        .match_header("authorization", "secret")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(r#"{"eventId":"1736187360563-0"}"#)
        .create_async()
        .await;

    let cursor = client_for(&server).get_cursor("test").await.expect("cursor");
    assert_eq!(cursor, "1736187360563-0");
    mock.assert_async().await;
}

#[tokio::test]
async fn channel_names_are_normalized_before_the_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/event/test/last")
        .with_status(200)
        .with_body(r#"{"eventId":"a"}"#)
        .create_async()
        .await;

    client_for(&server).get_cursor("  TeSt  ").await.expect("cursor");
    mock.assert_async().await;
}

#[tokio::test]
async fn send_event_posts_json_and_returns_the_assigned_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/event/orders")
        .match_header("authorization", "secret")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(serde_json::json!({"key": "value"})))
        .with_status(200)
        .with_body(r#"{"eventId":"42-0"}"#)
        .create_async()
        .await;

    let id = client_for(&server)
        .send_event("orders", &serde_json::json!({"key": "value"}))
        .await
        .expect("event id");
    assert_eq!(id, "42-0");
    mock.assert_async().await;
}

#[tokio::test]
async fn get_events_decodes_the_event_list() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::Exact("sub=false".into()))
        .match_header("accept", "application/json")
        .with_status(200)
        .with_body(
            r#"{"events":[
                {"id":"1","createdAt":"2024-01-01T00:00:00Z","data":{"n":1}},
                {"id":"2","createdAt":"2024-01-01T00:00:01Z","data":"two"}
            ]}"#,
        )
        .create_async()
        .await;

    let events = client_for(&server).get_events("test").await.expect("events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, "1");
    assert_eq!(
        events[0].data_as::<serde_json::Value>().unwrap(),
        serde_json::json!({"n": 1})
    );
    assert_eq!(events[1].data_as::<String>().unwrap(), "two");
}

#[tokio::test]
async fn get_events_since_passes_the_cursor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sub".into(), "false".into()),
            Matcher::UrlEncoded("eventId".into(), "1736187360563-0".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"events":[]}"#)
        .create_async()
        .await;

    let events = client_for(&server)
        .get_events_since("test", "1736187360563-0")
        .await
        .expect("events");
    assert!(events.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn status_codes_map_to_typed_errors() {
    let cases = [
        (401, "not authorized"),
        (403, "forbidden"),
        (404, "forbidden"),
        (500, "unknown"),
    ];

    for (status, expected) in cases {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/event/test/last")
            .with_status(status)
            .create_async()
            .await;

        let err = client_for(&server).get_cursor("test").await.unwrap_err();
        match (expected, err) {
            ("not authorized", Error::NotAuthorized) => {}
            ("forbidden", Error::Forbidden) => {}
            ("unknown", Error::Unknown(code)) => assert_eq!(code.as_u16(), status as u16),
            (_, other) => panic!("status {status}: unexpected error {other:?}"),
        }
    }
}

#[tokio::test]
async fn validation_errors_are_returned_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let no_key = RitaClient::new(&RitaConfig::new(server.url(), "   ")).expect("client");
    assert!(matches!(
        no_key.get_cursor("test").await,
        Err(Error::ApiKeyNotConfigured)
    ));
    assert!(matches!(
        no_key.subscribe("test").await.err(),
        Some(Error::ApiKeyNotConfigured)
    ));

    let client = client_for(&server);
    assert!(matches!(
        client.get_events("   ").await,
        Err(Error::ChannelInvalid)
    ));

    let no_server = RitaClient::new(&RitaConfig::new("", "secret")).expect("client");
    assert!(matches!(
        no_server.send_event("test", &1).await,
        Err(Error::ServerNotConfigured)
    ));

    mock.assert_async().await;
}

#[tokio::test]
async fn subscribe_streams_events_until_server_eof() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::Exact("sub=true".into()))
        .match_header("authorization", "secret")
        .match_header("accept", "text/event-stream")
        .with_status(200)
        .with_body(concat!(
            "data: {\"id\":\"1\",\"createdAt\":\"2024-01-01T00:00:00Z\",\"data\":{}}\n",
            "\n",
            "data: ping\n",
            ": comment\n",
            "data: {bad json\n",
            "data: {\"id\":\"2\",\"createdAt\":\"2024-01-01T00:00:01Z\",\"data\":[1,2]}\n",
        ))
        .create_async()
        .await;

    let mut subscription = client_for(&server).subscribe("test").await.expect("subscription");

    assert_eq!(subscription.recv().await.expect("first event").id, "1");
    assert_eq!(subscription.recv().await.expect("second event").id, "2");
    // Body exhausted: the delivery channel closes and stays closed.
    assert!(subscription.recv().await.is_none());
    assert!(subscription.recv().await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn subscribe_since_sends_the_sentinel_cursor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sub".into(), "true".into()),
            Matcher::UrlEncoded("eventId".into(), "$".into()),
        ]))
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let mut subscription = client_for(&server)
        .subscribe_since("test", LAST_EVENT)
        .await
        .expect("subscription");
    assert!(subscription.recv().await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn subscribe_fails_with_a_typed_error_on_rejection() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::Exact("sub=true".into()))
        .with_status(401)
        .create_async()
        .await;

    let err = client_for(&server).subscribe("test").await.unwrap_err();
    assert!(matches!(err, Error::NotAuthorized));
}

#[tokio::test]
async fn subscription_implements_stream() {
    use futures::StreamExt;

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/event/test")
        .match_query(Matcher::Exact("sub=true".into()))
        .with_status(200)
        .with_body("data: {\"id\":\"1\",\"createdAt\":\"2024-01-01T00:00:00Z\",\"data\":null}\n")
        .create_async()
        .await;

    let subscription = client_for(&server).subscribe("test").await.expect("subscription");
    let ids: Vec<String> = subscription.map(|event| event.id).collect().await;
    assert_eq!(ids, vec!["1".to_string()]);
}
