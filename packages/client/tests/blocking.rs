#![cfg(feature = "blocking")]

use std::time::{Duration, Instant};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dualfetch_client::{FetchConfig, FetchError, FetchRequest, Fetcher, Tweet};

fn tweet_body() -> serde_json::Value {
    serde_json::json!([
        {"text": "a", "author": "@u1"},
        {"text": "b", "author": "@u2"},
        {"text": "c", "author": "@u1"},
    ])
}

#[tokio::test]
async fn round_trip_preserves_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tweet_body()))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let tweets = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        fetcher.fetch_blocking_url(&uri).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(
        tweets,
        vec![
            Tweet::new("a", "@u1"),
            Tweet::new("b", "@u2"),
            Tweet::new("c", "@u1"),
        ]
    );
}

#[tokio::test]
async fn call_blocks_for_at_least_the_server_delay() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tweet_body())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let elapsed = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        let start = Instant::now();
        fetcher.fetch_blocking_url(&uri).unwrap();
        start.elapsed()
    })
    .await
    .unwrap();

    assert!(elapsed >= Duration::from_millis(300), "returned in {elapsed:?}");
}

#[tokio::test]
async fn non_success_status_fails_with_the_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = format!("{}/missing", server.uri());
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        fetcher.fetch_blocking_url(&uri).unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(err, FetchError::HttpStatus { code: 404 }));
}

#[tokio::test]
async fn oversized_body_fails_with_payload_too_large() {
    let server = MockServer::start().await;

    let big_text = "x".repeat(4096);
    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"text": big_text, "author": "@u1"},
        ])))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::new(FetchConfig {
            max_body_bytes: 256,
            ..Default::default()
        })
        .unwrap();
        fetcher.fetch_blocking_url(&uri).unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(err, FetchError::PayloadTooLarge { limit: 256 }));
}

#[tokio::test]
async fn malformed_body_fails_with_deserialization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not even json"))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        fetcher.fetch_blocking_url(&uri).unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(err, FetchError::Deserialization(_)));
}

#[tokio::test]
async fn headers_and_cookies_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .and(header("X-Test-Header", "testvalue"))
        .and(header("Cookie", "testkey=testvalue"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tweet_body()))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let tweets = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        let request = FetchRequest::get(&uri)
            .unwrap()
            .with_header("X-Test-Header", "testvalue")
            .with_cookie("testkey", "testvalue");
        fetcher.fetch_blocking(&request).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(tweets.len(), 3);
}

#[tokio::test]
async fn connection_refused_is_classified() {
    // Bind then drop to get a port nothing is listening on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let uri = format!("http://127.0.0.1:{port}/slow-tweets");
    let err = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::with_defaults().unwrap();
        fetcher.fetch_blocking_url(&uri).unwrap_err()
    })
    .await
    .unwrap();

    assert!(
        matches!(err, FetchError::ConnectionRefused),
        "got {err:?}"
    );
}

#[tokio::test]
async fn shared_fetcher_serves_concurrent_blocking_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tweet_body()))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let fetcher = Fetcher::with_defaults().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let fetcher = fetcher.clone();
            let uri = uri.clone();
            tokio::task::spawn_blocking(move || fetcher.fetch_blocking_url(&uri).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn stalled_body_trips_the_read_timeout() {
    use std::io::{Read as _, Write as _};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    // Serve one connection by hand: first chunk promptly, then stall far
    // longer than the configured read timeout.
    std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf);

        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  content-type: application/json\r\n\
                  transfer-encoding: chunked\r\n\r\n",
            )
            .unwrap();
        let first = r#"[{"text":"a","author":"@u1"},"#;
        write!(socket, "{:x}\r\n{}\r\n", first.len(), first).unwrap();
        socket.flush().unwrap();

        std::thread::sleep(Duration::from_millis(1500));
        let rest = r#"{"text":"b","author":"@u2"}]"#;
        let _ = write!(socket, "{:x}\r\n{}\r\n0\r\n\r\n", rest.len(), rest);
    });

    let uri = format!("http://{addr}/slow-tweets");
    let (err, elapsed) = tokio::task::spawn_blocking(move || {
        let fetcher = Fetcher::new(FetchConfig {
            read_timeout: Duration::from_millis(300),
            ..Default::default()
        })
        .unwrap();
        let start = Instant::now();
        let err = fetcher.fetch_blocking_url(&uri).unwrap_err();
        (err, start.elapsed())
    })
    .await
    .unwrap();

    assert!(matches!(err, FetchError::ReadTimeout), "got {err:?}");
    assert!(
        elapsed < Duration::from_millis(1200),
        "read bound fired only after {elapsed:?}"
    );
}

#[tokio::test]
async fn fetcher_can_be_dropped_on_the_runtime_after_blocking_use() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tweet_body()))
        .mount(&server)
        .await;

    let uri = format!("{}/slow-tweets", server.uri());
    let fetcher = Fetcher::with_defaults().unwrap();

    let worker = fetcher.clone();
    let tweets = tokio::task::spawn_blocking(move || worker.fetch_blocking_url(&uri).unwrap())
        .await
        .unwrap();
    assert_eq!(tweets.len(), 3);

    // The last clone goes away on the async test body itself; teardown of
    // the used blocking client must not panic here.
    drop(fetcher);
}
