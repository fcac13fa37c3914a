//! EodClient against a mocked EOD Historical Data API

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eod_pipeline::api::{EodClient, FetchOutcome, MarketDataSource};
use eod_pipeline::error::FetchError;

use crate::common::test_data::date;

async fn client_for(server: &MockServer) -> EodClient {
    EodClient::with_base_url(&format!("{}/api", server.uri()), "test-key", None).unwrap()
}

#[tokio::test]
async fn test_daily_bars_request_and_normalization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/eod/AAPL.US"))
        .and(query_param("api_token", "test-key"))
        .and(query_param("from", "2023-01-01"))
        .and(query_param("to", "2023-01-31"))
        .and(query_param("period", "d"))
        .and(query_param("fmt", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2023-01-03", "open": 130.28, "high": 130.9, "low": 124.17,
              "close": 125.07, "adjusted_close": 124.2, "volume": 112117500 },
            { "date": "2023-01-04", "open": 126.89, "high": 128.66, "low": 125.08,
              "close": 126.36, "adjusted_close": 125.5, "volume": 89113600 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let bars = client
        .daily_bars("AAPL", "US", date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].ticker, "AAPL");
    assert_eq!(bars[0].time, date(2023, 1, 3).and_hms_opt(0, 0, 0));
    assert_eq!(bars[0].open, Some(130.28));
    assert_eq!(bars[1].volume, Some(89_113_600));
}

#[tokio::test]
async fn test_empty_array_is_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/eod/AAPL.US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let outcome = client
        .fetch_daily_bars("AAPL", "US", date(2023, 1, 1), date(2023, 1, 31))
        .await;
    assert_eq!(outcome, FetchOutcome::Empty);
}

#[tokio::test]
async fn test_missing_date_key_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/eod/AAPL.US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 1 }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .daily_bars("AAPL", "US", date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap_err();
    assert_matches!(err, FetchError::DataShape { .. });

    let outcome = client
        .fetch_daily_bars("AAPL", "US", date(2023, 1, 1), date(2023, 1, 31))
        .await;
    assert_matches!(outcome, FetchOutcome::Malformed(reason) => {
        assert!(reason.contains("'date' column missing"));
    });
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client
        .news("AAPL", date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap_err();
    assert_matches!(err, FetchError::Status { status, .. } => {
        assert_eq!(status.as_u16(), 503);
    });
    // The API key must not leak into error messages.
    assert!(!err.to_string().contains("test-key"));

    let outcome = client.fetch_news("AAPL", date(2023, 1, 1), date(2023, 1, 31)).await;
    assert_matches!(outcome, FetchOutcome::TransportFailure(_));
}

#[tokio::test]
async fn test_connection_refused_hides_api_key() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base = format!("http://127.0.0.1:{}/api", port);
    let client = EodClient::with_base_url(&base, "SECRET-KEY", None).unwrap();
    let err = client
        .daily_bars("AAPL", "US", date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap_err();
    assert_matches!(err, FetchError::Transport { ref url, .. } => {
        assert_eq!(url, &format!("{}/eod/AAPL.US", base));
    });
    assert!(!err.to_string().contains("SECRET-KEY"));
    assert!(!format!("{:?}", err).contains("SECRET-KEY"));

    let outcome = client
        .fetch_news("AAPL", date(2023, 1, 1), date(2023, 1, 31))
        .await;
    assert_matches!(outcome, FetchOutcome::TransportFailure(reason) => {
        assert!(!reason.contains("SECRET-KEY"));
    });
}

#[tokio::test]
async fn test_news_flattening() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .and(query_param("s", "AAPL"))
        .and(query_param("from", "2023-01-01"))
        .and(query_param("to", "2023-01-31"))
        .and(query_param("api_token", "test-key"))
        .and(query_param("fmt", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "date": "2023-01-31T21:58:00+00:00",
                "title": "Apple earnings preview",
                "content": "Analysts expect...",
                "link": "https://news.example/apple",
                "symbols": ["AAPL", "MSFT"],
                "tags": ["EARNINGS", "TECH"],
                "sentiment": { "polarity": 0.81, "neg": 0.02, "neu": 0.88, "pos": 0.1 }
            },
            {
                "date": "garbage",
                "symbols": null
            }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let news = client
        .news("AAPL", date(2023, 1, 1), date(2023, 1, 31))
        .await
        .unwrap();

    assert_eq!(news.len(), 2);
    assert_eq!(news[0].symbols, "AAPL,MSFT");
    assert_eq!(news[0].tags, "EARNINGS,TECH");
    assert_eq!(news[0].time, date(2023, 1, 31).and_hms_opt(21, 58, 0));
    assert_eq!(news[0].sentiment_neu, Some(0.88));

    assert_eq!(news[1].time, None);
    assert_eq!(news[1].title, "");
    assert_eq!(news[1].symbols, "");
    assert_eq!(news[1].tags, "");
    assert_eq!(news[1].sentiment_polarity, None);
    assert_eq!(news[1].sentiment_pos, None);
}

#[tokio::test]
async fn test_non_list_news_is_empty_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "no news" })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let outcome = client.fetch_news("AAPL", date(2023, 1, 1), date(2023, 1, 31)).await;
    assert_eq!(outcome, FetchOutcome::Empty);
}
