use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use nightverse_api::{
    db::InMemoryDocumentStore,
    error::{AppError, AppResult},
    models::{Genre, GenreList, MovieDetails, MovieId, MovieSummary, PagedResults},
    routes::{create_router, AppState},
    services::providers::CatalogProvider,
};

const USER: &str = "uid-test";

/// Fixed catalog: ids below 100 resolve, everything else is a 404
struct StubCatalog;

#[async_trait::async_trait]
impl CatalogProvider for StubCatalog {
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        if movie_id.0 >= 100 {
            return Err(AppError::NotFound(format!("movie {}", movie_id)));
        }
        Ok(MovieDetails {
            id: movie_id,
            title: format!("Movie {}", movie_id),
            overview: Some("Stub".to_string()),
            genres: vec![
                Genre { id: 28, name: "Action".to_string() },
                Genre { id: 18, name: "Drama".to_string() },
            ],
            vote_average: Some(7.86),
            release_date: Some("2020-01-01".to_string()),
            runtime: Some(120),
            poster_path: Some(format!("/{}.jpg", movie_id)),
        })
    }

    async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieSummary>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Search query cannot be empty".to_string()));
        }
        Ok(vec![MovieSummary {
            id: MovieId(603),
            title: "The Matrix".to_string(),
            poster_path: None,
            vote_average: Some(8.2),
            release_date: Some("1999-03-30".to_string()),
            genre_ids: vec![28],
        }])
    }

    async fn discover_by_genre(
        &self,
        genre_id: u32,
        page: u32,
        _alphabetical: bool,
    ) -> AppResult<PagedResults<MovieSummary>> {
        Ok(listing(page, &["Airplane!", "Big", "Booksmart"], genre_id))
    }

    async fn popular(&self, page: u32) -> AppResult<PagedResults<MovieSummary>> {
        Ok(listing(page, &["Dune", "Barbie"], 28))
    }

    async fn now_playing(&self, page: u32) -> AppResult<PagedResults<MovieSummary>> {
        Ok(listing(page, &["Wonka", "Napoleon", "Wish"], 35))
    }

    async fn genres(&self) -> AppResult<GenreList> {
        Ok(GenreList {
            genres: vec![
                Genre { id: 28, name: "Action".to_string() },
                Genre { id: 35, name: "Comedy".to_string() },
            ],
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn listing(page: u32, titles: &[&str], genre_id: u32) -> PagedResults<MovieSummary> {
    let results = titles
        .iter()
        .enumerate()
        .map(|(i, title)| MovieSummary {
            id: MovieId(i as u64 + 1),
            title: title.to_string(),
            poster_path: None,
            vote_average: None,
            release_date: None,
            genre_ids: vec![genre_id],
        })
        .collect();
    PagedResults {
        page,
        results,
        total_pages: 2,
    }
}

fn create_test_app() -> Router {
    let state = AppState::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(StubCatalog),
        Duration::from_secs(1),
    );
    create_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", USER);

    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let app = create_test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let request_id = response.headers().get("x-request-id").unwrap();
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_watchlist_requires_user() {
    let app = create_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/watchlist")
        .header("content-type", "application/json")
        .body(Body::from(json!({"id": 7}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_then_list_enriched_watchlist() {
    let app = create_test_app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/watchlist",
        Some(json!({"id": 7, "title": "Seven", "poster_path": "/mine.jpg"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], 1);

    let (status, body) = send(&app, Method::GET, "/api/v1/watchlist", None).await;
    assert_eq!(status, StatusCode::OK);

    let entry = &body["entries"][0];
    assert_eq!(entry["movie_id"], 7);
    assert_eq!(entry["title"], "Movie 7");
    assert_eq!(entry["genres"], json!(["Action", "Drama"]));
    assert_eq!(entry["rating"], "7.9");
    assert_eq!(entry["release_date"], "2020-01-01");
    assert_eq!(entry["runtime_minutes"], 120);
    assert_eq!(entry["poster_path"], "/mine.jpg");

    assert_eq!(body["stats"]["movie_count"], 1);
    assert_eq!(body["stats"]["total_runtime_minutes"], 120);
    assert_eq!(body["stats"]["genre_counts"]["Action"], 1);
}

#[tokio::test]
async fn test_adding_twice_keeps_one_entry() {
    let app = create_test_app();

    for title in ["First", "Second"] {
        send(
            &app,
            Method::POST,
            "/api/v1/watchlist",
            Some(json!({"id": 3, "title": title})),
        )
        .await;
    }

    let (_, snapshot) = send(
        &app,
        Method::POST,
        "/api/v1/watchlist",
        Some(json!({"id": 3, "title": "Third"})),
    )
    .await;
    assert_eq!(snapshot["entries"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["entries"][0]["title"], "Third");
}

#[tokio::test]
async fn test_failed_lookup_keeps_entry_visible() {
    let app = create_test_app();
    send(
        &app,
        Method::POST,
        "/api/v1/watchlist",
        Some(json!({"id": 404, "title": "Lost"})),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/watchlist", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"][0]["title"], "Lost");
    assert_eq!(body["entries"][0]["runtime_minutes"], 0);
}

#[tokio::test]
async fn test_remove_and_membership() {
    let app = create_test_app();
    send(&app, Method::POST, "/api/v1/watchlist", Some(json!({"id": 9}))).await;

    let (_, membership) = send(&app, Method::GET, "/api/v1/watchlist/9", None).await;
    assert_eq!(membership["in_watchlist"], true);

    let (status, _) = send(&app, Method::DELETE, "/api/v1/watchlist/9", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, membership) = send(&app, Method::GET, "/api/v1/watchlist/9", None).await;
    assert_eq!(membership["in_watchlist"], false);

    // removing again is not an error
    let (status, _) = send(&app, Method::DELETE, "/api/v1/watchlist/9", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_toggle() {
    let app = create_test_app();
    let item = json!({"id": 12, "title": "Twelve"});

    let (_, on) = send(&app, Method::PUT, "/api/v1/watchlist/toggle", Some(item.clone())).await;
    assert_eq!(on["in_watchlist"], true);

    let (_, off) = send(&app, Method::PUT, "/api/v1/watchlist/toggle", Some(item)).await;
    assert_eq!(off["in_watchlist"], false);
}

#[tokio::test]
async fn test_rows_pad_odd_watchlist() {
    let app = create_test_app();
    for id in 1..=3 {
        send(&app, Method::POST, "/api/v1/watchlist", Some(json!({"id": id}))).await;
    }

    let (status, rows) = send(&app, Method::GET, "/api/v1/watchlist/rows", None).await;

    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["left"]["movie_id"], 1);
    assert_eq!(rows[0]["right"]["movie_id"], 2);
    assert_eq!(rows[1]["left"]["movie_id"], 3);
    assert!(rows[1]["right"].is_null());
}

#[tokio::test]
async fn test_stats_for_empty_watchlist() {
    let app = create_test_app();
    let (status, stats) = send(&app, Method::GET, "/api/v1/watchlist/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["movie_count"], 0);
    assert_eq!(stats["total_runtime_minutes"], 0);
    assert_eq!(stats["genre_counts"], json!({}));
}

#[tokio::test]
async fn test_category_letter_filter() {
    let app = create_test_app();
    let (status, page) = send(
        &app,
        Method::GET,
        "/api/v1/categories/35/movies?page=1&letter=b",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["letter"], "B");
    assert_eq!(page["has_more"], true);
    let titles: Vec<&str> = page["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Big", "Booksmart"]);
}

#[tokio::test]
async fn test_category_rejects_bad_letter() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/categories/35/movies?letter=42",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("single letter"));
}

#[tokio::test]
async fn test_search_and_details() {
    let app = create_test_app();

    let (status, cards) = send(&app, Method::GET, "/api/v1/movies/search?q=matrix", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cards[0]["title"], "The Matrix");
    assert_eq!(cards[0]["genres"], json!(["Action"]));

    let (status, details) = send(&app, Method::GET, "/api/v1/movies/42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["runtime"], 120);

    let (status, _) = send(&app, Method::GET, "/api/v1/movies/500", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_feed_pairs_latest() {
    let app = create_test_app();
    let (status, feed) = send(&app, Method::GET, "/api/v1/home", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["top"][0]["title"], "Dune");
    assert_eq!(feed["top"][0]["genres"], json!(["Action"]));
    assert_eq!(feed["action"].as_array().unwrap().len(), 3);
    assert_eq!(feed["comedy"][1]["title"], "Big");

    let latest = feed["latest"].as_array().unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0]["left"]["title"], "Wonka");
    assert_eq!(latest[0]["right"]["title"], "Napoleon");
    assert_eq!(latest[1]["left"]["title"], "Wish");
    assert!(latest[1]["right"].is_null());
}

#[tokio::test]
async fn test_short_search_returns_nothing() {
    let app = create_test_app();

    let (status, cards) = send(&app, Method::GET, "/api/v1/movies/search?q=ma", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cards, json!([]));

    let (status, _) = send(&app, Method::GET, "/api/v1/movies/search?q=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_page_names_its_genre() {
    let app = create_test_app();
    let (status, page) = send(&app, Method::GET, "/api/v1/categories/28/movies", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["genre_name"], "Action");
    assert_eq!(page["movies"].as_array().unwrap().len(), 3);
}

/// Reads server-sent events until one matches `accept`, returning its JSON payload
async fn next_event_matching(body: &mut Body, accept: impl Fn(&Value) -> bool) -> Value {
    let mut buffer = String::new();
    loop {
        let frame = body.frame().await.expect("event stream ended").unwrap();
        if let Some(data) = frame.data_ref() {
            buffer.push_str(std::str::from_utf8(data).unwrap());
        }

        while let Some(end) = buffer.find("\n\n") {
            let event: String = buffer.drain(..end + 2).collect();
            let payload = event
                .lines()
                .find_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start);
            if let Some(payload) = payload {
                let view: Value = serde_json::from_str(payload).unwrap();
                if accept(&view) {
                    return view;
                }
            }
        }
    }
}

#[tokio::test]
async fn test_event_stream_follows_changes() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/api/v1/watchlist/events")
        .header("x-user-id", USER)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
    let mut body = response.into_body();

    let (status, _) = send(&app, Method::POST, "/api/v1/watchlist", Some(json!({"id": 7}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let view = tokio::time::timeout(
        Duration::from_secs(5),
        next_event_matching(&mut body, |view| view["version"] == 1 && view["enriched"] == true),
    )
    .await
    .expect("no enriched view was streamed");

    assert_eq!(view["entries"][0]["movie_id"], 7);
    assert_eq!(view["entries"][0]["title"], "Movie 7");
    assert_eq!(view["stats"]["movie_count"], 1);
}

#[tokio::test]
async fn test_event_stream_requires_user() {
    let app = create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/watchlist/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
