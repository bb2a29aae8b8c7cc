use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use catalog_api::{
    config::AppSettings,
    db::InterestStore,
    error::{AppError, AppResult},
    models::{Category, Genre, Interest},
    routes::{create_router, AppState},
    services::providers::{DiscoverFilters, FetchRequest},
    testing::{movie_json, person_json, series_json, ScriptedFetcher},
};

struct StaticInterests(Option<Vec<Interest>>);

#[async_trait::async_trait]
impl InterestStore for StaticInterests {
    async fn interests_for(&self, _user_id: &str) -> AppResult<Vec<Interest>> {
        self.0
            .clone()
            .ok_or_else(|| AppError::Internal("store offline".to_string()))
    }
}

fn create_test_server(interests: Option<Vec<Interest>>) -> (TestServer, Arc<ScriptedFetcher>) {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let state = AppState::new(
        fetcher.clone(),
        Arc::new(StaticInterests(interests)),
        AppSettings::default(),
    );
    let server = TestServer::new(create_router(state)).unwrap();
    (server, fetcher)
}

fn search(query: &str) -> FetchRequest {
    FetchRequest::Search {
        query: query.to_string(),
    }
}

fn result_ids(body: &Value) -> Vec<u64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server(Some(vec![]));
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (server, _) = create_test_server(Some(vec![]));
    let id = "3f0c1a52-8a7e-4c1f-9d4b-2b7a2f1c9e10";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;

    let echoed = response.headers().get("x-request-id").unwrap();
    assert_eq!(echoed.to_str().unwrap(), id);
}

#[tokio::test]
async fn test_pagination_window_endpoint() {
    let (server, _) = create_test_server(Some(vec![]));

    let response = server
        .get("/api/v1/pagination")
        .add_query_param("current_page", 50)
        .add_query_param("total_pages", 100)
        .await;
    response.assert_status_ok();

    let tokens: Value = response.json();
    let tokens = tokens.as_array().unwrap();
    assert_eq!(tokens.len(), 11);
    assert_eq!(tokens[0], json!({"kind": "page", "page": 1}));
    assert_eq!(tokens[1], json!({"kind": "ellipsis"}));
    assert_eq!(tokens[2], json!({"kind": "page", "page": 47}));
    assert_eq!(tokens[10], json!({"kind": "page", "page": 100}));
}

#[tokio::test]
async fn test_pagination_rejects_bad_windows() {
    let (server, _) = create_test_server(Some(vec![]));

    for window in ["8", "0", "23", "4000000000"] {
        server
            .get("/api/v1/pagination")
            .add_query_param("current_page", 1)
            .add_query_param("total_pages", 4_000_000_000u32)
            .add_query_param("window", window)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_pagination_huge_page_count() {
    let (server, _) = create_test_server(Some(vec![]));

    let response = server
        .get("/api/v1/pagination")
        .add_query_param("current_page", 4_000_000_000u32)
        .add_query_param("total_pages", 4_000_000_000u32)
        .add_query_param("window", 5)
        .await;
    response.assert_status_ok();

    let tokens: Value = response.json();
    let tokens = tokens.as_array().unwrap();
    assert_eq!(tokens.len(), 7);
    assert_eq!(tokens[6], json!({"kind": "page", "page": 4_000_000_000u32}));
}

#[tokio::test]
async fn test_catalog_discover() {
    let (server, fetcher) = create_test_server(Some(vec![]));
    let request = FetchRequest::Discover {
        category: Category::Movie,
        filters: DiscoverFilters {
            genres: vec![28],
            ..Default::default()
        },
    };
    fetcher
        .set_page(
            &request,
            1,
            30,
            vec![movie_json(1, 500, 7.0), movie_json(2, 1, 1.0), person_json(3)],
        )
        .await;

    let response = server
        .get("/api/v1/catalog/movie")
        .add_query_param("genres", "28")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(result_ids(&body["items"]), vec![1]);
    assert_eq!(body["page"], 1);
    assert_eq!(body["total_pages"], 30);
    assert_eq!(body["pagination"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_catalog_rejects_unknown_category() {
    let (server, _) = create_test_server(Some(vec![]));
    let response = server.get("/api/v1/catalog/person").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_fetch_failure_is_bad_gateway() {
    let (server, fetcher) = create_test_server(Some(vec![]));
    fetcher
        .fail_page(
            &FetchRequest::Trending {
                category: Category::Series,
            },
            1,
        )
        .await;

    let response = server.get("/api/v1/catalog/tv/trending").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_search_session_flow() {
    let (server, fetcher) = create_test_server(Some(vec![]));
    let request = search("breaking");
    let first_page: Vec<Value> = (1..=20).map(|id| series_json(id, 100, 8.0)).collect();
    let second_page: Vec<Value> = (21..=35).map(|id| movie_json(id, 100, 8.0)).collect();
    fetcher.set_page(&request, 1, 2, first_page).await;
    fetcher.set_page(&request, 2, 2, second_page).await;

    let response = server
        .post("/api/v1/search/sessions/tab-1")
        .json(&json!({ "query": "breaking" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["session"]["phase"], "idle");
    assert_eq!(body["session"]["results"].as_array().unwrap().len(), 20);

    let response = server
        .post("/api/v1/search/sessions/tab-1")
        .json(&json!({ "query": "breaking", "mode": "load_more" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["added"], 15);
    assert_eq!(body["session"]["phase"], "exhausted");

    let response = server
        .post("/api/v1/search/sessions/tab-1")
        .json(&json!({ "query": "breaking", "mode": "load_more" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["outcome"], "no_op");
    assert_eq!(body["session"]["results"].as_array().unwrap().len(), 35);
    assert_eq!(fetcher.call_count().await, 2);

    let response = server.get("/api/v1/search/sessions/tab-1").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["query"], "breaking");

    server
        .delete("/api/v1/search/sessions/tab-1")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get("/api/v1/search/sessions/tab-1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_failure_keeps_partial_results() {
    let (server, fetcher) = create_test_server(Some(vec![]));
    let request = search("heat");
    fetcher
        .set_page(&request, 1, 4, vec![movie_json(949, 7000, 7.9)])
        .await;
    fetcher.fail_page(&request, 2).await;

    let response = server
        .post("/api/v1/search/sessions/tab-2")
        .json(&json!({ "query": "heat", "mode": "fresh" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["outcome"], "failed");
    assert!(body["error"].is_string());
    assert_eq!(result_ids(&body["session"]["results"]), vec![949]);
    assert_eq!(body["session"]["phase"], "idle");
}

#[tokio::test]
async fn test_recommendations_from_interests() {
    let interests = vec![Interest::Title {
        id: 603,
        category: Category::Movie,
    }];
    let (server, fetcher) = create_test_server(Some(interests));
    fetcher
        .set_page(
            &FetchRequest::Similar {
                category: Category::Movie,
                id: 603,
            },
            1,
            1,
            vec![
                movie_json(604, 100, 6.5),
                movie_json(603, 9000, 8.7),
                movie_json(605, 800, 6.0),
            ],
        )
        .await;

    let response = server.get("/api/v1/recommendations/user-42").await;
    response.assert_status_ok();
    assert_eq!(result_ids(&response.json::<Value>()), vec![605, 604]);
}

#[tokio::test]
async fn test_recommendations_without_personalization() {
    let (server, fetcher) = create_test_server(None);
    fetcher
        .set_page(
            &FetchRequest::Trending {
                category: Category::Movie,
            },
            1,
            5,
            vec![movie_json(1, 20, 6.0), movie_json(2, 40, 6.0)],
        )
        .await;

    let response = server.get("/api/v1/recommendations/user-42").await;
    response.assert_status_ok();
    assert_eq!(result_ids(&response.json::<Value>()), vec![2, 1]);
}

#[tokio::test]
async fn test_genres_loaded_once() {
    let (server, fetcher) = create_test_server(Some(vec![]));
    fetcher
        .set_genres(
            Category::Movie,
            vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
        )
        .await;
    fetcher
        .set_genres(
            Category::Series,
            vec![Genre {
                id: 18,
                name: "Drama".to_string(),
            }],
        )
        .await;

    let response = server.get("/api/v1/genres").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["movie"]["28"], "Action");
    assert_eq!(body["tv"]["18"], "Drama");

    server.get("/api/v1/genres").await.assert_status_ok();
    assert_eq!(fetcher.genre_call_count().await, 2);
}
