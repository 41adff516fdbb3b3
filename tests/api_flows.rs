//! End-to-end flows against a loopback HTTP server.
//!
//! Each test spins up a small axum router standing in for the real API,
//! points a [`Client`] at it, and drives the public surface: the assertions
//! are about observable behavior (request counts, session state, cache
//! contents), not internals.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tempfile::TempDir;
use tracing::level_filters::LevelFilter;
use url::Url;

use gramline::config::{
    ApiSettings, CacheSettings, LogFormat, LoggingSettings, SessionSettings, Settings,
};
use gramline::domain::requests::{CreatePostRequest, WriteCommentRequest};
use gramline::{Client, ErrorKind};

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

fn settings(addr: SocketAddr, dir: &TempDir) -> Settings {
    Settings {
        api: ApiSettings {
            base_url: Url::parse(&format!("http://{addr}/api/instagram/")).expect("base url"),
            timeout: Duration::from_secs(5),
            user_agent: "gramline-tests".to_string(),
        },
        session: SessionSettings {
            storage_path: dir.path().join("session.json"),
        },
        cache: CacheSettings::default(),
        logging: LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        },
    }
}

fn post_json(id: i64) -> Value {
    json!({"id": id, "username": "ada"})
}

async fn expired_token() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "token expired"})),
    )
}

fn login_route() -> Router {
    Router::new().route(
        "/api/instagram/users/login",
        post(|Json(body): Json<Value>| async move {
            assert!(body.get("username").is_some());
            assert!(body.get("password").is_some());
            Json(json!({"token": "tok-1", "username": "ada", "message": "welcome"}))
        }),
    )
}

#[tokio::test]
async fn concurrent_feed_reads_share_one_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let router = Router::new().route(
        "/api/instagram/posts",
        get({
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Keep the first request in flight long enough for the
                    // second caller to join it.
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Json(json!([post_json(1)]))
                }
            }
        }),
    );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let client = Client::new(&settings(addr, &dir)).expect("client");

    let posts_a = client.posts();
    let posts_b = client.posts();
    let (a, b) = tokio::join!(posts_a.feed(), posts_b.feed());
    assert_eq!(a.expect("first feed").len(), 1);
    assert_eq!(b.expect("second feed").len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn creating_a_post_refreshes_the_feed() {
    let feed_calls = Arc::new(AtomicUsize::new(0));
    let posts = Arc::new(Mutex::new(vec![1i64]));

    let router = Router::new()
        .route(
            "/api/instagram/posts",
            get({
                let feed_calls = Arc::clone(&feed_calls);
                let posts = Arc::clone(&posts);
                move || {
                    let feed_calls = Arc::clone(&feed_calls);
                    let posts = Arc::clone(&posts);
                    async move {
                        feed_calls.fetch_add(1, Ordering::SeqCst);
                        let ids = posts.lock().expect("posts lock").clone();
                        Json(Value::Array(ids.into_iter().map(post_json).collect()))
                    }
                }
            }),
        )
        .route(
            "/api/instagram/posts/create-post",
            post({
                let posts = Arc::clone(&posts);
                move |Json(body): Json<Value>| {
                    let posts = Arc::clone(&posts);
                    async move {
                        assert_eq!(body["imageUrl"], "https://cdn.example/2.png");
                        posts.lock().expect("posts lock").push(2);
                        StatusCode::OK
                    }
                }
            }),
        );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let client = Client::new(&settings(addr, &dir)).expect("client");

    assert_eq!(client.posts().feed().await.expect("feed").len(), 1);
    // Cached: a second read does not hit the server.
    assert_eq!(client.posts().feed().await.expect("feed").len(), 1);
    assert_eq!(feed_calls.load(Ordering::SeqCst), 1);

    client
        .posts()
        .create(&CreatePostRequest {
            description: "sunset".to_string(),
            image_url: "https://cdn.example/2.png".to_string(),
        })
        .await
        .expect("create post");

    assert_eq!(client.posts().feed().await.expect("feed").len(), 2);
    assert_eq!(feed_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn writing_a_comment_refreshes_the_count() {
    let count = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/instagram/comments/post/7/comment-count",
            get({
                let count = Arc::clone(&count);
                move || {
                    let count = Arc::clone(&count);
                    async move { Json(json!(count.load(Ordering::SeqCst))) }
                }
            }),
        )
        .route(
            "/api/instagram/comments/create-comment",
            post({
                let count = Arc::clone(&count);
                move |Json(body): Json<Value>| {
                    let count = Arc::clone(&count);
                    async move {
                        assert_eq!(body["postId"], 7);
                        count.fetch_add(1, Ordering::SeqCst);
                        StatusCode::OK
                    }
                }
            }),
        );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let client = Client::new(&settings(addr, &dir)).expect("client");

    assert_eq!(client.comments().count(7).await.expect("count"), 0);
    client
        .comments()
        .write(&WriteCommentRequest {
            content: "nice".to_string(),
            post_id: 7,
        })
        .await
        .expect("write comment");
    assert_eq!(client.comments().count(7).await.expect("count"), 1);
}

#[tokio::test]
async fn follow_toggle_flips_the_cached_flag() {
    let followed = Arc::new(AtomicBool::new(false));
    let router = Router::new()
        .route(
            "/api/instagram/follows/already-follows/{username}",
            get({
                let followed = Arc::clone(&followed);
                move |Path(username): Path<String>| {
                    let followed = Arc::clone(&followed);
                    async move {
                        assert_eq!(username, "bob");
                        Json(json!(followed.load(Ordering::SeqCst)))
                    }
                }
            }),
        )
        .route(
            "/api/instagram/follows/following/{username}",
            post({
                let followed = Arc::clone(&followed);
                move |Path(_): Path<String>| {
                    let followed = Arc::clone(&followed);
                    async move {
                        followed.fetch_xor(true, Ordering::SeqCst);
                        StatusCode::OK
                    }
                }
            }),
        );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let client = Client::new(&settings(addr, &dir)).expect("client");

    assert!(!client.follows().is_followed("bob").await.expect("flag"));
    client.follows().toggle("bob").await.expect("toggle");
    assert!(client.follows().is_followed("bob").await.expect("flag"));
}

#[tokio::test]
async fn bearer_token_is_attached_after_login_and_survives_a_restart() {
    let router = login_route().route(
        "/api/instagram/posts",
        get(|headers: HeaderMap| async move {
            let authorized = headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some("Bearer tok-1");
            if authorized {
                Json(json!([post_json(1)])).into_response()
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        }),
    );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = settings(addr, &dir);

    let client = Client::new(&config).expect("client");
    assert_eq!(
        client.posts().feed().await,
        Err(ErrorKind::Unauthorized),
        "anonymous requests carry no token"
    );

    let response = client.auth().login("ada", "pw").await.expect("login");
    assert_eq!(response.username, "ada");
    assert!(client.session().is_authenticated());
    assert_eq!(client.posts().feed().await.expect("feed").len(), 1);

    // A fresh client over the same storage path rehydrates the session and
    // can talk to the API without logging in again.
    let restarted = Client::new(&config).expect("restarted client");
    assert!(restarted.session().is_authenticated());
    assert_eq!(restarted.session().username().as_deref(), Some("ada"));
    assert_eq!(restarted.posts().feed().await.expect("feed").len(), 1);
}

#[tokio::test]
async fn logout_clears_session_and_cached_data() {
    let feed_calls = Arc::new(AtomicUsize::new(0));
    let router = login_route().route(
        "/api/instagram/posts",
        get({
            let feed_calls = Arc::clone(&feed_calls);
            move || {
                let feed_calls = Arc::clone(&feed_calls);
                async move {
                    feed_calls.fetch_add(1, Ordering::SeqCst);
                    Json(json!([post_json(1)]))
                }
            }
        }),
    );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = settings(addr, &dir);
    let client = Client::new(&config).expect("client");

    client.auth().login("ada", "pw").await.expect("login");
    client.posts().feed().await.expect("feed");
    assert!(!client.cache().is_empty());

    client.auth().logout();
    assert!(!client.session().is_authenticated());
    assert!(client.cache().is_empty());

    // The next read goes back to the network.
    client.posts().feed().await.expect("feed");
    assert_eq!(feed_calls.load(Ordering::SeqCst), 2);

    // Durable storage is gone too.
    let restarted = Client::new(&config).expect("restarted client");
    assert!(!restarted.session().is_authenticated());
}

#[tokio::test]
async fn unauthorized_response_forces_logout_and_drops_the_cache() {
    let router = login_route()
        .route(
            "/api/instagram/posts",
            get(|| async { Json(json!([post_json(1)])) }),
        )
        .route(
            "/api/instagram/post-likes/post/7/like-count",
            get(expired_token),
        )
        .route(
            "/api/instagram/post-likes/post/7/is-liked",
            get(expired_token),
        );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let config = settings(addr, &dir);
    let client = Client::new(&config).expect("client");

    client.auth().login("ada", "pw").await.expect("login");
    client.posts().feed().await.expect("feed");
    assert!(!client.cache().is_empty());

    // Two components hit the expired-token endpoint at once; both see the
    // error, and the shared state ends up logged out exactly once.
    let likes_a = client.post_likes();
    let likes_b = client.post_likes();
    let (a, b) = tokio::join!(likes_a.count(7), likes_b.is_liked(7));
    assert_eq!(a, Err(ErrorKind::Unauthorized));
    assert_eq!(b, Err(ErrorKind::Unauthorized));

    assert!(!client.session().is_authenticated());
    assert!(client.cache().is_empty());

    let restarted = Client::new(&config).expect("restarted client");
    assert!(!restarted.session().is_authenticated());
}

#[tokio::test]
async fn rejected_mutation_surfaces_the_server_message() {
    let router = Router::new().route(
        "/api/instagram/posts/create-post",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "description too long"})),
            )
        }),
    );
    let addr = spawn(router).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let client = Client::new(&settings(addr, &dir)).expect("client");

    let outcome = client
        .posts()
        .create(&CreatePostRequest {
            description: "x".repeat(10_000),
            image_url: String::new(),
        })
        .await;
    assert_eq!(
        outcome,
        Err(ErrorKind::Rejected {
            status: 400,
            message: "description too long".to_string(),
        })
    );
}
