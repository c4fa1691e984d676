//! Reload listener tests against an in-process event stream.
//!
//! The mock side serves `text/event-stream` responses with the same
//! `start`/`heartbeat` events a development server emits, including streams
//! that end early to force the reconnect path.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::time::{timeout, Duration};

use passkey_auth_client::{ClientConfig, ReloadEvent, ReloadListener};

/// Build an SSE response; `hold_open` keeps the connection alive after the
/// scripted events, the way a healthy server's stream stays up.
fn sse(events: Vec<Event>, hold_open: bool) -> Sse<BoxStream<'static, Result<Event, Infallible>>> {
    let events = stream::iter(events.into_iter().map(Ok::<Event, Infallible>));
    if hold_open {
        Sse::new(events.chain(stream::pending()).boxed())
    } else {
        Sse::new(events.boxed())
    }
}

/// Log pipeline for test runs; `RUST_LOG` overrides the default filter.
/// First test wins, later calls are no-ops.
fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_auth_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

async fn spawn_server(app: Router) -> SocketAddr {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    addr
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(format!("http://{addr}"))
}

#[tokio::test]
async fn start_event_triggers_a_reload() {
    let app = Router::new().route(
        "/__livereload",
        get(|| async {
            sse(
                vec![
                    Event::default().event("heartbeat").data("ping"),
                    Event::default().event("start").data("server started"),
                ],
                true,
            )
        }),
    );
    let addr = spawn_server(app).await;

    let mut reloads = ReloadListener::new(&config_for(addr)).spawn();

    let event = timeout(Duration::from_secs(5), reloads.recv())
        .await
        .expect("timeout")
        .expect("listener stopped");
    assert_eq!(event, ReloadEvent::Reload);
}

#[tokio::test]
async fn heartbeats_alone_do_not_reload() {
    let app = Router::new().route(
        "/__livereload",
        get(|| async {
            sse(
                vec![
                    Event::default().event("heartbeat").data("ping"),
                    Event::default().event("heartbeat").data("ping"),
                ],
                true,
            )
        }),
    );
    let addr = spawn_server(app).await;

    let mut reloads = ReloadListener::new(&config_for(addr)).spawn();

    let waited = timeout(Duration::from_millis(500), reloads.recv()).await;
    assert!(waited.is_err(), "heartbeats must not reload");
}

#[tokio::test]
async fn listener_reconnects_after_the_stream_ends() {
    let connections = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/__livereload",
        get({
            let connections = connections.clone();
            move || {
                let connections = connections.clone();
                async move {
                    let n = connections.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        // First stream dies right away, like a server
                        // going down for a restart
                        sse(vec![Event::default().event("heartbeat").data("ping")], false)
                    } else {
                        sse(vec![Event::default().event("start").data("server started")], true)
                    }
                }
            }
        }),
    );
    let addr = spawn_server(app).await;

    let mut reloads = ReloadListener::new(&config_for(addr)).spawn();

    // One reconnect backoff plus the reload delay fits well inside 10s
    let event = timeout(Duration::from_secs(10), reloads.recv())
        .await
        .expect("timeout")
        .expect("listener stopped");
    assert_eq!(event, ReloadEvent::Reload);
    assert!(connections.load(Ordering::SeqCst) >= 2, "should have reconnected");
}

#[tokio::test]
async fn custom_reload_path_is_honored() {
    let app = Router::new().route(
        "/custom-reload",
        get(|| async { sse(vec![Event::default().event("start").data("server started")], true) }),
    );
    let addr = spawn_server(app).await;

    let mut config = config_for(addr);
    config.reload_path = "/custom-reload".to_string();

    let mut reloads = ReloadListener::new(&config).spawn();

    let event = timeout(Duration::from_secs(5), reloads.recv())
        .await
        .expect("timeout")
        .expect("listener stopped");
    assert_eq!(event, ReloadEvent::Reload);
}

#[tokio::test]
async fn run_stops_once_the_receiver_is_gone() {
    let app = Router::new().route(
        "/__livereload",
        get(|| async { sse(vec![Event::default().event("heartbeat").data("ping")], false) }),
    );
    let addr = spawn_server(app).await;

    let (tx, rx) = tokio::sync::mpsc::channel(1);
    drop(rx);

    let listener = ReloadListener::new(&config_for(addr));
    timeout(Duration::from_secs(5), listener.run(tx))
        .await
        .expect("run should return without an audience");
}

#[tokio::test]
async fn heartbeats_to_a_dropped_receiver_end_the_run() {
    // Healthy stream that never closes; only the heartbeat can reveal that
    // nobody is listening anymore
    let app = Router::new().route(
        "/__livereload",
        get(|| async { sse(vec![Event::default().event("heartbeat").data("ping")], true) }),
    );
    let addr = spawn_server(app).await;

    let (tx, rx) = tokio::sync::mpsc::channel(1);
    drop(rx);

    let listener = ReloadListener::new(&config_for(addr));
    timeout(Duration::from_secs(5), listener.run(tx))
        .await
        .expect("run should notice the dropped receiver");
}
