//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! crawls through the default HTTP collaborators.

use linkscout::config::Config;
use linkscout::crawler::{Collaborators, IdGenerator};
use linkscout::{Bot, BotState, Event, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
fn create_test_config(server: &MockServer) -> Config {
    let mut config =
        Config::for_start_url(&format!("{}/", server.uri())).expect("valid start URL");
    config.pipeline.max_verifier_count = 4;
    config.pipeline.max_renderer_count = 2;
    config.pipeline.max_extractor_count = 1;
    config.pipeline.http_request_timeout_secs = 5;
    config.pipeline.progress_report_interval_ms = 100;
    config
}

fn create_bot(config: &Config) -> (Arc<Bot>, Arc<Mutex<Vec<Event>>>) {
    let id_generator = Arc::new(IdGenerator::new());
    let collaborators =
        Collaborators::http(config, Arc::clone(&id_generator)).expect("HTTP client builds");
    let bot = Arc::new(Bot::new(collaborators, id_generator));

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    bot.on_event(move |event| sink.lock().unwrap().push(event.clone()));
    (bot, events)
}

/// Runs a crawl to its end and returns the final state and every event
async fn run_crawl(config: &Config) -> (BotState, Vec<Event>) {
    let (bot, events) = create_bot(config);
    assert!(bot.try_start(config).await, "crawl should start");

    let final_state = tokio::time::timeout(Duration::from_secs(15), bot.wait_for_completion())
        .await
        .expect("crawl should complete");

    let events = events.lock().unwrap().clone();
    (final_state, events)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

fn last_progress(events: &[Event]) -> Event {
    events
        .iter()
        .rev()
        .find(|e| matches!(e, Event::WorkingProgressReport { .. }))
        .cloned()
        .expect("at least one progress report")
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"
            <a href="/a">A</a>
            <a href="/b#section">B</a>
            <a href="/missing">Missing</a>
            <a href="mailto:webmaster@example.com">Mail</a>
            <a href="javascript:void(0)">Menu</a>
            "#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"
            <a href="/">Home</a>
            <a href="/b">B</a>
            <a href="/style.css">Style</a>
            "#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("No links here"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/style.css"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("body { color: black; }", "text/css"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (final_state, events) = run_crawl(&config).await;

    assert_eq!(final_state, BotState::RanToCompletion);
    assert_eq!(
        events.last(),
        Some(&Event::WorkflowCompleted {
            final_state: BotState::RanToCompletion
        })
    );
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == Event::NoMoreWorkToDo)
            .count(),
        1
    );

    // /, /a, /b, /missing and /style.css; mailto: is skipped, not verified
    assert_eq!(
        last_progress(&events),
        Event::WorkingProgressReport {
            remaining_workload: 0,
            verified_url_count: 5,
            valid_url_count: 4,
            broken_url_count: 1,
        }
    );

    let broken: Vec<Event> = events
        .iter()
        .filter(|e| matches!(e, Event::BrokenLinkFound { .. }))
        .cloned()
        .collect();
    assert_eq!(
        broken,
        vec![Event::BrokenLinkFound {
            url: format!("{}/missing", server.uri()),
            status_code: StatusCode::Http(404),
            parent_url: Some(format!("{}/", server.uri())),
        }]
    );
}

#[tokio::test]
async fn test_link_to_dead_host_is_broken() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"
            <a href="http://127.0.0.1:9/gone">Gone</a>
            <a href="/missing">Missing</a>
            "#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (final_state, events) = run_crawl(&config).await;

    assert_eq!(final_state, BotState::RanToCompletion);
    assert_eq!(
        last_progress(&events),
        Event::WorkingProgressReport {
            remaining_workload: 0,
            verified_url_count: 3,
            valid_url_count: 1,
            broken_url_count: 2,
        }
    );
    assert!(events.contains(&Event::BrokenLinkFound {
        url: "http://127.0.0.1:9/gone".to_string(),
        status_code: StatusCode::Unreachable,
        parent_url: Some(format!("{}/", server.uri())),
    }));
}

#[tokio::test]
async fn test_event_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/only">Only</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/only"))
        .respond_with(html(""))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (final_state, events) = run_crawl(&config).await;
    assert_eq!(final_state, BotState::RanToCompletion);

    let position = |wanted: &Event| events.iter().position(|e| e == wanted).unwrap();
    let started = position(&Event::start_progress(
        "Setting up and configuring services ...",
    ));
    let activating = position(&Event::start_progress("Activating crawl workflow ..."));
    let activated = position(&Event::WorkflowActivated);
    let finished = position(&Event::NoMoreWorkToDo);
    let waiting = position(&Event::stop_progress(
        "Waiting for background tasks to complete ...",
    ));
    let disposing = position(&Event::stop_progress("Disposing services ..."));

    assert!(started < activating);
    assert!(activating < activated);
    assert!(activated < finished);
    assert!(finished < waiting);
    assert!(waiting < disposing);
    assert_eq!(disposing, events.len() - 2);

    // The workload reported after each processed resource ends at zero
    let workloads: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            Event::ResourceProcessed { remaining_workload } => Some(*remaining_workload),
            _ => None,
        })
        .collect();
    assert_eq!(workloads.last(), Some(&0));
    assert_eq!(workloads.iter().filter(|w| **w == 0).count(), 1);
}

#[tokio::test]
async fn test_redirect_at_start_url_faults_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(html(r#"<a href="/elsewhere">Elsewhere</a>"#))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (final_state, events) = run_crawl(&config).await;

    assert_eq!(final_state, BotState::Faulted);
    let redirect = events
        .iter()
        .find_map(|e| match e {
            Event::RedirectHappenedAtStartUrl { final_url } => Some(final_url.clone()),
            _ => None,
        })
        .expect("redirect event");
    assert_eq!(redirect, format!("{}/home", server.uri()));
    assert!(!events.contains(&Event::NoMoreWorkToDo));
}

#[tokio::test]
async fn test_stop_cancels_slow_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("").set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (bot, events) = create_bot(&config);
    assert!(bot.try_start(&config).await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    tokio::time::timeout(Duration::from_secs(5), bot.stop())
        .await
        .expect("stop should not wait for the slow request");

    assert_eq!(bot.wait_for_completion().await, BotState::Cancelled);
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&Event::WorkflowCompleted {
            final_state: BotState::Cancelled
        })
    );
}

#[tokio::test]
async fn test_pause_holds_work_until_resumed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/next">Next</a>"#).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html(""))
        .mount(&server)
        .await;

    let config = create_test_config(&server);
    let (bot, _events) = create_bot(&config);
    assert!(bot.try_start(&config).await);
    assert!(bot.pause());
    assert_eq!(bot.state(), BotState::Paused);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(bot.state(), BotState::Paused);

    assert!(bot.resume());
    let final_state = tokio::time::timeout(Duration::from_secs(15), bot.wait_for_completion())
        .await
        .expect("crawl should complete after resuming");
    assert_eq!(final_state, BotState::RanToCompletion);
}

#[tokio::test]
async fn test_unreachable_start_url_is_reported_broken() {
    // Nothing listens on the discard port
    let config = Config::for_start_url("http://127.0.0.1:9/").unwrap();
    let (final_state, events) = run_crawl(&config).await;

    assert_eq!(final_state, BotState::RanToCompletion);
    assert_eq!(
        last_progress(&events),
        Event::WorkingProgressReport {
            remaining_workload: 0,
            verified_url_count: 1,
            valid_url_count: 0,
            broken_url_count: 1,
        }
    );
    assert!(events.contains(&Event::BrokenLinkFound {
        url: "http://127.0.0.1:9/".to_string(),
        status_code: StatusCode::Unreachable,
        parent_url: None,
    }));
}
