//! Driving the interactive shell against the mock API.

mod common;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use common::make_client;
use common::mock_backend::{MockBackend, MockResponse};
use docindex::client::DocumentClient;
use docindex::shell::{parse_line, Flow, Shell, ShellCommand, ShellOptions};
use tempfile::TempDir;

fn options() -> ShellOptions {
    ShellOptions {
        page_size: NonZeroU32::new(10).unwrap(),
        page_size_options: vec![10, 20],
        paginated: true,
    }
}

fn text(shell: &Shell<Vec<u8>>) -> String {
    String::from_utf8_lossy(shell.output()).into_owned()
}

/// Handle events until `needle` has appeared `times` times in the output.
async fn pump_until(shell: &mut Shell<Vec<u8>>, needle: &str, times: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while text(shell).matches(needle).count() < times {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, shell.pump()).await {
            Ok(Ok(Some(()))) => {}
            other => panic!(
                "'{}' never showed up ({:?}); output so far:\n{}",
                needle,
                other,
                text(shell)
            ),
        }
    }
}

async fn signed_in_shell(backend: &MockBackend) -> (Shell<Vec<u8>>, Arc<DocumentClient>, TempDir) {
    let (client, dir) = make_client(&backend.base_url());
    let client = Arc::new(client);
    let mut shell = Shell::new(client.clone(), options(), Vec::new());
    shell.start().await.unwrap();

    backend
        .enqueue_response(MockResponse::json(r#"{"username":"alice"}"#).with_cookie("token", "t0k"))
        .await;
    backend.enqueue_response(MockResponse::page(1, 10, 25, 10)).await;
    assert_eq!(shell.execute("login alice secret1").await.unwrap(), Flow::Continue);
    pump_until(&mut shell, "Page 1 of 3", 1).await;
    (shell, client, dir)
}

#[test]
fn parses_commands_and_aliases() {
    assert_eq!(parse_line("   ").unwrap(), None);
    assert_eq!(parse_line("prev").unwrap(), Some(ShellCommand::Previous));
    assert_eq!(
        parse_line("goto 3").unwrap(),
        Some(ShellCommand::Goto {
            page: "3".to_string()
        })
    );
    assert_eq!(
        parse_line(r#"upload "my file.pdf""#).unwrap(),
        Some(ShellCommand::Upload {
            paths: vec!["my file.pdf".into()]
        })
    );
    assert_eq!(
        parse_line("download 4 -o out.pdf").unwrap(),
        Some(ShellCommand::Download {
            id: 4,
            output: Some("out.pdf".into())
        })
    );
    assert_eq!(parse_line("exit").unwrap(), Some(ShellCommand::Quit));
    assert!(parse_line("delete four").is_err());
    assert!(parse_line("frobnicate").is_err());
}

#[tokio::test]
async fn login_mounts_and_renders_the_first_page() {
    let backend = MockBackend::start().await;
    let (shell, client, _dir) = signed_in_shell(&backend).await;

    let output = text(&shell);
    assert!(output.contains("Not signed in."));
    assert!(output.contains("Welcome, alice."));
    assert!(output.contains("doc-1.pdf"));
    assert!(output.contains("Page 1 of 3 (25 documents, 10 per page)"));
    assert_eq!(client.session().current().as_deref(), Some("alice"));
}

/// Flipping back to a fetched page is served from the cache.
#[tokio::test]
async fn paging_reuses_cached_windows() {
    let backend = MockBackend::start().await;
    let (mut shell, _client, _dir) = signed_in_shell(&backend).await;

    backend.enqueue_response(MockResponse::page(2, 10, 25, 10)).await;
    shell.execute("next").await.unwrap();
    pump_until(&mut shell, "Page 2 of 3", 1).await;
    assert!(text(&shell).contains("\n11 "));

    shell.execute("prev").await.unwrap();
    pump_until(&mut shell, "Page 1 of 3", 2).await;
    assert_eq!(backend.request_count().await, 3);

    backend.enqueue_response(MockResponse::page(3, 10, 25, 5)).await;
    shell.execute("goto 9").await.unwrap();
    pump_until(&mut shell, "Page 3 of 3", 1).await;
    assert_eq!(shell.pagination().window().page_index(), 2);

    // Already on the last page: no fetch, just the footer.
    shell.execute("next").await.unwrap();
    assert_eq!(text(&shell).matches("Page 3 of 3").count(), 2);
    assert_eq!(backend.request_count().await, 4);
}

#[tokio::test]
async fn page_size_must_be_an_offered_option() {
    let backend = MockBackend::start().await;
    let (mut shell, _client, _dir) = signed_in_shell(&backend).await;

    shell.execute("size 15").await.unwrap();
    assert!(text(&shell).contains("Page size must be one of: 10, 20"));
    assert_eq!(shell.pagination().window().page_size().get(), 10);

    backend.enqueue_response(MockResponse::page(1, 20, 25, 20)).await;
    shell.execute("size 20").await.unwrap();
    pump_until(&mut shell, "Page 1 of 2", 1).await;
}

#[tokio::test]
async fn delete_rerenders_the_listing() {
    let backend = MockBackend::start().await;
    let (mut shell, _client, _dir) = signed_in_shell(&backend).await;

    backend.enqueue_response(MockResponse::json("{}")).await;
    backend.enqueue_response(MockResponse::page(1, 10, 24, 10)).await;
    shell.execute("delete 1").await.unwrap();
    assert!(text(&shell).contains("Deleted document 1."));
    pump_until(&mut shell, "(24 documents", 1).await;
}

#[tokio::test]
async fn failures_are_reported_inline() {
    let backend = MockBackend::start().await;
    let (mut shell, _client, _dir) = signed_in_shell(&backend).await;

    backend
        .enqueue_response(MockResponse::detail(404, "Document not found"))
        .await;
    shell.execute("process 99").await.unwrap();
    assert!(text(&shell).contains("Error: Document not found"));

    shell.execute("login bob secret1").await.unwrap();
    assert!(text(&shell).contains("Error: Already signed in as alice"));

    shell.execute("frobnicate").await.unwrap();
    assert!(text(&shell).contains("unrecognized subcommand"));
}

#[tokio::test]
async fn download_writes_the_listed_document() {
    let backend = MockBackend::start().await;
    let (mut shell, _client, dir) = signed_in_shell(&backend).await;

    shell.execute("download 500").await.unwrap();
    assert!(text(&shell).contains("No document with id 500 in the current listing."));

    let listing = serde_json::json!({
        "page": 1,
        "page_size": 10,
        "total_items": 1,
        "documents": [{
            "id": 77,
            "key": "scan.pdf",
            "status": "PROCESSED",
            "url": format!("{}/files/scan.pdf", backend.base_url()),
        }],
    });
    backend
        .enqueue_response(MockResponse::json(&listing.to_string()))
        .await;
    shell.execute("refresh").await.unwrap();
    pump_until(&mut shell, "scan.pdf", 1).await;

    backend.enqueue_response(MockResponse::bytes(b"%PDF-scan")).await;
    let target = dir.path().join("copy.pdf");
    shell
        .execute(&format!("download 77 -o \"{}\"", target.display()))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-scan");
    assert!(text(&shell).contains("Saved 9 bytes to"));
    let last = backend.captured_requests().await.pop().unwrap();
    assert_eq!(last.path, "/files/scan.pdf");
}

#[tokio::test]
async fn logout_drops_the_listing() {
    let backend = MockBackend::start().await;
    let (mut shell, client, _dir) = signed_in_shell(&backend).await;

    backend
        .enqueue_response(MockResponse::json("{}").clearing_cookie("token"))
        .await;
    shell.execute("logout").await.unwrap();
    pump_until(&mut shell, "Signed out.", 1).await;
    assert_eq!(client.session().current(), None);

    shell.execute("list").await.unwrap();
    assert!(text(&shell).contains("Sign in to see documents."));
}

#[tokio::test]
async fn run_processes_a_script_until_quit() {
    let backend = MockBackend::start().await;
    let (client, _dir) = make_client(&backend.base_url());
    let mut out = Vec::new();
    let shell = Shell::new(Arc::new(client), options(), &mut out);

    shell
        .run(&b"help\nquit\nwhoami\n"[..])
        .await
        .unwrap();

    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("Not signed in."));
    assert!(output.contains("upload"));
    // Nothing after `quit` runs.
    assert_eq!(backend.request_count().await, 0);
}
