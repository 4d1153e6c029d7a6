//! Integration tests for the GitHub source against a local HTTP responder.
//!
//! Run with:
//!   cargo test --test test_github_source

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use issue_wiki::model::IssueState;
use issue_wiki::source::SourceError;
use issue_wiki::source::github::GitHubSource;

// ── helpers ──────────────────────────────────────────────────────────────────

/// Requests seen by the responder: request line plus raw headers.
type Seen = Arc<Mutex<Vec<String>>>;

/// Serve `status` + `body` to every connection, recording each request head.
async fn serve(status: &'static str, body: &'static str) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let log = log.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                log.lock().expect("log lock").push(String::from_utf8_lossy(&buf).into_owned());

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), seen)
}

fn source(base: String, token: Option<&str>) -> GitHubSource {
    GitHubSource::new(base, "nao-amj".into(), "starlight-issue-wiki".into(), 100, 5, token.map(String::from))
        .expect("client builds")
}

const ISSUES: &str = r#"[
  {"number": 1, "title": "Alpha", "body": "see [[Beta]]", "html_url": "", "state": "open",
   "labels": [{"name": "guide", "color": "0e8a16", "description": null}],
   "user": {"login": "octo", "avatar_url": "", "html_url": ""}, "comments": 3,
   "created_at": "2024-05-01T00:00:00Z", "updated_at": "2024-05-02T00:00:00Z"},
  {"number": 2, "title": "Fix typo", "body": null, "html_url": "", "state": "open",
   "labels": [], "user": null, "comments": 0, "pull_request": {"url": "x"},
   "created_at": "2024-05-01T00:00:00Z", "updated_at": "2024-05-01T00:00:00Z"}
]"#;

// ── tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_open_issues_with_expected_request() {
    let (base, seen) = serve("200 OK", ISSUES).await;
    let issues = source(base, Some("ghp_secret")).list_open_issues().await.expect("list");

    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].title, "Alpha");
    assert_eq!(issues[0].state, IssueState::Open);
    assert!(issues[1].is_change_request());

    let requests = seen.lock().unwrap();
    let head = requests[0].to_ascii_lowercase();
    assert!(head.starts_with("get /repos/nao-amj/starlight-issue-wiki/issues?state=open&per_page=100 "));
    assert!(head.contains("accept: application/vnd.github+json"));
    assert!(head.contains("authorization: bearer ghp_secret"));
    assert!(head.contains("user-agent: issue-wiki/"));
}

#[tokio::test]
async fn anonymous_requests_carry_no_token() {
    let (base, seen) = serve("200 OK", "[]").await;
    assert!(source(base, None).fetch_comments(3).await.expect("comments").is_empty());

    let requests = seen.lock().unwrap();
    let head = requests[0].to_ascii_lowercase();
    assert!(head.starts_with("get /repos/nao-amj/starlight-issue-wiki/issues/3/comments "));
    assert!(!head.contains("authorization:"));
}

#[tokio::test]
async fn fetches_single_issue() {
    let (base, seen) = serve(
        "200 OK",
        r#"{"number": 9, "title": "Closed one", "state": "closed",
            "created_at": "2024-05-01T00:00:00Z", "updated_at": "2024-05-01T00:00:00Z"}"#,
    )
    .await;
    let issue = source(base, None).fetch_issue(9).await.expect("issue");
    assert_eq!(issue.state, IssueState::Closed);
    assert!(seen.lock().unwrap()[0].starts_with("GET /repos/nao-amj/starlight-issue-wiki/issues/9 "));
}

#[tokio::test]
async fn error_envelope_becomes_status_error() {
    let (base, _) = serve(
        "404 Not Found",
        r#"{"message": "Not Found", "documentation_url": "https://docs.github.com/rest"}"#,
    )
    .await;
    match source(base, None).fetch_issue(1).await {
        Err(SourceError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.starts_with("Not Found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    let (base, _) = serve("502 Bad Gateway", "upstream down").await;
    match source(base, None).list_open_issues().await {
        Err(SourceError::Status { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let (base, _) = serve("200 OK", r#"{"not": "an array"}"#).await;
    assert!(matches!(source(base, None).list_open_issues().await, Err(SourceError::Decode(_))));
}
