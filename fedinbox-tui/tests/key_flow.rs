use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use fedinbox_client::{ClientStore, Inbox, MemoryStore, NoticeKind, TimelineGateway};
use fedinbox_http::HttpError;
use fedinbox_social::mastodon::Status;
use fedinbox_tui::{InboxTui, TuiMsg};
use ratatui::{Terminal, backend::TestBackend};
use serde_json::{Value, json};

#[derive(Default)]
struct StubGateway {
    posts: Vec<Value>,
    shared: Mutex<Vec<String>>,
    /// Never answer favorite requests.
    stall_favorite: bool,
}

#[async_trait]
impl TimelineGateway for StubGateway {
    async fn timeline(&self) -> Result<Vec<Status>, HttpError> {
        Ok(self
            .posts
            .iter()
            .map(|v| serde_json::from_value(v.clone()).unwrap())
            .collect())
    }

    async fn favorites(&self) -> Result<Vec<String>, HttpError> {
        Ok(Vec::new())
    }

    async fn share(&self, text: &str) -> Result<Value, HttpError> {
        self.shared.lock().unwrap().push(text.to_string());
        Ok(json!({}))
    }

    async fn favorite(&self, _id: &str) -> Result<Value, HttpError> {
        if self.stall_favorite {
            std::future::pending::<()>().await;
        }
        Err(HttpError::Network("connection reset".into()))
    }

    async fn unfavorite(&self, _id: &str) -> Result<Value, HttpError> {
        Ok(json!({}))
    }
}

fn post(id: &str) -> Value {
    json!({
        "id": id,
        "content": format!("<p>hello {id}</p>"),
        "account": {"username": "alice", "display_name": "Alice"}
    })
}

fn key(code: KeyCode) -> TuiMsg {
    TuiMsg::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

async fn loaded_tui(gateway: Arc<StubGateway>) -> InboxTui<MemoryStore, TestBackend> {
    let inbox = Inbox::new(gateway, ClientStore::load(MemoryStore::default()));
    let term = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let mut tui = InboxTui::new(inbox, term);
    assert!(tui.handle(TuiMsg::Refresh).await.unwrap());
    tui
}

#[tokio::test]
async fn archive_key_removes_selected_post() {
    let gateway = Arc::new(StubGateway {
        posts: vec![post("1"), post("2")],
        ..Default::default()
    });
    let mut tui = loaded_tui(gateway).await;

    tui.handle(key(KeyCode::Char('j'))).await.unwrap();
    assert_eq!(tui.selected(), 1);
    tui.handle(key(KeyCode::Char('a'))).await.unwrap();

    assert_eq!(tui.inbox().view().visible_ids(), vec!["1"]);
    assert_eq!(tui.selected(), 0);
}

#[tokio::test]
async fn share_opens_notice_that_blocks_other_keys() {
    let gateway = Arc::new(StubGateway {
        posts: vec![post("1")],
        ..Default::default()
    });
    let mut tui = loaded_tui(gateway.clone()).await;

    tui.handle(key(KeyCode::Char('s'))).await.unwrap();
    let notice = tui.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert_eq!(notice.message, "Post shared successfully!");
    assert_eq!(*gateway.shared.lock().unwrap(), vec!["hello 1 – Alice"]);

    // archive is swallowed while the notice is up
    tui.handle(key(KeyCode::Char('a'))).await.unwrap();
    assert_eq!(tui.inbox().view().visible_ids(), vec!["1"]);

    tui.handle(key(KeyCode::Esc)).await.unwrap();
    assert!(tui.notice().is_none());
}

#[tokio::test]
async fn failed_favorite_surfaces_error_and_keeps_label() {
    let gateway = Arc::new(StubGateway {
        posts: vec![post("1")],
        ..Default::default()
    });
    let mut tui = loaded_tui(gateway).await;

    tui.handle(key(KeyCode::Char('f'))).await.unwrap();

    let notice = tui.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.message.starts_with("Failed to update favorite"));
    assert_eq!(tui.inbox().view().card("1").unwrap().favorite_label, "Favorite");
}

#[tokio::test]
async fn pending_favorite_is_drawn_while_in_flight() {
    let gateway = Arc::new(StubGateway {
        posts: vec![post("1")],
        stall_favorite: true,
        ..Default::default()
    });
    let mut tui = loaded_tui(gateway).await;

    let stalled = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        tui.handle(key(KeyCode::Char('f'))),
    )
    .await;
    assert!(stalled.is_err());

    let screen: String = tui
        .terminal()
        .backend()
        .buffer()
        .content
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert!(screen.contains("[f] Favorite…"));
    assert!(screen.contains("Working…"));
}

#[tokio::test]
async fn quit_keys_stop_the_loop() {
    let mut tui = loaded_tui(Arc::new(StubGateway::default())).await;

    assert!(!tui.handle(key(KeyCode::Char('q'))).await.unwrap());
    let ctrl_c = TuiMsg::Input(Event::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    )));
    assert!(!tui.handle(ctrl_c).await.unwrap());
}

#[tokio::test]
async fn shutdown_message_ends_the_run() {
    let tui = loaded_tui(Arc::new(StubGateway {
        posts: vec![post("1")],
        ..Default::default()
    }))
    .await;
    let (tx, rx) = tokio::sync::mpsc::channel(8);
    tx.send(TuiMsg::Shutdown).await.unwrap();
    // would be handled only if the loop kept going
    tx.send(key(KeyCode::Char('a'))).await.unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(1), tui.run(rx))
        .await
        .expect("loop should stop on shutdown")
        .unwrap();
}
