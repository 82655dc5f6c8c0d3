//! Integration tests: a real server on an ephemeral port, driven over
//! WebSocket (`tokio-tungstenite`) and HTTP (`reqwest`).

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use rakugaki_server::{config::ServerConfig, ui::Server};
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper struct to manage server lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig::parse_from([
            "rakugaki-server",
            "--database-url",
            "sqlite::memory:",
            "--bcrypt-cost",
            "4",
        ]);
        let server = Server::from_config(&config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));
        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Helper struct wrapping one WebSocket connection
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let (ws, _) = connect_async(server.ws_url()).await.unwrap();
        let mut client = Self { ws };
        // 接続直後の default ルームのプレゼンス
        client.recv_type("users list update").await;
        client
    }

    async fn send(&mut self, message: Value) {
        self.ws
            .send(Message::Text(message.to_string().into()))
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a message")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).unwrap();
            }
        }
    }

    /// `message_type` が来るまで他のメッセージを読み飛ばす
    async fn recv_type(&mut self, message_type: &str) -> Value {
        loop {
            let message = self.recv().await;
            if message["type"] == message_type {
                return message;
            }
        }
    }

    async fn join(&mut self, room: &str, password: Option<&str>) -> Value {
        self.send(json!({"type": "join room", "room": room, "password": password}))
            .await;
        loop {
            let reply = self.recv().await;
            if reply["type"] == "room joined" {
                return self.recv_type("room state").await;
            }
            if reply["type"] == "join room error" {
                return reply;
            }
        }
    }

    /// `count` 人のプレゼンスリストが来るまで読み飛ばす
    async fn recv_presence(&mut self, count: usize) -> Value {
        loop {
            let message = self.recv_type("users list update").await;
            if message["users"].as_array().map(Vec::len) == Some(count) {
                return message;
            }
        }
    }

    /// 送信済みのメッセージがすべて処理されたことを room state の応答で確かめる
    async fn sync(&mut self) -> Value {
        self.send(json!({"type": "request room state"})).await;
        self.recv_type("room state").await
    }

    async fn close(mut self) {
        self.ws.close(None).await.unwrap();
    }
}

#[tokio::test]
async fn test_late_joiner_sees_existing_strokes() {
    // テスト項目: 後から参加したユーザーが既存のストロークを受け取る（start + continue）
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.join("art", None).await;
    alice
        .send(json!({"type": "draw start", "x": 10, "y": 10, "color": "#ff0000", "size": 3, "strokeId": "s1"}))
        .await;
    alice
        .send(json!({"type": "draw continue", "x": 20, "y": 20, "color": "#ff0000", "size": 3, "strokeId": "s1"}))
        .await;
    alice.sync().await;

    // when (操作):
    let mut bob = TestClient::connect(&server).await;
    let snapshot = bob.join("art", None).await;

    // then (期待する結果):
    let strokes = snapshot["strokes"].as_array().unwrap();
    assert_eq!(strokes.len(), 1);
    assert_eq!(strokes[0]["strokeId"], "s1");
    assert_eq!(strokes[0]["color"], "#ff0000");
    assert_eq!(
        strokes[0]["points"],
        json!([{"x": 10.0, "y": 10.0}, {"x": 20.0, "y": 20.0}])
    );
}

#[tokio::test]
async fn test_draw_is_relayed_and_clear_reaches_everyone() {
    // テスト項目: 描画は他のメンバーに中継され、clear canvas は全員に届きルームが空になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    alice.join("art", None).await;
    bob.join("art", None).await;

    // when (操作):
    alice
        .send(json!({"type": "draw start", "x": 1, "y": 2, "color": "#00ff00", "size": 5, "strokeId": 99}))
        .await;
    let relayed = bob.recv_type("draw start").await;
    bob.send(json!({"type": "clear canvas"})).await;

    // then (期待する結果):
    assert_eq!(relayed["data"]["strokeId"], 99);
    assert_eq!(relayed["data"]["x"], 1.0);
    assert!(relayed["userId"].is_string());
    alice.recv_type("clear canvas").await;
    bob.recv_type("clear canvas").await;
    let state = alice.sync().await;
    assert_eq!(state["strokes"], json!([]));
}

#[tokio::test]
async fn test_private_room_requires_password() {
    // テスト項目: REST で作成したプライベートルームは正しいパスワードでのみ参加できる
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let response = http
        .post(server.http_url("/api/rooms"))
        .json(&json!({"name": "Secret Room", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created, json!({"name": "Secret Room", "isPrivate": true}));
    let mut alice = TestClient::connect(&server).await;

    // when (操作):
    let rejected = alice.join("Secret Room", Some("wrong")).await;
    let accepted = alice.join("Secret Room", Some("hunter2")).await;

    // then (期待する結果):
    assert_eq!(rejected["type"], "join room error");
    assert_eq!(accepted["type"], "room state");
    let detail: Value = http
        .get(server.http_url("/api/rooms/Secret%20Room"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["isPrivate"], true);
    assert_eq!(detail["userCount"], 1);
}

#[tokio::test]
async fn test_disconnect_updates_presence() {
    // テスト項目: 切断したユーザーは残ったメンバーのプレゼンスから消える
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let mut bob = TestClient::connect(&server).await;
    alice.join("art", None).await;
    bob.join("art", None).await;
    alice.recv_presence(2).await;

    // when (操作):
    bob.close().await;

    // then (期待する結果):
    let remaining = alice.recv_presence(1).await;
    assert_eq!(remaining["users"][0]["authenticated"], false);
}

#[tokio::test]
async fn test_user_session_cookie_and_nickname() {
    // テスト項目: GET /api/user で Cookie が発行され、その Cookie でニックネームを変更できる
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let response = http.get(server.http_url("/api/user")).send().await.unwrap();
    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let user: Value = response.json().await.unwrap();

    // when (操作):
    let renamed = http
        .put(server.http_url("/api/user/nickname"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"nickname": "Painter"}))
        .send()
        .await
        .unwrap();
    let invalid = http
        .put(server.http_url("/api/user/nickname"))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"nickname": "x"}))
        .send()
        .await
        .unwrap();
    let anonymous = http
        .put(server.http_url("/api/user/nickname"))
        .json(&json!({"nickname": "Painter"}))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(cookie, format!("session_id={}", user["sessionId"].as_str().unwrap()));
    assert!(user["nickname"].as_str().unwrap().starts_with("User"));
    assert_eq!(renamed.status(), reqwest::StatusCode::OK);
    let renamed: Value = renamed.json().await.unwrap();
    assert_eq!(renamed["nickname"], "Painter");
    assert_eq!(renamed["id"], user["id"]);
    assert_eq!(invalid.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(anonymous.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticate_over_websocket() {
    // テスト項目: REST で発行したセッションで authenticate すると同じユーザーになる
    // given (前提条件):
    let server = TestServer::start().await;
    let user: Value = reqwest::get(server.http_url("/api/user"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut alice = TestClient::connect(&server).await;

    // when (操作):
    alice
        .send(json!({"type": "authenticate", "sessionId": user["sessionId"]}))
        .await;

    // then (期待する結果):
    let reply = alice.recv_type("authenticated").await;
    assert_eq!(reply["user"]["id"], user["id"]);
    let presence = alice.recv_type("users list update").await;
    assert_eq!(presence["users"][0]["name"], user["nickname"]);
    assert_eq!(presence["users"][0]["authenticated"], true);
}

#[tokio::test]
async fn test_rest_room_listing_and_health() {
    // テスト項目: ヘルスチェックとルーム一覧・存在しないルームの 404
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    alice.join("lobby", None).await;

    // when (操作):
    let health: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rooms: Value = reqwest::get(server.http_url("/api/rooms"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let missing = reqwest::get(server.http_url("/api/rooms/nowhere"))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health, json!({"status": "ok"}));
    let rooms = rooms["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "lobby");
    assert_eq!(rooms[0]["userCount"], 1);
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body, json!({"error": "room not found"}));
}

#[tokio::test]
async fn test_private_room_detail_survives_listing() {
    // テスト項目: 一覧取得で空のプライベートルームが消えても、詳細は isPrivate を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let response = http
        .post(server.http_url("/api/rooms"))
        .json(&json!({"name": "vault", "password": "hunter2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    // when (操作):
    let listing: Value = http
        .get(server.http_url("/api/rooms"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let detail = http
        .get(server.http_url("/api/rooms/vault"))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(listing, json!({"rooms": []}));
    assert_eq!(detail.status(), reqwest::StatusCode::OK);
    let detail: Value = detail.json().await.unwrap();
    assert_eq!(detail["name"], "vault");
    assert_eq!(detail["isPrivate"], true);
    assert_eq!(detail["strokeCount"], 0);
    assert_eq!(detail["userCount"], 0);
}

#[tokio::test]
async fn test_server_stats() {
    // テスト項目: 統計にルーム数・接続数・稼働時間が含まれる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;
    let _bob = TestClient::connect(&server).await;
    alice.join("lobby", None).await;

    // when (操作):
    let stats: Value = reqwest::get(server.http_url("/api/stats"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(stats["totalRooms"], 2);
    assert_eq!(stats["totalUsers"], 2);
    assert!(stats["server"]["uptime"].as_f64().unwrap() >= 0.0);
    assert_eq!(stats["server"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unparseable_frames_are_ignored() {
    // テスト項目: 解析できないフレームは無視され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;

    // when (操作):
    alice
        .ws
        .send(Message::Text("not json".into()))
        .await
        .unwrap();
    alice.send(json!({"type": "no such event"})).await;

    // then (期待する結果):
    let state = alice.sync().await;
    assert_eq!(state["strokes"], json!([]));
}
