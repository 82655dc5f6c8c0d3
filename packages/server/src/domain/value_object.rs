//! 値オブジェクト
//!
//! 不変で、生成時に検証済みであることを型で保証する値の集まり。

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// 名前が空のときに使われるルーム名
pub const DEFAULT_ROOM_NAME: &str = "default";

const ROOM_NAME_MIN_LEN: usize = 2;
const ROOM_NAME_MAX_LEN: usize = 50;
const NICKNAME_MIN_LEN: usize = 2;
const NICKNAME_MAX_LEN: usize = 20;
const BRUSH_SIZE_MIN: f64 = 1.0;
const BRUSH_SIZE_MAX: f64 = 50.0;

// ========================================
// ConnectionId
// ========================================

/// トランスポート接続の ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyConnectionId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 表示名の合成に使う短縮形（先頭 8 文字）
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ========================================
// RoomName
// ========================================

/// ルーム名（大文字小文字を区別する）
///
/// `new` は互換経路向けで、空でなければどんな文字列でも受け付ける。
/// `validated` は作成 API 向けの厳格な検証を行う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    /// 前後の空白を除去し、空でなければ受け付ける
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRoomName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 長さ 2〜50 文字、英数字・空白・`-`・`_` のみ
    pub fn validated(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        let len = trimmed.chars().count();
        if !(ROOM_NAME_MIN_LEN..=ROOM_NAME_MAX_LEN).contains(&len) {
            return Err(ValidationError::RoomNameLength {
                min: ROOM_NAME_MIN_LEN,
                max: ROOM_NAME_MAX_LEN,
            });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_')
        {
            return Err(ValidationError::RoomNameCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn default_room() -> Self {
        Self(DEFAULT_ROOM_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for RoomName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// StrokeId
// ========================================

/// クライアントが生成したストローク ID（不透明な値として扱う）
///
/// 欠落している場合は空文字列をキーとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StrokeId(String);

impl StrokeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn unspecified() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ========================================
// Point
// ========================================

/// キャンバス上の座標
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ========================================
// StrokeStyle
// ========================================

/// ストロークの色と太さ
///
/// 互換経路では値をそのまま保持し、厳格経路では `#RRGGBB` と
/// 1〜50 の太さを要求する。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
}

impl StrokeStyle {
    pub fn lenient(color: Option<String>, size: Option<f64>) -> Self {
        Self { color, size }
    }

    pub fn strict(color: Option<String>, size: Option<f64>) -> Result<Self, ValidationError> {
        let color = color.ok_or(ValidationError::MissingField("color"))?;
        if !is_hex_color(&color) {
            return Err(ValidationError::InvalidColor(color));
        }
        let size = size.ok_or(ValidationError::MissingField("size"))?;
        if !(BRUSH_SIZE_MIN..=BRUSH_SIZE_MAX).contains(&size) {
            return Err(ValidationError::BrushSize {
                min: BRUSH_SIZE_MIN,
                max: BRUSH_SIZE_MAX,
            });
        }
        Ok(Self {
            color: Some(color),
            size: Some(size),
        })
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

// ========================================
// Nickname
// ========================================

/// ユーザーのニックネーム（2〜20 文字、ラテン/キリル文字・数字・空白・`-`・`_`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();
        let len = trimmed.chars().count();
        if !(NICKNAME_MIN_LEN..=NICKNAME_MAX_LEN).contains(&len) {
            return Err(ValidationError::NicknameLength {
                min: NICKNAME_MIN_LEN,
                max: NICKNAME_MAX_LEN,
            });
        }
        if !trimmed.chars().all(is_nickname_char) {
            return Err(ValidationError::NicknameCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn is_nickname_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || ('а'..='я').contains(&c)
        || ('А'..='Я').contains(&c)
        || c.is_whitespace()
        || c == '-'
        || c == '_'
}

// ========================================
// Identity
// ========================================

/// 永続ユーザー ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// セッション Cookie の値
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// セッションが無いときにユーザーを識別するための IP + User-Agent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientFingerprint {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientFingerprint {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
        }
    }
}

// ========================================
// Timestamp
// ========================================

/// Unix ミリ秒
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// `earlier` からの経過ミリ秒（負にはならない）
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}
