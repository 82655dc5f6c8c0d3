//! ドメイン層
//!
//! ルーム・ストローク・プレゼンスのモデルと、外部へのインターフェース（trait）を定義します。

pub mod entity;
pub mod error;
pub mod factory;
pub mod message_pusher;
pub mod repository;
pub mod store;
pub mod value_object;

pub use entity::{
    DEFAULT_MAX_STROKES_PER_ROOM, DEFAULT_STROKE_RETAIN_MARGIN, PresenceEntry, Room, RoomRecord,
    RoomSummary, Stroke, StrokeCeiling, User,
};
pub use error::{MessagePushError, NotFoundError, StoreError, ValidationError};
pub use factory::{ConnectionIdFactory, IdentityFactory};
pub use message_pusher::{ConnectionGroups, MessagePusher, PusherChannel};
pub use repository::{MemberCounts, RoomRepository};
pub use store::{PasswordHasher, RoomRecordStore, UserStore};
pub use value_object::{
    ClientFingerprint, ConnectionId, DEFAULT_ROOM_NAME, Nickname, Point, RoomName, SessionId,
    StrokeId, StrokeStyle, Timestamp, UserId,
};

#[cfg(test)]
pub use store::{MockPasswordHasher, MockRoomRecordStore, MockUserStore};
