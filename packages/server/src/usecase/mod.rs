//! UseCase 層
//!
//! 各ユースケースは必要な trait オブジェクト（Repository / Store / MessagePusher）を
//! `Arc<dyn Trait>` で受け取り、1 つのクライアント操作を実行します。
//! JSON への変換と送信先への push は UI 層が担当します。

mod authenticate;
mod clear_canvas;
mod connect_participant;
mod create_room;
mod disconnect_participant;
mod draw;
mod error;
mod get_room_detail;
mod get_room_state;
mod get_rooms;
mod get_stats;
mod get_user;
mod join_room;
mod membership;
mod reap_rooms;
mod session;
mod update_nickname;

pub use authenticate::AuthenticateUseCase;
pub use clear_canvas::ClearCanvasUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use create_room::{CreateRoomUseCase, CreatedRoom, RoomNameRule};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use draw::{DrawInput, DrawOutcome, DrawUseCase, DrawingPolicy, SkipReason, StrokeWrite};
pub use error::{
    AuthenticateError, CreateRoomError, GetRoomDetailError, JoinRoomError, UpdateNicknameError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_room_state::GetRoomStateUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use get_stats::{GetStatsUseCase, ServerStats};
pub use get_user::GetUserUseCase;
pub use join_room::{JoinOutcome, JoinRoomUseCase};
pub use membership::MembershipTracker;
pub use reap_rooms::{PurgeReport, ReapRoomsUseCase, ReaperPolicy};
pub use session::{ConnectionSession, resolve_room};
pub use update_nickname::UpdateNicknameUseCase;
