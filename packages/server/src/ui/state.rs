//! Shared application state.

use std::{sync::Arc, time::Instant};

use rakugaki_shared::time::Clock;

use crate::{
    domain::{
        ConnectionGroups, MessagePusher, PasswordHasher, RoomRecordStore, RoomRepository,
        UserStore,
    },
    usecase::{
        AuthenticateUseCase, ClearCanvasUseCase, ConnectParticipantUseCase, CreateRoomUseCase,
        DisconnectParticipantUseCase, DrawUseCase, DrawingPolicy, GetRoomDetailUseCase,
        GetRoomStateUseCase, GetRoomsUseCase, GetStatsUseCase, GetUserUseCase, JoinRoomUseCase,
        MembershipTracker, ReapRoomsUseCase, ReaperPolicy, UpdateNicknameUseCase,
    },
};

/// Infrastructure handed to [`AppState::new`]
pub struct AppDependencies {
    /// Repository（ルームレジストリ）
    pub repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// トランスポートのグループ（メンバーシップの正）
    pub groups: Arc<dyn ConnectionGroups>,
    pub room_store: Arc<dyn RoomRecordStore>,
    pub user_store: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub drawing_policy: DrawingPolicy,
    pub reaper_policy: ReaperPolicy,
}

/// Shared application state
pub struct AppState {
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub get_room_state_usecase: Arc<GetRoomStateUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub get_stats_usecase: Arc<GetStatsUseCase>,
    pub draw_usecase: Arc<DrawUseCase>,
    pub clear_canvas_usecase: Arc<ClearCanvasUseCase>,
    pub get_user_usecase: Arc<GetUserUseCase>,
    pub update_nickname_usecase: Arc<UpdateNicknameUseCase>,
    pub reap_rooms_usecase: Arc<ReapRoomsUseCase>,
    /// MessagePusher（JSON を接続に届ける）
    pub message_pusher: Arc<dyn MessagePusher>,
    /// プレゼンス通知用
    pub membership: Arc<MembershipTracker>,
    pub repository: Arc<dyn RoomRepository>,
}

impl AppState {
    /// Wire every use case from the given infrastructure.
    pub fn new(deps: AppDependencies) -> Self {
        let AppDependencies {
            repository,
            message_pusher,
            groups,
            room_store,
            user_store,
            hasher,
            clock,
            drawing_policy,
            reaper_policy,
        } = deps;

        let membership = Arc::new(MembershipTracker::new(groups));

        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                membership.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                membership.clone(),
            )),
            authenticate_usecase: Arc::new(AuthenticateUseCase::new(
                user_store.clone(),
                membership.clone(),
            )),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                repository.clone(),
                room_store.clone(),
                hasher,
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                repository.clone(),
                room_store.clone(),
                membership.clone(),
            )),
            get_room_state_usecase: Arc::new(GetRoomStateUseCase::new(repository.clone())),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(
                repository.clone(),
                room_store.clone(),
                membership.clone(),
            )),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                repository.clone(),
                room_store.clone(),
                membership.clone(),
            )),
            get_stats_usecase: Arc::new(GetStatsUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                Instant::now(),
            )),
            draw_usecase: Arc::new(DrawUseCase::new(
                repository.clone(),
                membership.clone(),
                clock.clone(),
                drawing_policy,
            )),
            clear_canvas_usecase: Arc::new(ClearCanvasUseCase::new(
                repository.clone(),
                membership.clone(),
            )),
            get_user_usecase: Arc::new(GetUserUseCase::new(user_store.clone())),
            update_nickname_usecase: Arc::new(UpdateNicknameUseCase::new(user_store.clone())),
            reap_rooms_usecase: Arc::new(ReapRoomsUseCase::new(
                repository.clone(),
                room_store,
                user_store,
                membership.clone(),
                clock,
                reaper_policy,
            )),
            message_pusher,
            membership,
            repository,
        }
    }
}
