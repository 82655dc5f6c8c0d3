//! メンバーシップトラッカー
//!
//! トランスポートのグループ（`ConnectionGroups`）への問い合わせ層です。
//! 人数やメンバーはグループから都度計算し、ここでは接続に紐づいた
//! 認証済みユーザーだけを保持します。
//!
//! メンバーの増減とレジストリからのルーム削除は `lock_rooms` のガードを
//! 持ったまま行います。人数を数えてから削除するまでの間に別の接続が
//! 参加することはありません。

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{ConnectionGroups, ConnectionId, MemberCounts, PresenceEntry, RoomName, User};

pub struct MembershipTracker {
    groups: Arc<dyn ConnectionGroups>,
    /// 接続 ID → authenticate 済みユーザー
    identities: Mutex<HashMap<ConnectionId, User>>,
    /// 参加・離脱とルーム削除を直列化する
    lifecycle: Mutex<()>,
}

impl MembershipTracker {
    pub fn new(groups: Arc<dyn ConnectionGroups>) -> Self {
        Self {
            groups,
            identities: Mutex::new(HashMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    /// 参加・離脱・空ルームの削除を行う間、保持するガード
    ///
    /// ガードを持ったまま永続ストアを待たないこと。
    pub async fn lock_rooms(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().await
    }

    pub async fn join(&self, id: &ConnectionId, room: &RoomName) {
        self.groups.join_group(id, room).await;
    }

    pub async fn leave(&self, id: &ConnectionId, room: &RoomName) -> bool {
        self.groups.leave_group(id, room).await
    }

    /// 全ルームから外し、外れたルームを返す
    pub async fn leave_all(&self, id: &ConnectionId) -> Vec<RoomName> {
        self.groups.leave_all_groups(id).await
    }

    pub async fn size(&self, room: &RoomName) -> usize {
        self.groups.group_size(room).await
    }

    pub async fn members(&self, room: &RoomName) -> Vec<ConnectionId> {
        self.groups.group_members(room).await
    }

    pub async fn sizes(&self) -> MemberCounts {
        self.groups.group_sizes().await
    }

    /// `exclude` 以外のメンバー
    pub async fn others(&self, room: &RoomName, exclude: &ConnectionId) -> Vec<ConnectionId> {
        self.members(room)
            .await
            .into_iter()
            .filter(|id| id != exclude)
            .collect()
    }

    pub async fn attach_user(&self, id: &ConnectionId, user: User) {
        self.identities.lock().await.insert(id.clone(), user);
    }

    pub async fn forget(&self, id: &ConnectionId) {
        self.identities.lock().await.remove(id);
    }

    /// ルームのプレゼンスリスト（参加順）
    ///
    /// 認証済みならニックネーム、そうでなければ接続 ID から合成した表示名を使う。
    pub async fn presence(&self, room: &RoomName) -> Vec<PresenceEntry> {
        let members = self.members(room).await;
        let identities = self.identities.lock().await;
        members
            .into_iter()
            .map(|id| match identities.get(&id) {
                Some(user) => PresenceEntry {
                    name: user.nickname.clone(),
                    id,
                    authenticated: true,
                },
                None => PresenceEntry {
                    name: guest_name(&id),
                    id,
                    authenticated: false,
                },
            })
            .collect()
    }
}

fn guest_name(id: &ConnectionId) -> String {
    format!("Guest {}", id.short())
}
