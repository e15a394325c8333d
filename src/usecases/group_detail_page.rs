//! Single group: details, rename/delete, members CRUD.
//!
//! Every mutation reloads group and members from the backend.

use super::request_scope::{Outcome, RequestScope};
use crate::domain::{ApiError, DomainError, Group, GroupForm, Member, MemberForm};
use crate::ports::ExpenseApi;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const LOAD_FAILED: &str = "Unable to load group details right now.";
pub const SAVE_FAILED: &str = "Failed to save group.";
pub const DELETE_FAILED: &str = "Failed to delete the group.";
pub const ADD_MEMBER_FAILED: &str =
    "Failed to add member. Ensure the user exists and is not already a member.";
pub const UPDATE_MEMBER_FAILED: &str = "Failed to update member.";
pub const REMOVE_MEMBER_FAILED: &str = "Failed to remove member.";

#[derive(Debug, Clone, Default)]
pub struct GroupDetailState {
    pub group_id: Option<i64>,
    pub group: Option<Group>,
    pub members: Vec<Member>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct GroupDetailPage {
    api: Arc<dyn ExpenseApi>,
    state: RwLock<GroupDetailState>,
    scope: RequestScope,
}

impl GroupDetailPage {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: RwLock::new(GroupDetailState::default()),
            scope: RequestScope::new(),
        }
    }

    pub async fn snapshot(&self) -> GroupDetailState {
        self.state.read().await.clone()
    }

    /// Show `group_id`, cancelling any load for a previously opened group.
    pub async fn open(&self, group_id: i64) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().await;
            if state.group_id != Some(group_id) {
                state.group = None;
                state.members.clear();
            }
            state.group_id = Some(group_id);
            state.loading = true;
            state.error = None;
        }
        let api = Arc::clone(&self.api);
        let outcome = self
            .scope
            .run(|token| async move {
                tokio::try_join!(
                    api.get_group(group_id, &token),
                    api.list_members(group_id, &token)
                )
            })
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Outcome::Superseded => Ok(()),
            Outcome::Current(Ok((group, members))) => {
                info!(group_id, members = members.len(), "group details loaded");
                state.group = Some(group);
                state.members = members;
                state.loading = false;
                Ok(())
            }
            Outcome::Current(Err(e)) => {
                warn!(group_id, error = %e, "loading group details failed");
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    async fn current_group_id(&self) -> Result<i64, DomainError> {
        self.state
            .read()
            .await
            .group_id
            .ok_or_else(|| DomainError::NotLoaded("no group is open".into()))
    }

    async fn reload(&self) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        self.open(group_id).await
    }

    async fn fail(&self, message: &str, e: ApiError) -> DomainError {
        warn!(error = %e, "{}", message);
        self.state.write().await.error = Some(message.to_string());
        e.into()
    }

    pub async fn rename(&self, form: &GroupForm) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        let payload = form.to_payload()?;
        if let Err(e) = self.api.rename_group(group_id, &payload).await {
            return Err(self.fail(SAVE_FAILED, e).await);
        }
        self.reload().await
    }

    /// Delete the open group and close the page. The caller confirms first.
    pub async fn delete_group(&self) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        if let Err(e) = self.api.delete_group(group_id).await {
            return Err(self.fail(DELETE_FAILED, e).await);
        }
        self.scope.cancel();
        *self.state.write().await = GroupDetailState::default();
        Ok(())
    }

    pub async fn add_member(&self, form: &MemberForm) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        let payload = form.to_new_payload()?;
        if let Err(e) = self.api.add_member(group_id, &payload).await {
            return Err(self.fail(ADD_MEMBER_FAILED, e).await);
        }
        self.reload().await
    }

    pub async fn update_member(&self, member_id: i64, form: &MemberForm) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        let payload = form.to_patch_payload()?;
        if let Err(e) = self.api.update_member(group_id, member_id, &payload).await {
            return Err(self.fail(UPDATE_MEMBER_FAILED, e).await);
        }
        self.reload().await
    }

    /// Remove a member. The caller confirms first.
    pub async fn remove_member(&self, member_id: i64) -> Result<(), DomainError> {
        let group_id = self.current_group_id().await?;
        if let Err(e) = self.api.remove_member(group_id, member_id).await {
            return Err(self.fail(REMOVE_MEMBER_FAILED, e).await);
        }
        self.reload().await
    }
}
