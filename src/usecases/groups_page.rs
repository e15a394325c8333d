//! Groups list: load on entry, create, rename, delete.
//!
//! Mutations reconcile the returned group into the local list by id.

use super::request_scope::{Outcome, RequestScope};
use crate::domain::{DomainError, Group, GroupForm, remove_by_id, upsert_by_id};
use crate::ports::ExpenseApi;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const LOAD_FAILED: &str = "Unable to load groups right now.";
pub const SAVE_FAILED: &str = "Failed to save group.";
pub const DELETE_FAILED: &str = "Failed to delete the group.";

#[derive(Debug, Clone, Default)]
pub struct GroupsState {
    pub groups: Vec<Group>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct GroupsPage {
    api: Arc<dyn ExpenseApi>,
    state: RwLock<GroupsState>,
    scope: RequestScope,
}

impl GroupsPage {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: RwLock::new(GroupsState::default()),
            scope: RequestScope::new(),
        }
    }

    pub async fn snapshot(&self) -> GroupsState {
        self.state.read().await.clone()
    }

    pub async fn load(&self) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }
        let api = Arc::clone(&self.api);
        let outcome = self
            .scope
            .run(|token| async move { api.list_groups(&token).await })
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Outcome::Superseded => Ok(()),
            Outcome::Current(Ok(groups)) => {
                info!(count = groups.len(), "groups loaded");
                state.groups = groups;
                state.loading = false;
                Ok(())
            }
            Outcome::Current(Err(e)) => {
                warn!(error = %e, "loading groups failed");
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn create(&self, form: &GroupForm) -> Result<Group, DomainError> {
        let payload = form.to_payload()?;
        match self.api.create_group(&payload).await {
            Ok(group) => {
                let mut state = self.state.write().await;
                upsert_by_id(&mut state.groups, group.clone());
                state.error = None;
                Ok(group)
            }
            Err(e) => Err(self.fail(SAVE_FAILED, e).await),
        }
    }

    pub async fn rename(&self, group_id: i64, form: &GroupForm) -> Result<Group, DomainError> {
        let payload = form.to_payload()?;
        match self.api.rename_group(group_id, &payload).await {
            Ok(group) => {
                let mut state = self.state.write().await;
                upsert_by_id(&mut state.groups, group.clone());
                state.error = None;
                Ok(group)
            }
            Err(e) => Err(self.fail(SAVE_FAILED, e).await),
        }
    }

    /// Delete a group. The caller confirms with the user first.
    pub async fn delete(&self, group_id: i64) -> Result<(), DomainError> {
        match self.api.delete_group(group_id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                remove_by_id(&mut state.groups, group_id);
                state.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(DELETE_FAILED, e).await),
        }
    }

    async fn fail(&self, message: &str, e: crate::domain::ApiError) -> DomainError {
        warn!(error = %e, "{}", message);
        self.state.write().await.error = Some(message.to_string());
        e.into()
    }
}
