//! Net balances per member of a selected group.
//!
//! The group picker is loaded first and the first group is selected. Every
//! change of selection cancels the balances fetch for the previous group, so
//! a slow response for an old group can never overwrite the current one.

use super::request_scope::{Outcome, RequestScope};
use crate::domain::{Balance, DomainError, Group};
use crate::ports::ExpenseApi;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const GROUPS_FAILED: &str = "Unable to load groups right now.";
pub const LOAD_FAILED: &str = "Unable to load balances for the selected group.";

#[derive(Debug, Clone, Default)]
pub struct BalancesState {
    pub groups: Vec<Group>,
    pub selected_group_id: Option<i64>,
    pub balances: Vec<Balance>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct BalancesPage {
    api: Arc<dyn ExpenseApi>,
    state: RwLock<BalancesState>,
    groups_scope: RequestScope,
    balances_scope: RequestScope,
}

impl BalancesPage {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: RwLock::new(BalancesState::default()),
            groups_scope: RequestScope::new(),
            balances_scope: RequestScope::new(),
        }
    }

    pub async fn snapshot(&self) -> BalancesState {
        self.state.read().await.clone()
    }

    /// Load the group picker and select the first group, if any.
    pub async fn load_groups(&self) -> Result<(), DomainError> {
        let api = Arc::clone(&self.api);
        let outcome = self
            .groups_scope
            .run(|token| async move { api.list_groups(&token).await })
            .await;

        let first = {
            let mut state = self.state.write().await;
            match outcome {
                Outcome::Superseded => return Ok(()),
                Outcome::Current(Ok(groups)) => {
                    let first = groups.first().map(|g| g.id);
                    state.groups = groups;
                    state.error = None;
                    first
                }
                Outcome::Current(Err(e)) => {
                    warn!(error = %e, "loading groups for balances failed");
                    state.error = Some(GROUPS_FAILED.to_string());
                    return Err(e.into());
                }
            }
        };

        match first {
            Some(group_id) => self.select_group(group_id).await,
            None => Ok(()),
        }
    }

    /// Fetch balances for `group_id`, cancelling the fetch for the previous selection.
    pub async fn select_group(&self, group_id: i64) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().await;
            state.selected_group_id = Some(group_id);
            state.balances.clear();
            state.loading = true;
            state.error = None;
        }
        let api = Arc::clone(&self.api);
        let outcome = self
            .balances_scope
            .run(|token| async move { api.group_balances(group_id, &token).await })
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Outcome::Superseded => Ok(()),
            Outcome::Current(Ok(balances)) => {
                info!(group_id, count = balances.len(), "balances loaded");
                state.balances = balances;
                state.loading = false;
                Ok(())
            }
            Outcome::Current(Err(e)) => {
                warn!(group_id, error = %e, "loading balances failed");
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }
}
