//! In-memory ExpenseApi for offline demo mode and tests.
//!
//! Keeps records in a lock-guarded store, simulates network latency, and
//! honors cancellation the same way the HTTP client does.

use crate::adapters::http::join_url;
use crate::domain::{
    ApiError, Balance, Expense, ExpensePayload, Group, GroupPayload, GroupRef, Member,
    MemberPatchPayload, NewMemberPayload, ReceiptFile, Share, UserRef,
};
use crate::ports::ExpenseApi;
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Default)]
struct Store {
    users: HashMap<i64, UserRef>,
    groups: Vec<Group>,
    members: Vec<Member>,
    /// (group id, expense)
    expenses: Vec<(i64, Expense)>,
    next_id: i64,
    offline: bool,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> UserRef {
        self.users.get(&id).cloned().unwrap_or(UserRef {
            id,
            name: None,
            email: None,
        })
    }

    fn group_ref(&self, group_id: i64) -> Option<GroupRef> {
        self.groups.iter().find(|g| g.id == group_id).map(|g| GroupRef {
            id: g.id,
            name: Some(g.name.clone()),
        })
    }
}

/// In-memory backend.
pub struct InMemoryExpenseApi {
    store: RwLock<Store>,
    /// Simulated latency for reads.
    delay: Duration,
    /// Per-group latency overrides for reads scoped to a group.
    group_delays: HashMap<i64, Duration>,
}

impl InMemoryExpenseApi {
    /// Empty backend with the given read latency.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            delay,
            group_delays: HashMap::new(),
        }
    }

    /// Reads scoped to `group_id` take `delay` instead of the default.
    pub fn with_group_delay(mut self, group_id: i64, delay: Duration) -> Self {
        self.group_delays.insert(group_id, delay);
        self
    }

    /// Backend seeded with a small demo dataset.
    pub fn demo() -> Self {
        let mut store = Store::default();
        seed_demo(&mut store);
        Self {
            store: RwLock::new(store),
            delay: Duration::from_millis(150),
            group_delays: HashMap::new(),
        }
    }

    /// Register a user that members can refer to.
    pub async fn add_user(&self, id: i64, name: &str) {
        self.store.write().await.users.insert(
            id,
            UserRef {
                id,
                name: Some(name.to_string()),
                email: None,
            },
        );
    }

    /// While offline every call fails with a network error.
    pub async fn set_offline(&self, offline: bool) {
        self.store.write().await.offline = offline;
    }

    async fn check_online(&self, path: &str) -> Result<(), ApiError> {
        if self.store.read().await.offline {
            return Err(ApiError::Network {
                url: join_url("memory://backend", path),
                source: "backend unreachable (offline mode)".into(),
            });
        }
        Ok(())
    }

    /// Simulated round trip for a read; aborted if `cancel` fires first.
    async fn read_latency(
        &self,
        path: &str,
        group_id: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let delay = group_id
            .and_then(|id| self.group_delays.get(&id).copied())
            .unwrap_or(self.delay);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Aborted {
                method: "GET".to_string(),
                path: path.to_string(),
            }),
            _ = tokio::time::sleep(delay) => self.check_online(path).await,
        }
    }

    fn not_found(method: &str, path: &str) -> ApiError {
        ApiError::Http {
            method: method.to_string(),
            path: path.to_string(),
            status: 404,
            status_text: "Not Found".to_string(),
            detail: "Not found".to_string(),
        }
    }

    fn conflict(method: &str, path: &str, detail: &str) -> ApiError {
        ApiError::Http {
            method: method.to_string(),
            path: path.to_string(),
            status: 409,
            status_text: "Conflict".to_string(),
            detail: detail.to_string(),
        }
    }
}

fn seed_demo(store: &mut Store) {
    for (id, name) in [(1, "Ana"), (2, "Ben"), (3, "Chloe")] {
        store.users.insert(
            id,
            UserRef {
                id,
                name: Some(name.to_string()),
                email: Some(format!("{}@example.com", name.to_lowercase())),
            },
        );
    }
    store.next_id = 100;
    let trip = store.next_id();
    let creator = store.user(1);
    store.groups.push(Group {
        id: trip,
        name: "Lisbon trip".to_string(),
        created_at: Some("2024-04-02T09:15:00Z".to_string()),
        created_by: Some(creator),
    });
    let trip_ref = store.group_ref(trip);
    for user_id in [1, 2, 3] {
        let member = Member {
            id: store.next_id(),
            group: trip_ref.clone(),
            user: store.user(user_id),
            role: (user_id == 1).then(|| "Admin".to_string()),
            joined_at: Some("2024-04-02T09:15:00Z".to_string()),
        };
        store.members.push(member);
    }
    let dinner = Expense {
        id: store.next_id(),
        group: trip_ref,
        description: "Dinner at Ramiro".to_string(),
        amount: "96.00".to_string(),
        paid_by_user: Some(store.user(2)),
        expense_date: Some("2024-04-03T00:00:00.000Z".to_string()),
        shares: Vec::new(),
        receipt_filename: None,
        receipt_mime_type: None,
    };
    store.expenses.push((trip, dinner));
}

fn amount(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_default()
}

/// Net balances: payers are credited the full amount; each share (or an equal
/// split across members when there are none) is debited.
fn compute_balances(store: &Store, group_id: i64) -> Vec<Balance> {
    let member_ids: Vec<i64> = store
        .members
        .iter()
        .filter(|m| m.group.as_ref().is_some_and(|g| g.id == group_id))
        .map(|m| m.user.id)
        .collect();
    let mut net: HashMap<i64, Decimal> =
        member_ids.iter().map(|id| (*id, Decimal::ZERO)).collect();

    for (_, expense) in store.expenses.iter().filter(|(g, _)| *g == group_id) {
        let total = amount(&expense.amount);
        if let Some(payer) = &expense.paid_by_user {
            *net.entry(payer.id).or_default() += total;
        }
        if expense.shares.is_empty() {
            if member_ids.is_empty() {
                continue;
            }
            let each = (total / Decimal::from(member_ids.len() as i64))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            for id in &member_ids {
                *net.entry(*id).or_default() -= each;
            }
        } else {
            for share in &expense.shares {
                *net.entry(share.user.id).or_default() -= amount(&share.amount);
            }
        }
    }

    let mut balances: Vec<Balance> = net
        .into_iter()
        .map(|(user_id, value)| Balance {
            user: store.user(user_id),
            balance: format!("{:.2}", value),
        })
        .collect();
    balances.sort_by_key(|b| b.user.id);
    balances
}

fn apply_payload(store: &Store, expense: &mut Expense, payload: &ExpensePayload) {
    expense.description = payload.description.clone();
    expense.amount = payload.amount.clone();
    expense.paid_by_user = payload.paid_by_user_id.map(|id| store.user(id));
    expense.expense_date = payload.expense_date.clone();
    expense.shares = payload
        .shares
        .iter()
        .flatten()
        .map(|s| Share {
            user: store.user(s.user_id),
            amount: s.amount.clone(),
        })
        .collect();
}

#[async_trait]
impl ExpenseApi for InMemoryExpenseApi {
    async fn list_groups(&self, cancel: &CancellationToken) -> Result<Vec<Group>, ApiError> {
        self.read_latency("/groups", None, cancel).await?;
        Ok(self.store.read().await.groups.clone())
    }

    async fn create_group(&self, payload: &GroupPayload) -> Result<Group, ApiError> {
        self.check_online("/groups").await?;
        let mut store = self.store.write().await;
        let group = Group {
            id: store.next_id(),
            name: payload.name.clone(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            created_by: None,
        };
        store.groups.push(group.clone());
        info!(group_id = group.id, "[MEMORY] group created");
        Ok(group)
    }

    async fn get_group(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Group, ApiError> {
        let path = format!("/groups/{}", group_id);
        self.read_latency(&path, Some(group_id), cancel).await?;
        let store = self.store.read().await;
        store
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| Self::not_found("GET", &path))
    }

    async fn rename_group(
        &self,
        group_id: i64,
        payload: &GroupPayload,
    ) -> Result<Group, ApiError> {
        let path = format!("/groups/{}", group_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let group = store
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Self::not_found("PATCH", &path))?;
        group.name = payload.name.clone();
        Ok(group.clone())
    }

    async fn delete_group(&self, group_id: i64) -> Result<(), ApiError> {
        let path = format!("/groups/{}", group_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let before = store.groups.len();
        store.groups.retain(|g| g.id != group_id);
        if store.groups.len() == before {
            return Err(Self::not_found("DELETE", &path));
        }
        store
            .members
            .retain(|m| m.group.as_ref().is_none_or(|g| g.id != group_id));
        store.expenses.retain(|(g, _)| *g != group_id);
        Ok(())
    }

    async fn list_members(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Member>, ApiError> {
        let path = format!("/groups/{}/members", group_id);
        self.read_latency(&path, Some(group_id), cancel).await?;
        let store = self.store.read().await;
        Ok(store
            .members
            .iter()
            .filter(|m| m.group.as_ref().is_some_and(|g| g.id == group_id))
            .cloned()
            .collect())
    }

    async fn add_member(
        &self,
        group_id: i64,
        payload: &NewMemberPayload,
    ) -> Result<Member, ApiError> {
        let path = format!("/groups/{}/members", group_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let group = store
            .group_ref(group_id)
            .ok_or_else(|| Self::not_found("POST", &path))?;
        if !store.users.contains_key(&payload.user_id) {
            return Err(Self::not_found("POST", &path));
        }
        let already = store.members.iter().any(|m| {
            m.user.id == payload.user_id && m.group.as_ref().is_some_and(|g| g.id == group_id)
        });
        if already {
            return Err(Self::conflict("POST", &path, "User is already a member"));
        }
        let member = Member {
            id: store.next_id(),
            group: Some(group),
            user: store.user(payload.user_id),
            role: payload.role.clone(),
            joined_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        store.members.push(member.clone());
        Ok(member)
    }

    async fn update_member(
        &self,
        group_id: i64,
        member_id: i64,
        payload: &MemberPatchPayload,
    ) -> Result<Member, ApiError> {
        let path = format!("/groups/{}/members/{}", group_id, member_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let member = store
            .members
            .iter_mut()
            .find(|m| m.id == member_id && m.group.as_ref().is_some_and(|g| g.id == group_id))
            .ok_or_else(|| Self::not_found("PATCH", &path))?;
        member.role = payload.role.clone();
        Ok(member.clone())
    }

    async fn remove_member(&self, group_id: i64, member_id: i64) -> Result<(), ApiError> {
        let path = format!("/groups/{}/members/{}", group_id, member_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let before = store.members.len();
        store.members.retain(|m| m.id != member_id);
        if store.members.len() == before {
            return Err(Self::not_found("DELETE", &path));
        }
        Ok(())
    }

    async fn list_expenses(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Expense>, ApiError> {
        let path = format!("/groups/{}/expenses", group_id);
        self.read_latency(&path, Some(group_id), cancel).await?;
        let store = self.store.read().await;
        Ok(store
            .expenses
            .iter()
            .filter(|(g, _)| *g == group_id)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn create_expense(
        &self,
        group_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError> {
        let path = format!("/groups/{}/expenses", group_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let group = store
            .group_ref(group_id)
            .ok_or_else(|| Self::not_found("POST", &path))?;
        let mut expense = Expense {
            id: store.next_id(),
            group: Some(group),
            description: String::new(),
            amount: String::new(),
            paid_by_user: None,
            expense_date: None,
            shares: Vec::new(),
            receipt_filename: None,
            receipt_mime_type: None,
        };
        apply_payload(&store, &mut expense, payload);
        store.expenses.push((group_id, expense.clone()));
        Ok(expense)
    }

    async fn update_expense(
        &self,
        expense_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError> {
        let path = format!("/expenses/{}", expense_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let index = store
            .expenses
            .iter()
            .position(|(_, e)| e.id == expense_id)
            .ok_or_else(|| Self::not_found("PATCH", &path))?;
        let mut expense = store.expenses[index].1.clone();
        apply_payload(&store, &mut expense, payload);
        store.expenses[index].1 = expense.clone();
        Ok(expense)
    }

    async fn delete_expense(&self, expense_id: i64) -> Result<(), ApiError> {
        let path = format!("/expenses/{}", expense_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let before = store.expenses.len();
        store.expenses.retain(|(_, e)| e.id != expense_id);
        if store.expenses.len() == before {
            return Err(Self::not_found("DELETE", &path));
        }
        Ok(())
    }

    async fn upload_receipt(
        &self,
        expense_id: i64,
        file: ReceiptFile,
    ) -> Result<Expense, ApiError> {
        let path = format!("/expenses/{}/receipt", expense_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let (_, expense) = store
            .expenses
            .iter_mut()
            .find(|(_, e)| e.id == expense_id)
            .ok_or_else(|| Self::not_found("POST", &path))?;
        expense.receipt_filename = Some(file.file_name);
        expense.receipt_mime_type = file.mime_type;
        Ok(expense.clone())
    }

    async fn delete_receipt(&self, expense_id: i64) -> Result<Option<Expense>, ApiError> {
        let path = format!("/expenses/{}/receipt", expense_id);
        self.check_online(&path).await?;
        let mut store = self.store.write().await;
        let (_, expense) = store
            .expenses
            .iter_mut()
            .find(|(_, e)| e.id == expense_id)
            .ok_or_else(|| Self::not_found("DELETE", &path))?;
        expense.receipt_filename = None;
        expense.receipt_mime_type = None;
        Ok(Some(expense.clone()))
    }

    fn receipt_url(&self, expense_id: i64) -> String {
        join_url("memory://backend", &format!("/expenses/{}/receipt", expense_id))
    }

    async fn group_balances(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Balance>, ApiError> {
        let path = format!("/groups/{}/balances", group_id);
        self.read_latency(&path, Some(group_id), cancel).await?;
        let store = self.store.read().await;
        if store.group_ref(group_id).is_none() {
            return Err(Self::not_found("GET", &path));
        }
        Ok(compute_balances(&store, group_id))
    }
}
