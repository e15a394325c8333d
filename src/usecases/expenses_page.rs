//! Expenses of the selected group: list, create, edit, delete.

use super::request_scope::{Outcome, RequestScope};
use crate::domain::{
    ApiError, DomainError, Expense, ExpenseForm, Member, remove_by_id, upsert_by_id,
};
use crate::ports::ExpenseApi;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const LOAD_FAILED: &str = "Unable to load expenses for the selected group.";
pub const SAVE_FAILED: &str = "Failed to save expense.";
pub const DELETE_FAILED: &str = "Failed to delete expense.";

#[derive(Debug, Clone, Default)]
pub struct ExpensesState {
    pub group_id: Option<i64>,
    /// Candidates for payer and share rows.
    pub members: Vec<Member>,
    pub expenses: Vec<Expense>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ExpensesPage {
    api: Arc<dyn ExpenseApi>,
    state: RwLock<ExpensesState>,
    scope: RequestScope,
}

impl ExpensesPage {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ExpensesState::default()),
            scope: RequestScope::new(),
        }
    }

    pub async fn snapshot(&self) -> ExpensesState {
        self.state.read().await.clone()
    }

    pub async fn select_group(&self, group_id: i64) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().await;
            state.group_id = Some(group_id);
            state.members.clear();
            state.expenses.clear();
            state.loading = true;
            state.error = None;
        }
        let api = Arc::clone(&self.api);
        let outcome = self
            .scope
            .run(|token| async move {
                tokio::try_join!(
                    api.list_members(group_id, &token),
                    api.list_expenses(group_id, &token)
                )
            })
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Outcome::Superseded => Ok(()),
            Outcome::Current(Ok((members, expenses))) => {
                info!(group_id, count = expenses.len(), "expenses loaded");
                state.members = members;
                state.expenses = expenses;
                state.loading = false;
                Ok(())
            }
            Outcome::Current(Err(e)) => {
                warn!(group_id, error = %e, "loading expenses failed");
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Empty form with a share row per member of the selected group.
    pub async fn new_form(&self) -> ExpenseForm {
        ExpenseForm::blank(&self.state.read().await.members)
    }

    pub async fn edit_form(&self, expense_id: i64) -> Result<ExpenseForm, DomainError> {
        let state = self.state.read().await;
        state
            .expenses
            .iter()
            .find(|e| e.id == expense_id)
            .map(|e| ExpenseForm::from_expense(e, &state.members))
            .ok_or_else(|| DomainError::NotLoaded(format!("expense {} is not listed", expense_id)))
    }

    pub async fn create(&self, form: &ExpenseForm) -> Result<Expense, DomainError> {
        let group_id = self
            .state
            .read()
            .await
            .group_id
            .ok_or_else(|| DomainError::NotLoaded("no group is selected".into()))?;
        let payload = form.to_payload()?;
        match self.api.create_expense(group_id, &payload).await {
            Ok(expense) => Ok(self.reconcile(expense).await),
            Err(e) => Err(self.fail(SAVE_FAILED, e).await),
        }
    }

    pub async fn update(&self, expense_id: i64, form: &ExpenseForm) -> Result<Expense, DomainError> {
        let payload = form.to_payload()?;
        match self.api.update_expense(expense_id, &payload).await {
            Ok(expense) => Ok(self.reconcile(expense).await),
            Err(e) => Err(self.fail(SAVE_FAILED, e).await),
        }
    }

    /// Delete an expense. The caller confirms first.
    pub async fn delete(&self, expense_id: i64) -> Result<(), DomainError> {
        match self.api.delete_expense(expense_id).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                remove_by_id(&mut state.expenses, expense_id);
                state.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(DELETE_FAILED, e).await),
        }
    }

    async fn reconcile(&self, expense: Expense) -> Expense {
        let mut state = self.state.write().await;
        upsert_by_id(&mut state.expenses, expense.clone());
        state.error = None;
        expense
    }

    async fn fail(&self, message: &str, e: ApiError) -> DomainError {
        warn!(error = %e, "{}", message);
        self.state.write().await.error = Some(message.to_string());
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryExpenseApi;

    const TRIP: i64 = 101;

    fn page() -> (Arc<InMemoryExpenseApi>, ExpensesPage) {
        let api = Arc::new(InMemoryExpenseApi::demo());
        let page = ExpensesPage::new(Arc::clone(&api) as Arc<dyn ExpenseApi>);
        (api, page)
    }

    #[tokio::test]
    async fn test_select_group_loads_members_and_expenses() {
        let (_, page) = page();
        page.select_group(TRIP).await.unwrap();
        let state = page.snapshot().await;
        assert_eq!(state.members.len(), 3);
        assert_eq!(state.expenses.len(), 1);
        assert_eq!(state.expenses[0].description, "Dinner at Ramiro");
        assert_eq!(page.new_form().await.shares.len(), 3);
    }

    #[tokio::test]
    async fn test_create_prepends_and_update_replaces() {
        let (_, page) = page();
        page.select_group(TRIP).await.unwrap();

        let mut form = page.new_form().await;
        form.description = "Tram tickets".into();
        form.amount = "12.60".into();
        form.paid_by_user_id = Some(1);
        let created = page.create(&form).await.unwrap();
        let state = page.snapshot().await;
        assert_eq!(state.expenses.len(), 2);
        assert_eq!(state.expenses[0].id, created.id);

        let mut edit = page.edit_form(created.id).await.unwrap();
        assert_eq!(edit.description, "Tram tickets");
        edit.amount = "14.00".into();
        page.update(created.id, &edit).await.unwrap();
        let state = page.snapshot().await;
        assert_eq!(state.expenses.len(), 2);
        assert_eq!(state.expenses[0].amount, "14.00");
    }

    #[tokio::test]
    async fn test_delete_removes() {
        let (_, page) = page();
        page.select_group(TRIP).await.unwrap();
        let id = page.snapshot().await.expenses[0].id;
        page.delete(id).await.unwrap();
        assert!(page.snapshot().await.expenses.is_empty());
    }

    #[tokio::test]
    async fn test_create_requires_selected_group() {
        let (_, page) = page();
        let form = ExpenseForm {
            description: "Coffee".into(),
            amount: "3".into(),
            ..ExpenseForm::default()
        };
        let err = page.create(&form).await.unwrap_err();
        assert!(matches!(err, DomainError::NotLoaded(_)));
    }

    #[tokio::test]
    async fn test_save_failure_sets_message() {
        let (api, page) = page();
        page.select_group(TRIP).await.unwrap();
        api.set_offline(true).await;
        let form = ExpenseForm {
            description: "Coffee".into(),
            amount: "3".into(),
            ..ExpenseForm::default()
        };
        assert!(page.create(&form).await.is_err());
        let state = page.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(SAVE_FAILED));
        assert_eq!(state.expenses.len(), 1);
    }
}
