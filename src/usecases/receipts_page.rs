//! Receipt attachments for the expenses of the selected group.

use super::request_scope::{Outcome, RequestScope};
use crate::domain::{
    ApiError, DomainError, Expense, ReceiptFile, is_likely_image, upsert_by_id,
};
use crate::ports::ExpenseApi;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const LOAD_FAILED: &str = "Unable to load expenses for the selected group.";
pub const UPLOAD_FAILED: &str = "Failed to upload receipt. Please try a different file.";
pub const DELETE_FAILED: &str = "Failed to delete receipt.";

/// How a stored receipt should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptView {
    pub url: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    /// Inline preview when true, download link otherwise.
    pub is_image: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptsState {
    pub group_id: Option<i64>,
    pub expenses: Vec<Expense>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ReceiptsPage {
    api: Arc<dyn ExpenseApi>,
    state: RwLock<ReceiptsState>,
    scope: RequestScope,
}

impl ReceiptsPage {
    pub fn new(api: Arc<dyn ExpenseApi>) -> Self {
        Self {
            api,
            state: RwLock::new(ReceiptsState::default()),
            scope: RequestScope::new(),
        }
    }

    pub async fn snapshot(&self) -> ReceiptsState {
        self.state.read().await.clone()
    }

    pub async fn select_group(&self, group_id: i64) -> Result<(), DomainError> {
        {
            let mut state = self.state.write().await;
            state.group_id = Some(group_id);
            state.expenses.clear();
            state.loading = true;
            state.error = None;
        }
        let api = Arc::clone(&self.api);
        let outcome = self
            .scope
            .run(|token| async move { api.list_expenses(group_id, &token).await })
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Outcome::Superseded => Ok(()),
            Outcome::Current(Ok(expenses)) => {
                state.expenses = expenses;
                state.loading = false;
                Ok(())
            }
            Outcome::Current(Err(e)) => {
                warn!(group_id, error = %e, "loading expenses for receipts failed");
                state.loading = false;
                state.error = Some(LOAD_FAILED.to_string());
                Err(e.into())
            }
        }
    }

    /// Attach or replace the receipt of an expense.
    pub async fn upload(&self, expense_id: i64, file: ReceiptFile) -> Result<Expense, DomainError> {
        let file_name = file.file_name.clone();
        match self.api.upload_receipt(expense_id, file).await {
            Ok(expense) => {
                info!(expense_id, file = %file_name, "receipt attached");
                let mut state = self.state.write().await;
                upsert_by_id(&mut state.expenses, expense.clone());
                state.error = None;
                Ok(expense)
            }
            Err(e) => Err(self.fail(UPLOAD_FAILED, e).await),
        }
    }

    /// Remove the receipt of an expense. The caller confirms first.
    ///
    /// When the backend answers without a body the receipt fields are
    /// cleared on the local copy.
    pub async fn delete(&self, expense_id: i64) -> Result<(), DomainError> {
        match self.api.delete_receipt(expense_id).await {
            Ok(updated) => {
                let mut state = self.state.write().await;
                match updated {
                    Some(expense) => upsert_by_id(&mut state.expenses, expense),
                    None => {
                        if let Some(local) =
                            state.expenses.iter_mut().find(|e| e.id == expense_id)
                        {
                            local.receipt_filename = None;
                            local.receipt_mime_type = None;
                        }
                    }
                }
                state.error = None;
                Ok(())
            }
            Err(e) => Err(self.fail(DELETE_FAILED, e).await),
        }
    }

    /// Presentation of an expense's receipt, if it has one.
    pub fn view(&self, expense: &Expense) -> Option<ReceiptView> {
        if !expense.has_receipt() {
            return None;
        }
        Some(ReceiptView {
            url: self.api.receipt_url(expense.id),
            filename: expense.receipt_filename.clone(),
            mime_type: expense.receipt_mime_type.clone(),
            is_image: is_likely_image(
                expense.receipt_filename.as_deref(),
                expense.receipt_mime_type.as_deref(),
            ),
        })
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

    fn page() -> (Arc<InMemoryExpenseApi>, ReceiptsPage) {
        let api = Arc::new(InMemoryExpenseApi::demo());
        let page = ReceiptsPage::new(Arc::clone(&api) as Arc<dyn ExpenseApi>);
        (api, page)
    }

    #[tokio::test]
    async fn test_upload_view_delete() {
        let (_, page) = page();
        page.select_group(TRIP).await.unwrap();
        let expense = page.snapshot().await.expenses[0].clone();
        assert!(page.view(&expense).is_none());

        let file = ReceiptFile::new("ramiro.jpg", vec![0xFF, 0xD8, 0xFF]);
        let updated = page.upload(expense.id, file).await.unwrap();
        assert_eq!(updated.receipt_filename.as_deref(), Some("ramiro.jpg"));

        let state = page.snapshot().await;
        let view = page.view(&state.expenses[0]).unwrap();
        assert!(view.is_image);
        assert_eq!(
            view.url,
            format!("memory://backend/expenses/{}/receipt", expense.id)
        );

        page.delete(expense.id).await.unwrap();
        let state = page.snapshot().await;
        assert!(!state.expenses[0].has_receipt());
    }

    #[tokio::test]
    async fn test_pdf_is_offered_as_download() {
        let (_, page) = page();
        page.select_group(TRIP).await.unwrap();
        let id = page.snapshot().await.expenses[0].id;
        let expense = page
            .upload(id, ReceiptFile::new("invoice.pdf", b"%PDF-1.4".to_vec()))
            .await
            .unwrap();
        let view = page.view(&expense).unwrap();
        assert!(!view.is_image);
        assert_eq!(view.mime_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_upload_failure_message() {
        let (api, page) = page();
        page.select_group(TRIP).await.unwrap();
        api.set_offline(true).await;
        let id = page.snapshot().await.expenses[0].id;
        let err = page
            .upload(id, ReceiptFile::new("scan.png", vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Api(_)));
        assert_eq!(page.snapshot().await.error.as_deref(), Some(UPLOAD_FAILED));
    }
}
