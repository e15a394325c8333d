//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ApiError, Balance, Expense, ExpensePayload, Group, GroupPayload, Member, MemberPatchPayload,
    NewMemberPayload, ReceiptFile,
};
use tokio_util::sync::CancellationToken;

/// Expense Splitter backend. One method per REST resource operation.
///
/// Reads take a cancellation token so a page can drop a load that no longer
/// matches its selection. Mutations run to completion (or timeout).
#[async_trait::async_trait]
pub trait ExpenseApi: Send + Sync {
    /// `GET /groups`
    async fn list_groups(&self, cancel: &CancellationToken) -> Result<Vec<Group>, ApiError>;

    /// `POST /groups`
    async fn create_group(&self, payload: &GroupPayload) -> Result<Group, ApiError>;

    /// `GET /groups/{id}`
    async fn get_group(&self, group_id: i64, cancel: &CancellationToken)
    -> Result<Group, ApiError>;

    /// `PATCH /groups/{id}`
    async fn rename_group(&self, group_id: i64, payload: &GroupPayload)
    -> Result<Group, ApiError>;

    /// `DELETE /groups/{id}`
    async fn delete_group(&self, group_id: i64) -> Result<(), ApiError>;

    /// `GET /groups/{id}/members`
    async fn list_members(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Member>, ApiError>;

    /// `POST /groups/{id}/members`
    async fn add_member(
        &self,
        group_id: i64,
        payload: &NewMemberPayload,
    ) -> Result<Member, ApiError>;

    /// `PATCH /groups/{id}/members/{mid}`
    async fn update_member(
        &self,
        group_id: i64,
        member_id: i64,
        payload: &MemberPatchPayload,
    ) -> Result<Member, ApiError>;

    /// `DELETE /groups/{id}/members/{mid}`
    async fn remove_member(&self, group_id: i64, member_id: i64) -> Result<(), ApiError>;

    /// `GET /groups/{id}/expenses`
    async fn list_expenses(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Expense>, ApiError>;

    /// `POST /groups/{id}/expenses`
    async fn create_expense(
        &self,
        group_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError>;

    /// `PATCH /expenses/{id}`
    async fn update_expense(
        &self,
        expense_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError>;

    /// `DELETE /expenses/{id}`
    async fn delete_expense(&self, expense_id: i64) -> Result<(), ApiError>;

    /// `POST /expenses/{id}/receipt` (multipart). Returns the updated expense.
    async fn upload_receipt(
        &self,
        expense_id: i64,
        file: ReceiptFile,
    ) -> Result<Expense, ApiError>;

    /// `DELETE /expenses/{id}/receipt`. Returns the updated expense when the
    /// backend sends one back (an empty body yields `None`).
    async fn delete_receipt(&self, expense_id: i64) -> Result<Option<Expense>, ApiError>;

    /// URL of `GET /expenses/{id}/receipt`. Pure; issues no request.
    fn receipt_url(&self, expense_id: i64) -> String;

    /// `GET /groups/{id}/balances`
    async fn group_balances(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Balance>, ApiError>;
}
