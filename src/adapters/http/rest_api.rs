//! Implements ExpenseApi over the HTTP client.
//!
//! One method per REST resource operation; responses are decoded into domain entities.

use super::client::{HttpClient, RequestOptions};
use crate::domain::{
    ApiError, Balance, BalancesResponse, Expense, ExpensePayload, Group, GroupPayload, Member,
    MemberPatchPayload, NewMemberPayload, ReceiptFile,
};
use crate::ports::ExpenseApi;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// REST adapter for the Expense Splitter backend.
pub struct RestExpenseApi {
    http: HttpClient,
}

impl RestExpenseApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn read(cancel: &CancellationToken) -> RequestOptions {
        RequestOptions::new().cancel(cancel.clone())
    }
}

#[async_trait]
impl ExpenseApi for RestExpenseApi {
    async fn list_groups(&self, cancel: &CancellationToken) -> Result<Vec<Group>, ApiError> {
        let path = "/groups";
        let groups = self
            .http
            .get(path, Self::read(cancel))
            .await?
            .decode_list("GET", path)?;
        Ok(groups)
    }

    async fn create_group(&self, payload: &GroupPayload) -> Result<Group, ApiError> {
        let path = "/groups";
        let group: Group = self
            .http
            .post(path, payload, RequestOptions::new())
            .await?
            .decode("POST", path)?;
        info!(group_id = group.id, "group created");
        Ok(group)
    }

    async fn get_group(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Group, ApiError> {
        let path = format!("/groups/{}", group_id);
        self.http
            .get(&path, Self::read(cancel))
            .await?
            .decode("GET", &path)
    }

    async fn rename_group(
        &self,
        group_id: i64,
        payload: &GroupPayload,
    ) -> Result<Group, ApiError> {
        let path = format!("/groups/{}", group_id);
        self.http
            .patch(&path, payload, RequestOptions::new())
            .await?
            .decode("PATCH", &path)
    }

    async fn delete_group(&self, group_id: i64) -> Result<(), ApiError> {
        self.http
            .delete(&format!("/groups/{}", group_id), RequestOptions::new())
            .await?;
        info!(group_id, "group deleted");
        Ok(())
    }

    async fn list_members(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Member>, ApiError> {
        let path = format!("/groups/{}/members", group_id);
        self.http
            .get(&path, Self::read(cancel))
            .await?
            .decode_list("GET", &path)
    }

    async fn add_member(
        &self,
        group_id: i64,
        payload: &NewMemberPayload,
    ) -> Result<Member, ApiError> {
        let path = format!("/groups/{}/members", group_id);
        self.http
            .post(&path, payload, RequestOptions::new())
            .await?
            .decode("POST", &path)
    }

    async fn update_member(
        &self,
        group_id: i64,
        member_id: i64,
        payload: &MemberPatchPayload,
    ) -> Result<Member, ApiError> {
        let path = format!("/groups/{}/members/{}", group_id, member_id);
        self.http
            .patch(&path, payload, RequestOptions::new())
            .await?
            .decode("PATCH", &path)
    }

    async fn remove_member(&self, group_id: i64, member_id: i64) -> Result<(), ApiError> {
        let path = format!("/groups/{}/members/{}", group_id, member_id);
        self.http.delete(&path, RequestOptions::new()).await?;
        Ok(())
    }

    async fn list_expenses(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Expense>, ApiError> {
        let path = format!("/groups/{}/expenses", group_id);
        self.http
            .get(&path, Self::read(cancel))
            .await?
            .decode_list("GET", &path)
    }

    async fn create_expense(
        &self,
        group_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError> {
        let path = format!("/groups/{}/expenses", group_id);
        let expense: Expense = self
            .http
            .post(&path, payload, RequestOptions::new())
            .await?
            .decode("POST", &path)?;
        info!(group_id, expense_id = expense.id, "expense created");
        Ok(expense)
    }

    async fn update_expense(
        &self,
        expense_id: i64,
        payload: &ExpensePayload,
    ) -> Result<Expense, ApiError> {
        let path = format!("/expenses/{}", expense_id);
        self.http
            .patch(&path, payload, RequestOptions::new())
            .await?
            .decode("PATCH", &path)
    }

    async fn delete_expense(&self, expense_id: i64) -> Result<(), ApiError> {
        self.http
            .delete(&format!("/expenses/{}", expense_id), RequestOptions::new())
            .await?;
        Ok(())
    }

    async fn upload_receipt(
        &self,
        expense_id: i64,
        file: ReceiptFile,
    ) -> Result<Expense, ApiError> {
        let size = file.bytes.len();
        let expense: Expense = self
            .http
            .upload_receipt(expense_id, file, RequestOptions::new())
            .await?
            .decode("POST", &format!("/expenses/{}/receipt", expense_id))?;
        info!(expense_id, size, "receipt uploaded");
        Ok(expense)
    }

    async fn delete_receipt(&self, expense_id: i64) -> Result<Option<Expense>, ApiError> {
        self.http
            .delete_receipt(expense_id, RequestOptions::new())
            .await?
            .decode_optional("DELETE", &format!("/expenses/{}/receipt", expense_id))
    }

    fn receipt_url(&self, expense_id: i64) -> String {
        self.http.receipt_url(expense_id)
    }

    async fn group_balances(
        &self,
        group_id: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<Balance>, ApiError> {
        let path = format!("/groups/{}/balances", group_id);
        // A null or empty body means no balances yet.
        let response: Option<BalancesResponse> = self
            .http
            .get(&path, Self::read(cancel))
            .await?
            .decode_optional("GET", &path)?;
        Ok(response.unwrap_or_default().balances)
    }
}
