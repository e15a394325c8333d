//! Form field state and the request payloads built from it.
//!
//! Forms refuse to produce a payload for incomplete input, so nothing is sent.
//! Optional payload keys are omitted entirely when unset.

use super::entities::{Expense, Member};
use super::errors::DomainError;
use super::money::{date_part, parse_amount};
use chrono::NaiveDate;
use serde::Serialize;

const MAX_DESCRIPTION_LEN: usize = 255;
const MAX_ROLE_LEN: usize = 50;

/// Body of `POST /groups` and `PATCH /groups/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPayload {
    pub name: String,
}

/// Body of `POST /groups/{id}/members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMemberPayload {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Body of `PATCH /groups/{id}/members/{mid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberPatchPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub user_id: i64,
    pub amount: String,
}

/// Body of `POST /groups/{id}/expenses` and `PATCH /expenses/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpensePayload {
    pub description: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_by_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_date: Option<String>,
    /// Absent means the backend splits equally among members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<Vec<SharePayload>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupForm {
    pub name: String,
}

impl GroupForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_payload(&self) -> Result<GroupPayload, DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("group name is required".into()));
        }
        Ok(GroupPayload {
            name: name.to_string(),
        })
    }
}

/// Member form. The user id is only editable when adding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberForm {
    pub user_id: String,
    pub role: String,
}

impl MemberForm {
    pub fn from_member(member: &Member) -> Self {
        Self {
            user_id: member.user.id.to_string(),
            role: member.role.clone().unwrap_or_default(),
        }
    }

    fn role(&self) -> Result<Option<String>, DomainError> {
        let role = self.role.trim();
        if role.chars().count() > MAX_ROLE_LEN {
            return Err(DomainError::Validation(format!(
                "role must be at most {} characters",
                MAX_ROLE_LEN
            )));
        }
        Ok((!role.is_empty()).then(|| role.to_string()))
    }

    pub fn to_new_payload(&self) -> Result<NewMemberPayload, DomainError> {
        let user_id = self
            .user_id
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= 1)
            .ok_or_else(|| DomainError::Validation("a positive user id is required".into()))?;
        Ok(NewMemberPayload {
            user_id,
            role: self.role()?,
        })
    }

    pub fn to_patch_payload(&self) -> Result<MemberPatchPayload, DomainError> {
        Ok(MemberPatchPayload { role: self.role()? })
    }
}

/// One editable share row: a member and the amount typed for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareRow {
    pub user_id: Option<i64>,
    pub amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    /// Empty means no payer selected.
    pub paid_by_user_id: Option<i64>,
    /// `YYYY-MM-DD`, empty for none.
    pub date: String,
    pub custom_shares: bool,
    pub shares: Vec<ShareRow>,
}

impl ExpenseForm {
    /// Blank form with one empty share row per member.
    pub fn blank(members: &[Member]) -> Self {
        Self {
            shares: member_rows(members),
            ..Self::default()
        }
    }

    /// Form pre-filled from an existing expense.
    pub fn from_expense(expense: &Expense, members: &[Member]) -> Self {
        let has_shares = !expense.shares.is_empty();
        let shares = if has_shares {
            expense
                .shares
                .iter()
                .map(|s| ShareRow {
                    user_id: Some(s.user.id),
                    amount: s.amount.clone(),
                })
                .collect()
        } else {
            member_rows(members)
        };
        Self {
            description: expense.description.clone(),
            amount: expense.amount.clone(),
            paid_by_user_id: expense.paid_by_user.as_ref().map(|u| u.id),
            date: expense
                .expense_date
                .as_deref()
                .and_then(date_part)
                .unwrap_or_default(),
            custom_shares: has_shares,
            shares,
        }
    }

    /// Set the amount typed for a user's share row.
    pub fn set_share(&mut self, user_id: i64, amount: impl Into<String>) {
        let amount = amount.into();
        match self.shares.iter_mut().find(|s| s.user_id == Some(user_id)) {
            Some(row) => row.amount = amount,
            None => self.shares.push(ShareRow {
                user_id: Some(user_id),
                amount,
            }),
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.description.trim().is_empty() && !self.amount.trim().is_empty()
    }

    pub fn to_payload(&self) -> Result<ExpensePayload, DomainError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(DomainError::Validation("description is required".into()));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(DomainError::Validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(DomainError::Validation("amount is required".into()));
        }
        match parse_amount(amount) {
            Some(value) if !value.is_sign_negative() => {}
            _ => {
                return Err(DomainError::Validation(format!(
                    "amount must be a non-negative decimal, got {:?}",
                    amount
                )));
            }
        }

        let expense_date = match self.date.trim() {
            "" => None,
            raw => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    DomainError::Validation(format!("date must be YYYY-MM-DD, got {:?}", raw))
                })?;
                Some(format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")))
            }
        };

        let shares = if self.custom_shares {
            let cleaned: Vec<SharePayload> = self
                .shares
                .iter()
                .filter_map(|row| {
                    let user_id = row.user_id?;
                    let amount = row.amount.trim();
                    (!amount.is_empty()).then(|| SharePayload {
                        user_id,
                        amount: amount.to_string(),
                    })
                })
                .collect();
            (!cleaned.is_empty()).then_some(cleaned)
        } else {
            None
        };

        Ok(ExpensePayload {
            description: description.to_string(),
            amount: amount.to_string(),
            paid_by_user_id: self.paid_by_user_id,
            expense_date,
            shares,
        })
    }
}

fn member_rows(members: &[Member]) -> Vec<ShareRow> {
    members
        .iter()
        .map(|m| ShareRow {
            user_id: Some(m.user.id),
            amount: String::new(),
        })
        .collect()
}
