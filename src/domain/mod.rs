//! Core domain layer. No network or terminal dependencies.
//!
//! Entities, form validation and list reconciliation live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod forms;
pub mod money;
pub mod reconcile;

pub use entities::{
    Balance, BalancesResponse, Expense, Group, GroupRef, Member, ReceiptFile, Share, Theme,
    UserRef, is_likely_image,
};
pub use errors::{ApiError, DomainError, ErrorCode};
pub use forms::{
    ExpenseForm, ExpensePayload, GroupForm, GroupPayload, MemberForm, MemberPatchPayload,
    NewMemberPayload, SharePayload, ShareRow,
};
pub use money::{BalanceStatus, format_money, format_timestamp};
pub use reconcile::{Keyed, remove_by_id, upsert_by_id};
