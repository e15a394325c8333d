//! Implements InputPort. Inquire-based menus over the page controllers.
//!
//! The theme lives in the run loop: light on start, toggled from the main menu,
//! never persisted. Destructive actions ask for confirmation before any request.

use super::progress::spin;
use super::theme;
use crate::domain::{
    BalanceStatus, DomainError, Expense, ExpenseForm, Group, GroupForm, Member, MemberForm,
    ReceiptFile, Theme, format_money, format_timestamp,
};
use crate::ports::InputPort;
use crate::usecases::{BalancesPage, ExpensesPage, GroupDetailPage, GroupsPage, ReceiptsPage};
use async_trait::async_trait;
use crossterm::style::Stylize;
use inquire::{Confirm, InquireError, Select, Text};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An empty role is omitted from the patch, so the backend keeps the current one.
const ROLE_EDIT_PROMPT: &str = "Role (empty leaves it unchanged):";

/// Menu entry carrying the value it stands for.
struct Choice<T> {
    label: String,
    value: T,
}

impl<T> Choice<T> {
    fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl<T> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[derive(Debug, Clone, Copy)]
enum MainAction {
    Groups,
    Expenses,
    Receipts,
    Balances,
    ToggleTheme,
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum DetailAction {
    Rename,
    AddMember,
    EditMember,
    RemoveMember,
    Delete,
    Back,
}

#[derive(Debug, Clone, Copy)]
enum ExpenseAction {
    Add,
    Edit,
    Delete,
    Back,
}

#[derive(Debug, Clone, Copy)]
enum ReceiptAction {
    View,
    Upload,
    Delete,
    Back,
}

/// Esc and Ctrl-C both mean "go back".
fn skippable<T>(answer: Result<Option<T>, InquireError>) -> Result<Option<T>, DomainError> {
    match answer {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

fn pick<T>(message: &str, choices: Vec<Choice<T>>) -> Result<Option<T>, DomainError> {
    if choices.is_empty() {
        return Ok(None);
    }
    Ok(skippable(Select::new(message, choices).prompt_skippable())?.map(|c| c.value))
}

fn ask_text(message: &str, initial: &str) -> Result<Option<String>, DomainError> {
    skippable(
        Text::new(message)
            .with_initial_value(initial)
            .prompt_skippable(),
    )
}

fn confirm(message: &str) -> Result<bool, DomainError> {
    Ok(skippable(Confirm::new(message).with_default(false).prompt_skippable())?.unwrap_or(false))
}

/// Validation errors are shown verbatim; anything else as the page's generic message.
fn show_failure(err: &DomainError, page_message: Option<String>) {
    debug!(error = %err, "operation failed");
    let text = match err {
        DomainError::Validation(reason) => reason.clone(),
        _ => page_message.unwrap_or_else(|| err.to_string()),
    };
    println!("{}", text.red());
}

fn show_success(text: &str) {
    println!("{}", text.green());
}

fn print_group(group: &Group, members: &[Member]) {
    println!("\n{}", group.name.as_str().bold());
    if let Some(created) = group.created_at.as_deref() {
        let by = group
            .created_by
            .as_ref()
            .map(|u| format!(" by {}", u.display_name()))
            .unwrap_or_default();
        println!("Created {}{}", format_timestamp(created), by);
    }
    if members.is_empty() {
        println!("No members yet.");
    }
    for m in members {
        println!(
            "  #{:<5} {:<24} {:<12} joined {}",
            m.id,
            m.user.display_name(),
            m.role.as_deref().unwrap_or("-"),
            m.joined_at.as_deref().map(format_timestamp).unwrap_or_default()
        );
    }
    println!();
}

fn expense_label(e: &Expense) -> String {
    let payer = e
        .paid_by_user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "—".to_string());
    let date = e
        .expense_date
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_default();
    let receipt = if e.has_receipt() { " [receipt]" } else { "" };
    format!(
        "{} · {} · paid by {} {}{}",
        e.description,
        format_money(Some(e.amount.as_str())),
        payer,
        date,
        receipt
    )
}

fn print_expenses(expenses: &[Expense]) {
    if expenses.is_empty() {
        println!("No expenses recorded for this group.");
        return;
    }
    for e in expenses {
        println!("  {}", expense_label(e));
        for share in &e.shares {
            println!(
                "      {} owes {}",
                share.user.display_name(),
                format_money(Some(share.amount.as_str()))
            );
        }
    }
}

/// Walk the user through an expense form. Returns false when they back out.
fn fill_expense_form(form: &mut ExpenseForm, members: &[Member]) -> Result<bool, DomainError> {
    let Some(description) = ask_text("Description:", &form.description)? else {
        return Ok(false);
    };
    form.description = description;
    let Some(amount) = ask_text("Amount (e.g. 42.50):", &form.amount)? else {
        return Ok(false);
    };
    form.amount = amount;

    let mut payers = vec![Choice::new("No payer", None)];
    payers.extend(
        members
            .iter()
            .map(|m| Choice::new(m.user.display_name(), Some(m.user.id))),
    );
    let Some(payer) = pick("Paid by:", payers)? else {
        return Ok(false);
    };
    form.paid_by_user_id = payer;

    let Some(date) = ask_text("Date (YYYY-MM-DD, empty for none):", &form.date)? else {
        return Ok(false);
    };
    form.date = date;

    form.custom_shares = skippable(
        Confirm::new("Use custom shares instead of an equal split?")
            .with_default(form.custom_shares)
            .prompt_skippable(),
    )?
    .unwrap_or(false);
    if form.custom_shares {
        for m in members {
            let current = form
                .shares
                .iter()
                .find(|s| s.user_id == Some(m.user.id))
                .map(|s| s.amount.clone())
                .unwrap_or_default();
            let prompt = format!("Share for {} (empty to skip):", m.user.display_name());
            let Some(amount) = ask_text(&prompt, &current)? else {
                return Ok(false);
            };
            form.set_share(m.user.id, amount);
        }
    }
    Ok(true)
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    groups: Arc<GroupsPage>,
    detail: Arc<GroupDetailPage>,
    expenses: Arc<ExpensesPage>,
    receipts: Arc<ReceiptsPage>,
    balances: Arc<BalancesPage>,
}

impl TuiInputPort {
    pub fn new(
        groups: Arc<GroupsPage>,
        detail: Arc<GroupDetailPage>,
        expenses: Arc<ExpensesPage>,
        receipts: Arc<ReceiptsPage>,
        balances: Arc<BalancesPage>,
    ) -> Self {
        Self {
            groups,
            detail,
            expenses,
            receipts,
            balances,
        }
    }

    /// Group picker shared by the expenses and receipts screens.
    async fn choose_group(&self) -> Result<Option<i64>, DomainError> {
        if let Err(e) = spin("Loading groups", self.groups.load()).await {
            show_failure(&e, self.groups.snapshot().await.error);
            return Ok(None);
        }
        let groups = self.groups.snapshot().await.groups;
        if groups.is_empty() {
            println!("No groups yet. Create one from the Groups menu.");
            return Ok(None);
        }
        pick(
            "Select a group",
            groups
                .iter()
                .map(|g| Choice::new(g.name.clone(), g.id))
                .collect(),
        )
    }

    async fn groups_menu(&self) -> Result<(), DomainError> {
        if let Err(e) = spin("Loading groups", self.groups.load()).await {
            show_failure(&e, self.groups.snapshot().await.error);
            return Ok(());
        }
        loop {
            let state = self.groups.snapshot().await;
            let mut choices = vec![Choice::new("+ Create group", None)];
            choices.extend(
                state
                    .groups
                    .iter()
                    .map(|g| Choice::new(format!("{} (#{})", g.name, g.id), Some(g.id))),
            );
            let Some(selected) = pick("Groups", choices)? else {
                return Ok(());
            };
            match selected {
                None => {
                    let Some(name) = ask_text("Group name:", "")? else {
                        continue;
                    };
                    match self.groups.create(&GroupForm::new(name)).await {
                        Ok(group) => show_success(&format!("Created group {}", group.name)),
                        Err(e) => show_failure(&e, self.groups.snapshot().await.error),
                    }
                }
                Some(group_id) => {
                    self.group_detail_menu(group_id).await?;
                    // Detail may have renamed or deleted the group.
                    if let Err(e) = spin("Refreshing groups", self.groups.load()).await {
                        show_failure(&e, self.groups.snapshot().await.error);
                    }
                }
            }
        }
    }

    async fn group_detail_menu(&self, group_id: i64) -> Result<(), DomainError> {
        if let Err(e) = spin("Loading group", self.detail.open(group_id)).await {
            show_failure(&e, self.detail.snapshot().await.error);
            return Ok(());
        }
        loop {
            let state = self.detail.snapshot().await;
            let Some(group) = state.group.clone() else {
                return Ok(());
            };
            print_group(&group, &state.members);

            let action = pick(
                &format!("{} actions", group.name),
                vec![
                    Choice::new("Rename group", DetailAction::Rename),
                    Choice::new("Add member", DetailAction::AddMember),
                    Choice::new("Change member role", DetailAction::EditMember),
                    Choice::new("Remove member", DetailAction::RemoveMember),
                    Choice::new("Delete group", DetailAction::Delete),
                    Choice::new("Back", DetailAction::Back),
                ],
            )?;
            let members: Vec<Choice<Member>> = state
                .members
                .iter()
                .map(|m| Choice::new(m.user.display_name(), m.clone()))
                .collect();

            let result = match action.unwrap_or(DetailAction::Back) {
                DetailAction::Back => return Ok(()),
                DetailAction::Rename => match ask_text("New name:", &group.name)? {
                    Some(name) => self.detail.rename(&GroupForm::new(name)).await,
                    None => continue,
                },
                DetailAction::AddMember => {
                    let Some(user_id) = ask_text("User id:", "")? else {
                        continue;
                    };
                    let Some(role) = ask_text("Role (optional):", "")? else {
                        continue;
                    };
                    self.detail.add_member(&MemberForm { user_id, role }).await
                }
                DetailAction::EditMember => {
                    let Some(member) = pick("Member", members)? else {
                        continue;
                    };
                    let mut form = MemberForm::from_member(&member);
                    let Some(role) = ask_text(ROLE_EDIT_PROMPT, &form.role)? else {
                        continue;
                    };
                    form.role = role;
                    self.detail.update_member(member.id, &form).await
                }
                DetailAction::RemoveMember => {
                    let Some(member) = pick("Member to remove", members)? else {
                        continue;
                    };
                    let question = format!(
                        "Remove {} from {}?",
                        member.user.display_name(),
                        group.name
                    );
                    if !confirm(&question)? {
                        continue;
                    }
                    self.detail.remove_member(member.id).await
                }
                DetailAction::Delete => {
                    if !confirm(&format!("Delete group {}? This cannot be undone.", group.name))? {
                        continue;
                    }
                    match self.detail.delete_group().await {
                        Ok(()) => {
                            show_success(&format!("Deleted group {}", group.name));
                            return Ok(());
                        }
                        Err(e) => Err(e),
                    }
                }
            };
            if let Err(e) = result {
                show_failure(&e, self.detail.snapshot().await.error);
            }
        }
    }

    async fn expenses_menu(&self) -> Result<(), DomainError> {
        let Some(group_id) = self.choose_group().await? else {
            return Ok(());
        };
        if let Err(e) = spin("Loading expenses", self.expenses.select_group(group_id)).await {
            show_failure(&e, self.expenses.snapshot().await.error);
            return Ok(());
        }
        loop {
            let state = self.expenses.snapshot().await;
            print_expenses(&state.expenses);
            let action = pick(
                "Expenses",
                vec![
                    Choice::new("Add expense", ExpenseAction::Add),
                    Choice::new("Edit expense", ExpenseAction::Edit),
                    Choice::new("Delete expense", ExpenseAction::Delete),
                    Choice::new("Back", ExpenseAction::Back),
                ],
            )?;
            let listed: Vec<Choice<Expense>> = state
                .expenses
                .iter()
                .map(|e| Choice::new(expense_label(e), e.clone()))
                .collect();

            let result = match action.unwrap_or(ExpenseAction::Back) {
                ExpenseAction::Back => return Ok(()),
                ExpenseAction::Add => {
                    let mut form = self.expenses.new_form().await;
                    if !fill_expense_form(&mut form, &state.members)? {
                        continue;
                    }
                    self.expenses.create(&form).await.map(|e| {
                        show_success(&format!("Added {}", e.description));
                    })
                }
                ExpenseAction::Edit => {
                    let Some(expense) = pick("Expense to edit", listed)? else {
                        continue;
                    };
                    match self.expenses.edit_form(expense.id).await {
                        Ok(mut form) => {
                            if !fill_expense_form(&mut form, &state.members)? {
                                continue;
                            }
                            self.expenses.update(expense.id, &form).await.map(|_| ())
                        }
                        Err(e) => Err(e),
                    }
                }
                ExpenseAction::Delete => {
                    let Some(expense) = pick("Expense to delete", listed)? else {
                        continue;
                    };
                    if !confirm(&format!("Delete expense {}?", expense.description))? {
                        continue;
                    }
                    self.expenses.delete(expense.id).await
                }
            };
            if let Err(e) = result {
                show_failure(&e, self.expenses.snapshot().await.error);
            }
        }
    }

    async fn receipts_menu(&self) -> Result<(), DomainError> {
        let Some(group_id) = self.choose_group().await? else {
            return Ok(());
        };
        if let Err(e) = spin("Loading expenses", self.receipts.select_group(group_id)).await {
            show_failure(&e, self.receipts.snapshot().await.error);
            return Ok(());
        }
        loop {
            let state = self.receipts.snapshot().await;
            let listed: Vec<Choice<Expense>> = state
                .expenses
                .iter()
                .map(|e| Choice::new(expense_label(e), e.clone()))
                .collect();
            if listed.is_empty() {
                println!("No expenses to attach receipts to.");
                return Ok(());
            }
            let Some(expense) = pick("Expense", listed)? else {
                return Ok(());
            };

            let mut actions = Vec::new();
            if expense.has_receipt() {
                actions.push(Choice::new("View receipt", ReceiptAction::View));
                actions.push(Choice::new("Replace receipt", ReceiptAction::Upload));
                actions.push(Choice::new("Delete receipt", ReceiptAction::Delete));
            } else {
                actions.push(Choice::new("Upload receipt", ReceiptAction::Upload));
            }
            actions.push(Choice::new("Back", ReceiptAction::Back));

            let result = match pick("Receipt", actions)?.unwrap_or(ReceiptAction::Back) {
                ReceiptAction::Back => continue,
                ReceiptAction::View => {
                    if let Some(view) = self.receipts.view(&expense) {
                        let kind = if view.is_image { "Image" } else { "Download" };
                        println!(
                            "{}: {} ({})\n  {}",
                            kind,
                            view.filename.as_deref().unwrap_or("receipt"),
                            view.mime_type.as_deref().unwrap_or("unknown type"),
                            view.url.as_str().underlined()
                        );
                    }
                    Ok(())
                }
                ReceiptAction::Upload => {
                    let Some(path) = ask_text("Path to image or PDF:", "")? else {
                        continue;
                    };
                    match ReceiptFile::from_path(path.trim()).await {
                        Ok(file) => spin("Uploading", self.receipts.upload(expense.id, file))
                            .await
                            .map(|_| show_success("Receipt uploaded")),
                        Err(e) => Err(DomainError::Validation(format!(
                            "cannot read {}: {}",
                            path.trim(),
                            e
                        ))),
                    }
                }
                ReceiptAction::Delete => {
                    if !confirm(&format!("Delete the receipt of {}?", expense.description))? {
                        continue;
                    }
                    self.receipts.delete(expense.id).await
                }
            };
            if let Err(e) = result {
                show_failure(&e, self.receipts.snapshot().await.error);
            }
        }
    }

    async fn balances_menu(&self) -> Result<(), DomainError> {
        let mut loaded = spin("Loading balances", self.balances.load_groups()).await;
        loop {
            let state = self.balances.snapshot().await;
            if let Err(e) = &loaded {
                show_failure(e, state.error.clone());
            } else if state.groups.is_empty() {
                println!("No groups yet.");
                return Ok(());
            } else {
                let name = state
                    .groups
                    .iter()
                    .find(|g| Some(g.id) == state.selected_group_id)
                    .map(|g| g.name.clone())
                    .unwrap_or_default();
                println!("\nBalances for {}", name.as_str().bold());
                if state.balances.is_empty() {
                    println!("No balances yet.");
                }
                for b in &state.balances {
                    let line = format!(
                        "  {} {}",
                        b.user.display_name(),
                        BalanceStatus::from_balance(&b.balance)
                    );
                    match BalanceStatus::from_balance(&b.balance) {
                        BalanceStatus::Owed(_) => println!("{}", line.green()),
                        BalanceStatus::Owes(_) => println!("{}", line.red()),
                        BalanceStatus::Settled => println!("{}", line),
                    }
                }
                println!();
            }

            let choices: Vec<Choice<i64>> = state
                .groups
                .iter()
                .map(|g| Choice::new(format!("Show {}", g.name), g.id))
                .collect();
            let Some(group_id) = pick("Switch group (Esc to go back)", choices)? else {
                return Ok(());
            };
            loaded = spin("Loading balances", self.balances.select_group(group_id)).await;
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut current_theme = Theme::default();
        theme::apply(current_theme);
        loop {
            let menu = vec![
                Choice::new("Groups", MainAction::Groups),
                Choice::new("Expenses", MainAction::Expenses),
                Choice::new("Receipts", MainAction::Receipts),
                Choice::new("Balances", MainAction::Balances),
                Choice::new(current_theme.toggle_label(), MainAction::ToggleTheme),
                Choice::new("Quit", MainAction::Quit),
            ];
            match pick("Expense Splitter", menu)?.unwrap_or(MainAction::Quit) {
                MainAction::Groups => self.groups_menu().await?,
                MainAction::Expenses => self.expenses_menu().await?,
                MainAction::Receipts => self.receipts_menu().await?,
                MainAction::Balances => self.balances_menu().await?,
                MainAction::ToggleTheme => {
                    current_theme = current_theme.toggled();
                    theme::apply(current_theme);
                    debug!(theme = ?current_theme, "theme toggled");
                }
                MainAction::Quit => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRef;

    #[test]
    fn test_expense_label() {
        let expense = Expense {
            id: 1,
            group: None,
            description: "Dinner".into(),
            amount: "42.5".into(),
            paid_by_user: Some(UserRef {
                id: 2,
                name: Some("Ben".into()),
                email: None,
            }),
            expense_date: None,
            shares: Vec::new(),
            receipt_filename: Some("r.png".into()),
            receipt_mime_type: None,
        };
        let label = expense_label(&expense);
        assert!(label.starts_with("Dinner · $42.50 · paid by Ben"));
        assert!(label.ends_with("[receipt]"));
    }

    #[test]
    fn test_empty_role_edit_sends_no_role() {
        let form = MemberForm {
            user_id: "4".into(),
            role: "  ".into(),
        };
        let body = serde_json::to_value(form.to_patch_payload().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({}));
        assert!(ROLE_EDIT_PROMPT.contains("unchanged"));
    }

    #[test]
    fn test_cancelled_prompt_means_back() {
        let answer: Result<Option<u8>, InquireError> = Err(InquireError::OperationCanceled);
        assert!(matches!(skippable(answer), Ok(None)));
        let answer: Result<Option<u8>, InquireError> = Err(InquireError::NotTTY);
        assert!(matches!(skippable(answer), Err(DomainError::Ui(_))));
    }
}
