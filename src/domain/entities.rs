//! Domain entities. Pure data structures exchanged with the backend.
//!
//! The backend owns every record; these are transient copies held in page state.
//! Amounts and balances stay decimal strings end to end; timestamps stay as sent
//! and are only parsed for display.

use serde::{Deserialize, Serialize};

/// Reference to a user as embedded in groups, members, expenses and balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRef {
    /// Name for display. Falls back to `User #<id>` when the backend sent none.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("User #{}", self.id),
        }
    }
}

/// Minimal group reference embedded in members and expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// A collection of users sharing expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
}

/// A user's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    #[serde(default)]
    pub group: Option<GroupRef>,
    pub user: UserRef,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub joined_at: Option<String>,
}

/// Portion of an expense assigned to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub user: UserRef,
    /// Decimal string, e.g. "12.50".
    pub amount: String,
}

/// A monetary transaction attributed to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    #[serde(default)]
    pub group: Option<GroupRef>,
    pub description: String,
    /// Decimal string, e.g. "42.50".
    pub amount: String,
    #[serde(default)]
    pub paid_by_user: Option<UserRef>,
    #[serde(default)]
    pub expense_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub shares: Vec<Share>,
    #[serde(default)]
    pub receipt_filename: Option<String>,
    #[serde(default)]
    pub receipt_mime_type: Option<String>,
}

impl Expense {
    pub fn has_receipt(&self) -> bool {
        self.receipt_filename
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }
}

/// Net amount a user owes or is owed within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub user: UserRef,
    /// Decimal string. Positive = owed to the user, negative = the user owes.
    pub balance: String,
}

/// Body of `GET /groups/{id}/balances`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BalancesResponse {
    #[serde(default, deserialize_with = "lenient_list")]
    pub balances: Vec<Balance>,
}

/// Accepts a list, or anything else as an empty list.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(serde::de::Error::custom)
        }
        _ => Ok(Vec::new()),
    }
}

/// A receipt file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ReceiptFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime(&file_name).map(str::to_string);
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read a receipt from disk. The file name is the last path component.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "receipt".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

/// MIME type for the receipt formats the backend accepts (images and PDF).
fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Whether a receipt renders as an image or is offered as a download.
pub fn is_likely_image(filename: Option<&str>, mime: Option<&str>) -> bool {
    if mime.is_some_and(|m| m.to_ascii_lowercase().starts_with("image/")) {
        return true;
    }
    let name = filename.unwrap_or_default().to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".webp"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// UI color scheme. Application-root state, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Label for the menu entry that switches away from this theme.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Theme::Light => "Switch to dark mode",
            Theme::Dark => "Switch to light mode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_decodes_with_optional_fields_missing() {
        let raw = r#"{"id": 3, "description": "Taxi", "amount": "18.00", "shares": null}"#;
        let expense: Expense = serde_json::from_str(raw).unwrap();
        assert_eq!(expense.id, 3);
        assert!(expense.shares.is_empty());
        assert!(!expense.has_receipt());
        assert!(expense.paid_by_user.is_none());
    }

    #[test]
    fn test_balances_response_tolerates_non_array() {
        let resp: BalancesResponse = serde_json::from_str(r#"{"balances": null}"#).unwrap();
        assert!(resp.balances.is_empty());
        let resp: BalancesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.balances.is_empty());
        let resp: BalancesResponse = serde_json::from_str(
            r#"{"balances": [{"user": {"id": 1, "name": "Ana"}, "balance": "-4.20"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.balances.len(), 1);
        assert_eq!(resp.balances[0].balance, "-4.20");
    }

    #[test]
    fn test_display_name_fallback() {
        let anon = UserRef {
            id: 9,
            name: None,
            email: None,
        };
        assert_eq!(anon.display_name(), "User #9");
        let named = UserRef {
            id: 9,
            name: Some("Ana".into()),
            email: None,
        };
        assert_eq!(named.display_name(), "Ana");
    }

    #[test]
    fn test_is_likely_image() {
        assert!(is_likely_image(Some("scan.PDF"), Some("image/png")));
        assert!(is_likely_image(Some("photo.JPEG"), None));
        assert!(!is_likely_image(Some("bill.pdf"), Some("application/pdf")));
        assert!(!is_likely_image(None, None));
    }

    #[test]
    fn test_receipt_file_guesses_mime() {
        let file = ReceiptFile::new("dinner.jpg", vec![1, 2, 3]);
        assert_eq!(file.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(ReceiptFile::new("notes.txt", vec![]).mime_type, None);
    }

    #[test]
    fn test_theme_toggle() {
        let theme = Theme::default();
        assert_eq!(theme, Theme::Light);
        assert_eq!(theme.toggled(), Theme::Dark);
        assert_eq!(theme.toggled().toggled(), Theme::Light);
    }
}
