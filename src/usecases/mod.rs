//! Application use cases. One headless controller per page, driven via the ExpenseApi port.

pub mod balances_page;
pub mod expenses_page;
pub mod group_detail_page;
pub mod groups_page;
pub mod receipts_page;
pub mod request_scope;

pub use balances_page::{BalancesPage, BalancesState};
pub use expenses_page::{ExpensesPage, ExpensesState};
pub use group_detail_page::{GroupDetailPage, GroupDetailState};
pub use groups_page::{GroupsPage, GroupsState};
pub use receipts_page::{ReceiptView, ReceiptsPage, ReceiptsState};
pub use request_scope::{Outcome, RequestScope};
