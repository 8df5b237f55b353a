//! 経費管理機能
//!
//! 経費のCRUD操作を提供します。APIサーバーが到達可能な場合はリモートへ
//! 委譲し、到達不能な場合はローカルストレージへフォールバックします。

pub mod api_client;
pub mod models;
pub mod service;
pub mod store;

pub use api_client::ExpenseApiClient;
pub use models::{CreateExpenseDto, Expense, ExpenseFilters, SortBy, SortOrder, UpdateExpenseDto};
pub use service::ExpenseService;
pub use store::ExpenseStore;
