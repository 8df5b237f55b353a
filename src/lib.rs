//! 家計簿アプリのオフラインファースト・データアクセス層
//!
//! APIサーバーが利用できる場合はリモートへ委譲し、利用できない場合は
//! ローカルストレージとローカル分析エンジンへ透過的にフォールバック
//! します。利用側は接続状態を意識する必要がありません。
//!
//! # 使用例
//!
//! ```no_run
//! use orano_kakeibo::{ExpenseFilters, ExpenseService};
//!
//! # async fn example() -> Result<(), orano_kakeibo::AppError> {
//! let service = ExpenseService::from_env()?;
//! let expenses = service.get_expenses(&ExpenseFilters::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod features;
pub mod shared;

pub use features::expenses::{
    CreateExpenseDto, Expense, ExpenseFilters, ExpenseService, SortBy, SortOrder, UpdateExpenseDto,
};
pub use features::insights::{
    CategoryBreakdown, CategoryStat, ChatResponse, InsightData, MonthlyStat, MonthlyTrends,
    SavingsSuggestions,
};
pub use shared::connectivity::ConnectivityState;
pub use shared::errors::{AppError, AppResult, ErrorSeverity};

/// 環境変数の読み込みとログシステムの初期化を行う
///
/// アプリケーションの起動時に一度だけ呼び出してください。
pub fn init() {
    shared::config::environment::load_environment_variables();
    shared::config::environment::initialize_logging_system();
}
