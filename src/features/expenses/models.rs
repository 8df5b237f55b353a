use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 経費データモデル
///
/// `id`は作成時に採番されます（オンライン時はAPIサーバー、オフライン時は
/// ローカルの単調増加ジェネレーター）。リモートIDとローカルIDの互換性は
/// 保証されません。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub amount: f64,
    /// 日付（YYYY-MM-DD形式）
    pub date: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 経費作成用DTO
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateExpenseDto {
    pub title: String,
    pub category: String,
    pub amount: f64,
    pub date: String,
    pub description: Option<String>,
}

impl CreateExpenseDto {
    /// 経費作成DTOを検証する
    ///
    /// # 戻り値
    /// 有効な場合はOk(())、無効な場合はバリデーションエラー
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("件名を入力してください"));
        }
        if self.amount < 0.0 {
            return Err(AppError::validation("金額は0以上である必要があります"));
        }
        if self.date.trim().is_empty() {
            return Err(AppError::validation("日付を入力してください"));
        }
        Ok(())
    }
}

/// 経費更新用DTO（部分更新）
///
/// 未指定のフィールドはリクエストボディに含めません（nullによる
/// 明示的なクリアと区別するため）。
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateExpenseDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateExpenseDto {
    /// 経費更新DTOを検証する
    pub fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(AppError::validation("件名を入力してください"));
            }
        }
        if let Some(amount) = self.amount {
            if amount < 0.0 {
                return Err(AppError::validation("金額は0以上である必要があります"));
            }
        }
        Ok(())
    }
}

/// ソート対象のフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Date,
    Amount,
    Title,
    Category,
}

impl SortBy {
    /// クエリパラメータとして使用する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Amount => "amount",
            SortBy::Title => "title",
            SortBy::Category => "category",
        }
    }
}

/// ソート順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// クエリパラメータとして使用する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// 経費一覧のフィルター条件（一時的なクエリ指定、永続化されない）
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilters {
    /// カテゴリの完全一致フィルター
    pub category: Option<String>,
    /// 件名の部分一致検索（大文字小文字を区別しない）
    pub search: Option<String>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    /// ページネーション（リモートAPIにのみ転送される）
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}
