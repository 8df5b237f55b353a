use serde::{Deserialize, Serialize};

/// 支出インサイト（集計から導出される一時データ、永続化されない）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InsightData {
    /// 支出合計
    pub total_spent: f64,
    /// 支出額上位のカテゴリ（整形済み文字列、最大3件）
    pub top_categories: Vec<String>,
    /// 支出傾向の観察（自由記述）
    pub patterns: Vec<String>,
    /// 外れ値の経費（平均の2倍を超えるもの、整形済み文字列）
    pub outliers: Vec<String>,
    /// 一般的なアドバイス
    pub suggestions: Vec<String>,
}

/// 節約提案
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavingsSuggestions {
    /// 提案（最大5件）
    pub suggestions: Vec<String>,
    /// 節約見込み額（支出合計の10%として推定）
    pub potential_savings: f64,
    /// 優先的に見直すべきカテゴリ（支出額上位2件）
    pub priority_areas: Vec<String>,
}

/// カテゴリ別の集計値
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryStat {
    pub category: String,
    pub amount: f64,
    pub count: usize,
    /// 支出合計に対する割合（パーセント）
    pub percentage: f64,
}

/// カテゴリ別内訳（支出額の降順）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub categories: Vec<CategoryStat>,
    pub total_amount: f64,
}

/// 月別の集計値
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyStat {
    /// 表示用の月（例: "Jan 2024"）
    pub month: String,
    pub amount: f64,
    pub count: usize,
    /// 1件あたりの平均支出額
    pub average: f64,
}

/// 月次推移（月の昇順）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyTrends {
    pub months: Vec<MonthlyStat>,
    pub total_months: usize,
}

/// チャット応答
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub context_available: bool,
    pub specialist_mode: Option<String>,
    pub response_type: Option<String>,
}
