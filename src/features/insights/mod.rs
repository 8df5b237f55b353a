//! 支出インサイト機能
//!
//! 支出の分析・節約提案・チャット応答を提供します。APIサーバーが利用
//! できない場合はローカル分析エンジンとルールベースの応答で代替します。

pub mod analytics;
pub mod chat;
pub mod models;

pub use models::{
    CategoryBreakdown, CategoryStat, ChatResponse, InsightData, MonthlyStat, MonthlyTrends,
    SavingsSuggestions,
};
