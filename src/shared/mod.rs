//! 共有モジュール
//!
//! 機能モジュール間で共有される基盤を提供します：
//! - 統一エラー型（errors）
//! - 環境・API・ストレージ設定（config）
//! - APIサーバー到達可能性の状態管理（connectivity）
pub mod config;
pub mod connectivity;
pub mod errors;
