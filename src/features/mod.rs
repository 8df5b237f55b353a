//! 機能モジュール
//!
//! 機能ごとにモジュールを分割して管理します。

pub mod expenses;
pub mod insights;
