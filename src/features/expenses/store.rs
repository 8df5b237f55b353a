use crate::features::expenses::models::{CreateExpenseDto, Expense, UpdateExpenseDto};
use crate::shared::config::StorageConfig;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use chrono_tz::Asia::Tokyo;
use log::{error, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// ローカルストレージアダプター
///
/// 経費コレクション全体を単一のJSONファイルとして読み書きします。
/// APIサーバーが利用できない間の唯一のデータソースであり、
/// トランザクションや競合解決は提供しません（ベストエフォート）。
///
/// 読み取り・変更・書き込みの一連の操作はミューテックスで直列化されるため、
/// ローカルモードでの書き込みが重なっても更新が失われることはありません。
pub struct ExpenseStore {
    /// コレクションを保存するファイルパス
    path: PathBuf,
    /// 読み取り・変更・書き込みを直列化するロック
    lock: Mutex<()>,
    /// ローカルID採番用の直前値（ミリ秒時刻から導出、単調増加）
    last_id: AtomicI64,
}

impl ExpenseStore {
    /// ストレージ設定からストアを作成する
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_path(config.data_file.clone())
    }

    /// ファイルパスを指定してストアを作成する
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
        }
    }

    /// コレクション全体を読み込む
    ///
    /// # 戻り値
    /// 経費のリスト。ファイルが存在しない、または破損している場合は空のリスト
    /// （破損はログに記録され、呼び出し側には伝播しません）
    pub fn load(&self) -> Vec<Expense> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                error!("ローカルストレージの読み取りに失敗しました: {e}");
                return Vec::new();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(expenses) => expenses,
            Err(e) => {
                error!("ローカルストレージのデータが破損しています: {e}");
                Vec::new()
            }
        }
    }

    /// コレクション全体を書き込む（ベストエフォート）
    ///
    /// 書き込み失敗はログに記録されるだけで、呼び出し側には伝播しません。
    pub fn save(&self, expenses: &[Expense]) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("データディレクトリの作成に失敗しました: {e}");
                    return;
                }
            }
        }

        let json = match serde_json::to_string(expenses) {
            Ok(json) => json,
            Err(e) => {
                error!("経費データのシリアライズに失敗しました: {e}");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, json) {
            error!("ローカルストレージへの書き込みに失敗しました: {e}");
        }
    }

    /// 経費を作成して追加する
    ///
    /// # 引数
    /// * `dto` - 経費作成用DTO
    ///
    /// # 戻り値
    /// ローカルIDとタイムスタンプが採番された経費
    pub fn append(&self, dto: &CreateExpenseDto) -> Expense {
        let _guard = self.acquire_lock();

        let now = Utc::now().with_timezone(&Tokyo).to_rfc3339();
        let expense = Expense {
            id: self.next_local_id(),
            title: dto.title.clone(),
            category: dto.category.clone(),
            amount: dto.amount,
            date: dto.date.clone(),
            description: dto.description.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        let mut expenses = self.load();
        expenses.push(expense.clone());
        self.save(&expenses);

        expense
    }

    /// 経費を部分更新する
    ///
    /// # 引数
    /// * `id` - 経費ID
    /// * `dto` - 経費更新用DTO
    ///
    /// # 戻り値
    /// 更新された経費。IDが存在しない場合はNotFoundエラー
    pub fn update(&self, id: i64, dto: &UpdateExpenseDto) -> AppResult<Expense> {
        let _guard = self.acquire_lock();

        let mut expenses = self.load();
        let expense = expenses
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::not_found("経費"))?;

        // 指定されたフィールドのみ上書きする
        if let Some(title) = &dto.title {
            expense.title = title.clone();
        }
        if let Some(category) = &dto.category {
            expense.category = category.clone();
        }
        if let Some(amount) = dto.amount {
            expense.amount = amount;
        }
        if let Some(date) = &dto.date {
            expense.date = date.clone();
        }
        if dto.description.is_some() {
            expense.description = dto.description.clone();
        }
        expense.updated_at = Utc::now().with_timezone(&Tokyo).to_rfc3339();

        let updated = expense.clone();
        self.save(&expenses);

        Ok(updated)
    }

    /// 経費を削除する（冪等、IDが存在しなくてもエラーにならない）
    ///
    /// # 引数
    /// * `id` - 経費ID
    pub fn remove(&self, id: i64) {
        let _guard = self.acquire_lock();

        let mut expenses = self.load();
        expenses.retain(|e| e.id != id);
        self.save(&expenses);
    }

    /// 直列化ロックを取得する
    ///
    /// ロックが毒化していても復旧して続行します（ローカルモードは
    /// ベストエフォートであり、呼び出し側にエラーを返す経路がないため）。
    fn acquire_lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| {
            warn!("ローカルストレージのロックが毒化していたため復旧します");
            poisoned.into_inner()
        })
    }

    /// ローカルIDを採番する（単調増加）
    ///
    /// ミリ秒時刻を基準とし、同一ミリ秒内の連続採番でも直前値+1で
    /// 厳密に増加させます。呼び出し側が直列化ロックを保持している前提です。
    fn next_local_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let last = self.last_id.load(Ordering::SeqCst);
        let next = if now > last { now } else { last + 1 };
        self.last_id.store(next, Ordering::SeqCst);
        next
    }
}
