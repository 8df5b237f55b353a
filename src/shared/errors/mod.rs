use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// リソースが見つからない場合のエラー
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// APIサーバー側のエラー（HTTP 5xx）
    #[error("サーバーエラー: {0}")]
    Server(String),

    /// APIサーバーへ到達できない場合のエラー
    #[error("接続エラー: {0}")]
    Connectivity(String),

    /// バリデーション関連のエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 分類できないエラー（APIサーバーの詳細メッセージを保持）
    #[error("予期しないエラー: {0}")]
    Unexpected(String),

    /// ローカルストレージ関連のエラー
    #[error("ローカルストレージエラー: {0}")]
    Storage(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（外部サービス一時的エラーなど）
    Medium,
    /// 高重要度（設定エラーなど）
    High,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::NotFound(msg) => msg,
            AppError::Server(_) => {
                "サーバーエラーが発生しました。しばらくしてから再試行してください"
            }
            AppError::Connectivity(_) => "サーバーに接続できません。オフラインモードで動作します",
            AppError::Validation(msg) => msg,
            AppError::Unexpected(msg) => msg,
            AppError::Storage(_) => "ローカルデータの読み書きでエラーが発生しました",
            AppError::Configuration(_) => "設定エラーが発生しました",
            AppError::Io(_) => "ファイル操作でエラーが発生しました",
            AppError::Json(_) => "データ形式の解析でエラーが発生しました",
        }
    }

    /// エラーの詳細情報を取得（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::NotFound(_) => ErrorSeverity::Low,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::Server(_) => ErrorSeverity::Medium,
            AppError::Connectivity(_) => ErrorSeverity::Medium,
            AppError::Unexpected(_) => ErrorSeverity::Medium,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Io(_) => ErrorSeverity::Medium,
            AppError::Json(_) => ErrorSeverity::Medium,
            AppError::Configuration(_) => ErrorSeverity::High,
        }
    }

    /// リソース未発見エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `resource` - 見つからなかったリソース名
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        AppError::NotFound(format!("{}が見つかりません", resource.into()))
    }

    /// サーバーエラーを作成するヘルパー関数
    pub fn server<S: Into<String>>(message: S) -> Self {
        AppError::Server(message.into())
    }

    /// 接続エラーを作成するヘルパー関数
    pub fn connectivity<S: Into<String>>(message: S) -> Self {
        AppError::Connectivity(message.into())
    }

    /// バリデーションエラーを作成するヘルパー関数
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// 予期しないエラーを作成するヘルパー関数
    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        AppError::Unexpected(message.into())
    }

    /// ローカルストレージエラーを作成するヘルパー関数
    pub fn storage<S: Into<String>>(message: S) -> Self {
        AppError::Storage(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }
}

/// AppErrorからStringへの変換（UI層へのエラー伝達のため）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message().to_string()
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
