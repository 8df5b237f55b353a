use crate::features::expenses::models::{
    CreateExpenseDto, Expense, ExpenseFilters, UpdateExpenseDto,
};
use crate::features::insights::models::{
    CategoryBreakdown, ChatResponse, InsightData, MonthlyTrends, SavingsSuggestions,
};
use crate::shared::config::ApiConfig;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// APIサーバーからのエラーレスポンス（FastAPI形式）
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<serde_json::Value>,
}

/// 経費APIクライアント
///
/// APIサーバーとの通信を行い、HTTPエラーを統一エラー型へ正規化します。
/// リトライは行いません。失敗は即座に呼び出し側（ファサード）へ返し、
/// オフラインモードへのフォールバック判断を委ねます。
#[derive(Debug)]
pub struct ExpenseApiClient {
    client: Client,
    config: ApiConfig,
}

impl ExpenseApiClient {
    /// 設定を指定してAPIクライアントを作成する
    pub fn new(config: ApiConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    /// 環境変数の設定でAPIクライアントを作成する
    pub fn from_env() -> AppResult<Self> {
        Self::new(ApiConfig::from_env())
    }

    /// APIサーバーのヘルスチェック
    ///
    /// # 戻り値
    /// 到達可能な場合はtrue（タイムアウト・接続拒否・非2xxはすべてfalse）
    ///
    /// オフライン判定を素早く行うため、短いタイムアウトを使用します。
    pub async fn health_check(&self) -> bool {
        debug!("APIサーバーヘルスチェック開始");

        let url = format!("{}/health", self.config.base_url);
        let request = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.health_timeout_seconds));

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                debug!("APIサーバーヘルスチェック成功");
                true
            }
            Ok(response) => {
                warn!("APIサーバーヘルスチェック失敗: HTTP {}", response.status());
                false
            }
            Err(e) => {
                warn!("APIサーバーヘルスチェックエラー: {e}");
                false
            }
        }
    }

    /// 経費一覧を取得する
    ///
    /// # 引数
    /// * `filters` - フィルター条件（クエリパラメータとして送信される）
    pub async fn list_expenses(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        let endpoint = build_list_endpoint(filters);
        info!("GETリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        self.send_json(self.client.get(&url)).await
    }

    /// 経費を作成する
    pub async fn create_expense(&self, dto: &CreateExpenseDto) -> AppResult<Expense> {
        info!("POSTリクエスト送信: endpoint=/expenses");

        let url = format!("{}/expenses", self.config.base_url);
        self.send_json(self.client.post(&url).json(dto)).await
    }

    /// 経費を部分更新する
    pub async fn update_expense(&self, id: i64, dto: &UpdateExpenseDto) -> AppResult<Expense> {
        info!("PUTリクエスト送信: endpoint=/expenses/{id}");

        let url = format!("{}/expenses/{id}", self.config.base_url);
        self.send_json(self.client.put(&url).json(dto)).await
    }

    /// 経費を削除する
    pub async fn delete_expense(&self, id: i64) -> AppResult<()> {
        info!("DELETEリクエスト送信: endpoint=/expenses/{id}");

        let url = format!("{}/expenses/{id}", self.config.base_url);
        match self.client.delete(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("経費削除成功: expense_id={id}");
                Ok(())
            }
            Ok(response) => Err(self.normalize_error_response(response).await),
            Err(e) => Err(AppError::connectivity(format!(
                "APIサーバーへの接続に失敗しました: {e}"
            ))),
        }
    }

    /// AIインサイトを取得する
    pub async fn fetch_insights(&self) -> AppResult<InsightData> {
        info!("POSTリクエスト送信: endpoint=/ai/insights");

        let url = format!("{}/ai/insights", self.config.base_url);
        self.send_json(self.client.post(&url)).await
    }

    /// 節約提案を取得する
    pub async fn fetch_savings_suggestions(&self) -> AppResult<SavingsSuggestions> {
        info!("POSTリクエスト送信: endpoint=/ai/savings-suggestions");

        let url = format!("{}/ai/savings-suggestions", self.config.base_url);
        self.send_json(self.client.post(&url)).await
    }

    /// カテゴリ別内訳を取得する
    pub async fn fetch_category_breakdown(&self) -> AppResult<CategoryBreakdown> {
        info!("GETリクエスト送信: endpoint=/expenses/analytics/category-breakdown");

        let url = format!("{}/expenses/analytics/category-breakdown", self.config.base_url);
        self.send_json(self.client.get(&url)).await
    }

    /// 月次推移を取得する
    pub async fn fetch_monthly_trends(&self) -> AppResult<MonthlyTrends> {
        info!("GETリクエスト送信: endpoint=/expenses/analytics/monthly-trends");

        let url = format!("{}/expenses/analytics/monthly-trends", self.config.base_url);
        self.send_json(self.client.get(&url)).await
    }

    /// チャットメッセージを送信する
    ///
    /// AI応答の生成に時間がかかるため、通常より長いタイムアウトを使用します。
    /// メッセージはAPIサーバーの仕様に合わせてクエリパラメータとして送信します。
    pub async fn send_chat_message(&self, message: &str) -> AppResult<ChatResponse> {
        info!("POSTリクエスト送信: endpoint=/ai/chat");

        let url = format!(
            "{}/ai/chat?message={}",
            self.config.base_url,
            urlencoding::encode(message)
        );
        let request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.chat_timeout_seconds));

        self.send_json(request).await
    }

    /// リクエストを送信してJSONレスポンスを解析する
    async fn send_json<T>(&self, request: reqwest::RequestBuilder) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        match request.send().await {
            Ok(response) => {
                if response.status().is_success() {
                    response
                        .json()
                        .await
                        .map_err(|e| AppError::unexpected(format!("レスポンス解析エラー: {e}")))
                } else {
                    Err(self.normalize_error_response(response).await)
                }
            }
            Err(e) => Err(AppError::connectivity(format!(
                "APIサーバーへの接続に失敗しました: {e}"
            ))),
        }
    }

    /// エラーレスポンスを統一エラー型へ正規化する
    ///
    /// - HTTP 404 -> NotFound
    /// - HTTP 5xx -> Server
    /// - その他の非2xx -> Unexpected（サーバーのdetailフィールドがあれば保持）
    async fn normalize_error_response(&self, response: Response) -> AppError {
        let status = response.status();
        let status_code = status.as_u16();

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        warn!("APIサーバーからエラーレスポンス: status={status_code}, body={body}");

        if status_code == 404 {
            return AppError::NotFound("指定されたリソースが見つかりません".to_string());
        }

        if status.is_server_error() {
            return AppError::server(format!(
                "HTTP {status_code}: しばらくしてから再試行してください"
            ));
        }

        // FastAPI形式のエラーボディからdetailを抽出する
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);

        AppError::unexpected(format!("HTTP {status_code}: {detail}"))
    }
}

/// 経費一覧エンドポイントのクエリ文字列を構築する
fn build_list_endpoint(filters: &ExpenseFilters) -> String {
    let mut endpoint = "/expenses".to_string();
    let mut params = Vec::new();

    if let Some(category) = &filters.category {
        params.push(format!("category={}", urlencoding::encode(category)));
    }
    if let Some(search) = &filters.search {
        params.push(format!("search={}", urlencoding::encode(search)));
    }
    if let Some(sort_by) = &filters.sort_by {
        params.push(format!("sort_by={}", sort_by.as_str()));
    }
    if let Some(sort_order) = &filters.sort_order {
        params.push(format!("sort_order={}", sort_order.as_str()));
    }
    if let Some(skip) = filters.skip {
        params.push(format!("skip={skip}"));
    }
    if let Some(limit) = filters.limit {
        params.push(format!("limit={limit}"));
    }

    if !params.is_empty() {
        endpoint.push('?');
        endpoint.push_str(&params.join("&"));
    }

    endpoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expenses::models::{SortBy, SortOrder};

    #[test]
    fn test_build_list_endpoint_without_filters() {
        // フィルターなしの場合はクエリ文字列を付けない
        let filters = ExpenseFilters::default();
        assert_eq!(build_list_endpoint(&filters), "/expenses");
    }

    #[test]
    fn test_build_list_endpoint_with_all_filters() {
        let filters = ExpenseFilters {
            category: Some("食費".to_string()),
            search: Some("スーパー".to_string()),
            sort_by: Some(SortBy::Amount),
            sort_order: Some(SortOrder::Desc),
            skip: Some(10),
            limit: Some(50),
        };

        let endpoint = build_list_endpoint(&filters);
        assert!(endpoint.starts_with("/expenses?"));
        assert!(endpoint.contains("sort_by=amount"));
        assert!(endpoint.contains("sort_order=desc"));
        assert!(endpoint.contains("skip=10"));
        assert!(endpoint.contains("limit=50"));
        // 日本語はURLエンコードされる
        assert!(endpoint.contains(&format!("category={}", urlencoding::encode("食費"))));
    }

    #[test]
    fn test_build_list_endpoint_encodes_search() {
        // 検索語に含まれる記号がエンコードされることを確認
        let filters = ExpenseFilters {
            search: Some("a&b=c".to_string()),
            ..ExpenseFilters::default()
        };

        let endpoint = build_list_endpoint(&filters);
        assert_eq!(endpoint, "/expenses?search=a%26b%3Dc");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        // 不正な設定ではクライアントを作成できない
        let config = ApiConfig {
            base_url: String::new(),
            ..ApiConfig::default()
        };
        let result = ExpenseApiClient::new(config);
        assert!(matches!(result.unwrap_err(), AppError::Configuration(_)));
    }
}
