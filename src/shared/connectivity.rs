use log::warn;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;

/// APIサーバーの到達可能性を管理する状態オブジェクト
///
/// プロセス起動時は「到達可能」として扱い、最初にリモート呼び出しの失敗を
/// 観測した時点でオフラインモードへ降格します。降格はプロセスの寿命の間
/// 恒久的であり、再昇格はプロセス再起動によってのみ行われます
/// （チャット操作の毎回プローブはこの状態を変更しません）。
///
/// 初回ヘルスチェックは`OnceCell`でメモ化されるため、同時に複数の操作が
/// 開始されても実際のプローブは一度しか実行されません。
#[derive(Debug)]
pub struct ConnectivityState {
    /// 到達可能フラグ（falseへの遷移は一方向）
    available: AtomicBool,
    /// 初回ヘルスチェックの結果（一度だけ実行される）
    initial_probe: OnceCell<bool>,
}

impl ConnectivityState {
    /// 新しい状態オブジェクトを作成する（到達可能として初期化）
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            initial_probe: OnceCell::new(),
        }
    }

    /// オフラインモード固定の状態オブジェクトを作成する
    ///
    /// ヘルスチェックを実行せずにローカルストレージのみで動作させたい
    /// 場合（テストや明示的なオフライン起動）に使用します。
    pub fn offline() -> Self {
        Self {
            available: AtomicBool::new(false),
            initial_probe: OnceCell::new_with(Some(false)),
        }
    }

    /// 初回ヘルスチェックの実行を保証し、現在の到達可能性を返す
    ///
    /// # 引数
    /// * `probe` - ヘルスチェックを実行する非同期クロージャ
    ///
    /// # 戻り値
    /// APIサーバーが到達可能として扱われる場合はtrue
    ///
    /// プローブは最初の呼び出しでのみ実行され、実行中に到着した呼び出しは
    /// 同じ結果を共有します。プローブ失敗時はオフラインモードへ降格します。
    pub async fn ensure_probed<F, Fut>(&self, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let reachable = *self.initial_probe.get_or_init(probe).await;

        if !reachable && self.available.load(Ordering::SeqCst) {
            warn!("初回ヘルスチェックに失敗したため、オフラインモードに切り替えます");
            self.available.store(false, Ordering::SeqCst);
        }

        self.is_available()
    }

    /// APIサーバーが到達可能として扱われているかを返す
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// オフラインモードへ降格する（恒久的、プロセス再起動まで）
    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::SeqCst);
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new()
    }
}
