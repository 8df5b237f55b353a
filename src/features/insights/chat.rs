//! ルールベースのチャット応答
//!
//! APIサーバーが利用できない場合に、メッセージのキーワードから
//! 定型のアドバイスを返します。AIは使用しません。

use crate::features::insights::models::ChatResponse;
use chrono::Utc;
use chrono_tz::Asia::Tokyo;

/// フォールバック応答を生成する
///
/// # 引数
/// * `message` - ユーザーのメッセージ
///
/// # 戻り値
/// キーワードに応じた定型のチャット応答
pub fn fallback_chat_response(message: &str) -> ChatResponse {
    let lowered = message.to_lowercase();

    let (response, response_type) = if contains_any(&lowered, &["投資", "invest", "sip"]) {
        (
            "投資のはじめ方:\n\
             ・少額の積立投資から始めましょう\n\
             ・分散されたインデックスファンドが定番です\n\
             ・余裕資金の範囲で長期保有を前提にしましょう",
            "investment_advice",
        )
    } else if contains_any(&lowered, &["支出", "経費", "spend", "expense"]) {
        (
            "支出の分析について:\n\
             経費を記録すると、月次の支出分析・カテゴリ別の内訳・\
             あなたに合わせた節約のヒントが利用できます。\n\
             まずは毎日の記録から始めましょう。",
            "expense_advice",
        )
    } else if contains_any(&lowered, &["貯蓄", "貯金", "節約", "save"]) {
        (
            "貯蓄のコツ:\n\
             ・50/30/20ルール（必需品50%・娯楽30%・貯蓄20%）を意識しましょう\n\
             ・先取り貯蓄を自動化しましょう\n\
             ・生活費6ヶ月分の予備資金を目標にしましょう",
            "savings_advice",
        )
    } else if contains_any(&lowered, &["予算", "budget"]) {
        (
            "予算の立て方:\n\
             まず3ヶ月ほど支出を記録して、収入に対する\
             必需品・娯楽・貯蓄の割合を把握しましょう。\n\
             そのうえでカテゴリごとの上限を決めるのが確実です。",
            "budget_advice",
        )
    } else {
        (
            "こんにちは！家計簿アシスタントです。\n\
             支出の分析、予算の立て方、貯蓄や投資のはじめ方について\
             お手伝いできます。気軽に質問してください。",
            "general_help",
        )
    };

    ChatResponse {
        response: response.to_string(),
        timestamp: Utc::now().with_timezone(&Tokyo).to_rfc3339(),
        context_available: false,
        specialist_mode: Some("fallback".to_string()),
        response_type: Some(response_type.to_string()),
    }
}

/// いずれかのキーワードを含むかを判定する
fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| message.contains(keyword))
}
