//! ローカル分析エンジン
//!
//! APIサーバーが利用できない場合に、ローカルストレージの経費データから
//! インサイトと節約提案を決定的に計算します。入力が同じであれば常に
//! 同じ結果を返す純粋関数のみで構成されます。

use crate::features::expenses::models::Expense;
use crate::features::insights::models::{
    CategoryBreakdown, CategoryStat, InsightData, MonthlyStat, MonthlyTrends, SavingsSuggestions,
};
use chrono::NaiveDate;

/// 外れ値と判定する閾値（平均支出額に対する倍率）
const OUTLIER_THRESHOLD: f64 = 2.0;

/// 節約見込み額の推定率（支出合計に対する割合）
const SAVINGS_RATE: f64 = 0.1;

/// 経費データからインサイトを計算する
///
/// # 引数
/// * `expenses` - 対象の経費データ
///
/// # 戻り値
/// 支出合計、上位カテゴリ、傾向、外れ値、アドバイスを含むインサイト
pub fn generate_insights(expenses: &[Expense]) -> InsightData {
    if expenses.is_empty() {
        return InsightData {
            total_spent: 0.0,
            top_categories: Vec::new(),
            patterns: vec!["まだ支出データがありません".to_string()],
            outliers: Vec::new(),
            suggestions: vec!["経費を記録して、支出の傾向を把握しましょう".to_string()],
        };
    }

    let total_spent: f64 = expenses.iter().map(|e| e.amount).sum();
    let average = total_spent / expenses.len() as f64;
    let totals = category_totals(expenses);

    let top_categories = ranked_by_amount(&totals)
        .into_iter()
        .take(3)
        .map(|(category, amount)| format!("{category}: ¥{amount:.2}"))
        .collect();

    // 最頻出カテゴリは合計額が最大のもの（同額の場合は先に出現した方）
    let most_frequent = totals
        .iter()
        .fold(None::<&(String, f64)>, |best, entry| match best {
            Some(current) if current.1 >= entry.1 => Some(current),
            _ => Some(entry),
        })
        .map(|(category, _)| category.clone())
        .unwrap_or_default();

    let patterns = vec![
        format!("平均支出: ¥{average:.2}"),
        format!("最も支出が多いカテゴリ: {most_frequent}"),
        format!("取引件数: {}件", expenses.len()),
    ];

    let outliers = expenses
        .iter()
        .filter(|e| e.amount > average * OUTLIER_THRESHOLD)
        .map(|e| format!("{}: ¥{:.2}", e.title, e.amount))
        .collect();

    let suggestions = vec![
        "支出を定期的に記録して傾向を把握しましょう".to_string(),
        "カテゴリごとに予算を設定してみましょう".to_string(),
        "高額な取引を月次で見直しましょう".to_string(),
    ];

    InsightData {
        total_spent,
        top_categories,
        patterns,
        outliers,
        suggestions,
    }
}

/// 経費データから節約提案を計算する
///
/// # 引数
/// * `expenses` - 対象の経費データ
///
/// # 戻り値
/// 提案（最大5件）、節約見込み額（支出合計の10%）、優先カテゴリ（上位2件）
pub fn generate_savings_suggestions(expenses: &[Expense]) -> SavingsSuggestions {
    let total_spent: f64 = expenses.iter().map(|e| e.amount).sum();
    let totals = category_totals(expenses);

    let priority: Vec<(String, f64)> = ranked_by_amount(&totals).into_iter().take(2).collect();

    let mut suggestions = vec![
        "支出を継続的に記録して傾向を把握しましょう".to_string(),
        "カテゴリごとに予算を設定してみましょう".to_string(),
        "支出が多いカテゴリを見直して節約の余地を探しましょう".to_string(),
    ];

    for (category, amount) in &priority {
        suggestions.push(format!(
            "{category}の支出 ¥{amount:.2} を見直して代替手段を検討しましょう"
        ));
    }
    suggestions.truncate(5);

    SavingsSuggestions {
        suggestions,
        potential_savings: total_spent * SAVINGS_RATE,
        priority_areas: priority.into_iter().map(|(category, _)| category).collect(),
    }
}

/// 経費データからカテゴリ別内訳を計算する
///
/// # 引数
/// * `expenses` - 対象の経費データ
///
/// # 戻り値
/// カテゴリごとの金額・件数・構成比（支出額の降順）と支出合計
pub fn generate_category_breakdown(expenses: &[Expense]) -> CategoryBreakdown {
    let total_amount: f64 = expenses.iter().map(|e| e.amount).sum();

    let mut categories: Vec<CategoryStat> = Vec::new();
    for expense in expenses {
        match categories.iter_mut().find(|s| s.category == expense.category) {
            Some(stat) => {
                stat.amount += expense.amount;
                stat.count += 1;
            }
            None => categories.push(CategoryStat {
                category: expense.category.clone(),
                amount: expense.amount,
                count: 1,
                percentage: 0.0,
            }),
        }
    }

    for stat in &mut categories {
        stat.percentage = if total_amount > 0.0 {
            stat.amount / total_amount * 100.0
        } else {
            0.0
        };
    }
    categories
        .sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal));

    CategoryBreakdown {
        categories,
        total_amount,
    }
}

/// 経費データから月次推移を計算する
///
/// # 引数
/// * `expenses` - 対象の経費データ
///
/// # 戻り値
/// 月ごとの金額・件数・平均（月の昇順）。日付を解析できない経費は集計対象外
pub fn generate_monthly_trends(expenses: &[Expense]) -> MonthlyTrends {
    // ソートキーはYYYY-MM、表示は "Jan 2024" 形式
    let mut monthly: Vec<(String, MonthlyStat)> = Vec::new();

    for expense in expenses {
        let date = match NaiveDate::parse_from_str(&expense.date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => continue,
        };

        let key = date.format("%Y-%m").to_string();
        match monthly.iter_mut().find(|(k, _)| *k == key) {
            Some((_, stat)) => {
                stat.amount += expense.amount;
                stat.count += 1;
            }
            None => monthly.push((
                key,
                MonthlyStat {
                    month: date.format("%b %Y").to_string(),
                    amount: expense.amount,
                    count: 1,
                    average: 0.0,
                },
            )),
        }
    }

    monthly.sort_by(|a, b| a.0.cmp(&b.0));

    let months: Vec<MonthlyStat> = monthly
        .into_iter()
        .map(|(_, mut stat)| {
            stat.average = stat.amount / stat.count as f64;
            stat
        })
        .collect();
    let total_months = months.len();

    MonthlyTrends {
        months,
        total_months,
    }
}

/// カテゴリごとの支出合計を計算する（初出順を保持）
fn category_totals(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();

    for expense in expenses {
        match totals.iter_mut().find(|(category, _)| *category == expense.category) {
            Some((_, amount)) => *amount += expense.amount,
            None => totals.push((expense.category.clone(), expense.amount)),
        }
    }

    totals
}

/// カテゴリ合計を支出額の降順に並べ替える（同額の場合は初出順を維持）
fn ranked_by_amount(totals: &[(String, f64)]) -> Vec<(String, f64)> {
    let mut ranked = totals.to_vec();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}
