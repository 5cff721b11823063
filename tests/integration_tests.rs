use chrono::NaiveDate;
use personal_finance_analytics::*;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Six months of a salaried household with one big purchase and a refund.
fn household_csv() -> String {
    let mut csv = String::from("Date,Description,Amount,Balance\n");
    let months = [
        (2023, 10),
        (2023, 11),
        (2023, 12),
        (2024, 1),
        (2024, 2),
        (2024, 3),
    ];

    for (i, (year, month)) in months.iter().enumerate() {
        let i = i as f64;
        csv.push_str(&format!("{}-{:02}-01,Monthly Salary Credit,\"75,000\",0\n", year, month));
        csv.push_str(&format!("{}-{:02}-04,Swiggy order #{},{},0\n", year, month, 100 + i as u32, 900.0 + 50.0 * i));
        csv.push_str(&format!("{}-{:02}-09,Uber ride,{},0\n", year, month, 400.0 + 20.0 * i));
        csv.push_str(&format!("{}-{:02}-12,Electricity bill,{},0\n", year, month, 2_000.0 + 100.0 * i));
        csv.push_str(&format!("{}-{:02}-18,Netflix subscription,649,0\n", year, month));
        csv.push_str(&format!("{}-{:02}-25,Zomato dinner,{},0\n", year, month, 700.0 + 30.0 * i));
    }

    csv.push_str("2024-02-14,Amazon laptop,\"₹ 85,000\",0\n");
    csv.push_str("2024-02-20,Refund for returned item,-500,0\n");
    // duplicate row and a broken row are dropped by the normalizer
    csv.push_str("2024-03-25,Zomato dinner,850,0\n");
    csv.push_str("not-a-date,Zomato dinner,850,0\n");
    csv
}

fn analyze_household() -> (Vec<Transaction>, AnalysisReport) {
    let transactions = read_csv(household_csv().as_bytes()).unwrap();
    let analyzer = FinanceAnalyzer::new(AnalyticsConfig::default()).unwrap();
    let report = analyzer.analyze(&transactions);
    (transactions, report)
}

#[test]
fn test_household_pipeline() {
    let (transactions, report) = analyze_household();

    assert_eq!(transactions.len(), 38);
    assert_eq!(report.transactions.len(), transactions.len());

    let salary = report
        .transactions
        .iter()
        .filter(|t| t.category == "Salary")
        .count();
    assert_eq!(salary, 6);

    let laptop = report
        .transactions
        .iter()
        .find(|t| t.description == "amazon laptop")
        .unwrap();
    assert_eq!(laptop.category, "Shopping");
    assert!(laptop.is_large, "threshold {}", report.large_transaction_threshold);
    assert!(laptop.is_anomaly);

    let refund = report
        .transactions
        .iter()
        .find(|t| t.description == "refund for returned item")
        .unwrap();
    assert_eq!(refund.category, "Others");
    assert_eq!(refund.transaction_type, TransactionType::Income);

    assert_eq!(report.total_income, 6.0 * 75_000.0 + 500.0);
    assert!(report.health.score > 0 && report.health.score <= 100);
    assert_eq!(report.monthly_health.len(), 6);

    let expense = report.expense_forecast.as_ref().unwrap();
    assert_eq!(expense.historical.len(), 6);
    let labels: Vec<&str> = expense
        .forecast
        .iter()
        .map(|p| p.period_label.as_str())
        .collect();
    assert_eq!(labels, vec!["2024-04", "2024-05", "2024-06"]);

    let savings = report.savings_forecast.as_ref().unwrap();
    assert_eq!(savings.forecast.len(), 3);
    for point in &savings.forecast {
        assert!(point.lower_bound <= point.predicted && point.predicted <= point.upper_bound);
    }

    let kinds: Vec<InsightKind> = report.insights.iter().map(|i| i.kind).collect();
    assert_eq!(kinds[0], InsightKind::Savings);
    assert!(kinds.contains(&InsightKind::TopCategory));
    assert!(kinds.contains(&InsightKind::LargeTransactions));
    assert!(kinds.contains(&InsightKind::Volatility));
}

#[test]
fn test_flags_only_on_expenses() {
    let (_, report) = analyze_household();
    for txn in &report.transactions {
        if txn.is_large || txn.is_anomaly {
            assert_eq!(txn.transaction_type, TransactionType::Expense, "{:?}", txn);
        }
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let (_, first) = analyze_household();
    let (_, second) = analyze_household();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_income_only_ledger() {
    let transactions = vec![
        Transaction::new(date(2024, 1, 1), "salary", 40_000.0),
        Transaction::new(date(2024, 2, 1), "salary", 40_000.0),
    ];
    let report = FinanceAnalyzer::new(AnalyticsConfig::default())
        .unwrap()
        .analyze(&transactions);

    assert_eq!(report.large_transaction_threshold, 0.0);
    assert!(report.transactions.iter().all(|t| !t.is_large && !t.is_anomaly));
    assert!(report.expense_forecast.is_none());
    assert!(report.savings_forecast.is_some());
    assert_eq!(report.health.score, 100);
}

#[test]
fn test_expense_only_ledger() {
    let transactions = vec![
        Transaction::new(date(2024, 1, 5), "amazon", 1_000.0),
        Transaction::new(date(2024, 1, 9), "swiggy", 300.0),
    ];
    let report = FinanceAnalyzer::new(AnalyticsConfig::default())
        .unwrap()
        .analyze(&transactions);

    assert_eq!(report.health.score, 0);
    assert!(report.health.breakdown.is_none());
    assert!(report.expense_forecast.is_none());
    assert_eq!(report.anomaly_count, 0);
    assert_eq!(report.insight_messages().len(), 1);
    assert_eq!(report.insights[0].kind, InsightKind::NoIncome);
}

#[test]
fn test_empty_ledger() {
    let report = FinanceAnalyzer::new(AnalyticsConfig::default())
        .unwrap()
        .analyze(&[]);
    assert!(report.transactions.is_empty());
    assert_eq!(report.health.score, 0);
    assert!(report.monthly_health.is_empty());
    assert!(report.expense_forecast.is_none());
    assert!(report.savings_forecast.is_none());
}

#[test]
fn test_single_month_trend_equals_overall_score() {
    let transactions = vec![
        Transaction::new(date(2024, 6, 1), "salary", 30_000.0),
        Transaction::new(date(2024, 6, 2), "irctc ticket", 1_800.0),
        Transaction::new(date(2024, 6, 8), "dominos", 650.0),
        Transaction::new(date(2024, 6, 15), "recharge", 299.0),
    ];
    let report = FinanceAnalyzer::new(AnalyticsConfig::default())
        .unwrap()
        .analyze(&transactions);

    assert_eq!(report.monthly_health.len(), 1);
    assert_eq!(report.monthly_health[0].score, report.health.score);
}

#[test]
fn test_custom_config_from_json() {
    let json = r#"{
        "large_transaction_multiplier": 1.0,
        "forecast_horizon": 2,
        "gap_policy": "zero_fill",
        "category_rules": [
            { "label": "Salary", "keywords": ["payroll"] },
            { "label": "Groceries", "keywords": ["bigbasket", "grocery"] }
        ]
    }"#;
    let config = AnalyticsConfig::from_json_str(json).unwrap();
    let analyzer = FinanceAnalyzer::new(config).unwrap();

    let transactions = vec![
        Transaction::new(date(2024, 1, 1), "payroll acme", 20_000.0),
        Transaction::new(date(2024, 1, 7), "bigbasket order", 1_000.0),
        Transaction::new(date(2024, 3, 7), "bigbasket order", 1_400.0),
        Transaction::new(date(2024, 3, 9), "swiggy", 400.0),
    ];
    let report = analyzer.analyze(&transactions);

    assert_eq!(report.transactions[0].transaction_type, TransactionType::Income);
    assert_eq!(report.transactions[1].category, "Groceries");
    assert_eq!(report.transactions[3].category, "Others");

    let forecast = report.expense_forecast.unwrap();
    // February is filled with a zero month
    assert_eq!(forecast.historical.len(), 3);
    assert_eq!(forecast.historical[1].amount, 0.0);
    assert_eq!(forecast.forecast.len(), 2);
    assert_eq!(forecast.forecast[0].period_label, "2024-04");
}

#[test]
fn test_substitute_outlier_model() {
    struct FlagNothing;

    impl OutlierModel for FlagNothing {
        fn score_samples(&self, sample: &[f64], _seed: u64) -> Vec<f64> {
            vec![0.0; sample.len()]
        }
    }

    let (transactions, _) = analyze_household();
    let analyzer =
        FinanceAnalyzer::with_model(AnalyticsConfig::default(), Box::new(FlagNothing)).unwrap();
    let report = analyzer.analyze(&transactions);

    assert_eq!(report.anomaly_count, 0);
    assert!(report.transactions.iter().all(|t| !t.is_anomaly));
    assert!(report
        .insight_messages()
        .contains(&"No suspicious activity detected.".to_string()));
}

#[test]
fn test_missing_amount_column_is_hard_failure() {
    let csv = "date,description,value\n2024-01-01,salary,100\n";
    let err = read_csv(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, AnalyticsError::MissingColumn(_)));
}

#[test]
fn test_summaries_over_report_table() {
    let (_, report) = analyze_household();

    let yearly = yearly_category_summary(&report.transactions);
    assert!(yearly.iter().any(|r| r.year == 2023 && r.category == "Food"));

    let monthly = monthly_category_summary(&report.transactions);
    let feb_shopping = monthly
        .iter()
        .find(|r| r.year_month == "2024-02" && r.category == "Shopping")
        .unwrap();
    assert_eq!(feb_shopping.amount, 85_000.0);

    let (top, _) = top_expense_category(&report.transactions).unwrap();
    assert_eq!(top, "Shopping");
}

#[test]
fn test_config_round_trip_drives_same_report() -> anyhow::Result<()> {
    let config = AnalyticsConfig::default();
    let reloaded = AnalyticsConfig::from_json_str(&config.to_json_string()?)?;
    assert_eq!(config, reloaded);

    let transactions = read_csv(household_csv().as_bytes())?;
    let first = FinanceAnalyzer::new(config)?.analyze(&transactions);
    let second = FinanceAnalyzer::new(reloaded)?.analyze(&transactions);
    assert_eq!(first.health, second.health);
    assert_eq!(first.insights, second.insights);
    Ok(())
}
