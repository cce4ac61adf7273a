// ==========================================
// 模板历史视图集成测试
// ==========================================
// 测试范围:
// 1. 无时间段: 按非数值列分组合并
// 2. 有时间段: 按 (year, quarter) 排序拼接
// 3. 运行期配置的额外数值列
// 4. 手工记录 / 模板映射编辑
// ==========================================


use artist_revenue::api::ApiError;
use artist_revenue::app::AppState;
use artist_revenue::config::config_keys;
use artist_revenue::domain::revenue::RevenueEntryInput;
use artist_revenue::domain::template::ImportTemplateInput;
use artist_revenue::importer::{ImportOutcome, ImportRequest};
use artist_revenue::logging;
use artist_revenue::{ColumnRole, HistoryMode};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use test_helpers::{
    create_test_state, streaming_report_csv, streaming_report_followup_csv, write_csv,
};

fn import(state: &AppState, content: &str, request: ImportRequest) -> String {
    let file = write_csv(content).unwrap();
    match state
        .import_api
        .import_file(file.path(), "report.csv", &request)
        .unwrap()
    {
        ImportOutcome::Imported(summary) => summary.template.template_id,
        other => panic!("期望导入成功, 实际: {:?}", other),
    }
}

fn request(create: Option<&str>, year: Option<i32>, quarter: Option<u8>) -> ImportRequest {
    ImportRequest {
        source_id: 4,
        create_template_name: create.map(|s| s.to_string()),
        year,
        quarter,
        ..Default::default()
    }
}

fn column_index(columns: &[String], name: &str) -> usize {
    columns
        .iter()
        .position(|c| c == name)
        .unwrap_or_else(|| panic!("列 {} 不存在", name))
}

#[test]
fn test_history_without_timeframe_merges_identical_rows() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let template_id = import(&ctx.state, streaming_report_csv(), request(Some("Distro"), None, None));
    import(&ctx.state, streaming_report_csv(), request(None, None, None));

    let table = ctx.state.template_api.template_history(&template_id).unwrap();
    assert_eq!(table.mode, HistoryMode::Merged);
    assert_eq!(table.entry_count, 2);
    assert_eq!(table.columns, vec!["Date", "Track", "Store", "Streams", "Amount"]);
    assert!(table.numeric_columns.contains(&"Amount".to_string()));
    assert!(table.numeric_columns.contains(&"Streams".to_string()));

    // 两次导入完全相同的行 → 每组合并为一行
    assert_eq!(table.rows.len(), 3);
    let amount = column_index(&table.columns, "Amount");
    let streams = column_index(&table.columns, "Streams");
    assert_eq!(table.rows[0][1], "Song A");
    assert_eq!(table.rows[0][amount], "7");
    assert_eq!(table.rows[0][streams], "2400");
    assert_eq!(table.rows[2][amount], "2.5");
}

#[test]
fn test_history_with_timeframe_is_ordered_time_series() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    // 先导入 Q2，再导入 Q1
    let template_id = import(
        &ctx.state,
        streaming_report_followup_csv(),
        request(Some("Distro"), Some(2024), Some(2)),
    );
    import(
        &ctx.state,
        streaming_report_csv(),
        request(None, Some(2024), Some(1)),
    );

    let table = ctx.state.template_api.template_history(&template_id).unwrap();
    assert_eq!(table.mode, HistoryMode::TimeSeries);
    assert_eq!(table.columns[0], "Period");
    assert_eq!(table.columns.len(), 6);
    assert_eq!(table.rows.len(), 5);

    let periods: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        periods,
        vec!["2024 Q1", "2024 Q1", "2024 Q1", "2024 Q2", "2024 Q2"]
    );

    // 时间序列不合并数值
    let amount = column_index(&table.columns, "Amount");
    assert_eq!(table.rows[0][amount], "3.50");
}

#[test]
fn test_extra_numeric_columns_from_config() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let template = ctx
        .state
        .template_api
        .create_template(ImportTemplateInput {
            name: "Shop payouts".to_string(),
            category: Some("Merch".to_string()),
            headers: vec!["Store".to_string(), "Fee".to_string()],
            mappings: BTreeMap::new(),
        })
        .unwrap();
    assert_eq!(template.mappings.get("Store"), Some(&ColumnRole::Store));
    assert!(!template.mappings.contains_key("Fee"));

    import(
        &ctx.state,
        "Store,Fee\nBandcamp,1.5\nBandcamp,2.5\n",
        ImportRequest {
            source_id: 1,
            ..Default::default()
        },
    );

    // Fee 不是数值列: 取值不同 → 两行
    let table = ctx
        .state
        .template_api
        .template_history(&template.template_id)
        .unwrap();
    assert_eq!(table.rows.len(), 2);

    ctx.state
        .config_api
        .update_config(config_keys::EXTRA_NUMERIC_COLUMNS, "fee, royalty")
        .unwrap();

    let table = ctx
        .state
        .template_api
        .template_history(&template.template_id)
        .unwrap();
    assert_eq!(table.rows, vec![vec!["Bandcamp".to_string(), "4".to_string()]]);
}

#[test]
fn test_manual_entry_linked_to_template_adds_no_rows() {
    logging::init_test();
    let ctx = create_test_state().unwrap();
    let template_id = import(&ctx.state, streaming_report_csv(), request(Some("Distro"), None, None));

    ctx.state
        .revenue_api
        .create_entry(RevenueEntryInput {
            source_id: 4,
            amount: 12.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            description: "Manual adjustment".to_string(),
            year: None,
            quarter: None,
            file_name: None,
            template_id: Some(template_id.clone()),
            album_id: None,
            track_id: None,
            campaign_id: None,
        })
        .unwrap();

    let table = ctx.state.template_api.template_history(&template_id).unwrap();
    assert_eq!(table.entry_count, 2);
    assert_eq!(table.rows.len(), 3);
}

#[test]
fn test_update_mappings_rejects_unknown_header() {
    logging::init_test();
    let ctx = create_test_state().unwrap();
    let template_id = import(&ctx.state, streaming_report_csv(), request(Some("Distro"), None, None));

    let mut mappings = BTreeMap::new();
    mappings.insert("Royalty".to_string(), ColumnRole::Amount);
    let err = ctx
        .state
        .template_api
        .update_mappings(&template_id, mappings)
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let mut mappings = BTreeMap::new();
    mappings.insert("Amount".to_string(), ColumnRole::Net);
    mappings.insert("Track".to_string(), ColumnRole::AssetName);
    let updated = ctx
        .state
        .template_api
        .update_mappings(&template_id, mappings)
        .unwrap();
    assert_eq!(updated.mappings.get("Amount"), Some(&ColumnRole::Net));
    assert_eq!(updated.mappings.len(), 2);
}
