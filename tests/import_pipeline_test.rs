// ==========================================
// 表格导入流程集成测试
// ==========================================
// 测试范围:
// 1. 新结构 → 模板确认 → 导入
// 2. 同结构再次导入自动匹配模板
// 3. 表头完全一致才视为同一模板
// 4. 资产累计 = 资产收入明细之和（导入 / 追加 / 删除后）
// 5. 删除模板后记录保留、模板关联置空
// 6. 分号分隔报表按小数逗号解析金额
// 7. 手工新建的模板（表头带空白）被上传文件复用
// ==========================================


use artist_revenue::api::ApiError;
use artist_revenue::app::AppState;
use artist_revenue::domain::template::ImportTemplateInput;
use artist_revenue::importer::{ImportOutcome, ImportRequest, ImportSummary, TemplateMatch};
use artist_revenue::logging;
use std::collections::BTreeMap;
use test_helpers::{
    create_test_state, streaming_report_csv, streaming_report_followup_csv, write_csv,
};

const STREAMS_SOURCE_ID: i64 = 4;

fn request_with_new_template(name: &str) -> ImportRequest {
    ImportRequest {
        source_id: STREAMS_SOURCE_ID,
        create_template_name: Some(name.to_string()),
        category: Some("Music".to_string()),
        ..Default::default()
    }
}

fn plain_request() -> ImportRequest {
    ImportRequest {
        source_id: STREAMS_SOURCE_ID,
        ..Default::default()
    }
}

fn import_csv(state: &AppState, content: &str, request: &ImportRequest) -> ImportSummary {
    let file = write_csv(content).unwrap();
    match state
        .import_api
        .import_file(file.path(), "report.csv", request)
        .unwrap()
    {
        ImportOutcome::Imported(summary) => summary,
        other => panic!("期望导入成功, 实际: {:?}", other),
    }
}

/// 校验每个资产的累计值等于其明细之和
fn assert_asset_totals_consistent(state: &AppState) {
    for asset in state.asset_api.list_assets().unwrap() {
        let sum: f64 = state
            .asset_api
            .list_asset_revenues(&asset.asset_id)
            .unwrap()
            .iter()
            .map(|r| r.amount)
            .sum();
        assert!(
            (asset.total_revenue - sum).abs() < 1e-9,
            "资产 {} 累计 {} != 明细合计 {}",
            asset.name,
            asset.total_revenue,
            sum
        );
    }
}

fn asset_total(state: &AppState, name: &str) -> f64 {
    state
        .asset_api
        .list_assets()
        .unwrap()
        .into_iter()
        .find(|a| a.name == name)
        .map(|a| a.total_revenue)
        .unwrap_or_else(|| panic!("资产 {} 不存在", name))
}

// ==========================================
// 测试1: 新结构需要确认模板
// ==========================================

#[test]
fn test_new_structure_requires_template_and_writes_nothing() {
    logging::init_test();
    let ctx = create_test_state().unwrap();
    let file = write_csv(streaming_report_csv()).unwrap();

    let outcome = ctx
        .state
        .import_api
        .import_file(file.path(), "report.csv", &plain_request())
        .unwrap();

    match outcome {
        ImportOutcome::TemplateRequired {
            headers,
            suggested_mappings,
        } => {
            assert_eq!(headers, vec!["Date", "Track", "Store", "Streams", "Amount"]);
            assert_eq!(suggested_mappings.len(), 5);
        }
        other => panic!("期望 TemplateRequired, 实际: {:?}", other),
    }

    assert!(ctx.state.template_api.list_templates().unwrap().is_empty());
    assert!(ctx
        .state
        .revenue_api
        .list_entries(&Default::default())
        .unwrap()
        .is_empty());
}

// ==========================================
// 测试2: 同一文件重复导入行数一致
// ==========================================

#[test]
fn test_reimport_matches_template_and_keeps_row_count() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let first = import_csv(
        &ctx.state,
        streaming_report_csv(),
        &request_with_new_template("Distributor"),
    );
    assert!(first.template_created);
    assert_eq!(first.imported_rows, 3);
    assert_eq!(first.skipped_rows, 0);
    assert!((first.entry.amount - 7.0).abs() < 1e-9);

    let second = import_csv(&ctx.state, streaming_report_csv(), &plain_request());
    assert!(!second.template_created);
    assert_eq!(second.template.template_id, first.template.template_id);
    assert_eq!(second.imported_rows, first.imported_rows);
    assert_eq!(second.sheet_count, first.sheet_count);

    assert_eq!(ctx.state.template_api.list_templates().unwrap().len(), 1);
    assert_eq!(
        ctx.state
            .revenue_api
            .list_entries(&Default::default())
            .unwrap()
            .len(),
        2
    );
}

// ==========================================
// 测试3: 表头完全一致才匹配
// ==========================================

#[test]
fn test_header_equality_is_the_only_matching_key() {
    logging::init_test();
    let ctx = create_test_state().unwrap();
    import_csv(
        &ctx.state,
        streaming_report_csv(),
        &request_with_new_template("Distributor"),
    );

    // 同样的列，顺序不同
    let reordered = "Track,Date,Store,Streams,Amount\nSong A,2024-01-05,Spotify,1200,3.50\n";
    let file = write_csv(reordered).unwrap();
    let outcome = ctx
        .state
        .import_api
        .import_file(file.path(), "reordered.csv", &plain_request())
        .unwrap();
    assert!(matches!(outcome, ImportOutcome::TemplateRequired { .. }));

    let exact = ctx
        .state
        .template_api
        .match_headers(
            ["Date", "Track", "Store", "Streams", "Amount"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
        .unwrap();
    assert!(matches!(exact, TemplateMatch::Matched { .. }));

    let renamed = ctx
        .state
        .template_api
        .match_headers(
            ["Date", "Track", "Store", "Plays", "Amount"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
        )
        .unwrap();
    assert!(matches!(renamed, TemplateMatch::NewStructure { .. }));
}

// ==========================================
// 测试4: 资产累计一致性
// ==========================================

#[test]
fn test_asset_totals_follow_import_annex_and_delete() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let first = import_csv(
        &ctx.state,
        streaming_report_csv(),
        &request_with_new_template("Distributor"),
    );
    assert_eq!(first.assets_linked, 2);
    assert!((asset_total(&ctx.state, "Song A") - 4.75).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song B") - 2.25).abs() < 1e-9);
    assert_asset_totals_consistent(&ctx.state);

    let second = import_csv(&ctx.state, streaming_report_followup_csv(), &plain_request());
    assert!((asset_total(&ctx.state, "Song A") - 7.75).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song C") - 0.40).abs() < 1e-9);
    assert_asset_totals_consistent(&ctx.state);

    // 追加到第二条记录
    let annex_file = write_csv(streaming_report_followup_csv()).unwrap();
    let annex = ctx
        .state
        .import_api
        .annex_file(&second.entry.entry_id, annex_file.path(), "annex.csv", None)
        .unwrap();
    assert_eq!(annex.imported_rows, 2);
    assert!((annex.added_amount - 3.40).abs() < 1e-9);
    assert!((annex.entry.amount - 6.80).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song A") - 10.75).abs() < 1e-9);
    assert_asset_totals_consistent(&ctx.state);

    let payload = ctx
        .state
        .revenue_api
        .get_entry_payload(&second.entry.entry_id)
        .unwrap();
    assert_eq!(payload.sheets.len(), 2);

    // 删除第一条记录: 扣减其贡献
    ctx.state
        .revenue_api
        .delete_entry(&first.entry.entry_id)
        .unwrap();
    assert!((asset_total(&ctx.state, "Song A") - 6.00).abs() < 1e-9);
    assert!(asset_total(&ctx.state, "Song B").abs() < 1e-9);
    assert_asset_totals_consistent(&ctx.state);

    // 已一致时重算不改变任何资产
    assert_eq!(ctx.state.asset_api.recompute_asset_totals().unwrap(), 0);
}

#[test]
fn test_extract_assets_can_be_disabled_per_request() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let request = ImportRequest {
        extract_assets: Some(false),
        ..request_with_new_template("Distributor")
    };
    let summary = import_csv(&ctx.state, streaming_report_csv(), &request);

    assert_eq!(summary.assets_linked, 0);
    assert!(ctx.state.asset_api.list_assets().unwrap().is_empty());
}

// ==========================================
// 测试5: 删除模板
// ==========================================

#[test]
fn test_delete_template_keeps_entries_and_clears_link() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let summary = import_csv(
        &ctx.state,
        streaming_report_csv(),
        &request_with_new_template("Distributor"),
    );
    let template_id = summary.template.template_id.clone();

    ctx.state.template_api.delete_template(&template_id).unwrap();

    let entry = ctx
        .state
        .revenue_api
        .get_entry(&summary.entry.entry_id)
        .unwrap();
    assert_eq!(entry.template_id, None);
    assert!((entry.amount - 7.0).abs() < 1e-9);

    assert!(matches!(
        ctx.state.template_api.template_history(&template_id),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        ctx.state.template_api.delete_template(&template_id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_explicit_template_parses_positionally() {
    logging::init_test();
    let ctx = create_test_state().unwrap();
    let summary = import_csv(
        &ctx.state,
        streaming_report_csv(),
        &request_with_new_template("Distributor"),
    );

    // 表头改名但列位置不变
    let renamed = "Day,Song,Shop,Plays,Paid\n2024-02-01,Song A,Spotify,10,1.50\n";
    let request = ImportRequest {
        template_id: Some(summary.template.template_id.clone()),
        ..plain_request()
    };
    let second = import_csv(&ctx.state, renamed, &request);

    assert_eq!(second.imported_rows, 1);
    assert!((second.entry.amount - 1.50).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song A") - 6.25).abs() < 1e-9);
}

// ==========================================
// 测试6: 分号分隔的欧式报表
// ==========================================

#[test]
fn test_semicolon_statement_keeps_sub_unit_amounts() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let statement = "Date;Track;Net\n\
                     2024-01-05;Song A;0,004\n\
                     2024-01-06;Song A;0,125\n\
                     31/01/2024;Song B;1,500\n";
    let summary = import_csv(&ctx.state, statement, &request_with_new_template("EU Distro"));

    assert_eq!(summary.imported_rows, 3);
    assert_eq!(summary.skipped_rows, 0);
    assert!((summary.entry.amount - 1.629).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song A") - 0.129).abs() < 1e-9);
    assert!((asset_total(&ctx.state, "Song B") - 1.5).abs() < 1e-9);
    assert_asset_totals_consistent(&ctx.state);

    // 历史视图与导入使用同一金额规则
    let table = ctx
        .state
        .template_api
        .template_history(&summary.template.template_id)
        .unwrap();
    let net = table.columns.iter().position(|c| c == "Net").unwrap();
    let total: f64 = table.rows.iter().map(|r| r[net].parse::<f64>().unwrap()).sum();
    assert!((total - 1.629).abs() < 1e-9);
}

// ==========================================
// 测试7: 手工新建模板的表头空白
// ==========================================

#[test]
fn test_manual_template_with_padded_headers_matches_upload() {
    logging::init_test();
    let ctx = create_test_state().unwrap();

    let template = ctx
        .state
        .template_api
        .create_template(ImportTemplateInput {
            name: "Bandcamp payouts".to_string(),
            category: None,
            headers: vec!["Date ".to_string(), "Net".to_string()],
            mappings: BTreeMap::new(),
        })
        .unwrap();

    let summary = import_csv(
        &ctx.state,
        "Date ,Net\n2024-02-01,4.50\n2024-02-02,1.50\n",
        &plain_request(),
    );
    assert!(!summary.template_created);
    assert_eq!(summary.template.template_id, template.template_id);
    assert_eq!(summary.imported_rows, 2);
    assert!((summary.entry.amount - 6.0).abs() < 1e-9);
}
