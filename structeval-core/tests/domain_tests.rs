use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use structeval_core::*;

// ===== FormatType Tests =====

#[test]
fn test_format_codes_are_unique_and_round_trip() {
    for format in FormatType::ALL {
        assert_eq!(FormatType::from_code(format.code()), Some(format));
    }

    let mut codes: Vec<&str> = FormatType::ALL.iter().map(|f| f.code()).collect();
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), 19);
}

#[rstest]
#[case("json", FormatType::Json)]
#[case("JSON", FormatType::Json)]
#[case("yml", FormatType::Yaml)]
#[case("tex", FormatType::Latex)]
#[case("vega-lite", FormatType::Vega)]
#[case(" Markdown ", FormatType::Markdown)]
#[case("tsx", FormatType::React)]
fn test_format_from_name(#[case] name: &str, #[case] expected: FormatType) {
    assert_eq!(FormatType::from_name(name), Some(expected));
}

#[test]
fn test_format_from_unknown_name() {
    assert_eq!(FormatType::from_name("brainfuck"), None);
    assert_eq!(FormatType::from_code("99"), None);
}

#[test]
fn test_structured_data_formats() {
    let structured: Vec<FormatType> = FormatType::ALL
        .into_iter()
        .filter(FormatType::is_structured_data)
        .collect();

    assert_eq!(
        structured,
        vec![
            FormatType::Csv,
            FormatType::Json,
            FormatType::Toml,
            FormatType::Xml,
            FormatType::Yaml
        ]
    );
}

// ===== TaskId Tests =====

#[test]
fn test_task_id_codes() {
    let id = TaskId::new("0518_a");

    assert_eq!(id.input_code(), Some("05"));
    assert_eq!(id.output_code(), Some("18"));
    assert_eq!(id.input_format(), Some(FormatType::Json));
    assert_eq!(id.output_format(), Some(FormatType::Yaml));
}

#[test]
fn test_short_task_id_has_no_formats() {
    let id = TaskId::from("05");

    assert_eq!(id.input_format(), Some(FormatType::Json));
    assert_eq!(id.output_code(), None);
    assert_eq!(id.output_format(), None);
}

#[test]
fn test_task_id_serializes_as_plain_string() {
    let id = TaskId::new("000500");
    assert_eq!(serde_json::to_value(&id).unwrap(), json!("000500"));
}

// ===== Branch Tests =====

#[rstest]
#[case("Write a haiku", true, Branch::TextToRenderable)]
#[case("List the planets", false, Branch::TextToNonRenderable)]
#[case("Convert <code>{\"a\": 1}</code>", true, Branch::NonTextToRenderable)]
#[case("Convert <code>{\"a\": 1}</code>", false, Branch::NonTextToNonRenderable)]
fn test_branch_from_query_and_rendering(
    #[case] query: &str,
    #[case] rendering: bool,
    #[case] expected: Branch,
) {
    let modality = InputModality::of_query(query, DEFAULT_OPEN_MARKER);
    let branch = Branch::new(modality, rendering);

    assert_eq!(branch, expected);
    assert_eq!(branch.modality(), modality);
    assert_eq!(branch.is_renderable(), rendering);
}

#[test]
fn test_empty_marker_never_marks_non_text() {
    assert_eq!(InputModality::of_query("<code>x", ""), InputModality::Text);
}

#[test]
fn test_branch_display_matches_serde() {
    for branch in Branch::ALL {
        assert_eq!(serde_json::to_value(branch).unwrap(), json!(branch.to_string()));
    }
}

// ===== Structure Tests =====

#[test]
fn test_table_to_records() {
    let table = Table::new(
        vec!["name".into(), "price".into()],
        vec![vec!["apple".into(), "3".into()], vec!["pear".into()]],
    );

    assert_eq!(
        table.to_records(),
        json!([{"name": "apple", "price": "3"}, {"name": "pear"}])
    );
    assert!(table.has_header("price"));
    assert!(!table.has_header("weight"));
}

#[test]
fn test_table_views() {
    let table = Table::new(vec!["name".into()], vec![vec!["apple".into()]]);
    let structure = Structure::Table(table);

    assert_eq!(*structure.as_value(), json!([{"name": "apple"}]));
    assert_eq!(*structure.as_rows_value(), json!([["name"], ["apple"]]));
}

#[test]
fn test_loaded_structure_trust_threshold() {
    let loaded = LoadedStructure::new(json!({"a": 1}), 0.5);
    assert!(loaded.trusted(0.5).is_some());
    assert!(loaded.trusted(0.6).is_none());

    let failed = LoadedStructure::failed();
    assert!(!failed.is_parsed());
    assert!(failed.trusted(0.0).is_none());
}

#[test]
fn test_loaded_structure_clamps_confidence() {
    assert_eq!(LoadedStructure::new(json!(1), 3.0).confidence, 1.0);
    assert_eq!(LoadedStructure::new(json!(1), -1.0).confidence, 0.0);
}

#[rstest]
#[case(json!(null), ValueKind::Null)]
#[case(json!(true), ValueKind::Bool)]
#[case(json!(3), ValueKind::Integer)]
#[case(json!(3.5), ValueKind::Float)]
#[case(json!("x"), ValueKind::String)]
#[case(json!([]), ValueKind::Array)]
#[case(json!({}), ValueKind::Object)]
fn test_value_kind(#[case] value: serde_json::Value, #[case] expected: ValueKind) {
    assert_eq!(ValueKind::of(&value), expected);
}

// ===== TaskRecord Tests =====

#[test]
fn test_task_record_reads_dataset_fields() {
    let raw = json!({
        "task_id": "000500",
        "query": "Describe a book as JSON",
        "generation": "<code>{\"title\": \"Dune\"}</code>",
        "output_type": "JSON",
        "rendering": false,
        "raw_output_metric": ["title"],
        "VQAmetric": [],
        "render_score": 1,
        "model": "some-model",
        "attempt": 3
    });

    let record: TaskRecord = serde_json::from_value(raw).unwrap();

    assert_eq!(record.task_id.as_str(), "000500");
    assert_eq!(record.render_score, Some(1.0));
    assert_eq!(record.output_format(), Some(FormatType::Json));
    assert_eq!(record.extra.get("model"), Some(&json!("some-model")));
    assert_eq!(record.extra.get("attempt"), Some(&json!(3)));
}

#[test]
fn test_task_record_writes_original_field_names() {
    let mut record = TaskRecord::new("001200", "Draw a circle", "<svg/>")
        .with_rendering(true)
        .with_vqa(vec![VqaItem::new("Is there a circle?", "yes")]);
    record.vqa_score = Some(1.0);
    record.vqa_eval = vec![Some(true)];
    record.extra.insert("model".into(), json!("m"));

    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["VQA_score"], json!(1.0));
    assert_eq!(value["VQAeval"], json!([true]));
    assert_eq!(value["VQAmetric"][0]["question"], json!("Is there a circle?"));
    assert_eq!(value["model"], json!("m"));
    assert!(value.get("eval_errors").is_none());
}

#[test]
fn test_task_record_reads_previously_scored_output() {
    let raw = r#"{
        "task_id": "001700",
        "raw_output_eval": ["True", "False", true, 1],
        "VQAeval": ["True", "NONE", "false.", null, false],
        "VQA_score": 0.5,
        "final_eval_score": 0.6
    }"#;

    let record: TaskRecord = serde_json::from_str(raw).unwrap();

    assert_eq!(record.raw_output_eval, vec![true, false, true, false]);
    assert_eq!(
        record.vqa_eval,
        vec![Some(true), None, Some(false), None, Some(false)]
    );
    assert_eq!(record.vqa_score, Some(0.5));
    assert!(record.extra.is_empty());
}

#[test]
fn test_task_record_tolerates_non_list_verdicts() {
    let record: TaskRecord =
        serde_json::from_value(json!({"task_id": "0005", "raw_output_eval": "True", "VQAeval": null}))
            .unwrap();

    assert!(record.raw_output_eval.is_empty());
    assert!(record.vqa_eval.is_empty());
}

#[rstest]
#[case(" True. ", Some(true))]
#[case("FALSE", Some(false))]
#[case("NONE", None)]
#[case("true, mostly", None)]
fn test_parse_verdict(#[case] response: &str, #[case] expected: Verdict) {
    assert_eq!(parse_verdict(response), expected);
}

#[test]
fn test_output_format_falls_back_to_task_id() {
    let record = TaskRecord::new("0018", "q", "g");
    assert_eq!(record.output_format(), Some(FormatType::Yaml));

    let declared = TaskRecord::new("0018", "q", "g").with_types("text", "toml");
    assert_eq!(declared.output_format(), Some(FormatType::Toml));
    assert_eq!(declared.input_format(), Some(FormatType::Text));
}

#[test]
fn test_reset_scores_keeps_render_score() {
    let mut record = TaskRecord::new("0005", "q", "g").with_render_score(1.0);
    record.raw_output_score = Some(0.5);
    record.final_eval_score = Some(0.7);
    record.eval_branch = Some(Branch::TextToNonRenderable);
    record.record_error("boom");

    record.reset_scores();

    assert_eq!(record.render_score, Some(1.0));
    assert_eq!(record.raw_output_score, None);
    assert_eq!(record.final_eval_score, None);
    assert_eq!(record.eval_branch, None);
    assert!(record.eval_errors.is_empty());
    assert!(!record.is_failed());
}

#[test]
fn test_record_error_marks_failed() {
    let mut record = TaskRecord::new("0005", "q", "g");
    record.record_error(CoreError::ParseFailure("bad".into()));

    assert!(record.is_failed());
    assert_eq!(record.eval_errors, vec!["Parse failure: bad".to_string()]);
}

// ===== Error Tests =====

#[test]
fn test_error_display() {
    let err = CoreError::malformed_path("a[1", "unmatched `[`");
    assert_eq!(err.to_string(), "Malformed path `a[1`: unmatched `[`");
    assert_eq!(
        CoreError::JudgeTimeout(250).to_string(),
        "VQA judge timed out after 250 ms"
    );
}

#[test]
fn test_serde_error_converts() {
    let err: CoreError = serde_json::from_str::<TaskRecord>("{").unwrap_err().into();
    assert!(matches!(err, CoreError::Serialization(_)));
}
