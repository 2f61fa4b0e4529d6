use serde_json::json;

use survey_spec::{
    ChoiceOption, ConfigError, QuestionConfig, QuestionKind, config_schema, descriptor,
    descriptors, parse_config,
};

fn rejected(kind: QuestionKind, raw: serde_json::Value) -> ConfigError {
    parse_config(kind, &raw).expect_err("config should be rejected")
}

fn accepted(kind: QuestionKind, raw: serde_json::Value) -> QuestionConfig {
    parse_config(kind, &raw).expect("config should be accepted")
}

#[test]
fn kind_aliases_resolve_to_canonical_tags() {
    let cases = [
        ("rating", QuestionKind::RatingStar),
        ("mcq_single", QuestionKind::SingleChoice),
        ("single-choice", QuestionKind::SingleChoice),
        ("mcq_multi", QuestionKind::MultipleChoice),
        ("multi-choice", QuestionKind::MultipleChoice),
        ("yes_no", QuestionKind::Boolean),
        ("order_rank", QuestionKind::OrderRank),
    ];
    for (raw, expected) in cases {
        assert_eq!(raw.parse::<QuestionKind>(), Ok(expected), "alias {raw}");
    }
    let err = "matrix"
        .parse::<QuestionKind>()
        .expect_err("matrix is not a kind");
    assert_eq!(err.to_string(), "unknown question kind 'matrix'");
}

#[test]
fn defaults_are_filled_per_kind() {
    let QuestionConfig::RatingStar(star) = accepted(QuestionKind::RatingStar, json!(null)) else {
        panic!("expected star rating config");
    };
    assert_eq!((star.min, star.max, star.step), (1, 5, 1));

    let QuestionConfig::RatingScale(scale) = accepted(QuestionKind::RatingScale, json!({})) else {
        panic!("expected scale rating config");
    };
    assert_eq!((scale.min, scale.max), (0, 10));
    let labels = scale.labels.expect("scale labels default");
    assert_eq!(labels.min.as_deref(), Some("Not Likely"));
    assert_eq!(labels.max.as_deref(), Some("Very Likely"));

    let config = accepted(QuestionKind::Boolean, json!({ "true_label": null }));
    let QuestionConfig::Boolean(boolean) = config else {
        panic!("expected boolean config");
    };
    assert_eq!(boolean.true_label, "Yes");
    assert_eq!(boolean.false_label, "No");

    let QuestionConfig::Textarea(textarea) = accepted(QuestionKind::Textarea, json!({})) else {
        panic!("expected textarea config");
    };
    assert_eq!(textarea.max_length, Some(2000));
}

#[test]
fn choice_kinds_need_two_distinct_non_empty_values() {
    let err = rejected(QuestionKind::SingleChoice, json!({ "options": ["Only"] }));
    assert_eq!(err.field, "options");
    assert_eq!(err.message, "must contain at least 2 options");

    let err = rejected(QuestionKind::Dropdown, json!({}));
    assert_eq!(err.field, "options");

    let err = rejected(
        QuestionKind::SingleChoice,
        json!({ "options": ["Red", "Green", "Red"] }),
    );
    assert_eq!(err.to_string(), "options[2]: duplicate value 'Red'");

    let err = rejected(
        QuestionKind::MultipleChoice,
        json!({ "options": [{ "value": "", "label": "Blank" }, "B"] }),
    );
    assert_eq!(err.field, "options[0].value");

    let err = rejected(
        QuestionKind::MultipleChoice,
        json!({ "options": [{ "value": "r", "label": "Red" }, "r"] }),
    );
    assert_eq!(err.message, "duplicate value 'r'");
}

#[test]
fn choice_options_accept_labels_and_pairs() {
    let config = parse_config(
        QuestionKind::SingleChoice,
        &json!({ "options": ["Red", { "value": "g", "label": "Green" }] }),
    )
    .expect("mixed options");
    let options = config.options().expect("choice options");
    assert_eq!(options[0], ChoiceOption::Label("Red".into()));
    assert_eq!(options[1].value(), "g");
    assert_eq!(options[1].label(), "Green");
}

#[test]
fn selection_bounds_must_be_ordered() {
    let err = rejected(
        QuestionKind::MultipleChoice,
        json!({ "options": ["a", "b", "c"], "min_selections": 3, "max_selections": 2 }),
    );
    assert_eq!(err.field, "min_selections");

    let err = rejected(
        QuestionKind::MultipleChoice,
        json!({ "options": ["a", "b"], "max_selections": 0 }),
    );
    assert_eq!(err.field, "max_selections");

    parse_config(
        QuestionKind::MultipleChoice,
        &json!({ "options": ["a", "b"], "min_selections": 0, "max_selections": 2 }),
    )
    .expect("0 <= min <= max");
}

#[test]
fn unknown_keys_are_rejected() {
    let err = rejected(
        QuestionKind::RatingStar,
        json!({ "min": 1, "max": 5, "stpe": 0 }),
    );
    assert_eq!(err.field, "config");
    assert!(err.message.contains("stpe"), "{err}");

    let err = rejected(
        QuestionKind::SingleChoice,
        json!({ "options": ["Red", "Green"], "allow_others": true }),
    );
    assert!(err.message.contains("allow_others"), "{err}");

    let err = rejected(
        QuestionKind::RatingScale,
        json!({ "labels": { "min": "Never", "middle": "Sometimes" } }),
    );
    assert!(err.message.contains("middle"), "{err}");
}

#[test]
fn camel_case_keys_are_honoured() {
    let config = accepted(
        QuestionKind::SingleChoice,
        json!({ "options": ["Red", "Green"], "allowOther": true }),
    );
    let QuestionConfig::SingleChoice(choice) = config else {
        panic!("expected single choice config");
    };
    assert!(choice.allow_other);

    let err = rejected(
        QuestionKind::MultipleChoice,
        json!({ "options": ["a", "b"], "minSelections": 3, "maxSelections": 1 }),
    );
    assert_eq!(err.field, "min_selections");

    let config = accepted(QuestionKind::Boolean, json!({ "trueLabel": "Agree" }));
    let QuestionConfig::Boolean(labels) = config else {
        panic!("expected boolean config");
    };
    assert_eq!(labels.true_label, "Agree");
    assert_eq!(labels.false_label, "No");

    let err = rejected(
        QuestionKind::Textarea,
        json!({ "minLength": 10, "maxLength": 5 }),
    );
    assert_eq!(err.field, "min_length");
}

#[test]
fn numeric_and_rating_bounds() {
    let err = rejected(QuestionKind::Number, json!({ "min": 10, "max": 1 }));
    assert_eq!(err.to_string(), "min: must not exceed max");

    let err = rejected(QuestionKind::Number, json!({ "step": 0 }));
    assert_eq!(err.field, "step");

    let err = rejected(QuestionKind::RatingStar, json!({ "min": 5, "max": 1 }));
    assert_eq!(err.field, "min");

    let err = rejected(QuestionKind::RatingScale, json!({ "step": -1 }));
    assert_eq!(err.field, "step");

    let err = rejected(QuestionKind::RatingStar, json!({ "min": 0, "max": 5000 }));
    assert_eq!(err.field, "max");

    let err = rejected(QuestionKind::RatingStar, json!({ "max": 4.5 }));
    assert_eq!(err.field, "config");
}

#[test]
fn date_bounds_compare_as_calendar_dates() {
    let err = rejected(
        QuestionKind::Date,
        json!({ "min_date": "2024-10-02", "max_date": "2024-9-30" }),
    );
    assert_eq!(err.field, "config", "non-padded dates are not ISO dates");

    let err = rejected(
        QuestionKind::Date,
        json!({ "min_date": "2024-10-02", "max_date": "2024-09-30" }),
    );
    assert_eq!(err.to_string(), "min_date: must not be after max_date");

    parse_config(
        QuestionKind::Date,
        &json!({ "min_date": "2024-09-30", "max_date": "2024-10-02" }),
    )
    .expect("ordered dates");
}

#[test]
fn text_and_rank_limits() {
    let err = rejected(
        QuestionKind::Text,
        json!({ "min_length": 10, "max_length": 5 }),
    );
    assert_eq!(err.field, "min_length");

    let err = rejected(
        QuestionKind::OrderRank,
        json!({ "items": ["a", "b"], "max_rankable": 3 }),
    );
    assert_eq!(err.message, "cannot exceed the 2 configured items");

    let err = rejected(QuestionKind::Email, json!("not an object"));
    assert_eq!(err.to_string(), "config: must be an object");
}

#[test]
fn registry_covers_every_kind() {
    let tags: Vec<&str> = descriptors().map(|entry| entry.kind.as_str()).collect();
    assert_eq!(tags.len(), 12);
    assert!(tags.contains(&"order_rank"));
    assert_eq!(descriptor(QuestionKind::Boolean).label, "Yes/No");
    assert_eq!(
        descriptor(QuestionKind::Boolean).default_config(),
        json!({ "true_label": "Yes", "false_label": "No" })
    );
}

#[test]
fn config_schemas_describe_objects() {
    for kind in QuestionKind::ALL {
        let schema = serde_json::to_value(config_schema(kind)).expect("schema serializes");
        assert_eq!(schema["type"], "object", "{kind}");
    }
    let schema = serde_json::to_value(config_schema(QuestionKind::MultipleChoice))
        .expect("schema serializes");
    assert!(schema["properties"]["min_selections"].is_object());
}
