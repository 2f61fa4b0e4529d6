use std::sync::Arc;

use serde_json::{Value, json};

use survey_engine::{EngineConfig, NewQuestion, QuestionPatch, SurveyEngine, SurveyError};
use survey_spec::{AnswerInput, QuestionKind, StatsSummary, Survey, SurveyStatus};
use survey_store::{MemoryStore, SurveyStore};

type Engine = SurveyEngine<MemoryStore>;

async fn engine_with(config: EngineConfig) -> Engine {
    let store = MemoryStore::new();
    store
        .insert_survey(Survey::new("s1", "owner-1", "Customer feedback"))
        .await
        .expect("insert survey");
    SurveyEngine::new(Arc::new(store), config)
}

async fn engine() -> Engine {
    engine_with(EngineConfig::default()).await
}

fn new_question(kind: QuestionKind, title: &str, order: Option<i64>, config: Value) -> NewQuestion {
    NewQuestion {
        survey_id: "s1".into(),
        kind,
        title: title.into(),
        required: false,
        order,
        config,
    }
}

async fn add_text(engine: &Engine, title: &str) -> String {
    engine
        .create_question(new_question(QuestionKind::Text, title, None, Value::Null))
        .await
        .expect("create text question")
        .id
}

async fn orders(engine: &Engine) -> Vec<(String, u32)> {
    engine
        .active_questions("s1")
        .await
        .expect("active questions")
        .into_iter()
        .map(|question| (question.title, question.order))
        .collect()
}

async fn publish(engine: &Engine) {
    engine
        .store()
        .set_survey_status("s1", SurveyStatus::Published)
        .await
        .expect("publish");
}

fn validation_message(err: &SurveyError) -> &str {
    match err {
        SurveyError::Validation(inner) => &inner.message,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn first_question_lands_at_order_zero() {
    let engine = engine().await;
    let mut colour = new_question(
        QuestionKind::SingleChoice,
        "Favourite colour",
        Some(0),
        json!({ "options": ["Red", "Green"] }),
    );
    colour.required = true;
    let question = engine.create_question(colour).await.expect("create");
    assert_eq!(question.order, 0);
    assert!(question.required);
    assert_eq!(question.kind(), QuestionKind::SingleChoice);
}

#[tokio::test]
async fn inserting_at_an_occupied_slot_shifts_the_rest() {
    let engine = engine().await;
    add_text(&engine, "first").await;
    engine
        .create_question(new_question(QuestionKind::Text, "second", Some(0), Value::Null))
        .await
        .expect("insert at front");
    assert_eq!(
        orders(&engine).await,
        vec![("second".to_string(), 0), ("first".to_string(), 1)]
    );
}

#[tokio::test]
async fn invalid_option_and_missing_required_answers_are_rejected() {
    let engine = engine().await;
    let mut colour = new_question(
        QuestionKind::SingleChoice,
        "Favourite colour",
        Some(0),
        json!({ "options": ["Red", "Green"] }),
    );
    colour.required = true;
    let question = engine.create_question(colour).await.expect("create");
    publish(&engine).await;

    let err = engine
        .submit_response(
            "s1",
            None,
            vec![AnswerInput::new(question.id.clone(), json!("Blue"))],
        )
        .await
        .expect_err("blue is not an option");
    assert_eq!(validation_message(&err), "invalid option selected: Blue");

    let err = engine
        .submit_response("s1", Some("r1".into()), Vec::new())
        .await
        .expect_err("required answer missing");
    assert_eq!(validation_message(&err), "this question is required");

    let stats = engine.compute_stats("s1").await.expect("stats");
    assert_eq!(stats.total_responses, 0);
}

#[tokio::test]
async fn rating_stats_cover_every_point_of_the_scale() {
    let engine = engine().await;
    let rating = engine
        .create_question(new_question(
            QuestionKind::RatingStar,
            "How was it?",
            None,
            json!({ "min": 1, "max": 5 }),
        ))
        .await
        .expect("create rating");
    publish(&engine).await;

    for score in [5, 5, 3] {
        let answers = vec![AnswerInput::new(rating.id.clone(), json!(score))];
        engine
            .submit_response("s1", None, answers)
            .await
            .expect("submit rating");
    }

    let stats = engine.compute_stats("s1").await.expect("stats");
    assert_eq!(stats.total_responses, 3);
    let summary = &stats.questions[0].summary;
    let StatsSummary::Rating { buckets, mean } = summary else {
        panic!("expected rating summary, got {summary:?}");
    };
    let counts: Vec<usize> = buckets.iter().map(|bucket| bucket.count).collect();
    assert_eq!(counts, vec![0, 0, 1, 0, 2]);
    assert_eq!(*mean, Some(4.3));
}

#[tokio::test]
async fn answered_questions_only_accept_title_changes() {
    let engine = engine().await;
    let colour = engine
        .create_question(new_question(
            QuestionKind::SingleChoice,
            "Favourite colour",
            None,
            json!({ "options": ["Red", "Green"] }),
        ))
        .await
        .expect("create");
    publish(&engine).await;
    let answers = vec![AnswerInput::new(colour.id.clone(), json!("Red"))];
    engine
        .submit_response("s1", None, answers)
        .await
        .expect("submit");

    let renamed = engine
        .update_question(&colour.id, QuestionPatch::title("Preferred colour"))
        .await
        .expect("title-only update");
    assert_eq!(renamed.title, "Preferred colour");

    let err = engine
        .update_question(
            &colour.id,
            QuestionPatch {
                title: Some("Colour".into()),
                config: Some(json!({ "options": ["Red", "Green", "Blue"] })),
                ..QuestionPatch::default()
            },
        )
        .await
        .expect_err("config change after responses");
    assert!(matches!(err, SurveyError::Conflict(_)));
    assert_eq!(
        err.to_string(),
        "conflict: cannot update config after responses exist"
    );

    let stored = engine.store().question(&colour.id).await.expect("stored");
    assert_eq!(stored.title, "Preferred colour");
    assert_eq!(stored.config().options().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn unanswered_questions_accept_config_changes() {
    let engine = engine().await;
    let colour = engine
        .create_question(new_question(
            QuestionKind::MultipleChoice,
            "Colours",
            None,
            json!({ "options": ["Red", "Green"] }),
        ))
        .await
        .expect("create");

    let updated = engine
        .update_question(
            &colour.id,
            QuestionPatch {
                config: Some(json!({ "max_selections": 1 })),
                required: Some(true),
                ..QuestionPatch::default()
            },
        )
        .await
        .expect("update");
    assert!(updated.required);
    assert_eq!(updated.config().options().map(<[_]>::len), Some(2));

    let err = engine
        .update_question(
            &colour.id,
            QuestionPatch {
                config: Some(json!({ "options": [] })),
                ..QuestionPatch::default()
            },
        )
        .await
        .expect_err("empty options");
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn kind_is_immutable() {
    let engine = engine().await;
    let id = add_text(&engine, "name").await;
    let err = engine
        .update_question(
            &id,
            QuestionPatch {
                kind: Some(QuestionKind::Email),
                ..QuestionPatch::default()
            },
        )
        .await
        .expect_err("kind change");
    assert_eq!(err.to_string(), "conflict: question kind is immutable");

    engine
        .update_question(
            &id,
            QuestionPatch {
                kind: Some(QuestionKind::Text),
                title: Some("full name".into()),
                ..QuestionPatch::default()
            },
        )
        .await
        .expect("same kind is accepted");
}

#[tokio::test]
async fn invalid_creations_write_nothing() {
    let engine = engine().await;
    add_text(&engine, "first").await;

    let err = engine
        .create_question(new_question(QuestionKind::Text, "   ", None, Value::Null))
        .await
        .expect_err("blank title");
    assert_eq!(err.kind(), "validation");

    let err = engine
        .create_question(new_question(QuestionKind::Text, "far", Some(5), Value::Null))
        .await
        .expect_err("order past the end");
    assert_eq!(err.kind(), "validation");

    let err = engine
        .create_question(new_question(QuestionKind::Text, "neg", Some(-1), Value::Null))
        .await
        .expect_err("negative order");
    assert_eq!(
        validation_message(&err),
        "order must be a non-negative integer"
    );

    let err = engine
        .create_question(new_question(
            QuestionKind::RatingStar,
            "rate",
            None,
            json!({ "min": 5, "max": 1 }),
        ))
        .await
        .expect_err("inverted bounds");
    assert_eq!(err.kind(), "validation");

    assert_eq!(orders(&engine).await, vec![("first".to_string(), 0)]);
}

#[tokio::test]
async fn one_based_surveys_start_at_one() {
    let engine = engine_with(EngineConfig {
        order_base: 1,
        ..EngineConfig::default()
    })
    .await;
    add_text(&engine, "a").await;
    add_text(&engine, "b").await;
    let err = engine
        .create_question(new_question(QuestionKind::Text, "zero", Some(0), Value::Null))
        .await
        .expect_err("below the base");
    assert_eq!(err.kind(), "validation");
    engine
        .create_question(new_question(QuestionKind::Text, "c", Some(1), Value::Null))
        .await
        .expect("insert at base");
    assert_eq!(
        orders(&engine).await,
        vec![
            ("c".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
        ]
    );
}

#[tokio::test]
async fn moves_shift_the_questions_in_between() {
    let engine = engine().await;
    let a = add_text(&engine, "a").await;
    add_text(&engine, "b").await;
    add_text(&engine, "c").await;
    let d = add_text(&engine, "d").await;

    engine.move_question(&a, 2).await.expect("move down");
    assert_eq!(
        orders(&engine).await,
        vec![
            ("b".to_string(), 0),
            ("c".to_string(), 1),
            ("a".to_string(), 2),
            ("d".to_string(), 3),
        ]
    );

    engine.move_question(&d, 0).await.expect("move up");
    assert_eq!(
        orders(&engine).await,
        vec![
            ("d".to_string(), 0),
            ("b".to_string(), 1),
            ("c".to_string(), 2),
            ("a".to_string(), 3),
        ]
    );

    let err = engine.move_question(&d, 4).await.expect_err("past the end");
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn deletes_leave_gaps_until_normalized() {
    let engine = engine().await;
    add_text(&engine, "a").await;
    let b = add_text(&engine, "b").await;
    add_text(&engine, "c").await;

    engine.delete_question(&b).await.expect("delete");
    assert_eq!(
        orders(&engine).await,
        vec![("a".to_string(), 0), ("c".to_string(), 2)]
    );
    let err = engine
        .delete_question(&b)
        .await
        .expect_err("already deleted");
    assert_eq!(err.kind(), "not_found");

    let normalized = engine.normalize_order("s1").await.expect("normalize");
    let compact: Vec<u32> = normalized.iter().map(|question| question.order).collect();
    assert_eq!(compact, vec![0, 1]);

    // Appends go after the highest active order.
    add_text(&engine, "d").await;
    assert_eq!(orders(&engine).await.last(), Some(&("d".to_string(), 2)));
}

#[tokio::test]
async fn published_surveys_refuse_inserts_and_deletes() {
    let engine = engine().await;
    let a = add_text(&engine, "a").await;
    add_text(&engine, "b").await;
    publish(&engine).await;

    let err = engine
        .create_question(new_question(QuestionKind::Text, "late", None, Value::Null))
        .await
        .expect_err("insert into published");
    assert!(matches!(err, SurveyError::Conflict(_)));
    assert!(matches!(
        engine.delete_question(&a).await,
        Err(SurveyError::Conflict(_))
    ));
    assert!(matches!(
        engine.normalize_order("s1").await,
        Err(SurveyError::Conflict(_))
    ));

    engine
        .update_question(&a, QuestionPatch::title("renamed"))
        .await
        .expect("title edits stay open");
}

#[tokio::test]
async fn published_surveys_allow_moving_unanswered_questions() {
    let engine = engine().await;
    let a = add_text(&engine, "a").await;
    let b = add_text(&engine, "b").await;
    publish(&engine).await;

    let moved = engine
        .move_question(&a, 1)
        .await
        .expect("move before answers");
    assert_eq!(moved.order, 1);
    assert_eq!(
        orders(&engine).await,
        vec![("b".to_string(), 0), ("a".to_string(), 1)]
    );

    engine
        .submit_response("s1", None, vec![AnswerInput::new(b.clone(), json!("hi"))])
        .await
        .expect("submit");
    let err = engine
        .move_question(&b, 1)
        .await
        .expect_err("answered question is pinned");
    assert_eq!(
        err.to_string(),
        "conflict: cannot update order after responses exist"
    );

    engine
        .store()
        .set_survey_status("s1", SurveyStatus::Deleted)
        .await
        .expect("delete survey");
    assert!(matches!(
        engine.move_question(&a, 0).await,
        Err(SurveyError::Conflict(_))
    ));
}

#[tokio::test]
async fn responses_need_a_published_survey() {
    let engine = engine().await;
    let id = add_text(&engine, "name").await;
    let err = engine
        .submit_response("s1", None, vec![AnswerInput::new(id.clone(), json!("Ada"))])
        .await
        .expect_err("draft survey");
    assert!(matches!(err, SurveyError::Conflict(_)));

    publish(&engine).await;
    let response = engine
        .submit_response(
            "s1",
            Some("r-42".into()),
            vec![AnswerInput::new(id.clone(), json!("Ada"))],
        )
        .await
        .expect("published survey");
    assert_eq!(response.respondent_id.as_deref(), Some("r-42"));
    assert_eq!(response.answers.len(), 1);

    engine
        .store()
        .set_survey_status("s1", SurveyStatus::Closed)
        .await
        .expect("close");
    assert!(matches!(
        engine.submit_response("s1", None, Vec::new()).await,
        Err(SurveyError::Conflict(_))
    ));
}

#[tokio::test]
async fn deleted_surveys_are_not_found() {
    let engine = engine().await;
    let id = add_text(&engine, "name").await;
    engine
        .store()
        .set_survey_status("s1", SurveyStatus::Deleted)
        .await
        .expect("delete survey");

    assert_eq!(
        engine.compute_stats("s1").await.expect_err("stats").kind(),
        "not_found"
    );
    assert_eq!(
        engine
            .submit_response("s1", None, Vec::new())
            .await
            .expect_err("submit")
            .kind(),
        "not_found"
    );
    assert!(matches!(
        engine.update_question(&id, QuestionPatch::title("x")).await,
        Err(SurveyError::Conflict(_))
    ));
    assert_eq!(
        engine
            .compute_stats("missing")
            .await
            .expect_err("missing")
            .kind(),
        "not_found"
    );
}

#[tokio::test]
async fn only_the_owner_is_authorized() {
    let engine = engine().await;
    let survey = engine
        .authorize_owner("s1", "owner-1")
        .await
        .expect("owner");
    assert_eq!(survey.title, "Customer feedback");

    let err = engine
        .authorize_owner("s1", "someone-else")
        .await
        .expect_err("stranger");
    assert!(matches!(err, SurveyError::Authorization(_)));
    assert_eq!(err.kind(), "authorization");
}

#[tokio::test]
async fn deleted_questions_drop_out_of_validation_and_stats() {
    let engine = engine().await;
    let keep = add_text(&engine, "keep").await;
    let mut dropped = new_question(QuestionKind::Text, "dropped", None, Value::Null);
    dropped.required = true;
    let dropped = engine.create_question(dropped).await.expect("create");
    engine.delete_question(&dropped.id).await.expect("delete");
    publish(&engine).await;

    let answers = vec![AnswerInput::new(keep.clone(), json!("hi"))];
    engine
        .submit_response("s1", None, answers)
        .await
        .expect("deleted required question is not enforced");
    let err = engine
        .submit_response(
            "s1",
            None,
            vec![AnswerInput::new(dropped.id.clone(), json!("late"))],
        )
        .await
        .expect_err("deleted question is foreign");
    assert_eq!(err.kind(), "validation");

    let stats = engine.compute_stats("s1").await.expect("stats");
    let ids: Vec<&str> = stats
        .questions
        .iter()
        .map(|question| question.question_id.as_str())
        .collect();
    assert_eq!(ids, vec![keep.as_str()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_keep_orders_contiguous() {
    let engine = engine_with(EngineConfig {
        max_commit_attempts: 5,
        ..EngineConfig::default()
    })
    .await;

    let mut tasks = Vec::new();
    for index in 0..8 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .create_question(new_question(
                    QuestionKind::Text,
                    &format!("q{index}"),
                    Some(0),
                    Value::Null,
                ))
                .await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.expect("join") {
            Ok(_) => created += 1,
            Err(err) => assert!(matches!(err, SurveyError::Conflict(_)), "{err}"),
        }
    }
    assert!(created > 0);

    let mut seen: Vec<u32> = orders(&engine)
        .await
        .into_iter()
        .map(|(_, order)| order)
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..created).collect::<Vec<u32>>());
}
