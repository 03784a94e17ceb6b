use std::env;

use chrono::Utc;
use mock_exam_backend::{
    database::{pool::create_pool, postgres::PgExamStore, store::ExamStore},
    models::{
        evaluation::Evaluation,
        mock_test::{ExamCompletion, ExamConfig, ExamStatus, NewExam, Question, UserAnswer},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

/// Connects to `DATABASE_URL` and runs migrations, or returns `None` so the
/// test is skipped on machines without Postgres.
async fn pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = env::var("DATABASE_URL").ok()?;
    let pool = create_pool(&url).await.expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    Some(pool)
}

fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question {
            question: format!("Question {}?", i),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: i % 4,
            skill: "sql".into(),
        })
        .collect()
}

fn completion(score: u32) -> ExamCompletion {
    ExamCompletion {
        user_answers: (0..15)
            .map(|i| UserAnswer {
                question_index: i,
                selected_option: Some(0),
                is_correct: i % 4 == 0,
            })
            .collect(),
        evaluation: Evaluation {
            total_score: score,
            percentage: 26.7,
            feedback: Vec::new(),
            overall_feedback: format!("score {}", score),
            areas_to_improve: vec!["joins".into()],
        },
        end_time: Utc::now(),
        time_taken: 3,
    }
}

#[tokio::test]
async fn postgres_store_completes_an_exam_only_once() {
    let Some(pool) = pool().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let store = PgExamStore::new(pool.clone());

    let user = format!("user-{}", Uuid::new_v4());
    let jd_id: Uuid = sqlx::query_scalar(
        r#"INSERT INTO job_descriptions (user_id, jd_text) VALUES ($1, $2) RETURNING id"#,
    )
    .bind(&user)
    .bind("Data engineer")
    .fetch_one(&pool)
    .await
    .expect("insert jd");
    sqlx::query(r#"INSERT INTO jd_skill_sets (jd_id, skills) VALUES ($1, $2)"#)
        .bind(jd_id)
        .bind(sqlx::types::Json(vec!["sql", "etl"]))
        .execute(&pool)
        .await
        .expect("insert skills");

    assert_eq!(
        store.latest_skills(jd_id).await.unwrap(),
        Some(vec!["sql".to_string(), "etl".to_string()])
    );

    let exam = store
        .insert_exam(NewExam {
            user_id: user.clone(),
            jd_id,
            exam_config: ExamConfig::for_question_count(15).unwrap(),
            questions: questions(15),
            start_time: Utc::now(),
        })
        .await
        .unwrap();
    assert_eq!(exam.exam_status, ExamStatus::InProgress);

    let first = store.complete_exam(exam.id, completion(4)).await.unwrap();
    assert!(first.is_some());
    let second = store.complete_exam(exam.id, completion(15)).await.unwrap();
    assert!(second.is_none());

    let stored = store.get_exam(exam.id).await.unwrap().unwrap();
    assert_eq!(stored.exam_status, ExamStatus::Completed);
    assert_eq!(stored.evaluation.as_ref().unwrap().total_score, 4);
    assert_eq!(stored.questions[2].correct_answer, 2);

    let summaries = store.list_exams(&user, Some(jd_id)).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_score, Some(4));
    assert_eq!(summaries[0].jd_text.as_deref(), Some("Data engineer"));
    assert_eq!(summaries[0].time_taken, Some(3));
}
