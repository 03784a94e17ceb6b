use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::store::ExamStore;
use crate::error::{Error, Result};
use crate::models::evaluation::Evaluation;
use crate::models::job_description::JobDescription;
use crate::models::mock_test::{
    ExamCompletion, ExamConfig, ExamRecord, ExamStatus, ExamSummary, NewExam, Question, UserAnswer,
};

#[derive(Debug, FromRow)]
struct MockTestRow {
    id: Uuid,
    user_id: String,
    jd_id: Uuid,
    number_of_questions: i32,
    time_limit_minutes: i32,
    questions: Json<Vec<Question>>,
    exam_status: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    time_taken_minutes: Option<i32>,
    user_answers: Option<Json<Vec<UserAnswer>>>,
    evaluation: Option<Json<Evaluation>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MockTestRow> for ExamRecord {
    type Error = Error;

    fn try_from(row: MockTestRow) -> Result<Self> {
        Ok(ExamRecord {
            id: row.id,
            user_id: row.user_id,
            jd_id: row.jd_id,
            exam_config: exam_config(row.number_of_questions, row.time_limit_minutes)?,
            questions: row.questions.0,
            exam_status: row.exam_status.parse()?,
            start_time: row.start_time,
            end_time: row.end_time,
            time_taken: row.time_taken_minutes.map(i64::from),
            user_answers: row.user_answers.map(|a| a.0),
            evaluation: row.evaluation.map(|e| e.0),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: Uuid,
    jd_text: Option<String>,
    number_of_questions: i32,
    time_limit_minutes: i32,
    total_score: Option<i32>,
    percentage: Option<f64>,
    overall_feedback: Option<String>,
    exam_status: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    time_taken_minutes: Option<i32>,
}

impl TryFrom<SummaryRow> for ExamSummary {
    type Error = Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        Ok(ExamSummary {
            id: row.id,
            jd_text: row.jd_text,
            exam_config: exam_config(row.number_of_questions, row.time_limit_minutes)?,
            total_score: row.total_score.and_then(|s| u32::try_from(s).ok()),
            percentage: row.percentage,
            overall_feedback: row.overall_feedback,
            exam_status: row.exam_status.parse()?,
            start_time: row.start_time,
            end_time: row.end_time,
            time_taken: row.time_taken_minutes.map(i64::from),
        })
    }
}

fn exam_config(number_of_questions: i32, time_limit: i32) -> Result<ExamConfig> {
    let to_u32 = |v: i32| {
        u32::try_from(v).map_err(|_| Error::Internal(format!("Negative exam config value: {}", v)))
    };
    Ok(ExamConfig {
        number_of_questions: to_u32(number_of_questions)?,
        time_limit: to_u32(time_limit)?,
    })
}

fn to_i32(v: u32) -> Result<i32> {
    i32::try_from(v).map_err(|_| Error::Internal(format!("Value out of range: {}", v)))
}

#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn get_job_description(&self, jd_id: Uuid) -> Result<Option<JobDescription>> {
        let jd = sqlx::query_as::<_, JobDescription>(
            r#"SELECT id, user_id, jd_text, created_at FROM job_descriptions WHERE id = $1"#,
        )
        .bind(jd_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(jd)
    }

    async fn latest_skills(&self, jd_id: Uuid) -> Result<Option<Vec<String>>> {
        let skills = sqlx::query_scalar::<_, Json<Vec<String>>>(
            r#"
            SELECT skills FROM jd_skill_sets
            WHERE jd_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(jd_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(skills.map(|s| s.0))
    }

    async fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord> {
        let row = sqlx::query_as::<_, MockTestRow>(
            r#"
            INSERT INTO mock_tests (
                user_id, jd_id, number_of_questions, time_limit_minutes,
                questions, exam_status, start_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&exam.user_id)
        .bind(exam.jd_id)
        .bind(to_i32(exam.exam_config.number_of_questions)?)
        .bind(to_i32(exam.exam_config.time_limit)?)
        .bind(Json(&exam.questions))
        .bind(ExamStatus::InProgress.as_str())
        .bind(exam.start_time)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_exam(&self, id: Uuid) -> Result<Option<ExamRecord>> {
        let row = sqlx::query_as::<_, MockTestRow>(r#"SELECT * FROM mock_tests WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ExamRecord::try_from).transpose()
    }

    async fn complete_exam(
        &self,
        id: Uuid,
        completion: ExamCompletion,
    ) -> Result<Option<ExamRecord>> {
        let time_taken = i32::try_from(completion.time_taken)
            .map_err(|_| Error::Internal("Time taken out of range".to_string()))?;

        let row = sqlx::query_as::<_, MockTestRow>(
            r#"
            UPDATE mock_tests
            SET user_answers = $2,
                evaluation = $3,
                exam_status = $4,
                end_time = $5,
                time_taken_minutes = $6
            WHERE id = $1 AND exam_status = $7
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(&completion.user_answers))
        .bind(Json(&completion.evaluation))
        .bind(ExamStatus::Completed.as_str())
        .bind(completion.end_time)
        .bind(time_taken)
        .bind(ExamStatus::InProgress.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ExamRecord::try_from).transpose()
    }

    async fn list_exams(&self, user_id: &str, jd_id: Option<Uuid>) -> Result<Vec<ExamSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                m.id,
                jd.jd_text,
                m.number_of_questions,
                m.time_limit_minutes,
                (m.evaluation->>'totalScore')::int AS total_score,
                (m.evaluation->>'percentage')::float8 AS percentage,
                m.evaluation->>'overallFeedback' AS overall_feedback,
                m.exam_status,
                m.start_time,
                m.end_time,
                m.time_taken_minutes
            FROM mock_tests m
            LEFT JOIN job_descriptions jd ON jd.id = m.jd_id
            WHERE m.user_id = $1 AND ($2::uuid IS NULL OR m.jd_id = $2)
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(jd_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ExamSummary::try_from).collect()
    }
}
