use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::ExamStore;
use crate::error::{Error, Result};
use crate::models::evaluation::Evaluation;
use crate::models::mock_test::{ExamCompletion, ExamConfig, ExamRecord, ExamStatus, ExamSummary, NewExam};
use crate::services::evaluation_service::EvaluationService;
use crate::services::generation_service::GenerationService;
use crate::services::grading_service::GradingService;
use crate::utils::time::{elapsed_minutes, now};

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub evaluation: Evaluation,
    pub time_taken: i64,
}

#[derive(Clone)]
pub struct ExamService {
    store: Arc<dyn ExamStore>,
    generator: GenerationService,
    evaluator: EvaluationService,
}

impl ExamService {
    pub fn new(
        store: Arc<dyn ExamStore>,
        generator: GenerationService,
        evaluator: EvaluationService,
    ) -> Self {
        Self {
            store,
            generator,
            evaluator,
        }
    }

    pub async fn create_exam(
        &self,
        user_id: &str,
        jd_id: Uuid,
        number_of_questions: u32,
    ) -> Result<ExamRecord> {
        let exam_config = ExamConfig::for_question_count(number_of_questions)?;

        let jd = self
            .store
            .get_job_description(jd_id)
            .await?
            .ok_or_else(|| Error::NotFound("JD not found".to_string()))?;

        let skills = self
            .store
            .latest_skills(jd_id)
            .await?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::BadRequest("No skills found for this JD".to_string()))?;

        let questions = self
            .generator
            .generate_questions(&jd.jd_text, &skills, exam_config.number_of_questions as usize)
            .await?;

        let exam = self
            .store
            .insert_exam(NewExam {
                user_id: user_id.to_string(),
                jd_id,
                exam_config,
                questions,
                start_time: now(),
            })
            .await?;

        tracing::info!(exam_id = %exam.id, user_id, jd_id = %jd_id, "Mock test created");
        Ok(exam)
    }

    pub async fn submit_exam(
        &self,
        user_id: &str,
        exam_id: Uuid,
        selections: &[Option<usize>],
    ) -> Result<SubmissionOutcome> {
        let exam = self.owned_exam(user_id, exam_id).await?;
        if exam.exam_status != ExamStatus::InProgress {
            return Err(already_submitted());
        }

        let user_answers = GradingService::grade(&exam.questions, selections)?;
        let evaluation = self.evaluator.evaluate(&exam.questions, &user_answers).await?;

        let end_time = now();
        let time_taken = elapsed_minutes(exam.start_time, end_time);

        let completed = self
            .store
            .complete_exam(
                exam_id,
                ExamCompletion {
                    user_answers,
                    evaluation: evaluation.clone(),
                    end_time,
                    time_taken,
                },
            )
            .await?;

        if completed.is_none() {
            tracing::warn!(exam_id = %exam_id, "Lost submission race, exam already completed");
            return Err(already_submitted());
        }

        tracing::info!(
            exam_id = %exam_id,
            total_score = evaluation.total_score,
            time_taken,
            "Mock test submitted"
        );
        Ok(SubmissionOutcome {
            evaluation,
            time_taken,
        })
    }

    pub async fn list_attempts(&self, user_id: &str, jd_id: Option<Uuid>) -> Result<Vec<ExamSummary>> {
        self.store.list_exams(user_id, jd_id).await
    }

    /// Full record plus the job-description text it was generated from.
    pub async fn get_exam_detail(
        &self,
        user_id: &str,
        exam_id: Uuid,
    ) -> Result<(ExamRecord, Option<String>)> {
        let exam = self.owned_exam(user_id, exam_id).await?;
        let jd_text = self
            .store
            .get_job_description(exam.jd_id)
            .await?
            .map(|jd| jd.jd_text);
        Ok((exam, jd_text))
    }

    async fn owned_exam(&self, user_id: &str, exam_id: Uuid) -> Result<ExamRecord> {
        let exam = self
            .store
            .get_exam(exam_id)
            .await?
            .ok_or_else(|| Error::NotFound("Mock test not found".to_string()))?;
        if !exam.is_owned_by(user_id) {
            return Err(Error::Forbidden("Unauthorized".to_string()));
        }
        Ok(exam)
    }
}

fn already_submitted() -> Error {
    Error::Conflict("Test already submitted".to_string())
}
