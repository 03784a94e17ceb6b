use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::evaluation::{Evaluation, QuestionFeedback};
use crate::models::mock_test::{
    ExamConfig, ExamRecord, ExamStatus, ExamSummary, Question, UserAnswer,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMockTestRequest {
    pub jd_id: Uuid,
    pub number_of_questions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub selected_option: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMockTestRequest {
    pub mock_test_id: Uuid,
    #[validate(length(min = 1, message = "answers must not be empty"))]
    pub answers: Vec<SubmittedAnswer>,
}

impl SubmitMockTestRequest {
    pub fn selections(&self) -> Vec<Option<usize>> {
        self.answers.iter().map(|a| a.selected_option).collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAttemptsQuery {
    pub jd_id: Option<Uuid>,
}

/// Question as shown to the candidate while the exam is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub skill: String,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
            skill: q.skill.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedMockTest {
    pub id: Uuid,
    pub questions: Vec<PublicQuestion>,
    pub exam_config: ExamConfig,
    pub start_time: DateTime<Utc>,
}

impl From<&ExamRecord> for CreatedMockTest {
    fn from(exam: &ExamRecord) -> Self {
        Self {
            id: exam.id,
            questions: exam.questions.iter().map(PublicQuestion::from).collect(),
            exam_config: exam.exam_config,
            start_time: exam.start_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMockTestResponse {
    pub success: bool,
    pub mock_test: CreatedMockTest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    pub total_score: u32,
    pub percentage: f64,
    pub feedback: Vec<QuestionFeedback>,
    pub overall_feedback: String,
    pub areas_to_improve: Vec<String>,
    pub time_taken: i64,
}

impl SubmitResult {
    pub fn new(evaluation: Evaluation, time_taken: i64) -> Self {
        Self {
            total_score: evaluation.total_score,
            percentage: evaluation.percentage,
            feedback: evaluation.feedback,
            overall_feedback: evaluation.overall_feedback,
            areas_to_improve: evaluation.areas_to_improve,
            time_taken,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitMockTestResponse {
    pub success: bool,
    pub result: SubmitResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSummary {
    pub total_score: Option<u32>,
    pub percentage: Option<f64>,
    pub overall_feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub id: Uuid,
    pub jd_text: Option<String>,
    pub exam_config: ExamConfig,
    pub evaluation: EvaluationSummary,
    pub exam_status: ExamStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

impl From<ExamSummary> for AttemptSummary {
    fn from(s: ExamSummary) -> Self {
        Self {
            id: s.id,
            jd_text: s.jd_text,
            exam_config: s.exam_config,
            evaluation: EvaluationSummary {
                total_score: s.total_score,
                percentage: s.percentage,
                overall_feedback: s.overall_feedback,
            },
            exam_status: s.exam_status,
            start_time: s.start_time,
            end_time: s.end_time,
            time_taken: s.time_taken,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAttemptsResponse {
    pub success: bool,
    pub attempts: Vec<AttemptSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTestDetail {
    pub id: Uuid,
    pub jd_text: Option<String>,
    pub exam_config: ExamConfig,
    pub questions: Vec<Question>,
    pub user_answers: Option<Vec<UserAnswer>>,
    pub evaluation: Option<Evaluation>,
    pub exam_status: ExamStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_taken: Option<i64>,
}

impl MockTestDetail {
    pub fn new(exam: ExamRecord, jd_text: Option<String>) -> Self {
        Self {
            id: exam.id,
            jd_text,
            exam_config: exam.exam_config,
            questions: exam.questions,
            user_answers: exam.user_answers,
            evaluation: exam.evaluation,
            exam_status: exam.exam_status,
            start_time: exam.start_time,
            end_time: exam.end_time,
            time_taken: exam.time_taken,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockTestDetailResponse {
    pub success: bool,
    pub mock_test: MockTestDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_question_has_no_answer_key() {
        let q = Question {
            question: "q?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 2,
            skill: "rust".into(),
        };
        let v = serde_json::to_value(PublicQuestion::from(&q)).unwrap();
        assert!(v.get("correctAnswer").is_none());
        assert_eq!(v["skill"], "rust");

        let stored = serde_json::to_value(&q).unwrap();
        assert_eq!(stored["correctAnswer"], 2);
    }

    #[test]
    fn submit_request_reads_camel_case() {
        let req: SubmitMockTestRequest = serde_json::from_value(serde_json::json!({
            "mockTestId": Uuid::nil(),
            "answers": [{"selectedOption": 2}, {"selectedOption": null}, {}]
        }))
        .unwrap();
        assert_eq!(req.selections(), vec![Some(2), None, None]);
    }
}
