use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::job_description::JobDescription;
use crate::models::mock_test::{ExamCompletion, ExamRecord, ExamSummary, NewExam};

/// Persistence seam for job descriptions, their skill sets and exam records.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn get_job_description(&self, jd_id: Uuid) -> Result<Option<JobDescription>>;

    /// Skill tags from the newest skill set recorded for the job description.
    async fn latest_skills(&self, jd_id: Uuid) -> Result<Option<Vec<String>>>;

    async fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord>;

    async fn get_exam(&self, id: Uuid) -> Result<Option<ExamRecord>>;

    /// Moves an exam from in-progress to completed.
    ///
    /// Returns `None` without writing anything when the record is missing or
    /// no longer in progress, so concurrent submissions cannot both win.
    async fn complete_exam(&self, id: Uuid, completion: ExamCompletion)
        -> Result<Option<ExamRecord>>;

    /// Caller's exams, newest first, optionally limited to one job description.
    async fn list_exams(&self, user_id: &str, jd_id: Option<Uuid>) -> Result<Vec<ExamSummary>>;
}
