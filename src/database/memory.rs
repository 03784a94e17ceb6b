use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::store::ExamStore;
use crate::error::Result;
use crate::models::job_description::JobDescription;
use crate::models::mock_test::{
    ExamCompletion, ExamRecord, ExamStatus, ExamSummary, NewExam,
};

#[derive(Debug, Clone)]
struct SkillSet {
    jd_id: Uuid,
    skills: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    job_descriptions: Vec<JobDescription>,
    skill_sets: Vec<SkillSet>,
    exams: Vec<ExamRecord>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Clone, Default)]
pub struct MemoryExamStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_job_description(&self, user_id: &str, jd_text: &str) -> JobDescription {
        let jd = JobDescription {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            jd_text: jd_text.to_string(),
            created_at: Utc::now(),
        };
        self.tables.write().await.job_descriptions.push(jd.clone());
        jd
    }

    pub async fn add_skill_set(&self, jd_id: Uuid, skills: &[&str]) {
        self.tables.write().await.skill_sets.push(SkillSet {
            jd_id,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        });
    }

    pub async fn exam_count(&self) -> usize {
        self.tables.read().await.exams.len()
    }
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn get_job_description(&self, jd_id: Uuid) -> Result<Option<JobDescription>> {
        let tables = self.tables.read().await;
        Ok(tables.job_descriptions.iter().find(|jd| jd.id == jd_id).cloned())
    }

    async fn latest_skills(&self, jd_id: Uuid) -> Result<Option<Vec<String>>> {
        let tables = self.tables.read().await;
        let mut latest: Option<&SkillSet> = None;
        for set in tables.skill_sets.iter().filter(|s| s.jd_id == jd_id) {
            if latest.map_or(true, |l| set.created_at >= l.created_at) {
                latest = Some(set);
            }
        }
        Ok(latest.map(|s| s.skills.clone()))
    }

    async fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord> {
        let record = ExamRecord {
            id: Uuid::new_v4(),
            user_id: exam.user_id,
            jd_id: exam.jd_id,
            exam_config: exam.exam_config,
            questions: exam.questions,
            exam_status: ExamStatus::InProgress,
            start_time: exam.start_time,
            end_time: None,
            time_taken: None,
            user_answers: None,
            evaluation: None,
            created_at: Utc::now(),
        };
        self.tables.write().await.exams.push(record.clone());
        Ok(record)
    }

    async fn get_exam(&self, id: Uuid) -> Result<Option<ExamRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.exams.iter().find(|e| e.id == id).cloned())
    }

    async fn complete_exam(
        &self,
        id: Uuid,
        completion: ExamCompletion,
    ) -> Result<Option<ExamRecord>> {
        let mut tables = self.tables.write().await;
        let Some(exam) = tables
            .exams
            .iter_mut()
            .find(|e| e.id == id && e.exam_status == ExamStatus::InProgress)
        else {
            return Ok(None);
        };

        exam.user_answers = Some(completion.user_answers);
        exam.evaluation = Some(completion.evaluation);
        exam.exam_status = ExamStatus::Completed;
        exam.end_time = Some(completion.end_time);
        exam.time_taken = Some(completion.time_taken);
        Ok(Some(exam.clone()))
    }

    async fn list_exams(&self, user_id: &str, jd_id: Option<Uuid>) -> Result<Vec<ExamSummary>> {
        let tables = self.tables.read().await;
        let mut exams: Vec<&ExamRecord> = tables
            .exams
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id && jd_id.map_or(true, |id| e.jd_id == id))
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(exams
            .into_iter()
            .map(|e| ExamSummary {
                id: e.id,
                jd_text: tables
                    .job_descriptions
                    .iter()
                    .find(|jd| jd.id == e.jd_id)
                    .map(|jd| jd.jd_text.clone()),
                exam_config: e.exam_config,
                total_score: e.evaluation.as_ref().map(|ev| ev.total_score),
                percentage: e.evaluation.as_ref().map(|ev| ev.percentage),
                overall_feedback: e.evaluation.as_ref().map(|ev| ev.overall_feedback.clone()),
                exam_status: e.exam_status,
                start_time: e.start_time,
                end_time: e.end_time,
                time_taken: e.time_taken,
            })
            .collect())
    }
}
