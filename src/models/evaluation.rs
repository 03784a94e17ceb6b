use serde::{Deserialize, Serialize};

pub const MISSING_SUGGESTION: &str = "No suggestion provided.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub total_score: u32,
    pub percentage: f64,
    pub feedback: Vec<QuestionFeedback>,
    pub overall_feedback: String,
    pub areas_to_improve: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub question_index: usize,
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub suggestion: String,
    pub skill_focus: String,
}
