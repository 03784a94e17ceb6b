use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::evaluation::{Evaluation, QuestionFeedback, MISSING_SUGGESTION};
use crate::models::mock_test::{Question, UserAnswer};
use crate::services::grading_service::GradingService;
use crate::services::llm_service::LanguageModel;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvaluation {
    pub feedback: Vec<RawFeedback>,
    #[serde(default)]
    pub overall_feedback: Option<String>,
    #[serde(default)]
    pub areas_to_improve: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFeedback {
    pub question_index: Option<i64>,
    pub explanation: Option<String>,
    pub suggestion: Option<String>,
    pub skill_focus: Option<String>,
}

#[derive(Clone)]
pub struct EvaluationService {
    llm: Arc<dyn LanguageModel>,
}

impl EvaluationService {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn evaluate(&self, questions: &[Question], answers: &[UserAnswer]) -> Result<Evaluation> {
        let prompt = build_evaluation_prompt(questions, answers);
        tracing::info!(questions = questions.len(), "Requesting answer evaluation");

        let text = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| Error::Evaluation(e.to_string()))?;

        let raw = parse_evaluation(&text).map_err(Error::Evaluation)?;
        Ok(normalize_evaluation(raw, questions, answers))
    }
}

pub fn build_evaluation_prompt(questions: &[Question], answers: &[UserAnswer]) -> String {
    let mut listing = String::new();
    for (index, q) in questions.iter().enumerate() {
        let options = q
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| format!("{}: {}", i, opt))
            .collect::<Vec<_>>()
            .join(", ");
        let user_answer = answers
            .get(index)
            .and_then(|a| a.selected_option)
            .and_then(|i| q.option_text(i))
            .unwrap_or("No answer");
        let _ = write!(
            listing,
            "\nQuestion {}: {}\nOptions: {}\nCorrect Answer: {}\nUser's Answer: {}\nSkill: {}\n",
            index + 1,
            q.question,
            options,
            q.correct_option(),
            user_answer,
            q.skill
        );
    }

    format!(
        r#"Evaluate the following user answers for a technical mock exam. For each question, provide:
- Whether the answer is correct
- The correct answer
- A detailed explanation
- If the user was wrong, a suggestion to improve on the specific topic/skill

Questions and User Answers:
{listing}
Return the evaluation in this exact JSON format:
{{
  "totalScore": 15,
  "percentage": 75.0,
  "feedback": [
    {{
      "questionIndex": 0,
      "isCorrect": true,
      "correctAnswer": "Correct answer text",
      "explanation": "Detailed explanation why this is correct",
      "suggestion": "Suggestion to improve if wrong, else empty string",
      "skillFocus": "Specific skill area to focus on"
    }}
  ],
  "overallFeedback": "Overall performance feedback",
  "areasToImprove": ["Area 1", "Area 2", "Area 3"]
}}"#
    )
}

/// Outermost `{...}` span of the text, tolerating prose around it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_evaluation(text: &str) -> std::result::Result<RawEvaluation, String> {
    let json = extract_json_object(text)
        .ok_or_else(|| "Invalid response format from evaluation model".to_string())?;
    serde_json::from_str(json).map_err(|e| format!("evaluation is not in the expected shape: {}", e))
}

pub fn normalize_suggestion(suggestion: Option<String>) -> String {
    match suggestion {
        Some(s) if !s.trim().is_empty() => s,
        _ => MISSING_SUGGESTION.to_string(),
    }
}

/// Builds the stored evaluation: scores and correctness come from local
/// grading, narrative text from the model. Feedback holds exactly one entry
/// per question, in question order.
pub fn normalize_evaluation(
    raw: RawEvaluation,
    questions: &[Question],
    answers: &[UserAnswer],
) -> Evaluation {
    let (total_score, percentage) = GradingService::score(answers);

    let mut by_index: Vec<Option<RawFeedback>> = questions.iter().map(|_| None).collect();
    for (position, fb) in raw.feedback.into_iter().enumerate() {
        let index = match fb.question_index {
            Some(i) => match usize::try_from(i) {
                Ok(i) => i,
                Err(_) => continue,
            },
            None => position,
        };
        if let Some(slot) = by_index.get_mut(index) {
            if slot.is_none() {
                *slot = Some(fb);
            }
        }
    }

    let feedback = questions
        .iter()
        .zip(by_index)
        .enumerate()
        .map(|(index, (question, fb))| {
            let fb = fb.unwrap_or_default();
            QuestionFeedback {
                question_index: index,
                is_correct: answers.get(index).map_or(false, |a| a.is_correct),
                correct_answer: question.correct_option().to_string(),
                explanation: fb.explanation.unwrap_or_default(),
                suggestion: normalize_suggestion(fb.suggestion),
                skill_focus: fb
                    .skill_focus
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| question.skill.clone()),
            }
        })
        .collect();

    Evaluation {
        total_score,
        percentage,
        feedback,
        overall_feedback: raw.overall_feedback.unwrap_or_default(),
        areas_to_improve: raw.areas_to_improve.unwrap_or_default(),
    }
}
