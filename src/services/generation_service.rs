use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::mock_test::{Question, OPTIONS_PER_QUESTION};
use crate::services::llm_service::LanguageModel;

const DEFAULT_SKILL: &str = "general";

#[derive(Clone)]
pub struct GenerationService {
    llm: Arc<dyn LanguageModel>,
    max_attempts: u32,
}

impl GenerationService {
    pub fn new(llm: Arc<dyn LanguageModel>, max_attempts: u32) -> Self {
        Self {
            llm,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Asks the model for `count` questions and keeps only well-formed ones.
    ///
    /// Transport failures are returned immediately. Output that does not parse,
    /// or yields fewer than `count` usable questions, is requested again until
    /// the attempt budget runs out.
    pub async fn generate_questions(
        &self,
        jd_text: &str,
        skills: &[String],
        count: usize,
    ) -> Result<Vec<Question>> {
        let prompt = build_question_prompt(jd_text, skills, count);
        let mut last_problem = String::new();

        for attempt in 1..=self.max_attempts {
            tracing::info!(attempt, count, "Requesting question generation");
            let text = self
                .llm
                .complete(&prompt)
                .await
                .map_err(|e| Error::Generation(e.to_string()))?;

            match parse_questions(&text, count) {
                Ok(questions) if questions.len() == count => {
                    tracing::info!(attempt, "Parsed questions data successfully");
                    return Ok(questions);
                }
                Ok(questions) => {
                    last_problem = format!(
                        "model returned {} usable questions, {} required",
                        questions.len(),
                        count
                    );
                }
                Err(problem) => last_problem = problem,
            }
            tracing::warn!(attempt, problem = %last_problem, "Rejected generated questions");
        }

        Err(Error::Generation(last_problem))
    }
}

pub fn build_question_prompt(jd_text: &str, skills: &[String], count: usize) -> String {
    format!(
        r#"You are an expert technical interviewer. Based on the following Job Description (JD), create {count} multiple choice questions (MCQs) for a mock exam. Each question should:
- Be relevant to the JD and the listed skills: {skills}
- Have exactly 4 options (A, B, C, D)
- Vary in difficulty as appropriate for the JD
- Focus on practical, real-world scenarios
- Cover a range of topics from the JD

Job Description:
"""
{jd_text}
"""

Return the result in this exact JSON format:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "skill": "skill_name"
    }}
  ]
}}
Note: correctAnswer should be the index (0-3) of the correct option."#,
        skills = skills.join(", "),
    )
}

/// Removes Markdown code fences the model tends to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the `{ "questions": [...] }` envelope, discarding malformed entries
/// and truncating to `count`.
pub fn parse_questions(text: &str, count: usize) -> std::result::Result<Vec<Question>, String> {
    let cleaned = strip_code_fences(text);
    let raw: JsonValue =
        serde_json::from_str(&cleaned).map_err(|e| format!("response is not valid JSON: {}", e))?;
    let items = raw
        .get("questions")
        .and_then(|q| q.as_array())
        .ok_or_else(|| "response has no questions array".to_string())?;

    let mut questions: Vec<Question> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match coerce_question(item) {
            Ok(q) => Some(q),
            Err(reason) => {
                tracing::warn!(index = idx, reason, "Dropping malformed question");
                None
            }
        })
        .collect();
    questions.truncate(count);
    Ok(questions)
}

fn coerce_question(v: &JsonValue) -> std::result::Result<Question, &'static str> {
    let question = v
        .get("question")
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("missing question text")?;

    let options = v
        .get("options")
        .and_then(|o| o.as_array())
        .ok_or("missing options")?
        .iter()
        .map(|o| o.as_str().map(|s| s.trim().to_string()))
        .collect::<Option<Vec<String>>>()
        .ok_or("non-string option")?;
    if options.len() != OPTIONS_PER_QUESTION {
        return Err("wrong number of options");
    }
    if options.iter().any(String::is_empty) {
        return Err("empty option");
    }

    let correct_answer = v
        .get("correctAnswer")
        .and_then(|i| i.as_u64())
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < OPTIONS_PER_QUESTION)
        .ok_or("correctAnswer out of range")?;

    let skill = v
        .get("skill")
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SKILL);

    Ok(Question {
        question: question.to_string(),
        options,
        correct_answer,
        skill: skill.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm_service::{LlmError, MockLanguageModel};
    use serde_json::json;

    fn question_json(n: usize) -> JsonValue {
        json!({
            "question": format!("Question {}?", n),
            "options": ["a", "b", "c", "d"],
            "correctAnswer": n % 4,
            "skill": "rust"
        })
    }

    fn envelope(n: usize) -> String {
        json!({ "questions": (0..n).map(question_json).collect::<Vec<_>>() }).to_string()
    }

    #[test]
    fn prompt_mentions_count_skills_and_jd() {
        let prompt = build_question_prompt(
            "Backend engineer",
            &["Rust".to_string(), "SQL".to_string()],
            15,
        );
        assert!(prompt.contains("create 15 multiple choice questions"));
        assert!(prompt.contains("Rust, SQL"));
        assert!(prompt.contains("Backend engineer"));
        assert!(prompt.contains("\"correctAnswer\": 0"));
    }

    #[test]
    fn fenced_json_is_parsed() {
        let text = format!("```json\n{}\n```", envelope(2));
        let questions = parse_questions(&text, 2).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].correct_answer, 1);
        assert_eq!(questions[0].skill, "rust");
    }

    #[test]
    fn prose_around_json_is_rejected() {
        let text = format!("Sure! Here you go:\n{}", envelope(1));
        assert!(parse_questions(&text, 1).is_err());
    }

    #[test]
    fn missing_envelope_is_rejected() {
        let err = parse_questions("[]", 1).unwrap_err();
        assert!(err.contains("questions"));
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let text = json!({ "questions": [
            question_json(0),
            {"question": "three options", "options": ["a", "b", "c"], "correctAnswer": 0},
            {"question": "bad index", "options": ["a", "b", "c", "d"], "correctAnswer": 4},
            {"question": "huge index", "options": ["a", "b", "c", "d"], "correctAnswer": 4294967296u64},
            {"question": "negative index", "options": ["a", "b", "c", "d"], "correctAnswer": -1},
            {"question": "", "options": ["a", "b", "c", "d"], "correctAnswer": 1},
            {"question": "no skill", "options": ["a", "b", "c", "d"], "correctAnswer": 3}
        ]})
        .to_string();

        let questions = parse_questions(&text, 10).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].skill, DEFAULT_SKILL);
    }

    #[test]
    fn surplus_questions_are_truncated() {
        let questions = parse_questions(&envelope(17), 15).unwrap();
        assert_eq!(questions.len(), 15);
    }

    #[tokio::test]
    async fn retries_once_when_model_comes_up_short() {
        let mut llm = MockLanguageModel::new();
        let mut calls = 0;
        llm.expect_complete().times(2).returning(move |_| {
            calls += 1;
            Ok(if calls == 1 { envelope(3) } else { envelope(5) })
        });

        let svc = GenerationService::new(Arc::new(llm), 2);
        let questions = svc
            .generate_questions("jd", &["rust".to_string()], 5)
            .await
            .unwrap();
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let mut llm = MockLanguageModel::new();
        llm.expect_complete()
            .times(2)
            .returning(|_| Ok("not json at all".to_string()));

        let svc = GenerationService::new(Arc::new(llm), 2);
        let err = svc.generate_questions("jd", &[], 15).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let mut llm = MockLanguageModel::new();
        llm.expect_complete()
            .times(1)
            .returning(|_| Err(LlmError::Api { status: 500, body: "boom".into() }));

        let svc = GenerationService::new(Arc::new(llm), 3);
        let err = svc.generate_questions("jd", &[], 15).await.unwrap_err();
        assert!(matches!(err, Error::Generation(msg) if msg.contains("500")));
    }
}
