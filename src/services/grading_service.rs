use crate::error::{Error, Result};
use crate::models::mock_test::{Question, UserAnswer};

pub struct GradingService;

impl GradingService {
    /// Index-aligned comparison of selections against stored correct answers.
    pub fn grade(questions: &[Question], selections: &[Option<usize>]) -> Result<Vec<UserAnswer>> {
        if selections.len() != questions.len() {
            return Err(Error::BadRequest(format!(
                "Expected {} answers, received {}",
                questions.len(),
                selections.len()
            )));
        }

        questions
            .iter()
            .zip(selections)
            .enumerate()
            .map(|(idx, (q, selected))| {
                if let Some(option) = selected {
                    if *option >= q.options.len() {
                        return Err(Error::BadRequest(format!(
                            "Selected option {} is out of range for question {}",
                            option,
                            idx + 1
                        )));
                    }
                }
                Ok(UserAnswer {
                    question_index: idx,
                    selected_option: *selected,
                    is_correct: *selected == Some(q.correct_answer),
                })
            })
            .collect()
    }

    /// Correct-answer count and percentage rounded to one decimal.
    pub fn score(answers: &[UserAnswer]) -> (u32, f64) {
        let correct = answers.iter().filter(|a| a.is_correct).count() as u32;
        if answers.is_empty() {
            return (0, 0.0);
        }
        let percentage = f64::from(correct) * 100.0 / answers.len() as f64;
        (correct, (percentage * 10.0).round() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(correct: usize) -> Question {
        Question {
            question: "q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            skill: "s".into(),
        }
    }

    #[test]
    fn correctness_follows_index_alignment() {
        let questions = vec![q(0), q(1), q(2)];
        let answers = GradingService::grade(&questions, &[Some(0), Some(2), None]).unwrap();

        assert_eq!(answers[0].question_index, 0);
        assert!(answers[0].is_correct);
        assert!(!answers[1].is_correct);
        assert!(!answers[2].is_correct);
        assert_eq!(answers[2].selected_option, None);
    }

    #[test]
    fn answer_count_must_match() {
        let err = GradingService::grade(&[q(0), q(1)], &[Some(0)]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let err = GradingService::grade(&[q(0)], &[Some(4)]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn score_rounds_percentage() {
        let questions = vec![q(0), q(0), q(0)];
        let answers = GradingService::grade(&questions, &[Some(0), Some(1), None]).unwrap();
        assert_eq!(GradingService::score(&answers), (1, 33.3));
        assert_eq!(GradingService::score(&[]), (0, 0.0));
    }
}
