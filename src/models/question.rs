// src/models/question.rs

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single multiple-choice question.
///
/// Field names on the wire follow the quiz file format:
/// `{"question": "...", "options": [...], "answer": 2, "image": "sales.png"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    /// The text of the question.
    #[serde(rename = "question")]
    #[validate(length(min = 1, max = 1000))]
    pub text: String,

    /// Options in display order. The position is what a team selects.
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,

    /// 0-based index of the correct option.
    pub answer: usize,

    /// Illustration shown next to the question. May point to a file that
    /// does not exist; the question is still playable without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        options: &[&str],
        answer: usize,
        image: Option<&str>,
    ) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer,
            image: image.map(str::to_string),
        }
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.answer
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("needs_at_least_two_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// DTO for sending a question to the client (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    /// 1-based position, as shown to the team ("Q3").
    pub number: usize,
    pub question: String,
    pub options: Vec<String>,
    pub image: Option<String>,
}

impl PublicQuestion {
    pub fn from_question(index: usize, question: &Question, image: Option<String>) -> Self {
        Self {
            number: index + 1,
            question: question.text.clone(),
            options: question.options.clone(),
            image,
        }
    }
}

#[derive(Debug)]
pub enum QuestionSetError {
    Empty,
    Invalid { index: usize, reason: String },
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for QuestionSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionSetError::Empty => write!(f, "question set is empty"),
            QuestionSetError::Invalid { index, reason } => {
                write!(f, "question {} is invalid: {}", index + 1, reason)
            }
            QuestionSetError::Io(e) => write!(f, "failed to read quiz file: {}", e),
            QuestionSetError::Parse(e) => write!(f, "failed to parse quiz file: {}", e),
        }
    }
}

impl std::error::Error for QuestionSetError {}

impl From<std::io::Error> for QuestionSetError {
    fn from(err: std::io::Error) -> Self {
        QuestionSetError::Io(err)
    }
}

impl From<serde_json::Error> for QuestionSetError {
    fn from(err: serde_json::Error) -> Self {
        QuestionSetError::Parse(err)
    }
}

/// The fixed, ordered list of questions every team plays through.
/// Checked once on construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionSetError> {
        if questions.is_empty() {
            return Err(QuestionSetError::Empty);
        }

        for (index, q) in questions.iter().enumerate() {
            if let Err(errors) = q.validate() {
                return Err(QuestionSetError::Invalid {
                    index,
                    reason: errors.to_string(),
                });
            }
            if q.answer >= q.options.len() {
                return Err(QuestionSetError::Invalid {
                    index,
                    reason: format!(
                        "answer index {} out of range for {} options",
                        q.answer,
                        q.options.len()
                    ),
                });
            }
        }

        Ok(Self { questions })
    }

    /// Loads a JSON array of questions from disk.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, QuestionSetError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let questions: Vec<Question> = serde_json::from_str(&raw)?;
        Self::new(questions)
    }

    /// The weekly dashboard quiz.
    pub fn builtin() -> Self {
        let questions = vec![
            Question::new(
                "What was our total sales yesterday?",
                &["$1,500", "$2,350", "$3,250", "$2,800"],
                2,
                Some("sales_dashboard.png"),
            ),
            Question::new(
                "Which drink was our top seller yesterday?",
                &["Green Mile", "Iron Man", "Power Shake", "Pick Me Up"],
                2,
                Some("top_seller.png"),
            ),
            Question::new(
                "What is our current waste percentage?",
                &["2%", "4%", "6%", "3.7%"],
                3,
                Some("waste_dashboard.png"),
            ),
            Question::new(
                "Which hour of the day had the lowest number of customers yesterday?",
                &["8–9 AM", "12–1 PM", "3–4 PM", "6–7 PM"],
                2,
                Some("customer_flow.png"),
            ),
            Question::new(
                "What’s our current average ticket size?",
                &["$10.25", "$11.10", "$12.70", "$13.20"],
                2,
                Some("avg_ticket.png"),
            ),
            Question::new(
                "Which item had the highest waste yesterday?",
                &["Bananas", "Spinach", "Almond Milk", "Chicken"],
                0,
                Some("item_waste.png"),
            ),
            Question::new(
                "Which store region had the highest sales last week?",
                &["UK", "Denmark", "France", "Portugal"],
                1,
                Some("region_sales.png"),
            ),
            Question::new(
                "What’s our current upsell success rate?",
                &["12%", "18%", "22%", "28%"],
                2,
                Some("upsell_rate.png"),
            ),
            Question::new(
                "Which smoothie had the **least** sales yesterday?",
                &["Pick Me Up", "Iron Man", "Green Mile", "Go Away Doc"],
                3,
                Some("low_sellers.png"),
            ),
            Question::new(
                "Which day this week had the highest sales so far?",
                &["Monday", "Wednesday", "Thursday", "Friday"],
                3,
                Some("daily_sales.png"),
            ),
        ];

        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_set_is_valid() {
        let builtin = QuestionSet::builtin();
        assert_eq!(builtin.len(), 10);
        let checked = QuestionSet::new(builtin.iter().cloned().collect());
        assert!(checked.is_ok());
    }

    #[test]
    fn test_rejects_empty_set() {
        assert!(matches!(QuestionSet::new(vec![]), Err(QuestionSetError::Empty)));
    }

    #[test]
    fn test_rejects_out_of_range_answer() {
        let q = Question::new("Pick one", &["A", "B"], 2, None);
        let err = QuestionSet::new(vec![q]).unwrap_err();
        assert!(matches!(err, QuestionSetError::Invalid { index: 0, .. }));
    }

    #[test]
    fn test_rejects_single_option() {
        let q = Question::new("Pick one", &["A"], 0, None);
        assert!(QuestionSet::new(vec![q]).is_err());
    }

    #[test]
    fn test_rejects_empty_text() {
        let q = Question::new("", &["A", "B"], 0, None);
        assert!(QuestionSet::new(vec![q]).is_err());
    }

    #[test]
    fn test_parses_quiz_file_format() {
        let raw = r#"[
            {"question": "2 + 2?", "options": ["3", "4"], "answer": 1},
            {"question": "Sky?", "options": ["Blue", "Green"], "answer": 0, "image": "images/sky.png"}
        ]"#;
        let questions: Vec<Question> = serde_json::from_str(raw).unwrap();
        let set = QuestionSet::new(questions).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0).unwrap().image, None);
        assert_eq!(set.get(1).unwrap().image.as_deref(), Some("images/sky.png"));
        assert!(set.get(0).unwrap().is_correct(1));
    }

    #[test]
    fn test_public_question_hides_answer() {
        let q = Question::new("2 + 2?", &["3", "4"], 1, None);
        let public = PublicQuestion::from_question(0, &q, None);
        let json = serde_json::to_value(&public).unwrap();

        assert_eq!(json["number"], 1);
        assert!(json.get("answer").is_none());
    }
}
