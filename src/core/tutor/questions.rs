//! Strict schema for the quiz the model is asked to produce.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    FillInBlank,
    ShortAnswer,
}

impl QuestionKind {
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple choice",
            QuestionKind::FillInBlank => "fill in the blank",
            QuestionKind::ShortAnswer => "short answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Empty unless `kind` is multiple choice.
    pub options: Vec<String>,
    pub correct_answer: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }
}

/// Models emit ids and answers as either strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(text) => text,
            Scalar::Integer(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WireQuestion {
    id: Scalar,
    question: String,
    #[serde(rename = "type")]
    kind: QuestionKind,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(rename = "correctAnswer")]
    correct_answer: Scalar,
}

#[derive(Debug)]
pub enum QuestionParseError {
    NotJson(serde_json::Error),
    Empty,
    Invalid { index: usize, reason: &'static str },
}

impl fmt::Display for QuestionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionParseError::NotJson(err) => {
                write!(f, "quiz is not a JSON array of questions: {err}")
            }
            QuestionParseError::Empty => write!(f, "quiz contains no questions"),
            QuestionParseError::Invalid { index, reason } => {
                write!(f, "question {} is invalid: {reason}", index + 1)
            }
        }
    }
}

impl std::error::Error for QuestionParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QuestionParseError::NotJson(err) => Some(err),
            _ => None,
        }
    }
}

/// Drop a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Skip the info string (`json`) on the opening fence line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

pub fn parse_questions(text: &str) -> Result<Vec<Question>, QuestionParseError> {
    let wire: Vec<WireQuestion> =
        serde_json::from_str(strip_code_fence(text)).map_err(QuestionParseError::NotJson)?;
    if wire.is_empty() {
        return Err(QuestionParseError::Empty);
    }

    wire.into_iter()
        .enumerate()
        .map(|(index, raw)| validate(index, raw))
        .collect()
}

fn validate(index: usize, raw: WireQuestion) -> Result<Question, QuestionParseError> {
    let invalid = |reason| QuestionParseError::Invalid { index, reason };

    let question = raw.question.trim().to_string();
    if question.is_empty() {
        return Err(invalid("empty question text"));
    }
    let correct_answer = raw.correct_answer.into_string().trim().to_string();
    if correct_answer.is_empty() {
        return Err(invalid("empty correctAnswer"));
    }

    let options: Vec<String> = raw
        .options
        .unwrap_or_default()
        .into_iter()
        .map(|option| option.trim().to_string())
        .filter(|option| !option.is_empty())
        .collect();

    let options = match raw.kind {
        QuestionKind::MultipleChoice if options.len() < 2 => {
            return Err(invalid("multiple-choice question needs at least two options"));
        }
        QuestionKind::MultipleChoice => options,
        _ => Vec::new(),
    };

    Ok(Question {
        id: raw.id.into_string(),
        question,
        options,
        correct_answer,
        kind: raw.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = r#"[
      {"id": "1", "question": "What stops a recursive function?", "type": "multiple-choice",
       "options": ["A base case", "A loop", "A stack overflow", "A return type"],
       "correctAnswer": "A base case"},
      {"id": 2, "question": "Name a problem solved naturally by recursion.", "type": "short-answer",
       "correctAnswer": "Tree traversal"}
    ]"#;

    #[test]
    fn parses_questions_in_the_requested_shape() {
        let questions = parse_questions(TWO_QUESTIONS).expect("valid quiz");
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "1");
        assert!(questions[0].is_multiple_choice());
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[1].id, "2");
        assert_eq!(questions[1].kind, QuestionKind::ShortAnswer);
        assert!(questions[1].options.is_empty());
        assert_eq!(questions[1].correct_answer, "Tree traversal");
    }

    #[test]
    fn tolerates_surrounding_code_fence() {
        let fenced = format!("```json\n{TWO_QUESTIONS}\n```\n");
        assert_eq!(parse_questions(&fenced).unwrap().len(), 2);
        let bare = format!("```\n{TWO_QUESTIONS}```");
        assert_eq!(parse_questions(&bare).unwrap().len(), 2);
    }

    #[test]
    fn rejects_prose_and_non_arrays() {
        assert!(matches!(
            parse_questions("Sure! Here are two questions: ..."),
            Err(QuestionParseError::NotJson(_))
        ));
        assert!(matches!(
            parse_questions(r#"{"questions": []}"#),
            Err(QuestionParseError::NotJson(_))
        ));
        assert!(matches!(parse_questions("[]"), Err(QuestionParseError::Empty)));
    }

    #[test]
    fn rejects_missing_fields_and_unknown_types() {
        let missing_answer = r#"[{"id": "1", "question": "q", "type": "short-answer"}]"#;
        assert!(matches!(
            parse_questions(missing_answer),
            Err(QuestionParseError::NotJson(_))
        ));

        let unknown_type =
            r#"[{"id": "1", "question": "q", "type": "essay", "correctAnswer": "a"}]"#;
        assert!(matches!(
            parse_questions(unknown_type),
            Err(QuestionParseError::NotJson(_))
        ));
    }

    #[test]
    fn rejects_multiple_choice_without_options() {
        let quiz = r#"[{"id": "1", "question": "q", "type": "multiple-choice",
                        "options": ["only one", "  "], "correctAnswer": "only one"}]"#;
        let err = parse_questions(quiz).expect_err("too few options");
        assert!(matches!(err, QuestionParseError::Invalid { index: 0, .. }));
        assert_eq!(
            err.to_string(),
            "question 1 is invalid: multiple-choice question needs at least two options"
        );
    }

    #[test]
    fn rejects_blank_question_text() {
        let quiz = r#"[{"id": "1", "question": "   ", "type": "fill-in-blank", "correctAnswer": "x"}]"#;
        assert!(matches!(
            parse_questions(quiz),
            Err(QuestionParseError::Invalid { index: 0, .. })
        ));
    }

    #[test]
    fn numeric_answers_become_text() {
        let quiz = r#"[{"id": 7, "question": "2 + 2 = ?", "type": "fill-in-blank", "correctAnswer": 4}]"#;
        let questions = parse_questions(quiz).unwrap();
        assert_eq!(questions[0].id, "7");
        assert_eq!(questions[0].correct_answer, "4");
    }
}
