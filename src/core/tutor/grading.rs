use super::questions::Question;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_correct: bool,
    /// Text shown to the student, usually the model's reply as-is.
    pub feedback: String,
}

/// Turns the grading model's reply into a verdict.
pub trait Grader: Send + Sync {
    fn grade(&self, question: &Question, response: &str) -> Verdict;
}

/// Looks for the `正确性：` line the grading prompt asks for. A partially
/// correct answer counts as correct.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringMatchGrader;

const CORRECT_MARKERS: [&str; 2] = ["正确性：正确", "正确性：部分正确"];

impl Grader for StringMatchGrader {
    fn grade(&self, _question: &Question, response: &str) -> Verdict {
        Verdict {
            is_correct: CORRECT_MARKERS
                .iter()
                .any(|marker| response.contains(marker)),
            feedback: response.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tutor::questions::QuestionKind;

    fn question() -> Question {
        Question {
            id: "1".to_string(),
            question: "q".to_string(),
            options: Vec::new(),
            correct_answer: "a".to_string(),
            kind: QuestionKind::ShortAnswer,
        }
    }

    fn grade(response: &str) -> bool {
        StringMatchGrader.grade(&question(), response).is_correct
    }

    #[test]
    fn correct_and_partially_correct_count_as_correct() {
        assert!(grade("正确性：正确\n反馈：很好"));
        assert!(grade("正确性：部分正确\n反馈：还差一点"));
        assert!(grade(&format!("正确性：正确\n反馈：{}", "很".repeat(5000))));
    }

    #[test]
    fn anything_else_counts_as_wrong() {
        assert!(!grade("正确性：错误\n反馈：再想想"));
        assert!(!grade("正确性: 正确"));
        assert!(!grade("Correct!"));
        assert!(!grade(""));
    }

    #[test]
    fn feedback_is_the_trimmed_reply() {
        let verdict = StringMatchGrader.grade(&question(), "\n正确性：错误\n反馈：x\n");
        assert_eq!(verdict.feedback, "正确性：错误\n反馈：x");
    }
}
