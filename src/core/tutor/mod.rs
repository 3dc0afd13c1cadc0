//! The tutoring flow: Input → Explanation → Quiz → Complete.
//!
//! [`Tutor`] is plain state. It never performs I/O; every transition that
//! needs the model returns a [`TutorCommand`] from [`apply_action`] and the
//! caller feeds the outcome back as [`TutorAction::CompletionFinished`].

pub mod actions;
pub mod grading;
pub mod prompts;
pub mod questions;


use std::collections::VecDeque;

pub use actions::{
    apply_action, apply_actions, RequestPurpose, TutorAction, TutorActionDispatcher,
    TutorCommand,
};
pub use grading::{Grader, StringMatchGrader, Verdict};
pub use questions::{parse_questions, Question, QuestionKind, QuestionParseError};

use crate::api::ChatMessage;
use crate::core::chat_client::CompletionRequest;
use crate::core::config::data::{
    Config, DEFAULT_GRADING_MAX_TOKENS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::core::records::RecordStore;
use crate::core::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Explanation,
    Quiz,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
    pub grading_max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            grading_max_tokens: DEFAULT_GRADING_MAX_TOKENS,
        }
    }
}

impl Sampling {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            grading_max_tokens: config.grading_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Validation,
    Error,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub detail: Option<String>,
}

impl Notice {
    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn validation(title: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Validation,
            title: title.into(),
            detail: None,
        }
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuizState {
    questions: Vec<Question>,
    current_index: usize,
    answer: String,
    selected_option: Option<usize>,
    verdict: Option<Verdict>,
    verdicts: Vec<bool>,
}

impl QuizState {
    /// `None` for an empty quiz; a quiz always has a current question.
    pub fn new(questions: Vec<Question>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            questions,
            current_index: 0,
            answer: String::new(),
            selected_option: None,
            verdict: None,
            verdicts: Vec::new(),
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn typed_answer(&self) -> &str {
        &self.answer
    }

    /// The answer that would be graded: the chosen option for multiple
    /// choice, the typed text otherwise.
    pub fn answer(&self) -> &str {
        let question = self.current();
        if question.is_multiple_choice() {
            self.selected_option
                .and_then(|index| question.options.get(index))
                .map(String::as_str)
                .unwrap_or("")
        } else {
            &self.answer
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn correct_count(&self) -> usize {
        self.verdicts.iter().filter(|correct| **correct).count()
    }

    /// Percentage of questions judged correct.
    pub fn score(&self) -> u8 {
        let total = self.questions.len();
        let percent = (self.correct_count() as f64 / total as f64 * 100.0).round();
        percent.clamp(0.0, 100.0) as u8
    }

    fn record_verdict(&mut self, verdict: Verdict) {
        self.verdicts.push(verdict.is_correct);
        self.verdict = Some(verdict);
    }

    /// Move to the next question. Returns false on the last one.
    fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current_index += 1;
        self.answer.clear();
        self.selected_option = None;
        self.verdict = None;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRequest {
    id: u64,
    purpose: RequestPurpose,
}

pub struct Tutor {
    settings: Settings,
    sampling: Sampling,
    grader: Box<dyn Grader>,
    stage: Stage,
    topic: String,
    explanation: String,
    quiz: Option<QuizState>,
    last_score: Option<u8>,
    pending: Option<PendingRequest>,
    next_request_id: u64,
    notices: VecDeque<Notice>,
    records: RecordStore,
}

impl Tutor {
    /// A tutor can only exist once settings have been resolved.
    pub fn new(settings: Settings, sampling: Sampling) -> Self {
        Self {
            settings,
            sampling,
            grader: Box::new(StringMatchGrader),
            stage: Stage::Input,
            topic: String::new(),
            explanation: String::new(),
            quiz: None,
            last_score: None,
            pending: None,
            next_request_id: 1,
            notices: VecDeque::new(),
            records: RecordStore::new(),
        }
    }

    pub fn with_grader(mut self, grader: Box<dyn Grader>) -> Self {
        self.grader = grader;
        self
    }

    /// Carry records over from an earlier session in the same process.
    pub fn with_records(mut self, records: RecordStore) -> Self {
        self.records = records;
        self
    }

    pub fn into_records(self) -> RecordStore {
        self.records
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn quiz(&self) -> Option<&QuizState> {
        self.quiz.as_ref()
    }

    pub fn last_score(&self) -> Option<u8> {
        self.last_score
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_purpose(&self) -> Option<RequestPurpose> {
        self.pending.map(|pending| pending.purpose)
    }

    pub fn is_current_request(&self, request_id: u64) -> bool {
        self.pending
            .is_some_and(|pending| pending.id == request_id)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.back() != Some(&notice) {
            self.notices.push_back(notice);
        }
    }

    fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    fn begin_request(
        &mut self,
        purpose: RequestPurpose,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> TutorCommand {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some(PendingRequest {
            id: request_id,
            purpose,
        });
        self.notices.retain(|notice| notice.kind == NoticeKind::Info);

        TutorCommand::Complete {
            request_id,
            purpose,
            request: CompletionRequest {
                model: self.settings.model.clone(),
                messages,
                temperature: self.sampling.temperature,
                max_tokens,
            },
        }
    }

    /// Back to Input. Records survive; an in-flight request is orphaned.
    fn reset(&mut self) {
        self.stage = Stage::Input;
        self.topic.clear();
        self.explanation.clear();
        self.quiz = None;
        self.last_score = None;
        self.pending = None;
        self.notices.clear();
    }
}
