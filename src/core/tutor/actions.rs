use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::prompts::{explain_messages, grading_messages, question_messages};
use super::questions::parse_questions;
use super::{Notice, QuizState, Stage, Tutor};
use crate::core::chat_client::{CompletionError, CompletionRequest};
use crate::core::records::LearningRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    Explain,
    GenerateQuestions,
    Grade,
}

impl RequestPurpose {
    pub fn loading_label(self) -> &'static str {
        match self {
            RequestPurpose::Explain => "Writing an explanation…",
            RequestPurpose::GenerateQuestions => "Preparing quiz questions…",
            RequestPurpose::Grade => "Grading your answer…",
        }
    }

    fn failure_title(self) -> &'static str {
        match self {
            RequestPurpose::Explain => "Explanation failed",
            RequestPurpose::GenerateQuestions => "Quiz generation failed",
            RequestPurpose::Grade => "Grading failed",
        }
    }
}

#[derive(Debug)]
pub enum TutorAction {
    SubmitTopic {
        topic: String,
    },
    ProceedToQuiz,
    SelectOption {
        index: usize,
    },
    EditAnswer {
        text: String,
    },
    SubmitAnswer,
    NextQuestion,
    Reset,
    DismissNotice,
    CompletionFinished {
        request_id: u64,
        result: Result<String, CompletionError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TutorCommand {
    Complete {
        request_id: u64,
        purpose: RequestPurpose,
        request: CompletionRequest,
    },
}

/// Sends actions back to the event loop from background tasks.
#[derive(Clone)]
pub struct TutorActionDispatcher {
    tx: mpsc::UnboundedSender<TutorAction>,
}

impl TutorActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<TutorAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: TutorAction) {
        let _ = self.tx.send(action);
    }
}

pub fn apply_actions(
    tutor: &mut Tutor,
    actions: impl IntoIterator<Item = TutorAction>,
) -> Vec<TutorCommand> {
    actions
        .into_iter()
        .filter_map(|action| apply_action(tutor, action))
        .collect()
}

pub fn apply_action(tutor: &mut Tutor, action: TutorAction) -> Option<TutorCommand> {
    match action {
        TutorAction::CompletionFinished { request_id, result } => {
            if !tutor.is_current_request(request_id) {
                debug!(request_id, "dropping stale completion");
                return None;
            }
            handle_completion(tutor, result);
            None
        }
        TutorAction::Reset => {
            info!(stage = ?tutor.stage, "flow reset");
            tutor.reset();
            None
        }
        TutorAction::DismissNotice => {
            tutor.dismiss_notice();
            None
        }
        // One request at a time; everything else waits for it.
        _ if tutor.is_loading() => None,
        TutorAction::SubmitTopic { topic } => submit_topic(tutor, topic),
        TutorAction::ProceedToQuiz => proceed_to_quiz(tutor),
        TutorAction::SelectOption { index } => {
            select_option(tutor, index);
            None
        }
        TutorAction::EditAnswer { text } => {
            if let Some(quiz) = open_quiz(tutor) {
                quiz.answer = text;
            }
            None
        }
        TutorAction::SubmitAnswer => submit_answer(tutor),
        TutorAction::NextQuestion => {
            next_question(tutor);
            None
        }
    }
}

/// The quiz, if it is still accepting an answer for the current question.
fn open_quiz(tutor: &mut Tutor) -> Option<&mut QuizState> {
    if tutor.stage != Stage::Quiz {
        return None;
    }
    tutor.quiz.as_mut().filter(|quiz| quiz.verdict.is_none())
}

fn submit_topic(tutor: &mut Tutor, topic: String) -> Option<TutorCommand> {
    if tutor.stage != Stage::Input {
        return None;
    }
    if topic.trim().is_empty() {
        tutor.push_notice(Notice::validation("Enter a topic to learn about"));
        return None;
    }

    debug!(topic = %topic.trim(), "requesting explanation");
    let messages = explain_messages(&topic);
    tutor.topic = topic;
    let max_tokens = tutor.sampling.max_tokens;
    Some(tutor.begin_request(RequestPurpose::Explain, messages, max_tokens))
}

fn proceed_to_quiz(tutor: &mut Tutor) -> Option<TutorCommand> {
    if tutor.stage != Stage::Explanation {
        return None;
    }
    debug!(topic = %tutor.topic.trim(), "requesting quiz");
    let messages = question_messages(&tutor.topic);
    let max_tokens = tutor.sampling.max_tokens;
    Some(tutor.begin_request(RequestPurpose::GenerateQuestions, messages, max_tokens))
}

fn select_option(tutor: &mut Tutor, index: usize) {
    let Some(quiz) = open_quiz(tutor) else {
        return;
    };
    let question = quiz.current();
    if question.is_multiple_choice() && index < question.options.len() {
        quiz.selected_option = Some(index);
    }
}

fn submit_answer(tutor: &mut Tutor) -> Option<TutorCommand> {
    let quiz = open_quiz(tutor)?;
    let answer = quiz.answer().to_string();
    if answer.trim().is_empty() {
        let prompt = if quiz.current().is_multiple_choice() {
            "Choose an option first"
        } else {
            "Type an answer first"
        };
        tutor.push_notice(Notice::validation(prompt));
        return None;
    }

    debug!(question = quiz.current_index, "requesting grade");
    let messages = grading_messages(quiz.current(), &answer);
    let max_tokens = tutor.sampling.grading_max_tokens;
    Some(tutor.begin_request(RequestPurpose::Grade, messages, max_tokens))
}

fn next_question(tutor: &mut Tutor) {
    if tutor.stage != Stage::Quiz {
        return;
    }
    let Some(quiz) = tutor.quiz.as_mut() else {
        return;
    };
    if quiz.verdict.is_none() || quiz.advance() {
        return;
    }

    let score = quiz.score();
    let topic = tutor.topic.trim().to_string();
    info!(topic = %topic, score, "quiz complete");
    tutor.records.append(LearningRecord::new(topic, score));
    tutor.last_score = Some(score);
    tutor.stage = Stage::Complete;
    tutor.push_notice(Notice::info("Quiz complete!", format!("Your score: {score}")));
}

fn handle_completion(tutor: &mut Tutor, result: Result<String, CompletionError>) {
    let Some(pending) = tutor.pending.take() else {
        return;
    };

    let text = match result {
        Ok(text) => text,
        Err(err) => {
            warn!(purpose = ?pending.purpose, error = %err, "completion failed");
            tutor.push_notice(Notice::error(
                pending.purpose.failure_title(),
                err.to_string(),
            ));
            return;
        }
    };

    match pending.purpose {
        RequestPurpose::Explain => {
            tutor.explanation = text;
            tutor.stage = Stage::Explanation;
        }
        RequestPurpose::GenerateQuestions => match parse_questions(&text) {
            Ok(questions) => match QuizState::new(questions) {
                Some(quiz) => {
                    debug!(count = quiz.questions.len(), "quiz ready");
                    tutor.quiz = Some(quiz);
                    tutor.stage = Stage::Quiz;
                }
                None => malformed_quiz(tutor, "quiz contains no questions".to_string()),
            },
            Err(err) => malformed_quiz(tutor, err.to_string()),
        },
        RequestPurpose::Grade => {
            let Some(quiz) = tutor.quiz.as_mut() else {
                return;
            };
            let verdict = tutor.grader.grade(quiz.current(), &text);
            debug!(question = quiz.current_index, correct = verdict.is_correct, "graded");
            quiz.record_verdict(verdict);
        }
    }
}

fn malformed_quiz(tutor: &mut Tutor, reason: String) {
    let err = CompletionError::MalformedResponse(reason);
    warn!(error = %err, "rejecting generated quiz");
    tutor.push_notice(Notice::error(
        RequestPurpose::GenerateQuestions.failure_title(),
        format!("{err}. Try again."),
    ));
}
