//! Screen state around the tutor: the input box, scroll position, and the
//! mapping from key presses to [`TutorAction`]s.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

use crate::core::tutor::{Stage, Tutor, TutorAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
    ChangeSettings,
}

pub struct TutorScreen {
    pub tutor: Tutor,
    pub input: TextArea<'static>,
    pub scroll: u16,
    pub spinner_frame: usize,
    view_key: (Stage, usize),
}

fn input_box(title: &'static str) -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_cursor_line_style(Style::default());
    input.set_block(Block::default().borders(Borders::ALL).title(title));
    input
}

fn input_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Quiz => " Your answer ",
        _ => " What do you want to learn? ",
    }
}

impl TutorScreen {
    pub fn new(tutor: Tutor) -> Self {
        let view_key = Self::view_key_of(&tutor);
        Self {
            input: input_box(input_title(view_key.0)),
            tutor,
            scroll: 0,
            spinner_frame: 0,
            view_key,
        }
    }

    fn view_key_of(tutor: &Tutor) -> (Stage, usize) {
        (
            tutor.stage(),
            tutor.quiz().map(|quiz| quiz.current_index()).unwrap_or(0),
        )
    }

    /// Reset scroll and input whenever the stage or the question changes.
    pub fn sync_view(&mut self) {
        let key = Self::view_key_of(&self.tutor);
        if key != self.view_key {
            self.view_key = key;
            self.scroll = 0;
            self.input = input_box(input_title(key.0));
        }
    }

    /// Whether the input box is part of the current view.
    pub fn input_visible(&self) -> bool {
        match self.tutor.stage() {
            Stage::Input => true,
            Stage::Quiz => self
                .tutor
                .quiz()
                .is_some_and(|quiz| !quiz.current().is_multiple_choice() && quiz.verdict().is_none()),
            _ => false,
        }
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn insert_text(&mut self, text: &str) {
        if !self.input_visible() {
            return;
        }
        let single_line: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
            .filter(|c| !c.is_control())
            .collect();
        self.input.insert_str(single_line);
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = i32::from(self.scroll) + delta;
        self.scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }

    /// Translate one key press. Actions are returned, not applied.
    pub fn handle_key(&mut self, key: KeyEvent) -> (KeyOutcome, Vec<TutorAction>) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return (KeyOutcome::Quit, Vec::new()),
            KeyCode::Char('s') if ctrl => return (KeyOutcome::ChangeSettings, Vec::new()),
            KeyCode::Char('r') if ctrl => {
                self.input = input_box(input_title(Stage::Input));
                return (KeyOutcome::Continue, vec![TutorAction::Reset]);
            }
            KeyCode::Esc => return (KeyOutcome::Continue, vec![TutorAction::DismissNotice]),
            KeyCode::PageUp => {
                self.scroll_by(-5);
                return (KeyOutcome::Continue, Vec::new());
            }
            KeyCode::PageDown => {
                self.scroll_by(5);
                return (KeyOutcome::Continue, Vec::new());
            }
            _ => {}
        }

        let actions = match self.tutor.stage() {
            Stage::Input => self.handle_text_key(key, |text| TutorAction::SubmitTopic { topic: text }),
            Stage::Explanation => self.handle_reading_key(key, TutorAction::ProceedToQuiz),
            Stage::Quiz => self.handle_quiz_key(key),
            Stage::Complete => self.handle_reading_key(key, TutorAction::Reset),
        };
        (KeyOutcome::Continue, actions)
    }

    fn handle_reading_key(&mut self, key: KeyEvent, on_enter: TutorAction) -> Vec<TutorAction> {
        match key.code {
            KeyCode::Enter => vec![on_enter],
            KeyCode::Up => {
                self.scroll_by(-1);
                Vec::new()
            }
            KeyCode::Down => {
                self.scroll_by(1);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_text_key<F>(&mut self, key: KeyEvent, on_enter: F) -> Vec<TutorAction>
    where
        F: FnOnce(String) -> TutorAction,
    {
        if key.code == KeyCode::Enter {
            return vec![on_enter(self.input_text())];
        }
        self.input.input(tui_textarea::Input::from(key));
        Vec::new()
    }

    fn handle_quiz_key(&mut self, key: KeyEvent) -> Vec<TutorAction> {
        let Some(quiz) = self.tutor.quiz() else {
            return Vec::new();
        };

        if quiz.verdict().is_some() {
            return self.handle_reading_key(key, TutorAction::NextQuestion);
        }

        if !quiz.current().is_multiple_choice() {
            return self.handle_text_key(key, |text| TutorAction::EditAnswer { text })
                .into_iter()
                .chain(
                    (key.code == KeyCode::Enter)
                        .then_some(TutorAction::SubmitAnswer),
                )
                .collect();
        }

        let option_count = quiz.current().options.len();
        let selected = quiz.selected_option();
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let digit = c.to_digit(10).unwrap_or(0) as usize;
                if digit == 0 {
                    Vec::new()
                } else {
                    vec![TutorAction::SelectOption { index: digit - 1 }]
                }
            }
            KeyCode::Up => {
                let index = selected.map_or(option_count.saturating_sub(1), |i| i.saturating_sub(1));
                vec![TutorAction::SelectOption { index }]
            }
            KeyCode::Down => {
                let index = selected.map_or(0, |i| (i + 1).min(option_count.saturating_sub(1)));
                vec![TutorAction::SelectOption { index }]
            }
            KeyCode::Enter => vec![TutorAction::SubmitAnswer],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::Settings;
    use crate::core::tutor::{apply_actions, Sampling, TutorCommand};

    const QUIZ_JSON: &str = r#"[
      {"id": "1", "question": "Pick one", "type": "multiple-choice",
       "options": ["a", "b", "c"], "correctAnswer": "b"},
      {"id": "2", "question": "Explain", "type": "short-answer", "correctAnswer": "x"}
    ]"#;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn screen() -> TutorScreen {
        TutorScreen::new(Tutor::new(
            Settings {
                model: "m".to_string(),
            },
            Sampling::default(),
        ))
    }

    /// Apply actions and answer any request immediately with `reply`.
    fn drive(screen: &mut TutorScreen, actions: Vec<TutorAction>, reply: &str) {
        let commands = apply_actions(&mut screen.tutor, actions);
        for command in commands {
            let TutorCommand::Complete { request_id, .. } = command;
            apply_actions(
                &mut screen.tutor,
                [TutorAction::CompletionFinished {
                    request_id,
                    result: Ok(reply.to_string()),
                }],
            );
        }
        screen.sync_view();
    }

    fn type_text(screen: &mut TutorScreen, text: &str) {
        for c in text.chars() {
            let (_, actions) = screen.handle_key(key(KeyCode::Char(c)));
            assert!(actions.is_empty());
        }
    }

    fn screen_in_quiz() -> TutorScreen {
        let mut screen = screen();
        type_text(&mut screen, "graphs");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, "explained");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, QUIZ_JSON);
        assert_eq!(screen.tutor.stage(), Stage::Quiz);
        screen
    }

    #[test]
    fn typing_then_enter_submits_the_topic() {
        let mut screen = screen();
        type_text(&mut screen, "recursion");
        assert_eq!(screen.input_text(), "recursion");

        let (outcome, actions) = screen.handle_key(key(KeyCode::Enter));
        assert_eq!(outcome, KeyOutcome::Continue);
        assert!(matches!(
            actions.as_slice(),
            [TutorAction::SubmitTopic { topic }] if topic == "recursion"
        ));
    }

    #[test]
    fn control_keys_map_to_session_outcomes() {
        let mut screen = screen();
        assert_eq!(screen.handle_key(ctrl('c')).0, KeyOutcome::Quit);
        assert_eq!(screen.handle_key(ctrl('s')).0, KeyOutcome::ChangeSettings);

        type_text(&mut screen, "abc");
        let (_, actions) = screen.handle_key(ctrl('r'));
        assert!(matches!(actions.as_slice(), [TutorAction::Reset]));
        assert_eq!(screen.input_text(), "");
    }

    #[test]
    fn digits_and_arrows_select_options() {
        let mut screen = screen_in_quiz();
        assert!(!screen.input_visible());

        let (_, actions) = screen.handle_key(key(KeyCode::Char('2')));
        drive(&mut screen, actions, "");
        assert_eq!(screen.tutor.quiz().and_then(|q| q.selected_option()), Some(1));

        let (_, actions) = screen.handle_key(key(KeyCode::Down));
        drive(&mut screen, actions, "");
        assert_eq!(screen.tutor.quiz().and_then(|q| q.selected_option()), Some(2));

        let (_, actions) = screen.handle_key(key(KeyCode::Down));
        drive(&mut screen, actions, "");
        assert_eq!(screen.tutor.quiz().and_then(|q| q.selected_option()), Some(2));

        let (_, actions) = screen.handle_key(key(KeyCode::Char('0')));
        assert!(actions.is_empty());
    }

    #[test]
    fn free_text_answers_are_sent_with_enter() {
        let mut screen = screen_in_quiz();
        let (_, actions) = screen.handle_key(key(KeyCode::Char('1')));
        drive(&mut screen, actions, "");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, "正确性：正确");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, "");

        assert_eq!(screen.tutor.quiz().map(|q| q.current_index()), Some(1));
        assert!(screen.input_visible());

        type_text(&mut screen, "edges");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            actions.as_slice(),
            [TutorAction::EditAnswer { text }, TutorAction::SubmitAnswer] if text == "edges"
        ));
    }

    #[test]
    fn enter_on_complete_starts_over() {
        let mut screen = screen_in_quiz();
        for reply in ["正确性：正确", "正确性：错误"] {
            if screen
                .tutor
                .quiz()
                .is_some_and(|q| q.current().is_multiple_choice())
            {
                let (_, actions) = screen.handle_key(key(KeyCode::Char('1')));
                drive(&mut screen, actions, "");
            } else {
                type_text(&mut screen, "answer");
            }
            let (_, actions) = screen.handle_key(key(KeyCode::Enter));
            drive(&mut screen, actions, reply);
            let (_, actions) = screen.handle_key(key(KeyCode::Enter));
            drive(&mut screen, actions, "");
        }
        assert_eq!(screen.tutor.stage(), Stage::Complete);
        assert_eq!(screen.tutor.last_score(), Some(50));

        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, "");
        assert_eq!(screen.tutor.stage(), Stage::Input);
        assert_eq!(screen.tutor.records().len(), 1);
    }

    #[test]
    fn stage_changes_reset_scroll_and_input() {
        let mut screen = screen();
        type_text(&mut screen, "sets");
        let (_, actions) = screen.handle_key(key(KeyCode::Enter));
        drive(&mut screen, actions, "explained");

        screen.handle_key(key(KeyCode::Down));
        screen.handle_key(key(KeyCode::PageDown));
        assert_eq!(screen.scroll, 6);
        screen.handle_key(key(KeyCode::PageUp));
        screen.handle_key(key(KeyCode::PageUp));
        assert_eq!(screen.scroll, 0);

        screen.handle_key(key(KeyCode::Down));
        let (_, actions) = screen.handle_key(ctrl('r'));
        drive(&mut screen, actions, "");
        assert_eq!(screen.scroll, 0);
        assert_eq!(screen.input_text(), "");
    }

    #[test]
    fn pasted_text_is_flattened_to_one_line() {
        let mut screen = screen();
        screen.insert_text("binary\nsearch\ttrees");
        assert_eq!(screen.input_text(), "binary search trees");
    }
}
