//! Terminal event loop for a tutoring session.
//!
//! Key presses become [`TutorAction`]s applied on this loop's turn. Completion
//! requests run on Tokio tasks and report back through the action channel, so
//! the tutor itself is only ever touched here.

use std::{error::Error, sync::Arc, time::Duration};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::chat_client::ChatCompletion;
use crate::core::records::RecordStore;
use crate::core::tutor::{
    apply_actions, Tutor, TutorAction, TutorActionDispatcher, TutorCommand,
};
use crate::ui::lifecycle::{restore_terminal, setup_terminal};
use crate::ui::renderer::ui;
use crate::ui::screen::{KeyOutcome, TutorScreen};

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Quit,
    ChangeSettings,
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub(crate) fn spawn_completion(
    client: Arc<dyn ChatCompletion>,
    dispatcher: TutorActionDispatcher,
    command: TutorCommand,
) {
    match command {
        TutorCommand::Complete {
            request_id,
            purpose,
            request,
        } => {
            tokio::spawn(async move {
                debug!(request_id, ?purpose, model = %request.model, "completion started");
                let result = client.complete(request).await;
                dispatcher.dispatch(TutorAction::CompletionFinished { request_id, result });
            });
        }
    }
}

fn apply_and_spawn(
    screen: &mut TutorScreen,
    actions: Vec<TutorAction>,
    client: &Arc<dyn ChatCompletion>,
    dispatcher: &TutorActionDispatcher,
) {
    if actions.is_empty() {
        return;
    }
    for command in apply_actions(&mut screen.tutor, actions) {
        spawn_completion(Arc::clone(client), dispatcher.clone(), command);
    }
    screen.sync_view();
}

/// Run the TUI until the user quits or asks to change settings. The
/// session's records are handed back so they outlive a settings change.
pub async fn run_tutor(
    tutor: Tutor,
    client: Arc<dyn ChatCompletion>,
) -> Result<(SessionExit, RecordStore), Box<dyn Error>> {
    let mut screen = TutorScreen::new(tutor);

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<TutorAction>();
    let dispatcher = TutorActionDispatcher::new(action_tx);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut terminal = setup_terminal()?;
    let event_reader_handle = spawn_event_reader(event_tx);

    let mut tick = tokio::time::interval(Duration::from_millis(250));

    let result: Result<SessionExit, Box<dyn Error>> = 'main_loop: loop {
        if let Err(err) = terminal.draw(|f| ui(f, &screen)) {
            break 'main_loop Err(err.into());
        }

        tokio::select! {
            Some(ev) = event_rx.recv() => {
                match ev {
                    UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        let (outcome, actions) = screen.handle_key(key);
                        match outcome {
                            KeyOutcome::Quit => break 'main_loop Ok(SessionExit::Quit),
                            KeyOutcome::ChangeSettings => {
                                break 'main_loop Ok(SessionExit::ChangeSettings)
                            }
                            KeyOutcome::Continue => {
                                apply_and_spawn(&mut screen, actions, &client, &dispatcher);
                            }
                        }
                    }
                    UiEvent::Crossterm(Event::Paste(text)) => screen.insert_text(&text),
                    UiEvent::Crossterm(_) => {}
                }
            }
            Some(action) = action_rx.recv() => {
                apply_and_spawn(&mut screen, vec![action], &client, &dispatcher);
            }
            _ = tick.tick() => {
                if screen.tutor.is_loading() {
                    screen.spinner_frame = screen.spinner_frame.wrapping_add(1);
                }
            }
        }
    };

    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    let exit = result?;
    Ok((exit, screen.tutor.into_records()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_client::{CompletionError, CompletionRequest};
    use crate::core::settings::Settings;
    use crate::core::tutor::{RequestPurpose, Sampling, Stage};
    use async_trait::async_trait;

    struct EchoClient;

    #[async_trait]
    impl ChatCompletion for EchoClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            Ok(format!("explained with {}", request.model))
        }
    }

    #[tokio::test]
    async fn spawned_completion_reports_back_with_its_request_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = TutorActionDispatcher::new(tx);
        let mut tutor = Tutor::new(
            Settings {
                model: "m1".to_string(),
            },
            Sampling::default(),
        );

        let commands = apply_actions(
            &mut tutor,
            [TutorAction::SubmitTopic {
                topic: "ownership".to_string(),
            }],
        );
        assert_eq!(commands.len(), 1);
        let client: Arc<dyn ChatCompletion> = Arc::new(EchoClient);
        for command in commands {
            spawn_completion(Arc::clone(&client), dispatcher.clone(), command);
        }

        let action = rx.recv().await.expect("completion action");
        assert!(matches!(
            &action,
            TutorAction::CompletionFinished { request_id: 1, result: Ok(text) } if text == "explained with m1"
        ));
        assert_eq!(tutor.pending_purpose(), Some(RequestPurpose::Explain));

        apply_actions(&mut tutor, [action]);
        assert_eq!(tutor.stage(), Stage::Explanation);
        assert_eq!(tutor.explanation(), "explained with m1");
    }
}
