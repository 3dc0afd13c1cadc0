//! One-shot explanation printed to stdout, without the full-screen UI.
//!
//! Runs the same tutor state machine as the interactive session, just for
//! the first stage.

use std::error::Error;
use std::sync::Arc;

use crate::core::chat_client::ChatCompletion;
use crate::core::settings::Settings;
use crate::core::tutor::{
    apply_actions, NoticeKind, Sampling, Stage, Tutor, TutorAction, TutorCommand,
};

/// Explain `topic` and return the text, or the tutor's error notice.
pub async fn explain_topic(
    client: Arc<dyn ChatCompletion>,
    settings: Settings,
    sampling: Sampling,
    topic: &str,
) -> Result<String, Box<dyn Error>> {
    let mut tutor = Tutor::new(settings, sampling);
    let mut pending = apply_actions(
        &mut tutor,
        [TutorAction::SubmitTopic {
            topic: topic.to_string(),
        }],
    );

    while let Some(TutorCommand::Complete {
        request_id,
        request,
        ..
    }) = pending.pop()
    {
        let result = client.complete(request).await;
        pending.extend(apply_actions(
            &mut tutor,
            [TutorAction::CompletionFinished { request_id, result }],
        ));
    }

    if tutor.stage() == Stage::Explanation {
        return Ok(tutor.explanation().to_string());
    }
    let message = tutor
        .notices()
        .find(|notice| notice.kind != NoticeKind::Info)
        .map(|notice| match &notice.detail {
            Some(detail) => format!("{}: {detail}", notice.title),
            None => notice.title.clone(),
        })
        .unwrap_or_else(|| "No explanation received".to_string());
    Err(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_client::{CompletionError, CompletionRequest};
    use async_trait::async_trait;

    struct FixedReply(Result<String, u16>);

    #[async_trait]
    impl ChatCompletion for FixedReply {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            assert_eq!(request.model, "Qwen/QwQ-32B");
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::Transport {
                    status: Some(*status),
                    body: "upstream unavailable".to_string(),
                }),
            }
        }
    }

    fn settings() -> Settings {
        Settings {
            model: "Qwen/QwQ-32B".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_the_explanation_text() {
        let client = Arc::new(FixedReply(Ok("A closure captures its environment.".into())));
        let text = explain_topic(client, settings(), Sampling::default(), "closures")
            .await
            .expect("explanation");
        assert_eq!(text, "A closure captures its environment.");
    }

    #[tokio::test]
    async fn surfaces_the_failure_notice() {
        let client = Arc::new(FixedReply(Err(503)));
        let err = explain_topic(client, settings(), Sampling::default(), "closures")
            .await
            .expect_err("failure");
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_without_a_request() {
        let client = Arc::new(FixedReply(Ok("unused".into())));
        assert!(explain_topic(client, settings(), Sampling::default(), "   ")
            .await
            .is_err());
    }
}
