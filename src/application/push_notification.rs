//! PushNotificationHandler - notifies both teams' supporters of a match
//! status change.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::push::{Notification, PushEvent};
use crate::domain::stream::{EventProcessingError, StreamEvent};
use crate::ports::{HandleOutcome, PushAudience, PushDispatcher, StreamHandler};

pub struct PushNotificationHandler {
    audience: Arc<dyn PushAudience>,
    dispatcher: Arc<dyn PushDispatcher>,
}

impl PushNotificationHandler {
    pub fn new(audience: Arc<dyn PushAudience>, dispatcher: Arc<dyn PushDispatcher>) -> Self {
        Self { audience, dispatcher }
    }

    async fn notify(&self, event: &PushEvent) -> Result<HandleOutcome, EventProcessingError> {
        let away = self.audience.team(event.away_id).await?;
        let home = self.audience.team(event.home_id).await?;
        let (Some(away), Some(home)) = (away, home) else {
            return Ok(HandleOutcome::skipped(format!(
                "unknown team in game {} (away {}, home {})",
                event.game_id, event.away_id, event.home_id
            )));
        };

        let tokens: Vec<String> = self
            .audience
            .device_tokens_for_teams(&[away.id, home.id])
            .await?
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(HandleOutcome::skipped(format!(
                "no device tokens for {} vs {}",
                away.name, home.name
            )));
        }

        let notification = Notification::for_match(event.status);
        if !self.dispatcher.send(&tokens, &notification).await? {
            return Err(EventProcessingError::dispatch(format!(
                "transport rejected {} notifications for game {}",
                tokens.len(),
                event.game_id
            )));
        }

        tracing::info!(
            game_id = %event.game_id,
            away = %away.name,
            home = %home.name,
            recipients = tokens.len(),
            "Push notification sent"
        );
        Ok(HandleOutcome::Handled)
    }
}

#[async_trait]
impl StreamHandler for PushNotificationHandler {
    async fn handle(&self, event: &StreamEvent) -> Result<HandleOutcome, EventProcessingError> {
        let push: PushEvent = event.payload_as()?;
        self.notify(&push).await
    }

    fn name(&self) -> &'static str {
        "PushNotificationHandler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPushAudience;
    use crate::adapters::push::RecordingPushDispatcher;
    use crate::domain::foundation::TeamId;
    use crate::domain::push::NOTIFICATION_TITLE;
    use crate::domain::stream::{StreamCoordinates, StreamRecord};

    fn team(id: i64) -> TeamId {
        TeamId::new(id).unwrap()
    }

    fn event(payload: &str) -> StreamEvent {
        let source = StreamCoordinates {
            stream_key: "push".to_string(),
            group: "g".to_string(),
            consumer: "c".to_string(),
        };
        StreamEvent::decode(&source, &StreamRecord::with_payload("1-0", payload)).unwrap()
    }

    async fn audience() -> Arc<InMemoryPushAudience> {
        let audience = Arc::new(InMemoryPushAudience::new());
        audience.add_team(team(1), "KIA").await;
        audience.add_team(team(2), "NC").await;
        audience.add_supporter(team(1), "token-away").await;
        audience.add_supporter(team(2), "token-home").await;
        audience.add_supporter(team(2), "  ").await;
        audience.add_supporter(team(3), "token-other").await;
        audience
    }

    const PROGRESS: &str = r#"{"gameId":"20240309HTNC0","awayId":1,"homeId":2,"status":"PROGRESS"}"#;

    #[tokio::test]
    async fn sends_start_notice_to_both_teams_without_blanks() {
        let dispatcher = Arc::new(RecordingPushDispatcher::new());
        let handler = PushNotificationHandler::new(audience().await, dispatcher.clone());

        let outcome = handler.handle(&event(PROGRESS)).await.unwrap();

        assert_eq!(outcome, HandleOutcome::Handled);
        let sent = dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tokens, vec!["token-away".to_string(), "token-home".to_string()]);
        assert_eq!(sent[0].notification.title, NOTIFICATION_TITLE);
        assert_eq!(sent[0].notification.body, "야구 볼 시간이에요⚾️");
    }

    #[tokio::test]
    async fn canceled_match_sends_cancellation_notice() {
        let dispatcher = Arc::new(RecordingPushDispatcher::new());
        let handler = PushNotificationHandler::new(audience().await, dispatcher.clone());

        handler
            .handle(&event(r#"{"gameId":"g","awayId":1,"homeId":2,"status":"CANCELED"}"#))
            .await
            .unwrap();

        assert_eq!(dispatcher.sent().await[0].notification.body, "오늘 경기는 취소 되었어요⚾️");
    }

    #[tokio::test]
    async fn unknown_team_is_skipped() {
        let dispatcher = Arc::new(RecordingPushDispatcher::new());
        let handler = PushNotificationHandler::new(audience().await, dispatcher.clone());

        let outcome = handler
            .handle(&event(r#"{"gameId":"g","awayId":1,"homeId":99,"status":"PROGRESS"}"#))
            .await
            .unwrap();

        assert!(matches!(outcome, HandleOutcome::Skipped(_)));
        assert_eq!(dispatcher.sent_count().await, 0);
    }

    #[tokio::test]
    async fn no_supporters_is_skipped() {
        let audience = Arc::new(InMemoryPushAudience::new());
        audience.add_team(team(1), "KIA").await;
        audience.add_team(team(2), "NC").await;
        let dispatcher = Arc::new(RecordingPushDispatcher::new());
        let handler = PushNotificationHandler::new(audience, dispatcher.clone());

        let outcome = handler.handle(&event(PROGRESS)).await.unwrap();

        assert!(matches!(outcome, HandleOutcome::Skipped(_)));
        assert_eq!(dispatcher.sent_count().await, 0);
    }

    #[tokio::test]
    async fn rejected_dispatch_is_an_error() {
        let handler = PushNotificationHandler::new(audience().await, Arc::new(RecordingPushDispatcher::rejecting()));

        let result = handler.handle(&event(PROGRESS)).await;

        assert!(matches!(result, Err(EventProcessingError::Dispatch(_))));
    }

    #[tokio::test]
    async fn wrong_payload_shape_is_malformed() {
        let handler = PushNotificationHandler::new(audience().await, Arc::new(RecordingPushDispatcher::new()));

        let result = handler.handle(&event(r#"{"gameId":"g"}"#)).await;

        assert!(matches!(result, Err(EventProcessingError::Malformed(_))));
    }
}
