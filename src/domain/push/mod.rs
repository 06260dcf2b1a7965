//! Push notification events.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::foundation::TeamId;

/// Title of every match notification.
pub const NOTIFICATION_TITLE: &str = "승요의 일기장";

const BODY_IN_PROGRESS: &str = "야구 볼 시간이에요⚾️";
const BODY_CANCELED: &str = "오늘 경기는 취소 되었어요⚾️";

/// Match lifecycle as reported by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Ready,
    Progress,
    End,
    Canceled,
}

/// "A match changed state, notify both teams' supporters."
///
/// Team ids arrive as JSON numbers in payload documents and as strings
/// in flat stream fields; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    pub game_id: String,
    #[serde(deserialize_with = "team_id_from_number_or_text")]
    pub away_id: TeamId,
    #[serde(deserialize_with = "team_id_from_number_or_text")]
    pub home_id: TeamId,
    pub status: MatchStatus,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Text(String),
}

fn team_id_from_number_or_text<'de, D>(deserializer: D) -> Result<TeamId, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(raw) => TeamId::new(raw).map_err(de::Error::custom),
        NumberOrText::Text(raw) => raw.parse().map_err(de::Error::custom),
    }
}

/// Team as needed to address a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

/// Title and body sent to devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Notification for a match status change: a start announcement for
    /// `PROGRESS`, a cancellation notice otherwise.
    pub fn for_match(status: MatchStatus) -> Self {
        let body = match status {
            MatchStatus::Progress => BODY_IN_PROGRESS,
            _ => BODY_CANCELED,
        };
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_event_reads_producer_json() {
        let json = r#"{"gameId":"20240309HTNC0","awayId":1,"homeId":2,"status":"PROGRESS"}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.game_id, "20240309HTNC0");
        assert_eq!(event.away_id, TeamId::new(1).unwrap());
        assert_eq!(event.status, MatchStatus::Progress);
    }

    #[test]
    fn push_event_reads_flat_string_fields() {
        let json = r#"{"gameId":"20240309HTNC0","awayId":"1","homeId":"2","status":"CANCELED"}"#;
        let event: PushEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.away_id, TeamId::new(1).unwrap());
        assert_eq!(event.home_id, TeamId::new(2).unwrap());
        assert_eq!(event.status, MatchStatus::Canceled);
    }

    #[test]
    fn push_event_rejects_non_numeric_or_non_positive_team_ids() {
        let text = r#"{"gameId":"g","awayId":"LG","homeId":"2","status":"PROGRESS"}"#;
        let zero = r#"{"gameId":"g","awayId":1,"homeId":0,"status":"PROGRESS"}"#;

        assert!(serde_json::from_str::<PushEvent>(text).is_err());
        assert!(serde_json::from_str::<PushEvent>(zero).is_err());
    }

    #[test]
    fn progress_announces_game_start() {
        let n = Notification::for_match(MatchStatus::Progress);
        assert_eq!(n.title, NOTIFICATION_TITLE);
        assert_eq!(n.body, "야구 볼 시간이에요⚾️");
    }

    #[test]
    fn other_statuses_announce_cancellation() {
        assert_eq!(Notification::for_match(MatchStatus::Canceled).body, "오늘 경기는 취소 되었어요⚾️");
        assert_eq!(Notification::for_match(MatchStatus::End).body, "오늘 경기는 취소 되었어요⚾️");
    }
}
