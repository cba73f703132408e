use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// What is reported about one bot after a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    /// The bot's dump: traffic, timeouts and warnings.
    pub log: String,
    /// The bot's stderr.
    pub errors: String,
    pub response_times: Vec<u64>,
    pub total_response_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
    /// Milliseconds since the wrapper started.
    pub time_elapsed: u64,
    /// The engine's answer to `details`.
    pub details: String,
    /// The engine's answer to `game`.
    pub game: String,
    pub players: Vec<PlayerResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectResult {
    pub errors: String,
    /// Only for bot subjects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioResult {
    pub status: RunStatus,
    pub subject: SubjectResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_result_uses_camel_case() {
        let result = MatchResult {
            status: RunStatus::Ok,
            error: None,
            time_elapsed: 12,
            details: "winner 0".to_string(),
            game: "{}".to_string(),
            players: vec![PlayerResult {
                log: "move 10000\n".to_string(),
                errors: String::new(),
                response_times: vec![3, 4],
                total_response_time: 7,
            }],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["timeElapsed"], 12);
        assert_eq!(json["players"][0]["responseTimes"][1], 4);
        assert_eq!(json["players"][0]["totalResponseTime"], 7);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn scenario_error_carries_message() {
        let result = ScenarioResult {
            status: RunStatus::Error,
            subject: SubjectResult {
                errors: String::new(),
                log: None,
            },
            error: Some(ErrorMessage {
                message: "Response timed out (500ms)".to_string(),
            }),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"]["message"], "Response timed out (500ms)");
        assert!(json["subject"].get("log").is_none());
    }
}
