//! Guide session bookkeeping: the status machine and the append-only event log

use crate::error::{GuideError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    InProgress,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_final(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventType {
    SessionStarted,
    StatusChanged,
    StepAdded,
    Completed,
    Abandoned,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub event_type: SessionEventType,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(event_type: SessionEventType, data: Value) -> Self {
        Self {
            event_type,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// One entry of a guide plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    pub completed: bool,
}

impl PlanStep {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            completed: false,
        }
    }
}

/// A guide session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSession {
    pub id: Uuid,
    pub instructions: String,
    pub status: SessionStatus,
    pub steps: Vec<PlanStep>,
    pub created_at: DateTime<Utc>,
}

impl GuideSession {
    pub fn new(instructions: impl Into<String>, plan: &[String]) -> Self {
        Self {
            id: Uuid::new_v4(),
            instructions: instructions.into(),
            status: SessionStatus::Started,
            steps: plan.iter().map(PlanStep::new).collect(),
            created_at: Utc::now(),
        }
    }

    /// 1-based numbers of the plan steps already done
    pub fn completed_steps(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.completed)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Mark plan steps complete from the model's 1-based step numbers.
    ///
    /// Numbers outside the plan are ignored. Returns whether anything changed.
    pub fn complete_steps(&mut self, numbers: &[usize]) -> bool {
        let mut changed = false;
        for &n in numbers {
            match n.checked_sub(1).and_then(|i| self.steps.get_mut(i)) {
                Some(step) if !step.completed => {
                    step.completed = true;
                    changed = true;
                }
                Some(_) => {}
                None => log::debug!("Ignoring completed step {} outside the plan", n),
            }
        }
        changed
    }
}

/// Where session status and events are persisted.
///
/// Appends happen from the driver task only, so they are totally ordered
/// per session.
#[async_trait]
pub trait SessionLog: Send + Sync {
    async fn append(&self, session_id: &Uuid, event: SessionEvent) -> Result<()>;

    async fn set_status(&self, session_id: &Uuid, status: SessionStatus) -> Result<()>;
}

#[derive(Debug, Default)]
struct SessionEntry {
    status: Option<SessionStatus>,
    events: Vec<SessionEvent>,
}

/// Session log kept in process memory
#[derive(Debug, Default)]
pub struct InMemorySessionLog {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl InMemorySessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, session_id: &Uuid) -> Vec<SessionEvent> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .map(|entry| entry.events.clone())
            .unwrap_or_default()
    }

    pub fn event_types(&self, session_id: &Uuid) -> Vec<SessionEventType> {
        self.events(session_id)
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }

    pub fn status(&self, session_id: &Uuid) -> Option<SessionStatus> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .and_then(|entry| entry.status)
    }
}

#[async_trait]
impl SessionLog for InMemorySessionLog {
    async fn append(&self, session_id: &Uuid, event: SessionEvent) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let entry = sessions.entry(*session_id).or_default();
        if entry.status.is_some_and(SessionStatus::is_final) {
            return Err(GuideError::SessionLog(format!(
                "session {} is already closed",
                session_id
            )));
        }
        entry.events.push(event);
        Ok(())
    }

    async fn set_status(&self, session_id: &Uuid, status: SessionStatus) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let entry = sessions.entry(*session_id).or_default();
        if let Some(current) = entry.status {
            if current.is_final() {
                return Err(GuideError::SessionLog(format!(
                    "session {} is already {:?}",
                    session_id, current
                )));
            }
        }
        entry.status = Some(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let timestamp = DateTime::parse_from_rfc3339("2024-05-01T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = SessionEvent {
            event_type: SessionEventType::StepAdded,
            data: json!({"step": 1}),
            timestamp,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "step_added", "data": {"step": 1}, "timestamp": "2024-05-01T09:30:00Z"})
        );
        assert_eq!(
            serde_json::to_value(SessionStatus::InProgress).unwrap(),
            json!("in_progress")
        );
    }

    #[test]
    fn test_complete_steps_is_one_based() {
        let plan = vec!["Open orders".to_string(), "Request refund".to_string()];
        let mut session = GuideSession::new("Get a refund", &plan);

        assert!(session.complete_steps(&[1]));
        assert!(session.steps[0].completed);
        assert!(!session.steps[1].completed);

        // Repeats and out-of-range numbers change nothing
        assert!(!session.complete_steps(&[0, 1, 9]));
        assert_eq!(session.completed_steps(), vec![1]);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = GuideSession::new("a", &[]);
        let b = GuideSession::new("b", &[]);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.get_version_num(), 4);
        assert!(a.created_at <= b.created_at);
        assert_eq!(a.status, SessionStatus::Started);
    }

    #[tokio::test]
    async fn test_in_memory_log_orders_events() {
        let log = InMemorySessionLog::new();
        let s1 = Uuid::new_v4();
        log.set_status(&s1, SessionStatus::Started).await.unwrap();
        log.append(&s1, SessionEvent::new(SessionEventType::SessionStarted, json!({})))
            .await
            .unwrap();
        log.append(&s1, SessionEvent::new(SessionEventType::StepAdded, json!({})))
            .await
            .unwrap();

        assert_eq!(
            log.event_types(&s1),
            vec![SessionEventType::SessionStarted, SessionEventType::StepAdded]
        );
        assert_eq!(log.status(&s1), Some(SessionStatus::Started));
        assert!(log.events(&Uuid::new_v4()).is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_rejects_writes() {
        let log = InMemorySessionLog::new();
        let s1 = Uuid::new_v4();
        log.set_status(&s1, SessionStatus::Completed).await.unwrap();

        assert!(matches!(
            log.set_status(&s1, SessionStatus::InProgress).await,
            Err(GuideError::SessionLog(_))
        ));
        assert!(log
            .append(&s1, SessionEvent::new(SessionEventType::StepAdded, json!({})))
            .await
            .is_err());
    }
}
