use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::rights::Role;
use crate::slot::Slot;
use crate::user::PersonRef;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrivateSession {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub trainer: PersonRef,
    pub member: PersonRef,
    pub slot: Slot,
    pub status: SessionStatus,
    #[serde(default)]
    pub version: u64,
}

impl PrivateSession {
    pub fn new(trainer: PersonRef, member: PersonRef, slot: Slot) -> PrivateSession {
        PrivateSession {
            id: ObjectId::new(),
            trainer,
            member,
            slot,
            status: SessionStatus::Confirmed,
            version: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SessionStatus::Cancelled
    }

    pub fn occupies(&self, slot: &Slot) -> bool {
        !self.is_cancelled() && &self.slot == slot
    }

    pub fn can_start(&self, now: DateTime<Utc>) -> bool {
        self.slot.is_past(now)
    }

    /// Role-scoped status transitions. Ownership is the caller's id
    /// matching the trainer or member embedded in the session.
    pub fn transition_allowed(&self, actor_id: ObjectId, role: Role, to: SessionStatus) -> bool {
        match role {
            Role::Admin => true,
            Role::Trainer => self.trainer.id == actor_id,
            Role::Member => self.member.id == actor_id && to == SessionStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn session() -> PrivateSession {
        let slot = Slot::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).single().unwrap(),
            "10:00",
        )
        .unwrap();
        PrivateSession::new(
            PersonRef {
                id: ObjectId::new(),
                name: "Radu".to_owned(),
            },
            PersonRef {
                id: ObjectId::new(),
                name: "Ana".to_owned(),
            },
            slot,
        )
    }

    #[test]
    fn test_member_may_only_cancel_own_session() {
        let session = session();
        let member = session.member.id;
        assert!(session.transition_allowed(member, Role::Member, SessionStatus::Cancelled));
        assert!(!session.transition_allowed(member, Role::Member, SessionStatus::Completed));
        assert!(!session.transition_allowed(ObjectId::new(), Role::Member, SessionStatus::Cancelled));
    }

    #[test]
    fn test_trainer_scoped_to_own_session() {
        let session = session();
        let trainer = session.trainer.id;
        assert!(session.transition_allowed(trainer, Role::Trainer, SessionStatus::Completed));
        assert!(session.transition_allowed(trainer, Role::Trainer, SessionStatus::Cancelled));
        assert!(!session.transition_allowed(ObjectId::new(), Role::Trainer, SessionStatus::Completed));
    }

    #[test]
    fn test_admin_unrestricted() {
        let session = session();
        assert!(session.transition_allowed(ObjectId::new(), Role::Admin, SessionStatus::Confirmed));
    }

    #[test]
    fn test_cancelled_session_frees_slot() {
        let mut session = session();
        let slot = session.slot.clone();
        assert!(session.occupies(&slot));
        session.status = SessionStatus::Cancelled;
        assert!(!session.occupies(&slot));
    }

    #[test]
    fn test_cannot_start_before_slot() {
        let session = session();
        let before = Utc.with_ymd_and_hms(2025, 1, 10, 9, 59, 0).single().unwrap();
        let after = Utc.with_ymd_and_hms(2025, 1, 10, 10, 1, 0).single().unwrap();
        assert!(!session.can_start(before));
        assert!(session.can_start(after));
    }
}
