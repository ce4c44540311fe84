use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::user::PersonRef;

pub const DEFAULT_DURATION_MIN: u32 = 60;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ClassType {
    Pilates,
    Yoga,
    Spinning,
    Zumba,
    Crossfit,
    BodyPump,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Enrolled,
    Cancelled,
    Present,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Participant {
    pub member_id: ObjectId,
    pub name: String,
    pub status: ParticipantStatus,
}

impl Participant {
    pub fn new(member: PersonRef) -> Participant {
        Participant {
            member_id: member.id,
            name: member.name,
            status: ParticipantStatus::Enrolled,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != ParticipantStatus::Cancelled
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupClass {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub class_type: ClassType,
    pub capacity: u32,
    pub trainer: PersonRef,
    pub slot: Slot,
    #[serde(default = "default_duration")]
    pub duration_min: u32,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub version: u64,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MIN
}

impl GroupClass {
    pub fn new(class_type: ClassType, capacity: u32, trainer: PersonRef, slot: Slot) -> GroupClass {
        GroupClass {
            id: ObjectId::new(),
            class_type,
            capacity,
            trainer,
            slot,
            duration_min: DEFAULT_DURATION_MIN,
            participants: vec![],
            version: 0,
        }
    }

    /// Cancelled entries stay in the array; they never count against
    /// capacity.
    pub fn active_participants(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active()).count()
    }

    pub fn is_full(&self) -> bool {
        self.active_participants() as u32 >= self.capacity
    }

    pub fn participant(&self, member_id: ObjectId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.member_id == member_id)
    }

    pub fn is_enrolled(&self, member_id: ObjectId) -> bool {
        self.participant(member_id).map_or(false, |p| p.is_active())
    }

    pub fn any_present(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.status == ParticipantStatus::Present)
    }

    /// Never persisted; recomputed from the stored fields on every read.
    pub fn status(&self, now: DateTime<Utc>) -> ClassStatus {
        if self.any_present() || self.slot.end_at(self.duration_min) < now {
            ClassStatus::Completed
        } else {
            ClassStatus::Scheduled
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ClassStatus {
    Scheduled,
    Completed,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn slot() -> Slot {
        Slot::new(
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).single().unwrap(),
            "18:00",
        )
        .unwrap()
    }

    fn trainer() -> PersonRef {
        PersonRef {
            id: ObjectId::new(),
            name: "Radu".to_owned(),
        }
    }

    fn participant(status: ParticipantStatus) -> Participant {
        Participant {
            member_id: ObjectId::new(),
            name: "Ana".to_owned(),
            status,
        }
    }

    #[test]
    fn test_cancelled_participants_free_capacity() {
        let mut class = GroupClass::new(ClassType::Yoga, 2, trainer(), slot());
        class.participants.push(participant(ParticipantStatus::Enrolled));
        class.participants.push(participant(ParticipantStatus::Cancelled));
        assert_eq!(class.active_participants(), 1);
        assert!(!class.is_full());

        class.participants.push(participant(ParticipantStatus::Present));
        assert!(class.is_full());
    }

    #[test]
    fn test_capacity_invariant_holds() {
        let mut class = GroupClass::new(ClassType::Yoga, 2, trainer(), slot());
        class.participants.push(participant(ParticipantStatus::Enrolled));
        class.participants.push(participant(ParticipantStatus::Enrolled));
        assert!(class.is_full());
        assert!(class.active_participants() as u32 <= class.capacity);
    }

    #[test]
    fn test_status_scheduled_before_end() {
        let class = GroupClass::new(ClassType::Spinning, 10, trainer(), slot());
        let before = Utc.with_ymd_and_hms(2025, 1, 10, 18, 30, 0).single().unwrap();
        assert_eq!(class.status(before), ClassStatus::Scheduled);
    }

    #[test]
    fn test_status_completed_after_end() {
        let class = GroupClass::new(ClassType::Spinning, 10, trainer(), slot());
        let after = Utc.with_ymd_and_hms(2025, 1, 10, 19, 1, 0).single().unwrap();
        assert_eq!(class.status(after), ClassStatus::Completed);
    }

    #[test]
    fn test_status_completed_when_any_present() {
        let mut class = GroupClass::new(ClassType::Zumba, 10, trainer(), slot());
        class.participants.push(participant(ParticipantStatus::Present));
        let before = Utc.with_ymd_and_hms(2025, 1, 10, 17, 0, 0).single().unwrap();
        assert_eq!(class.status(before), ClassStatus::Completed);
    }
}
