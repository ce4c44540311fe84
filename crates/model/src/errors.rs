use bson::oid::ObjectId;
use thiserror::Error;

use crate::rights::Rule;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),
    #[error("No rights to perform: {0:?}")]
    Forbidden(Rule),
    #[error("User not found: {0}")]
    UserNotFound(ObjectId),
    #[error("Class not found: {0}")]
    ClassNotFound(ObjectId),
    #[error("Session not found: {0}")]
    SessionNotFound(ObjectId),
    #[error("Subscription not found")]
    SubscriptionNotFound {
        user_id: ObjectId,
        subscription_id: ObjectId,
    },
    #[error("Equipment not found: {0}")]
    EquipmentNotFound(ObjectId),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Slot is already taken")]
    SlotConflict,
    #[error("Member already enrolled")]
    AlreadyEnrolled {
        class_id: ObjectId,
        member_id: ObjectId,
    },
    #[error("Member not enrolled")]
    NotEnrolled {
        class_id: ObjectId,
        member_id: ObjectId,
    },
    #[error("Class is full")]
    CapacityExceeded { class_id: ObjectId },
    #[error("Class has enrolled participants")]
    ClassHasParticipants { class_id: ObjectId },
    #[error("Subscription does not cover group classes: {member_id}")]
    SubscriptionRequired { member_id: ObjectId },
    #[error("No session credits left: {0}")]
    CreditExhausted(ObjectId),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
