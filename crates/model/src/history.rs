use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::class::ClassType;
use crate::equipment::EquipmentStatus;
use crate::private_session::SessionStatus;
use crate::slot::Slot;
use crate::subscription::SubscriptionType;

#[derive(Serialize, Deserialize, Debug)]
pub struct HistoryRow {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub actor: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date_time: DateTime<Utc>,
    pub action: Action,
}

impl HistoryRow {
    pub fn new(actor: ObjectId, action: Action) -> Self {
        HistoryRow {
            id: ObjectId::new(),
            actor,
            date_time: Utc::now(),
            action,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub enum Action {
    CreateUser {
        user_id: ObjectId,
        email: String,
    },
    ChangeRole {
        user_id: ObjectId,
    },
    ChangeCredits {
        user_id: ObjectId,
        amount: i32,
    },
    SetSpecializations {
        user_id: ObjectId,
        specializations: Vec<ClassType>,
    },
    CreateClass {
        class_id: ObjectId,
        class_type: ClassType,
        slot: Slot,
    },
    EditClass {
        class_id: ObjectId,
    },
    DeleteClass {
        class_id: ObjectId,
    },
    Enroll {
        class_id: ObjectId,
        member_id: ObjectId,
    },
    CancelEnrollment {
        class_id: ObjectId,
        member_id: ObjectId,
    },
    MarkPresent {
        class_id: ObjectId,
    },
    BookSession {
        session_id: ObjectId,
        trainer_id: ObjectId,
        member_id: ObjectId,
        slot: Slot,
    },
    SessionStatus {
        session_id: ObjectId,
        status: SessionStatus,
    },
    DeleteSession {
        session_id: ObjectId,
    },
    AddSubscription {
        member_id: ObjectId,
        tp: SubscriptionType,
    },
    EditSubscription {
        member_id: ObjectId,
        subscription_id: ObjectId,
    },
    RemoveSubscription {
        member_id: ObjectId,
        subscription_id: ObjectId,
    },
    AddEquipment {
        equipment_id: ObjectId,
        name: String,
    },
    EquipmentStatus {
        equipment_id: ObjectId,
        status: EquipmentStatus,
    },
    DeleteEquipment {
        equipment_id: ObjectId,
    },
}
