use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentStatus {
    Functional,
    Broken,
    Service,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Equipment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub manufacturer: String,
    pub status: EquipmentStatus,
    #[serde(default)]
    pub version: u64,
}

impl Equipment {
    pub fn new(name: String, manufacturer: String) -> Equipment {
        Equipment {
            id: ObjectId::new(),
            name,
            manufacturer,
            status: EquipmentStatus::Functional,
            version: 0,
        }
    }
}
