use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ModelError;

/// Lifecycle states of an intake application.
/// `draft` is the only state in which the applicant may edit `data`;
/// submission moves it to `new` and the remaining states are set by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    New,
    InProgress,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::New => "new",
            ApplicationStatus::InProgress => "in_progress",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "new" => Ok(ApplicationStatus::New),
            "in_progress" => Ok(ApplicationStatus::InProgress),
            "completed" => Ok(ApplicationStatus::Completed),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(ModelError::Validation(format!("unknown application status: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "application")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub telegram_id: Option<i64>,
    pub status: String,
    pub data: Json,
    pub admin_comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Files,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Files => Entity::has_many(super::application_file::Entity).into(),
        }
    }
}

impl Related<super::application_file::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status_parsed(&self) -> Result<ApplicationStatus, ModelError> {
        self.status.parse()
    }

    pub fn is_draft(&self) -> bool {
        self.status == ApplicationStatus::Draft.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus;

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            ApplicationStatus::Draft,
            ApplicationStatus::New,
            ApplicationStatus::InProgress,
            ApplicationStatus::Completed,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(s.as_str().parse::<ApplicationStatus>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("archived".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: ApplicationStatus = serde_json::from_str("\"draft\"").unwrap();
        assert_eq!(back, ApplicationStatus::Draft);
    }
}
