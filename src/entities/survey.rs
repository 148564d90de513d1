//! Survey and write-off records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Record, SurveyStatus};
use crate::core::identity::{IdPrefix, RecordId};
use crate::core::store::TableId;

/// Store assessment flagging loaned items as unserviceable or lost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    pub id: RecordId,
    pub item: String,
    pub department: String,
    pub quantity: u32,

    /// Reference number of the survey board
    pub survey_ref: String,

    pub status: SurveyStatus,
    pub created: DateTime<Utc>,
}

impl Record for Survey {
    const TABLE: TableId = TableId::Surveys;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}

/// Final removal of surveyed quantity from a department's PLL; append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOff {
    pub id: RecordId,

    /// The approved survey
    pub survey: RecordId,

    pub item: String,
    pub department: String,
    pub quantity: u32,
    pub survey_ref: String,
    pub status: SurveyStatus,
    pub approved_by: String,
    pub posted: DateTime<Utc>,
}

impl WriteOff {
    /// Write-off copying an approved survey
    pub fn from_survey(survey: &Survey, approved_by: &str) -> Self {
        Self {
            id: RecordId::new(IdPrefix::Wo),
            survey: survey.id,
            item: survey.item.clone(),
            department: survey.department.clone(),
            quantity: survey.quantity,
            survey_ref: survey.survey_ref.clone(),
            status: SurveyStatus::Approved,
            approved_by: approved_by.to_string(),
            posted: Utc::now(),
        }
    }
}

impl Record for WriteOff {
    const TABLE: TableId = TableId::WriteOffs;
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.id
    }
}
