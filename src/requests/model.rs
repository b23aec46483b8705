use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::QueueError;

/// Garment categories a PRT request can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RequestCategory {
    #[serde(rename = "t_shirt", alias = "T-shirt")]
    TShirt,
    #[serde(rename = "hoodie", alias = "Hoodie")]
    Hoodie,
    #[serde(rename = "sweatshirt", alias = "Sweatshirt")]
    Sweatshirt,
    #[serde(rename = "polo", alias = "Polo")]
    Polo,
    #[serde(rename = "tote_bag", alias = "Tote bag")]
    ToteBag,
    #[serde(rename = "cap", alias = "Cap")]
    Cap,
}

impl RequestCategory {
    pub const ALL: [RequestCategory; 6] = [
        Self::TShirt,
        Self::Hoodie,
        Self::Sweatshirt,
        Self::Polo,
        Self::ToteBag,
        Self::Cap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::TShirt => "T-shirt",
            Self::Hoodie => "Hoodie",
            Self::Sweatshirt => "Sweatshirt",
            Self::Polo => "Polo",
            Self::ToteBag => "Tote bag",
            Self::Cap => "Cap",
        }
    }
}

impl Default for RequestCategory {
    fn default() -> Self {
        Self::TShirt
    }
}

/// `new -> seen -> done`, never backwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    New,
    Seen,
    Done,
}

impl RequestStatus {
    /// The next stage; `Done` stays `Done`.
    pub fn advanced(self) -> Self {
        match self {
            Self::New => Self::Seen,
            Self::Seen | Self::Done => Self::Done,
        }
    }
}

/// One entry of the PRT request queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrtRequest {
    pub id: String,
    pub category: RequestCategory,
    pub size: String,
    pub quantity: u32,
    pub color: String,
    pub submitter: String,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
}

/// The request form as typed by a staff member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RequestDraft {
    #[serde(default)]
    pub category: RequestCategory,
    #[serde(default)]
    pub size: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub color: String,
}

fn default_quantity() -> u32 {
    1
}

impl Default for RequestDraft {
    fn default() -> Self {
        Self {
            category: RequestCategory::default(),
            size: String::new(),
            quantity: default_quantity(),
            color: String::new(),
        }
    }
}

impl RequestDraft {
    pub fn new(
        category: RequestCategory,
        size: impl Into<String>,
        quantity: u32,
        color: impl Into<String>,
    ) -> Self {
        Self {
            category,
            size: size.into(),
            quantity,
            color: color.into(),
        }
    }

    /// Builds the queue entry, trimming free text.
    pub fn to_request(
        &self,
        id: String,
        submitter: &str,
        created_at: DateTime<Utc>,
    ) -> Result<PrtRequest, QueueError> {
        let size = self.size.trim();
        let color = self.color.trim();
        if size.is_empty() {
            return Err(QueueError::InvalidDraft("size is required".into()));
        }
        if color.is_empty() {
            return Err(QueueError::InvalidDraft("color is required".into()));
        }
        if self.quantity == 0 {
            return Err(QueueError::InvalidDraft(
                "quantity must be at least 1".into(),
            ));
        }
        Ok(PrtRequest {
            id,
            category: self.category,
            size: size.to_string(),
            quantity: self.quantity,
            color: color.to_string(),
            submitter: submitter.to_string(),
            created_at,
            status: RequestStatus::New,
        })
    }
}
