use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position of an order in the production and shipping workflow.
///
/// Variants are declared in workflow order. No transition table is enforced:
/// staff may move an order to any stage from any other.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FulfillmentStatus {
    #[sea_orm(string_value = "intake")]
    Intake,
    #[sea_orm(string_value = "design_in_progress")]
    DesignInProgress,
    #[sea_orm(string_value = "awaiting_proof_approval")]
    AwaitingProofApproval,
    #[sea_orm(string_value = "proof_approved")]
    ProofApproved,
    #[sea_orm(string_value = "awaiting_stock")]
    AwaitingStock,
    #[sea_orm(string_value = "in_production")]
    InProduction,
    #[sea_orm(string_value = "quality_check")]
    QualityCheck,
    #[sea_orm(string_value = "ready_to_ship")]
    ReadyToShip,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl Default for FulfillmentStatus {
    fn default() -> Self {
        Self::Intake
    }
}

impl FulfillmentStatus {
    /// Human-facing label shown in the status select.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::DesignInProgress => "Design in progress",
            Self::AwaitingProofApproval => "Awaiting proof approval",
            Self::ProofApproved => "Proof approved",
            Self::AwaitingStock => "Awaiting stock",
            Self::InProduction => "In production",
            Self::QualityCheck => "Quality check",
            Self::ReadyToShip => "Ready to ship",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Archived => "Archived",
        }
    }
}

/// Billing state of an order, independent of fulfillment.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// How an order entered the system.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderSource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "test")]
    Test,
    #[sea_orm(string_value = "external")]
    External,
}
