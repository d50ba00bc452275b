// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::call_record::CallStatus;
use crate::domain::models::delivery::AttemptStatus;
use crate::domain::models::webhook::SubscriptionStatus;
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaSubscriptionStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "disabled")]
    Disabled,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

impl From<SubscriptionStatus> for SeaSubscriptionStatus {
    fn from(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Active => SeaSubscriptionStatus::Active,
            SubscriptionStatus::Paused => SeaSubscriptionStatus::Paused,
            SubscriptionStatus::Disabled => SeaSubscriptionStatus::Disabled,
            SubscriptionStatus::Deleted => SeaSubscriptionStatus::Deleted,
        }
    }
}

impl From<SeaSubscriptionStatus> for SubscriptionStatus {
    fn from(status: SeaSubscriptionStatus) -> Self {
        match status {
            SeaSubscriptionStatus::Active => SubscriptionStatus::Active,
            SeaSubscriptionStatus::Paused => SubscriptionStatus::Paused,
            SeaSubscriptionStatus::Disabled => SubscriptionStatus::Disabled,
            SeaSubscriptionStatus::Deleted => SubscriptionStatus::Deleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaAttemptStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "in_flight")]
    InFlight,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "exhausted")]
    Exhausted,
}

impl From<AttemptStatus> for SeaAttemptStatus {
    fn from(status: AttemptStatus) -> Self {
        match status {
            AttemptStatus::Pending => SeaAttemptStatus::Pending,
            AttemptStatus::InFlight => SeaAttemptStatus::InFlight,
            AttemptStatus::Success => SeaAttemptStatus::Success,
            AttemptStatus::Failed => SeaAttemptStatus::Failed,
            AttemptStatus::Exhausted => SeaAttemptStatus::Exhausted,
        }
    }
}

impl From<SeaAttemptStatus> for AttemptStatus {
    fn from(status: SeaAttemptStatus) -> Self {
        match status {
            SeaAttemptStatus::Pending => AttemptStatus::Pending,
            SeaAttemptStatus::InFlight => AttemptStatus::InFlight,
            SeaAttemptStatus::Success => AttemptStatus::Success,
            SeaAttemptStatus::Failed => AttemptStatus::Failed,
            SeaAttemptStatus::Exhausted => AttemptStatus::Exhausted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum SeaCallStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<CallStatus> for SeaCallStatus {
    fn from(status: CallStatus) -> Self {
        match status {
            CallStatus::Pending => SeaCallStatus::Pending,
            CallStatus::Success => SeaCallStatus::Success,
            CallStatus::Failed => SeaCallStatus::Failed,
        }
    }
}

impl From<SeaCallStatus> for CallStatus {
    fn from(status: SeaCallStatus) -> Self {
        match status {
            SeaCallStatus::Pending => CallStatus::Pending,
            SeaCallStatus::Success => CallStatus::Success,
            SeaCallStatus::Failed => CallStatus::Failed,
        }
    }
}
