// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::sea_orm_active_enums::SeaSubscriptionStatus;
use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "webhooks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub team_id: Uuid,
    pub url: String,
    pub secret: String,
    pub event_types: JsonValue,
    pub status: SeaSubscriptionStatus,
    pub consecutive_failures: i32,
    pub created_by_user_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::webhook_call::Entity")]
    WebhookCalls,
    #[sea_orm(has_many = "super::delivery_attempt::Entity")]
    DeliveryAttempts,
}

impl Related<super::webhook_call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WebhookCalls.def()
    }
}

impl Related<super::delivery_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAttempts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
