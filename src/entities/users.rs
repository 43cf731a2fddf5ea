use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub social_name: Option<String>,
    #[sea_orm(unique)]
    pub document: Option<String>,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_type: i32,
    pub is_active: bool,
    pub is_foreigner: bool,
    pub status_code: i32,
    pub street: Option<String>,
    pub address_number: Option<i32>,
    pub district: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state_id: Option<i32>,
    pub created_at: Option<DateTimeUtc>,
    pub modified_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::certificates::Entity")]
    Certificates,
    #[sea_orm(has_many = "super::password_recoveries::Entity")]
    PasswordRecoveries,
}

impl Related<super::certificates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl Related<super::password_recoveries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PasswordRecoveries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
