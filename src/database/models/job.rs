//! `SeaORM` Entity for scraped postings

use crate::database::models::job_type::JobType;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "job")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
    pub source_name: String,
    pub source_url: String,
    pub job_type: JobType,
    pub company: String,
    pub logo_url: Option<String>,
    pub role: String,
    pub location: String,
    /// Identity of a posting across re-scrapes
    #[sea_orm(unique)]
    pub application_link: String,
    pub first_seen: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_receipt::Entity")]
    DeliveryReceipt,
}

impl Related<super::delivery_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryReceipt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
