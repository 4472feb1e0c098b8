use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "change_alert")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub field_id: Uuid,
    pub baseline_date: Date,
    pub comparison_date: Date,
    pub change_percentage: f64,
    pub change_type: String,
    pub vegetation_index: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::routes::farms::fields::db::Entity",
        from = "Column::FieldId",
        to = "crate::routes::farms::fields::db::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Field,
}

impl Related<crate::routes::farms::fields::db::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
