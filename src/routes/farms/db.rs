use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "farm")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fields::db::Entity")]
    Field,
    #[sea_orm(has_many = "crate::routes::analysis::weather::db::Entity")]
    WeatherDay,
}

impl Related<super::fields::db::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Field.def()
    }
}

impl Related<crate::routes::analysis::weather::db::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WeatherDay.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}
