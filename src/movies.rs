use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::{entities::movie, error::AppResult};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> AppResult<Vec<movie::Model>> {
        let movies = movie::Entity::find().order_by_asc(movie::Column::Id).all(&self.db).await?;
        Ok(movies)
    }

    pub async fn insert(
        &self,
        title: &str,
        description: &str,
        poster: &str,
        created_at: jiff::Timestamp,
    ) -> AppResult<movie::Model> {
        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            poster: Set(poster.to_string()),
            created_at: Set(created_at.as_second()),
        };
        Ok(model.insert(&self.db).await?)
    }
}
