use crate::entities::{prelude::*, videos};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// The metadata store owning video records.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<videos::Model>, DbErr>;

    /// Full overwrite of the stored record; last write wins.
    async fn update_video(&self, video: videos::Model) -> Result<videos::Model, DbErr>;

    async fn create_video(
        &self,
        user_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<videos::Model, DbErr>;

    async fn list_videos(&self, user_id: &str) -> Result<Vec<videos::Model>, DbErr>;
}

pub struct SeaOrmVideoRepository {
    db: DatabaseConnection,
}

impl SeaOrmVideoRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoRepository for SeaOrmVideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<videos::Model>, DbErr> {
        Videos::find_by_id(id.to_string()).one(&self.db).await
    }

    async fn update_video(&self, video: videos::Model) -> Result<videos::Model, DbErr> {
        let mut active = videos::ActiveModel::from(video).reset_all();
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await
    }

    async fn create_video(
        &self,
        user_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<videos::Model, DbErr> {
        let now = Utc::now();
        let video = videos::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            title: Set(title),
            description: Set(description),
            thumbnail_url: Set(None),
            video_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        video.insert(&self.db).await
    }

    async fn list_videos(&self, user_id: &str) -> Result<Vec<videos::Model>, DbErr> {
        Videos::find()
            .filter(videos::Column::UserId.eq(user_id))
            .order_by_desc(videos::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
