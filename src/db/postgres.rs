use super::models::{posts, users};
use super::{Author, Document, DocumentStore, NewPost, PostPatch};
use crate::config::DatabaseConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Post storage over Postgres via SeaORM
#[derive(Clone)]
pub struct PostgresStore {
    db: DatabaseConnection,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
        let mut opt = sea_orm::ConnectOptions::new(&config.url);
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .sqlx_logging(false);

        sea_orm::Database::connect(opt).await
    }

    fn to_document(post: posts::Model, author: Option<users::Model>) -> Document {
        Document {
            id: post.id,
            title: post.title,
            body: post.body,
            author: author.map(|u| Author {
                id: u.id,
                username: u.username,
                email: u.email,
            }),
            created_at: post.created_at.with_timezone(&Utc),
            updated_at: post.updated_at.with_timezone(&Utc),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn list(&self) -> Result<Vec<Document>, AppError> {
        let rows = posts::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(post, author)| Self::to_document(post, author))
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let row = posts::Entity::find_by_id(id)
            .find_also_related(users::Entity)
            .one(&self.db)
            .await?;

        Ok(row.map(|(post, author)| Self::to_document(post, author)))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Document>, AppError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = posts::Entity::find()
            .filter(posts::Column::Id.is_in(ids.to_vec()))
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(post, author)| Self::to_document(post, author))
            .collect())
    }

    async fn insert(&self, post: NewPost) -> Result<Document, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let model = posts::ActiveModel {
            id: Set(id),
            title: Set(post.title),
            body: Set(post.body),
            author_id: Set(post.author_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        model.insert(&self.db).await?;

        // Re-read to populate the author reference
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("post vanished after insert")))
    }

    async fn update(&self, id: Uuid, patch: PostPatch) -> Result<Option<Document>, AppError> {
        let Some(existing) = posts::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: posts::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            model.title = Set(title);
        }
        if let Some(body) = patch.body {
            model.body = Set(body);
        }
        model.updated_at = Set(Utc::now().into());
        model.update(&self.db).await?;

        self.find_by_id(id).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = posts::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.db.ping().await?;
        Ok(())
    }
}
