use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use uuid::Uuid;

use models::{provider, service};

use super::{ProviderFields, ProviderRepository, ServiceFields, ServiceRepository};
use crate::errors::ServiceError;

/// The only unique constraint in the schema besides primary keys is the
/// provider email index.
fn map_write_err(e: DbErr) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::duplicate_email(),
        _ => ServiceError::from(e),
    }
}

/// SeaORM-backed provider repository.
#[derive(Clone)]
pub struct SeaOrmProviderRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl ProviderRepository for SeaOrmProviderRepository {
    async fn list_with_services(&self) -> Result<Vec<(provider::Model, Vec<service::Model>)>, ServiceError> {
        let rows = provider::Entity::find()
            .find_with_related(service::Entity)
            .order_by_asc(provider::Column::CreatedAt)
            .order_by_asc(provider::Column::Id)
            .order_by_asc(service::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<provider::Model>, ServiceError> {
        Ok(provider::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<provider::Model>, ServiceError> {
        Ok(provider::find_by_email(&self.db, email).await?)
    }

    async fn services_of(&self, id: Uuid) -> Result<Vec<service::Model>, ServiceError> {
        let rows = service::Entity::find()
            .filter(service::Column::ProviderId.eq(id))
            .order_by_asc(service::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create(&self, fields: ProviderFields) -> Result<provider::Model, ServiceError> {
        let now = Utc::now().into();
        let am = provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            email: Set(fields.email),
            phone: Set(fields.phone),
            address: Set(fields.address),
            created_at: Set(now),
            updated_at: Set(now),
        };
        am.insert(&self.db).await.map_err(map_write_err)
    }

    async fn update(&self, current: provider::Model, fields: ProviderFields) -> Result<provider::Model, ServiceError> {
        let mut am: provider::ActiveModel = current.into();
        am.name = Set(fields.name);
        am.email = Set(fields.email);
        am.phone = Set(fields.phone);
        am.address = Set(fields.address);
        am.updated_at = Set(Utc::now().into());
        am.update(&self.db).await.map_err(map_write_err)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        // service rows go through the ON DELETE CASCADE foreign key
        let res = provider::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

/// SeaORM-backed service repository.
#[derive(Clone)]
pub struct SeaOrmServiceRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl ServiceRepository for SeaOrmServiceRepository {
    async fn list_with_provider(&self) -> Result<Vec<(service::Model, provider::Model)>, ServiceError> {
        let rows = service::Entity::find()
            .find_also_related(provider::Entity)
            .order_by_asc(service::Column::CreatedAt)
            .order_by_asc(service::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().filter_map(|(s, p)| p.map(|p| (s, p))).collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<service::Model>, ServiceError> {
        Ok(service::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn create(&self, provider_id: Uuid, fields: ServiceFields) -> Result<service::Model, ServiceError> {
        let now = Utc::now().into();
        let am = service::ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_id: Set(provider_id),
            name: Set(fields.name),
            description: Set(fields.description),
            price: Set(fields.price),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(am.insert(&self.db).await?)
    }

    async fn update(&self, current: service::Model, fields: ServiceFields) -> Result<service::Model, ServiceError> {
        let mut am: service::ActiveModel = current.into();
        am.name = Set(fields.name);
        am.description = Set(fields.description);
        am.price = Set(fields.price);
        am.updated_at = Set(Utc::now().into());
        Ok(am.update(&self.db).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = service::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
