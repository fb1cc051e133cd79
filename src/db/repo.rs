use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use sea_orm::{
    sea_query::Expr, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use super::entities::tickets;
use super::{StoreError, TicketStore};
use crate::conversation::validate::{normalize_key, surname_key};
use crate::conversation::Sale;

pub struct Repo {
    db: DatabaseConnection,
}

impl Repo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await.context("Database ping failed")
    }

    async fn get(&self, id: i64) -> Result<Option<tickets::Model>, DbErr> {
        tickets::Entity::find_by_id(id).one(&self.db).await
    }
}

/// LIKE wildcards typed by users are dropped instead of escaped.
fn like_safe(term: &str) -> String {
    term.replace(['%', '_'], "")
}

#[async_trait]
impl TicketStore for Repo {
    async fn search_by_surname(&self, prefix: &str) -> Result<Vec<tickets::Model>, StoreError> {
        let prefix = like_safe(&normalize_key(prefix));
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let rows = tickets::Entity::find()
            .filter(tickets::Column::Surname.starts_with(prefix.as_str()))
            .order_by_asc(tickets::Column::Surname)
            .order_by_asc(tickets::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn search_by_full_name(&self, name: &str) -> Result<Vec<tickets::Model>, StoreError> {
        let key = normalize_key(name);
        if key.is_empty() {
            return Ok(Vec::new());
        }

        let rows = tickets::Entity::find()
            .filter(tickets::Column::FullNameKey.eq(key))
            .order_by_asc(tickets::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<tickets::Model, StoreError> {
        self.get(id).await?.ok_or(StoreError::NotFound)
    }

    async fn mark_entered(&self, id: i64) -> Result<tickets::Model, StoreError> {
        // Conditional update so two checkers cannot both admit the same ticket
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::PassedControlZone, Expr::value(true))
            .filter(tickets::Column::Id.eq(id))
            .filter(tickets::Column::PassedControlZone.eq(false))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return match self.get(id).await? {
                Some(_) => Err(StoreError::AlreadyEntered(id)),
                None => Err(StoreError::NotFound),
            };
        }

        self.get(id).await?.ok_or(StoreError::NotFound)
    }

    async fn sell_ticket(&self, sale: &Sale, seller: &str) -> Result<i64, StoreError> {
        let key = normalize_key(&sale.full_name);

        let existing = tickets::Entity::find()
            .filter(tickets::Column::FullNameKey.eq(key.as_str()))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(StoreError::Duplicate(sale.full_name.clone()));
        }

        let ticket = tickets::ActiveModel {
            id: NotSet,
            full_name: Set(sale.full_name.clone()),
            full_name_key: Set(key),
            surname: Set(surname_key(&sale.full_name)),
            ticket_type: Set(sale.ticket_type.to_string()),
            price: Set(sale.price as i32),
            repost: Set(sale.repost),
            seller: Set(seller.to_string()),
            passed_control_zone: Set(false),
            created_at: Set(Local::now().naive_local()),
        };

        match tickets::Entity::insert(ticket).exec(&self.db).await {
            Ok(res) => Ok(res.last_insert_id),
            // Lost a race against a concurrent sale for the same buyer
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreError::Duplicate(sale.full_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
