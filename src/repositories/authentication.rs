use crate::entities::{password_recoveries, prelude::*, users};
use crate::models::{Address, EntityStatus, User, UserType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

/// A user row together with its password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub social_name: Option<String>,
    pub document: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub is_foreigner: bool,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryToken {
    pub id: i64,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

#[async_trait]
pub trait AuthenticationRepository: Send + Sync {
    /// Looks a user up by email or document. Soft-deleted users are skipped.
    async fn get_user_by_login(&self, login: &str) -> Result<Option<StoredUser>, DbErr>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbErr>;
    async fn email_exists(&self, email: &str) -> Result<bool, DbErr>;
    async fn document_exists(&self, document: &str) -> Result<bool, DbErr>;
    /// New users are `Flat1` and already in `Exists` status.
    async fn register_user(&self, user: &NewUser) -> Result<User, DbErr>;
    async fn create_recovery(
        &self,
        user_id: i64,
        token: &str,
        ip: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbErr>;
    async fn find_recovery(&self, token: &str) -> Result<Option<RecoveryToken>, DbErr>;
    /// Stores the new hash and consumes the token in one transaction.
    async fn complete_recovery(
        &self,
        recovery_id: i64,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), DbErr>;
}

impl From<users::Model> for StoredUser {
    fn from(model: users::Model) -> Self {
        Self {
            password_hash: model.password_hash.clone(),
            user: model.into(),
        }
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            social_name: model.social_name,
            document: model.document,
            email: model.email,
            user_type: model.user_type,
            is_active: model.is_active,
            is_foreigner: model.is_foreigner,
            status_code: model.status_code,
            modified_at: model.modified_at,
        }
    }
}

pub struct SeaOrmAuthenticationRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuthenticationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthenticationRepository for SeaOrmAuthenticationRepository {
    async fn get_user_by_login(&self, login: &str) -> Result<Option<StoredUser>, DbErr> {
        let model = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Email.eq(login.to_lowercase()))
                    .add(users::Column::Document.eq(login)),
            )
            .filter(users::Column::StatusCode.ne(EntityStatus::Deleted.code()))
            .one(&self.db)
            .await?;
        Ok(model.map(StoredUser::from))
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbErr> {
        Ok(Users::find_by_id(id).one(&self.db).await?.map(User::from))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = Users::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn document_exists(&self, document: &str) -> Result<bool, DbErr> {
        let count = Users::find()
            .filter(users::Column::Document.eq(document))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn register_user(&self, user: &NewUser) -> Result<User, DbErr> {
        let now = Utc::now();
        let model = users::ActiveModel {
            name: Set(user.name.clone()),
            social_name: Set(user.social_name.clone()),
            document: Set(user.document.clone().filter(|d| !d.is_empty())),
            email: Set(user.email.to_lowercase()),
            password_hash: Set(user.password_hash.clone()),
            user_type: Set(UserType::Flat1.code()),
            is_active: Set(true),
            is_foreigner: Set(user.is_foreigner),
            status_code: Set(EntityStatus::Exists.code()),
            street: Set(user.address.street.clone()),
            address_number: Set(user.address.address_number),
            district: Set(user.address.district.clone()),
            zip_code: Set(user.address.zip_code.clone()),
            city: Set(user.address.city.clone()),
            state_id: Set(user.address.state_id),
            created_at: Set(Some(now)),
            modified_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(model.into())
    }

    async fn create_recovery(
        &self,
        user_id: i64,
        token: &str,
        ip: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        password_recoveries::ActiveModel {
            user_id: Set(user_id),
            token: Set(token.to_string()),
            ip: Set(ip.map(str::to_string)),
            expires_at: Set(expires_at),
            used: Set(false),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn find_recovery(&self, token: &str) -> Result<Option<RecoveryToken>, DbErr> {
        let model = PasswordRecoveries::find()
            .filter(password_recoveries::Column::Token.eq(token))
            .one(&self.db)
            .await?;

        Ok(model.map(|m| RecoveryToken {
            id: m.id,
            user_id: m.user_id,
            expires_at: m.expires_at,
            used: m.used,
        }))
    }

    async fn complete_recovery(
        &self,
        recovery_id: i64,
        user_id: i64,
        password_hash: &str,
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::ModifiedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;

        PasswordRecoveries::update_many()
            .col_expr(password_recoveries::Column::Used, Expr::value(true))
            .filter(password_recoveries::Column::Id.eq(recovery_id))
            .exec(&txn)
            .await?;

        txn.commit().await
    }
}
