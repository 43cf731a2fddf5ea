use crate::entities::{certificates, prelude::*};
use crate::models::{Address, Certificate, CertificateRecord, EntityStatus, GeneralFilter, PaginatedList};
use crate::utils::text::escape_like;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

/// Persistence of certificates. Every operation is scoped to the owning user.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Inserts a row in `Incomplete` status.
    async fn create(&self, user_id: i64, record: &CertificateRecord) -> Result<Certificate, DbErr>;
    async fn set_status(&self, user_id: i64, id: i64, status: EntityStatus) -> Result<(), DbErr>;
    async fn list(
        &self,
        user_id: i64,
        filter: &GeneralFilter,
    ) -> Result<PaginatedList<Certificate>, DbErr>;
    /// Soft-deleted rows are not returned.
    async fn get_by_id(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr>;
    /// Like `get_by_id` but also returns soft-deleted rows.
    async fn find_any(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr>;
    async fn update(&self, user_id: i64, id: i64, record: &CertificateRecord) -> Result<(), DbErr>;
}

impl From<certificates::Model> for Certificate {
    fn from(model: certificates::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            image_url: model.image_url,
            name: model.name,
            is_active: model.is_active,
            address: Address {
                street: model.street,
                address_number: model.address_number,
                district: model.district,
                zip_code: model.zip_code,
                city: model.city,
                state_id: model.state_id,
            },
            cpf: model.cpf,
            cnpj: model.cnpj,
            phone: model.phone,
            email: model.email,
            last_visit_date: model.last_visit_date,
            status_code: model.status_code,
            modified_at: model.modified_at,
            created_at: model.created_at,
        }
    }
}

fn apply_record(active: &mut certificates::ActiveModel, record: &CertificateRecord) {
    active.name = Set(record.name.clone());
    active.image_url = Set(record.image_url.clone());
    active.is_active = Set(record.is_active);
    active.street = Set(record.address.street.clone());
    active.address_number = Set(record.address.address_number);
    active.district = Set(record.address.district.clone());
    active.zip_code = Set(record.address.zip_code.clone());
    active.city = Set(record.address.city.clone());
    active.state_id = Set(record.address.state_id);
    active.cpf = Set(record.cpf.clone());
    active.cnpj = Set(record.cnpj.clone());
    active.phone = Set(record.phone.clone());
    active.email = Set(record.email.clone());
    active.modified_at = Set(Some(Utc::now()));
}

fn lower_name_like(pattern: String) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(certificates::Column::Name)))
        .like(LikeExpr::new(pattern).escape('\\'))
}

pub struct SeaOrmCertificateRepository {
    db: DatabaseConnection,
}

impl SeaOrmCertificateRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn owned(user_id: i64) -> Select<Certificates> {
        Certificates::find().filter(certificates::Column::UserId.eq(user_id))
    }

    fn visible(user_id: i64) -> Select<Certificates> {
        Self::owned(user_id)
            .filter(certificates::Column::StatusCode.ne(EntityStatus::Deleted.code()))
    }
}

#[async_trait]
impl CertificateRepository for SeaOrmCertificateRepository {
    async fn create(&self, user_id: i64, record: &CertificateRecord) -> Result<Certificate, DbErr> {
        let now = Utc::now();
        let mut active = certificates::ActiveModel {
            user_id: Set(user_id),
            status_code: Set(EntityStatus::Incomplete.code()),
            created_at: Set(Some(now)),
            ..Default::default()
        };
        apply_record(&mut active, record);

        let model = active.insert(&self.db).await?;
        Ok(model.into())
    }

    async fn set_status(&self, user_id: i64, id: i64, status: EntityStatus) -> Result<(), DbErr> {
        let result = Certificates::update_many()
            .col_expr(certificates::Column::StatusCode, Expr::value(status.code()))
            .col_expr(certificates::Column::ModifiedAt, Expr::value(Utc::now()))
            .filter(certificates::Column::Id.eq(id))
            .filter(certificates::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotUpdated);
        }
        Ok(())
    }

    async fn list(
        &self,
        user_id: i64,
        filter: &GeneralFilter,
    ) -> Result<PaginatedList<Certificate>, DbErr> {
        let mut query = Self::visible(user_id);

        if let Some(status) = filter.status {
            query = query.filter(certificates::Column::StatusCode.eq(status));
        }
        if let Some(active) = filter.active {
            query = query.filter(certificates::Column::IsActive.eq(active));
        }

        let search = filter.search.trim().to_lowercase();
        if !search.is_empty() {
            let escaped = escape_like(&search);
            query = query.filter(lower_name_like(format!("%{}%", escaped)));
        }

        let total_count = query.clone().count(&self.db).await?;

        let order = if filter.ordination_asc {
            Order::Asc
        } else {
            Order::Desc
        };

        if !search.is_empty() {
            let escaped = escape_like(&search);
            // lower rank sorts first: prefix, substring, suffix, no match
            let rank: SimpleExpr = Expr::case(lower_name_like(format!("{}%", escaped)), 1)
                .case(lower_name_like(format!("%{}", escaped)), 3)
                .case(lower_name_like(format!("%{}%", escaped)), 2)
                .finally(4)
                .into();
            query = query.order_by(rank, Order::Asc);
        }

        query = if filter.column == "name" || !search.is_empty() {
            query.order_by(certificates::Column::Name, order.clone())
        } else {
            query.order_by(certificates::Column::ModifiedAt, order.clone())
        };
        query = query.order_by(certificates::Column::Id, order);

        if filter.limit > 0 {
            query = query.offset(filter.offset()).limit(filter.limit);
        }

        let items = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(Certificate::from)
            .collect();

        Ok(PaginatedList::new(items, total_count, filter.limit))
    }

    async fn get_by_id(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr> {
        let model = Self::visible(user_id)
            .filter(certificates::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        Ok(model.map(Certificate::from))
    }

    async fn find_any(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr> {
        let model = Self::owned(user_id)
            .filter(certificates::Column::Id.eq(id))
            .one(&self.db)
            .await?;
        Ok(model.map(Certificate::from))
    }

    async fn update(&self, user_id: i64, id: i64, record: &CertificateRecord) -> Result<(), DbErr> {
        let model = Self::visible(user_id)
            .filter(certificates::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("certificate {}", id)))?;

        let mut active: certificates::ActiveModel = model.into();
        apply_record(&mut active, record);
        active.update(&self.db).await?;
        Ok(())
    }
}
