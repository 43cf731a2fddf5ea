mod permission;
mod usecase;

pub use permission::CertificatePermissions;
pub use usecase::CertificateService;

use crate::api::error::AppError;
use crate::models::{Certificate, CertificateInput, GeneralFilter, PaginatedList, User};
use async_trait::async_trait;

/// Certificate operations on behalf of an authenticated user.
#[async_trait]
pub trait CertificateUseCase: Send + Sync {
    async fn create(&self, user: &User, input: CertificateInput) -> Result<Certificate, AppError>;

    async fn list(
        &self,
        user: &User,
        filter: GeneralFilter,
    ) -> Result<PaginatedList<Certificate>, AppError>;

    async fn get_by_id(&self, user: &User, id: i64) -> Result<Certificate, AppError>;

    async fn edit(
        &self,
        user: &User,
        id: i64,
        input: CertificateInput,
    ) -> Result<Certificate, AppError>;

    /// Soft delete. Deleting an already deleted certificate succeeds.
    async fn delete(&self, user: &User, id: i64) -> Result<(), AppError>;
}
