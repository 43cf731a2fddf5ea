use super::CertificateUseCase;
use crate::api::error::{AppError, messages};
use crate::models::{Certificate, CertificateInput, GeneralFilter, PaginatedList, User};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Role check in front of another [`CertificateUseCase`].
/// Rejected calls never reach the wrapped implementation.
pub struct CertificatePermissions {
    inner: Arc<dyn CertificateUseCase>,
}

impl CertificatePermissions {
    pub fn new(inner: Arc<dyn CertificateUseCase>) -> Self {
        Self { inner }
    }

    fn authorize(user: &User, operation: &str) -> Result<(), AppError> {
        // master and every flat tier share the same certificate permissions
        if user.role().is_some() {
            return Ok(());
        }

        warn!(
            user_id = user.id,
            user_type = user.user_type,
            "{} certificate denied",
            operation
        );
        Err(AppError::Unauthorized(messages::UNAUTHORIZED.to_string()))
    }
}

#[async_trait]
impl CertificateUseCase for CertificatePermissions {
    async fn create(&self, user: &User, input: CertificateInput) -> Result<Certificate, AppError> {
        Self::authorize(user, "create")?;
        self.inner.create(user, input).await
    }

    async fn list(
        &self,
        user: &User,
        filter: GeneralFilter,
    ) -> Result<PaginatedList<Certificate>, AppError> {
        Self::authorize(user, "list")?;
        self.inner.list(user, filter).await
    }

    async fn get_by_id(&self, user: &User, id: i64) -> Result<Certificate, AppError> {
        Self::authorize(user, "get")?;
        self.inner.get_by_id(user, id).await
    }

    async fn edit(
        &self,
        user: &User,
        id: i64,
        input: CertificateInput,
    ) -> Result<Certificate, AppError> {
        Self::authorize(user, "edit")?;
        self.inner.edit(user, id, input).await
    }

    async fn delete(&self, user: &User, id: i64) -> Result<(), AppError> {
        Self::authorize(user, "delete")?;
        self.inner.delete(user, id).await
    }
}
