use super::CertificateUseCase;
use crate::api::error::{AppError, messages};
use crate::models::{
    Certificate, CertificateInput, CertificateRecord, EntityStatus, GeneralFilter, PaginatedList,
    User,
};
use crate::repositories::CertificateRepository;
use crate::services::image_ingestion::{ImageIngestion, is_url, stored_path_for_url};
use crate::services::storage::FileStorage;
use crate::utils::validation::certificate_rules;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

const CERTIFICATES_FOLDER: &str = "certificates";

pub struct CertificateService {
    repo: Arc<dyn CertificateRepository>,
    storage: Arc<dyn FileStorage>,
    ingestion: ImageIngestion,
}

impl CertificateService {
    pub fn new(
        repo: Arc<dyn CertificateRepository>,
        storage: Arc<dyn FileStorage>,
        domain: String,
    ) -> Self {
        Self {
            repo,
            ingestion: ImageIngestion::new(storage.clone(), domain),
            storage,
        }
    }

    /// URL payloads are kept as they are; anything else is stored as a new file.
    async fn resolve_image(&self, payload: &str) -> Result<String, AppError> {
        if is_url(payload) {
            return Ok(payload.to_string());
        }

        let destination = format!("{}/{}", CERTIFICATES_FOLDER, Uuid::new_v4());
        Ok(self.ingestion.ingest(payload, &destination).await?)
    }

    async fn delete_stored_image(&self, image_url: &str) -> Result<(), AppError> {
        let Some(path) = stored_path_for_url(image_url, self.ingestion.domain()) else {
            debug!("Image {} is not stored locally", image_url);
            return Ok(());
        };

        self.storage.delete_path(&path).await.map_err(|e| {
            error!("Failed to delete {}: {}", path, e);
            AppError::unexpected()
        })
    }

    async fn find(&self, user: &User, id: i64) -> Result<Certificate, AppError> {
        self.repo
            .get_by_id(user.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::CERTIFICATE_NOT_FOUND.to_string()))
    }
}

#[async_trait]
impl CertificateUseCase for CertificateService {
    async fn create(
        &self,
        user: &User,
        mut input: CertificateInput,
    ) -> Result<Certificate, AppError> {
        certificate_rules(&mut input)?;

        let image_url = self.resolve_image(&input.image).await?;
        let record = CertificateRecord::from_input(input, image_url);

        let mut certificate = self.repo.create(user.id, &record).await?;

        // no rollback: a failure here leaves the row Incomplete
        if let Err(e) = self
            .repo
            .set_status(user.id, certificate.id, EntityStatus::Exists)
            .await
        {
            error!(
                "Certificate {} left incomplete, status update failed: {}",
                certificate.id, e
            );
            return Err(e.into());
        }
        certificate.status_code = EntityStatus::Exists.code();

        info!("📜 Certificate {} created by user {}", certificate.id, user.id);
        Ok(certificate)
    }

    async fn list(
        &self,
        user: &User,
        filter: GeneralFilter,
    ) -> Result<PaginatedList<Certificate>, AppError> {
        if !filter.is_valid() {
            return Err(AppError::bad_request(messages::INVALID_PARAMETER));
        }

        Ok(self.repo.list(user.id, &filter).await?)
    }

    async fn get_by_id(&self, user: &User, id: i64) -> Result<Certificate, AppError> {
        self.find(user, id).await
    }

    async fn edit(
        &self,
        user: &User,
        id: i64,
        mut input: CertificateInput,
    ) -> Result<Certificate, AppError> {
        certificate_rules(&mut input)?;

        let old = self.find(user, id).await?;

        let image_url = if is_url(&input.image) {
            input.image.clone()
        } else {
            if !old.image_url.is_empty() {
                self.delete_stored_image(&old.image_url).await?;
            }
            self.resolve_image(&input.image).await?
        };

        let record = CertificateRecord::from_input(input, image_url);
        self.repo.update(user.id, id, &record).await?;
        self.repo
            .set_status(user.id, id, EntityStatus::Exists)
            .await?;

        self.find(user, id).await
    }

    async fn delete(&self, user: &User, id: i64) -> Result<(), AppError> {
        let existing = self
            .repo
            .find_any(user.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(messages::CERTIFICATE_NOT_FOUND.to_string()))?;

        if existing.status_code == EntityStatus::Deleted.code() {
            debug!("Certificate {} already deleted", id);
            return Ok(());
        }

        if !existing.image_url.is_empty() {
            self.delete_stored_image(&existing.image_url).await?;
        }

        self.repo
            .set_status(user.id, id, EntityStatus::Deleted)
            .await?;

        info!("🗑️ Certificate {} deleted by user {}", id, user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use sea_orm::DbErr;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    const DOMAIN: &str = "http://localhost:3000";

    #[derive(Default)]
    struct MockCertificateRepository {
        rows: Mutex<HashMap<i64, Certificate>>,
        next_id: AtomicI64,
        fail_set_status: AtomicBool,
    }

    #[async_trait]
    impl CertificateRepository for MockCertificateRepository {
        async fn create(
            &self,
            user_id: i64,
            record: &CertificateRecord,
        ) -> Result<Certificate, DbErr> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let certificate = Certificate {
                id,
                user_id,
                image_url: record.image_url.clone(),
                name: record.name.clone(),
                is_active: record.is_active,
                address: record.address.clone(),
                cpf: record.cpf.clone(),
                cnpj: record.cnpj.clone(),
                phone: record.phone.clone(),
                email: record.email.clone(),
                last_visit_date: None,
                status_code: EntityStatus::Incomplete.code(),
                modified_at: None,
                created_at: None,
            };
            self.rows.lock().unwrap().insert(id, certificate.clone());
            Ok(certificate)
        }

        async fn set_status(
            &self,
            user_id: i64,
            id: i64,
            status: EntityStatus,
        ) -> Result<(), DbErr> {
            if self.fail_set_status.load(Ordering::SeqCst) {
                return Err(DbErr::Custom("status update failed".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(row) if row.user_id == user_id => {
                    row.status_code = status.code();
                    Ok(())
                }
                _ => Err(DbErr::RecordNotUpdated),
            }
        }

        async fn list(
            &self,
            user_id: i64,
            filter: &GeneralFilter,
        ) -> Result<PaginatedList<Certificate>, DbErr> {
            let items: Vec<Certificate> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.user_id == user_id && c.status_code != EntityStatus::Deleted.code())
                .cloned()
                .collect();
            let total = items.len() as u64;
            Ok(PaginatedList::new(items, total, filter.limit))
        }

        async fn get_by_id(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr> {
            Ok(self
                .find_any(user_id, id)
                .await?
                .filter(|c| c.status_code != EntityStatus::Deleted.code()))
        }

        async fn find_any(&self, user_id: i64, id: i64) -> Result<Option<Certificate>, DbErr> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&id)
                .filter(|c| c.user_id == user_id)
                .cloned())
        }

        async fn update(
            &self,
            user_id: i64,
            id: i64,
            record: &CertificateRecord,
        ) -> Result<(), DbErr> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .get_mut(&id)
                .filter(|c| c.user_id == user_id)
                .ok_or(DbErr::RecordNotUpdated)?;
            row.name = record.name.clone();
            row.image_url = record.image_url.clone();
            row.phone = record.phone.clone();
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStorage {
        files: Mutex<HashMap<String, Vec<u8>>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileStorage for MemoryStorage {
        async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Key not found"))
        }

        async fn write(&self, path: &str, data: &[u8]) -> anyhow::Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn delete_path(&self, path: &str) -> anyhow::Result<()> {
            if self.files.lock().unwrap().remove(path).is_some() {
                self.deleted.lock().unwrap().push(path.to_string());
            }
            Ok(())
        }

        async fn exists(&self, path: &str) -> anyhow::Result<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn create_folder_if_not_exists(&self, _path: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            name: "Tester".to_string(),
            social_name: None,
            document: None,
            email: "tester@example.com".to_string(),
            user_type: UserType::Flat1.code(),
            is_active: true,
            is_foreigner: true,
            status_code: EntityStatus::Exists.code(),
            modified_at: None,
        }
    }

    fn png_payload() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    fn setup() -> (
        CertificateService,
        Arc<MockCertificateRepository>,
        Arc<MemoryStorage>,
    ) {
        let repo = Arc::new(MockCertificateRepository::default());
        let storage = Arc::new(MemoryStorage::default());
        let service = CertificateService::new(repo.clone(), storage.clone(), DOMAIN.to_string());
        (service, repo, storage)
    }

    fn input(name: &str, image: &str) -> CertificateInput {
        CertificateInput {
            name: name.to_string(),
            image: image.to_string(),
            is_active: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_url_keeps_url() {
        let (service, _, storage) = setup();
        let created = service
            .create(&user(1), input(" Course ", "https://cdn.example.com/a.png"))
            .await
            .unwrap();

        assert_eq!(created.name, "Course");
        assert_eq!(created.image_url, "https://cdn.example.com/a.png");
        assert_eq!(created.status_code, EntityStatus::Exists.code());
        assert!(storage.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_ingests_data_uri() {
        let (service, repo, storage) = setup();
        let created = service
            .create(&user(1), input("Course", &png_payload()))
            .await
            .unwrap();

        assert!(created.image_url.starts_with("http://localhost:3000/certificates/"));
        assert!(created.image_url.ends_with(".png"));

        let files = storage.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        let path = files.keys().next().unwrap();
        assert!(path.starts_with("images/certificates/"));

        let stored = repo.rows.lock().unwrap().get(&created.id).cloned().unwrap();
        assert_eq!(stored.status_code, EntityStatus::Exists.code());
    }

    #[tokio::test]
    async fn test_create_rejects_empty_fields() {
        let (service, repo, _) = setup();

        let err = service
            .create(&user(1), input("  ", "https://cdn.example.com/a.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == messages::EMPTY_CERTIFICATE_NAME));

        let err = service
            .create(&user(1), input("Course", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == messages::EMPTY_IMAGE));

        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unsupported_payload() {
        let (service, repo, _) = setup();
        let err = service
            .create(&user(1), input("Course", "data:image/gif;base64,R0lGOD"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == messages::INVALID_IMAGE_EXTENSION));
        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_status_update_leaves_row_incomplete() {
        let (service, repo, _) = setup();
        repo.fail_set_status.store(true, Ordering::SeqCst);

        let result = service
            .create(&user(1), input("Course", "https://cdn.example.com/a.png"))
            .await;
        assert!(result.is_err());

        let rows = repo.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.values().next().unwrap().status_code,
            EntityStatus::Incomplete.code()
        );
    }

    #[tokio::test]
    async fn test_edit_replaces_stored_image() {
        let (service, _, storage) = setup();
        let owner = user(1);
        let created = service
            .create(&owner, input("Course", &png_payload()))
            .await
            .unwrap();
        let old_path = storage.files.lock().unwrap().keys().next().cloned().unwrap();

        let edited = service
            .edit(&owner, created.id, input("Renamed", &png_payload()))
            .await
            .unwrap();

        assert_eq!(edited.name, "Renamed");
        assert_ne!(edited.image_url, created.image_url);
        assert_eq!(*storage.deleted.lock().unwrap(), vec![old_path.clone()]);
        let files = storage.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        assert!(!files.contains_key(&old_path));
    }

    #[tokio::test]
    async fn test_edit_with_url_keeps_files() {
        let (service, _, storage) = setup();
        let owner = user(1);
        let created = service
            .create(&owner, input("Course", &png_payload()))
            .await
            .unwrap();

        let edited = service
            .edit(&owner, created.id, input("Course", &created.image_url))
            .await
            .unwrap();
        assert_eq!(edited.image_url, created.image_url);
        assert!(storage.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_of_foreign_certificate_is_not_found() {
        let (service, _, _) = setup();
        let created = service
            .create(&user(1), input("Course", "https://cdn.example.com/a.png"))
            .await
            .unwrap();

        let err = service
            .edit(&user(2), created.id, input("Mine now", "https://cdn.example.com/b.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let (service, repo, storage) = setup();
        let owner = user(1);
        let created = service
            .create(&owner, input("Course", &png_payload()))
            .await
            .unwrap();

        service.delete(&owner, created.id).await.unwrap();
        service.delete(&owner, created.id).await.unwrap();

        assert!(storage.files.lock().unwrap().is_empty());
        assert_eq!(storage.deleted.lock().unwrap().len(), 1);
        assert_eq!(
            repo.rows.lock().unwrap()[&created.id].status_code,
            EntityStatus::Deleted.code()
        );

        let err = service.get_by_id(&owner, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_certificate() {
        let (service, _, _) = setup();
        let err = service.delete(&user(1), 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_page_without_limit() {
        let (service, _, _) = setup();
        let filter = GeneralFilter {
            limit: 0,
            page: 2,
            ..Default::default()
        };
        let err = service.list(&user(1), filter).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let list = service
            .list(&user(1), GeneralFilter::default())
            .await
            .unwrap();
        assert_eq!(list.total_count, 0);
    }
}
