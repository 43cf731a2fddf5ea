use crate::api::error::{AppError, messages};
use crate::config::Settings;
use crate::models::{AuthSession, LoginCredentials, RegisterUser, ResetPassword, User};
use crate::repositories::AuthenticationRepository;
use crate::repositories::authentication::NewUser;
use crate::services::mail::MailSender;
use crate::utils::auth::{create_jwt, hash_password, validate_jwt, verify_password};
use crate::utils::text::{capitalize_words, sanitize_login};
use crate::utils::validation::{validate_new_password, validate_user_register};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[async_trait]
pub trait AuthUseCase: Send + Sync {
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, AppError>;
    async fn register(&self, payload: RegisterUser) -> Result<User, AppError>;
    /// Unknown logins are answered the same way as known ones.
    async fn request_password_recovery(&self, login: &str, ip: Option<&str>)
    -> Result<(), AppError>;
    async fn reset_password(&self, reset: ResetPassword) -> Result<(), AppError>;
    /// Resolves a bearer token to an active user.
    async fn authenticate(&self, token: &str) -> Result<User, AppError>;
}

pub struct AuthService {
    repo: Arc<dyn AuthenticationRepository>,
    mailer: Arc<dyn MailSender>,
    settings: Settings,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AuthenticationRepository>,
        mailer: Arc<dyn MailSender>,
        settings: Settings,
    ) -> Self {
        Self {
            repo,
            mailer,
            settings,
        }
    }

    fn forbidden() -> AppError {
        AppError::Forbidden(messages::FORBIDDEN.to_string())
    }

    fn unauthorized() -> AppError {
        AppError::Unauthorized(messages::UNAUTHORIZED.to_string())
    }
}

#[async_trait]
impl AuthUseCase for AuthService {
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, AppError> {
        let login = credentials.login.trim();
        if login.is_empty() {
            return Err(AppError::bad_request(messages::LOGIN_CANNOT_BE_EMPTY));
        }
        if credentials.password.is_empty() {
            return Err(AppError::bad_request(messages::EMPTY_PASSWORD_FIELD));
        }

        let login = sanitize_login(login);
        let Some(stored) = self.repo.get_user_by_login(&login).await? else {
            warn!("Login attempt for unknown user {}", login);
            return Err(Self::forbidden());
        };

        if !stored.user.is_active || !stored.user.exists() {
            warn!("Login attempt for disabled user {}", stored.user.id);
            return Err(Self::forbidden());
        }

        if !verify_password(&credentials.password, &stored.password_hash) {
            warn!("Wrong password for user {}", stored.user.id);
            return Err(Self::forbidden());
        }

        let token = create_jwt(
            stored.user.id,
            &self.settings.jwt_secret,
            self.settings.jwt_expiration_hours,
        )?;

        info!("🔑 User {} logged in", stored.user.id);
        Ok(AuthSession {
            token,
            user: stored.user,
        })
    }

    async fn register(&self, mut payload: RegisterUser) -> Result<User, AppError> {
        validate_user_register(&mut payload)?;

        if self.repo.email_exists(&payload.email).await? {
            return Err(AppError::bad_request(messages::EMAIL_EXISTS));
        }

        let document = payload.document.filter(|d| !d.is_empty());
        if let Some(document) = &document
            && self.repo.document_exists(document).await?
        {
            return Err(AppError::bad_request(messages::DOCUMENT_EXISTS));
        }

        let new_user = NewUser {
            name: capitalize_words(&payload.name),
            social_name: payload.social_name,
            document,
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
            is_foreigner: payload.is_foreigner,
            address: payload.address,
        };

        let user = self.repo.register_user(&new_user).await?;
        info!("👤 Registered user {}", user.id);
        Ok(user)
    }

    async fn request_password_recovery(
        &self,
        login: &str,
        ip: Option<&str>,
    ) -> Result<(), AppError> {
        let login = sanitize_login(login);
        if login.is_empty() {
            return Err(AppError::bad_request(messages::LOGIN_CANNOT_BE_EMPTY));
        }

        let Some(stored) = self.repo.get_user_by_login(&login).await? else {
            info!("Password recovery requested for unknown login {}", login);
            return Ok(());
        };

        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::minutes(self.settings.recovery_token_ttl_minutes);
        self.repo
            .create_recovery(stored.user.id, &token, ip, expires_at)
            .await?;

        let link = format!(
            "{}/password/reset?token={}",
            self.settings.full_domain(),
            token
        );
        let html = format!(
            "<p>Hello {},</p><p>Use the link below to choose a new password. \
             It expires in {} minutes.</p><p><a href=\"{}\">{}</a></p>",
            stored.user.name, self.settings.recovery_token_ttl_minutes, link, link
        );

        self.mailer
            .send_system_message("Password recovery", &html, &stored.user.email, &stored.user.name)
            .await
            .map_err(|e| {
                error!("Failed to send recovery mail to user {}: {}", stored.user.id, e);
                AppError::unexpected()
            })?;

        info!("📧 Password recovery sent to user {}", stored.user.id);
        Ok(())
    }

    async fn reset_password(&self, reset: ResetPassword) -> Result<(), AppError> {
        validate_new_password(&reset.password, &reset.confirmation)?;

        let token = reset.token.trim();
        let recovery = match token {
            "" => None,
            token => self.repo.find_recovery(token).await?,
        }
        .ok_or_else(|| AppError::NotFound(messages::RECOVERY_TOKEN_NOT_FOUND.to_string()))?;

        if recovery.used || recovery.expires_at < Utc::now() {
            return Err(AppError::bad_request(messages::RECOVERY_TOKEN_EXPIRED));
        }

        let password_hash = hash_password(&reset.password)?;
        self.repo
            .complete_recovery(recovery.id, recovery.user_id, &password_hash)
            .await?;

        info!("🔐 Password reset for user {}", recovery.user_id);
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = validate_jwt(token, &self.settings.jwt_secret).map_err(|e| {
            warn!("Rejected token: {}", e);
            Self::unauthorized()
        })?;
        let user_id = claims.user_id().map_err(|_| Self::unauthorized())?;

        match self.repo.get_user_by_id(user_id).await? {
            Some(user) if user.is_active && user.exists() => Ok(user),
            _ => Err(Self::unauthorized()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::run_migrations;
    use crate::repositories::SeaOrmAuthenticationRepository;
    use crate::models::Address;
    use sea_orm::Database;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MailSender for RecordingMailSender {
        async fn send_system_message(
            &self,
            _subject: &str,
            html: &str,
            email: &str,
            _name: &str,
        ) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), html.to_string()));
            Ok(())
        }
    }

    async fn setup() -> (AuthService, Arc<RecordingMailSender>) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
        let mailer = Arc::new(RecordingMailSender::default());
        let service = AuthService::new(
            Arc::new(SeaOrmAuthenticationRepository::new(db)),
            mailer.clone(),
            Settings::development(),
        );
        (service, mailer)
    }

    fn registration() -> RegisterUser {
        RegisterUser {
            name: "maria DA silva".to_string(),
            social_name: None,
            document: Some("52998224725".to_string()),
            email: "maria@example.com".to_string(),
            password: "Abc12345!".to_string(),
            password_confirmation: "Abc12345!".to_string(),
            is_foreigner: false,
            address: Address::default(),
        }
    }

    fn credentials(login: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    fn token_from(html: &str) -> String {
        let start = html.find("token=").unwrap() + "token=".len();
        html[start..start + 32].to_string()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, _) = setup().await;
        let user = service.register(registration()).await.unwrap();
        assert_eq!(user.name, "Maria Da Silva");

        let session = service
            .login(credentials("maria@example.com", "Abc12345!"))
            .await
            .unwrap();
        assert_eq!(session.user.id, user.id);

        let by_document = service
            .login(credentials("529.982.247-25", "Abc12345!"))
            .await
            .unwrap();
        assert_eq!(by_document.user.id, user.id);

        let authenticated = service.authenticate(&session.token).await.unwrap();
        assert_eq!(authenticated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (service, _) = setup().await;
        service.register(registration()).await.unwrap();

        assert!(matches!(
            service.login(credentials("  ", "x")).await,
            Err(AppError::BadRequest(msg)) if msg == messages::LOGIN_CANNOT_BE_EMPTY
        ));
        assert!(matches!(
            service.login(credentials("maria@example.com", "")).await,
            Err(AppError::BadRequest(msg)) if msg == messages::EMPTY_PASSWORD_FIELD
        ));
        assert!(matches!(
            service.login(credentials("nobody@example.com", "Abc12345!")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.login(credentials("maria@example.com", "Wrong123!")).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let (service, _) = setup().await;
        service.register(registration()).await.unwrap();

        assert!(matches!(
            service.register(registration()).await,
            Err(AppError::BadRequest(msg)) if msg == messages::EMAIL_EXISTS
        ));

        let mut same_document = registration();
        same_document.email = "other@example.com".to_string();
        assert!(matches!(
            service.register(same_document).await,
            Err(AppError::BadRequest(msg)) if msg == messages::DOCUMENT_EXISTS
        ));
    }

    #[tokio::test]
    async fn test_password_recovery_cycle() {
        let (service, mailer) = setup().await;
        service.register(registration()).await.unwrap();

        service
            .request_password_recovery("maria@example.com", Some("127.0.0.1"))
            .await
            .unwrap();
        let token = {
            let sent = mailer.sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].0, "maria@example.com");
            token_from(&sent[0].1)
        };

        let reset = ResetPassword {
            token: token.clone(),
            password: "NewPass1!".to_string(),
            confirmation: "NewPass1!".to_string(),
        };
        service.reset_password(reset.clone()).await.unwrap();

        // single use
        assert!(matches!(
            service.reset_password(reset).await,
            Err(AppError::BadRequest(msg)) if msg == messages::RECOVERY_TOKEN_EXPIRED
        ));

        assert!(service
            .login(credentials("maria@example.com", "NewPass1!"))
            .await
            .is_ok());
        assert!(service
            .login(credentials("maria@example.com", "Abc12345!"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_recovery_for_unknown_login_sends_nothing() {
        let (service, mailer) = setup().await;
        service
            .request_password_recovery("ghost@example.com", None)
            .await
            .unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());

        let reset = ResetPassword {
            token: "unknown".to_string(),
            password: "NewPass1!".to_string(),
            confirmation: "NewPass1!".to_string(),
        };
        assert!(matches!(
            service.reset_password(reset).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.authenticate("not.a.token").await,
            Err(AppError::Unauthorized(_))
        ));

        let orphan = create_jwt(404, &Settings::development().jwt_secret, 1).unwrap();
        assert!(matches!(
            service.authenticate(&orphan).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
