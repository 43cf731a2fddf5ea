pub mod authentication;
pub mod certificate;

pub use authentication::{AuthenticationRepository, SeaOrmAuthenticationRepository};
pub use certificate::{CertificateRepository, SeaOrmCertificateRepository};
