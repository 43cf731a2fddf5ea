pub use super::certificates::Entity as Certificates;
pub use super::password_recoveries::Entity as PasswordRecoveries;
pub use super::users::Entity as Users;
