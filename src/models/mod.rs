use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role tiers. Codes match the values persisted in `users.user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum UserType {
    Master,
    Flat3,
    Flat2,
    Flat1,
}

impl UserType {
    pub fn code(self) -> i32 {
        match self {
            UserType::Master => 1,
            UserType::Flat3 => 2,
            UserType::Flat2 => 3,
            UserType::Flat1 => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(UserType::Master),
            2 => Some(UserType::Flat3),
            3 => Some(UserType::Flat2),
            4 => Some(UserType::Flat1),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserType::Master => "master",
            UserType::Flat3 => "flat3",
            UserType::Flat2 => "flat2",
            UserType::Flat1 => "flat1",
        }
    }
}

/// Lifecycle stage of a user or certificate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EntityStatus {
    Exists,
    Deleted,
    Incomplete,
    NeedsRelation,
}

impl EntityStatus {
    pub fn code(self) -> i32 {
        match self {
            EntityStatus::Exists => 0,
            EntityStatus::Deleted => 2,
            EntityStatus::Incomplete => 3,
            EntityStatus::NeedsRelation => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(EntityStatus::Exists),
            2 => Some(EntityStatus::Deleted),
            3 => Some(EntityStatus::Incomplete),
            4 => Some(EntityStatus::NeedsRelation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub address_number: Option<i32>,
    pub district: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "stateID")]
    pub state_id: Option<i32>,
}

/// Authenticated identity as seen by the use cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub social_name: Option<String>,
    pub document: Option<String>,
    pub email: String,
    /// Raw role code; see [`UserType`].
    pub user_type: i32,
    pub is_active: bool,
    pub is_foreigner: bool,
    pub status_code: i32,
    pub modified_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn role(&self) -> Option<UserType> {
        UserType::from_code(self.user_type)
    }

    pub fn is_master(&self) -> bool {
        self.role() == Some(UserType::Master)
    }

    pub fn is_flat3(&self) -> bool {
        self.role() == Some(UserType::Flat3)
    }

    pub fn is_flat2(&self) -> bool {
        self.role() == Some(UserType::Flat2)
    }

    pub fn is_flat1(&self) -> bool {
        self.role() == Some(UserType::Flat1)
    }

    pub fn exists(&self) -> bool {
        self.status_code == EntityStatus::Exists.code()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub name: String,
    pub is_active: bool,
    pub address: Address,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub last_visit_date: Option<DateTime<Utc>>,
    #[serde(rename = "status_code")]
    pub status_code: i32,
    #[serde(rename = "lastChange")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(rename = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/edit payload. `image` is either a public URL or a data URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateInput {
    #[serde(rename = "imageBase64")]
    pub image: String,
    pub name: String,
    pub is_active: bool,
    pub address: Address,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Row values handed to the repository after validation and ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateRecord {
    pub name: String,
    pub image_url: String,
    pub is_active: bool,
    pub address: Address,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CertificateRecord {
    pub fn from_input(input: CertificateInput, image_url: String) -> Self {
        Self {
            name: input.name,
            image_url,
            is_active: input.is_active,
            address: input.address,
            cpf: input.cpf,
            cnpj: input.cnpj,
            phone: input.phone,
            email: input.email,
        }
    }
}

/// Query shaping for list operations. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralFilter {
    pub column: String,
    pub ordination_asc: bool,
    pub limit: u64,
    pub page: u64,
    pub search: String,
    /// Only rows with this status code (soft-deleted rows are never listed)
    pub status: Option<i32>,
    /// Only rows with this active flag
    pub active: Option<bool>,
}

impl GeneralFilter {
    /// A page without a limit has no meaning.
    pub fn is_valid(&self) -> bool {
        !(self.limit == 0 && self.page != 0)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(CertificateList = PaginatedList<Certificate>)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub total_count: u64,
    pub requested_count: u64,
}

impl<T> PaginatedList<T> {
    /// `page` carries the page count derived from `total_count` and `limit`.
    pub fn new(items: Vec<T>, total_count: u64, limit: u64) -> Self {
        let page = if limit > 0 {
            total_count.div_ceil(limit)
        } else if total_count > 0 {
            1
        } else {
            0
        };

        Self {
            requested_count: items.len() as u64,
            items,
            page,
            total_count,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginCredentials {
    pub login: String,
    pub password: String,
}

/// Successful login: the signed token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterUser {
    pub name: String,
    pub social_name: Option<String>,
    pub document: Option<String>,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub is_foreigner: bool,
    pub address: Address,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetPassword {
    pub token: String,
    pub password: String,
    pub confirmation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessfulRequest {
    pub success: bool,
}

impl SuccessfulRequest {
    pub fn new() -> Self {
        Self { success: true }
    }
}

impl Default for SuccessfulRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        let list = PaginatedList::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 25, 10);
        assert_eq!(list.page, 3);
        assert_eq!(list.total_count, 25);
        assert_eq!(list.requested_count, 10);
    }

    #[test]
    fn test_unbounded_list_has_single_page() {
        let list = PaginatedList::new(vec!["a", "b"], 2, 0);
        assert_eq!(list.page, 1);

        let empty: PaginatedList<()> = PaginatedList::new(vec![], 0, 0);
        assert_eq!(empty.page, 0);
    }

    #[test]
    fn test_filter_offset_and_validity() {
        let filter = GeneralFilter {
            limit: 10,
            page: 3,
            ..Default::default()
        };
        assert!(filter.is_valid());
        assert_eq!(filter.offset(), 20);

        let first = GeneralFilter {
            limit: 10,
            page: 0,
            ..Default::default()
        };
        assert_eq!(first.offset(), 0);

        let invalid = GeneralFilter {
            limit: 0,
            page: 2,
            ..Default::default()
        };
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_role_codes() {
        for role in [
            UserType::Master,
            UserType::Flat3,
            UserType::Flat2,
            UserType::Flat1,
        ] {
            assert_eq!(UserType::from_code(role.code()), Some(role));
        }
        assert_eq!(UserType::from_code(0), None);
        assert_eq!(UserType::from_code(99), None);
    }

    #[test]
    fn test_certificate_input_accepts_wire_names() {
        let input: CertificateInput = serde_json::from_str(
            r#"{"imageBase64": "https://cdn.example.com/a.png", "name": "Course", "isActive": true}"#,
        )
        .unwrap();
        assert_eq!(input.image, "https://cdn.example.com/a.png");
        assert_eq!(input.name, "Course");
        assert!(input.is_active);
    }
}
