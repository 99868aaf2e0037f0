use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 42,
    "employee_code": "EMP-042",
    "full_name": "Budi Santoso",
    "email": "budi@office.example",
    "phone": "+628123456789",
    "rotation_offset": 2,
    "status": "active"
}))]
pub struct Employee {
    pub id: u64,

    #[schema(example = "EMP-042")]
    pub employee_code: String,

    pub full_name: String,

    pub email: String,

    pub phone: Option<String>,

    /// Phase within the 5-slot shift rotation; admin-assigned, 0..=4.
    #[schema(minimum = 0, maximum = 4)]
    pub rotation_offset: u8,

    pub status: EmployeeStatus,
}
