use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Alice Rahman",
        "job_title": "Accountant",
        "email": "alice@company.com",
        "phone": "+8801712345678",
        "address": "House 12, Road 5, Dhaka",
        "created_at": "2024-01-01T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Alice Rahman")]
    pub name: String,

    #[schema(example = "Accountant")]
    pub job_title: String,

    #[schema(example = "alice@company.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "House 12, Road 5, Dhaka", nullable = true)]
    pub address: Option<String>,

    #[schema(
        example = "2024-01-01T09:00:00Z",
        value_type = String,
        format = "date-time"
    )]
    pub created_at: DateTime<Utc>,
}

/// Profile fields for a new employee. Identity and creation time are assigned by the store.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Alice Rahman")]
    pub name: String,
    #[schema(example = "Accountant")]
    pub job_title: String,
    #[schema(example = "alice@company.com", format = "email")]
    pub email: Option<String>,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Partial profile update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewEmployee {
    /// Trims free text and rejects blank required fields. Blank optionals become `None`.
    pub fn normalized(self) -> Result<Self, String> {
        Ok(NewEmployee {
            name: required("name", self.name)?,
            job_title: required("job_title", self.job_title)?,
            email: optional(self.email),
            phone: optional(self.phone),
            address: optional(self.address),
        })
    }
}

impl EmployeeUpdate {
    pub fn normalized(self) -> Result<Self, String> {
        Ok(EmployeeUpdate {
            name: self.name.map(|v| required("name", v)).transpose()?,
            job_title: self.job_title.map(|v| required("job_title", v)).transpose()?,
            email: self.email.map(|v| v.trim().to_string()),
            phone: self.phone.map(|v| v.trim().to_string()),
            address: self.address.map(|v| v.trim().to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.job_title.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }

    /// Applies the update in place. An empty string clears an optional field.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(job_title) = &self.job_title {
            employee.job_title = job_title.clone();
        }
        if let Some(email) = &self.email {
            employee.email = optional(Some(email.clone()));
        }
        if let Some(phone) = &self.phone {
            employee.phone = optional(Some(phone.clone()));
        }
        if let Some(address) = &self.address {
            employee.address = optional(Some(address.clone()));
        }
    }
}

fn required(field: &str, value: String) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
