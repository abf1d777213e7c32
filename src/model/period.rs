use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AppError;

/// Named reporting period anchored to "today".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Parses a period name. Unknown names are an error rather than a fallback to `Day`.
    pub fn parse(name: &str) -> Result<Self, AppError> {
        name.trim()
            .parse()
            .map_err(|_| AppError::InvalidArgument(format!("unknown period '{name}', expected day, week or month")))
    }
}
