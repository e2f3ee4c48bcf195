use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring matched against name and description.
    pub search: Option<String>,
    /// Category id filter.
    pub category: Option<i64>,
}
