//! Query parameters shared by listings.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::dao::tournament_store::Page;

/// Offset/limit query parameters of paginated listings.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Records to skip (default 0).
    pub offset: Option<usize>,
    /// Records to return (default 100, at most 1000).
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Page::new(query.offset, query.limit)
    }
}
