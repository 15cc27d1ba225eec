use serde::Deserialize;

/// Query parameters for breed listing, forwarded verbatim upstream.
#[derive(Debug, Default, Deserialize)]
pub struct BreedQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Query parameters for image search, forwarded verbatim upstream.
#[derive(Debug, Default, Deserialize)]
pub struct ImageQuery {
    pub breed_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub size: Option<String>,
    pub mime_types: Option<String>,
}
