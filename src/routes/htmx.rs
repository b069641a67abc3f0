use axum::http::{HeaderMap, StatusCode};

/// Header set by htmx on every request it issues.
pub const HX_REQUEST: &str = "hx-request";

/// Whether a response should be a swappable fragment or a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Fragment,
    Page,
}

impl RenderMode {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(HX_REQUEST) {
            Some(value) if !value.is_empty() => RenderMode::Fragment,
            _ => RenderMode::Page,
        }
    }

    /// Fragments are always sent as `200 OK` so htmx performs the swap.
    pub fn status(self, status: StatusCode) -> StatusCode {
        match self {
            RenderMode::Fragment => StatusCode::OK,
            RenderMode::Page => status,
        }
    }
}
