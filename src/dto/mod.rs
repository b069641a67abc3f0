/// Game forms, JSON payloads and views.
pub mod game;
/// Health check payloads.
pub mod health;
/// Demo user views and queries.
pub mod user;
/// Field validation shared by the forms and the JSON API.
pub mod validation;
