use time::{OffsetDateTime, macros::format_description};

use crate::{
    config::AppConfig,
    dao::models::UserEntity,
    view::{PageMeta, escape, layout},
};

/// Element id of the swappable users fragment.
pub const USERS_FRAGMENT_ID: &str = "users";

pub fn page(config: &AppConfig) -> String {
    let body = format!(
        r##"<h1>Hello from {app_name}!</h1>
<section>
  <button hx-get="/home/htmx/clicked" hx-target="#clicked" hx-swap="innerHTML">Ask the server</button>
  <div id="clicked"></div>
</section>
<section>
  <h2>Users</h2>
  <button hx-post="/insert-users" hx-target="#{USERS_FRAGMENT_ID}" hx-swap="outerHTML">Insert demo users</button>
  <button hx-post="/home/htmx/users" hx-target="#{USERS_FRAGMENT_ID}" hx-swap="outerHTML">Add random user</button>
  <div id="{USERS_FRAGMENT_ID}" hx-get="/home/htmx/users" hx-trigger="load" hx-swap="outerHTML"></div>
</section>"##,
        app_name = escape(&config.app_name),
    );
    layout(
        config,
        &PageMeta {
            title: "Home",
            page: "home",
        },
        &body,
    )
}

/// Static page about animals.
pub fn animals_page(config: &AppConfig) -> String {
    layout(
        config,
        &PageMeta {
            title: "Animals",
            page: "animals",
        },
        r#"<h1>Animals</h1>
<p>A page about animals.</p>
<ul>
  <li>Cats</li>
  <li>Dogs</li>
  <li>Owls</li>
</ul>"#,
    )
}

/// Greeting with the server's local time.
pub fn clicked_fragment(now: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let server_time = now.format(format).unwrap_or_else(|_| now.to_string());
    format!(
        r#"<p>You just clicked! <time datetime="{server_time}">{server_time}</time></p>"#
    )
}

/// Users list with a delete button per row.
pub fn users_fragment(users: &[UserEntity]) -> String {
    let rows: String = if users.is_empty() {
        r#"
    <li class="empty">No users yet.</li>"#
            .to_owned()
    } else {
        users
            .iter()
            .map(|user| {
                let age = user.age.map(|age| age.to_string()).unwrap_or_default();
                format!(
                    r##"
    <li>{name} ({age}) <button hx-delete="/home/htmx/users?id={id}" hx-target="#{USERS_FRAGMENT_ID}" hx-swap="outerHTML">Delete</button></li>"##,
                    name = escape(&user.name),
                    id = user.id,
                )
            })
            .collect()
    };

    format!(
        r#"<div id="{USERS_FRAGMENT_ID}">
  <ul>{rows}
  </ul>
</div>"#
    )
}
