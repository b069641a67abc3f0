use crate::{
    config::AppConfig,
    dao::models::GameEntity,
    dto::{
        game::{OldInput, REORDER_FIELD},
        validation::{FORM_FIELD, FieldErrors},
    },
    view::{PageMeta, escape, layout},
};

/// Element id of the swappable games fragment.
pub const FRAGMENT_ID: &str = "games__list";

/// Everything the games fragment shows: the ranking, errors and echoed input.
#[derive(Debug, Clone, Copy)]
pub struct GamesListing<'a> {
    pub games: &'a [GameEntity],
    pub errors: &'a FieldErrors,
    pub old: Option<&'a OldInput>,
}

impl GamesListing<'_> {
    fn max_rank(&self) -> i64 {
        self.games.last().map(|game| game.rank).unwrap_or(0)
    }

    fn error(&self, field: &str) -> String {
        self.errors
            .get(field)
            .map(|message| {
                format!(
                    r#"<p class="error" data-field="{field}">{}</p>"#,
                    escape(message)
                )
            })
            .unwrap_or_default()
    }
}

/// Add form plus the sortable ranking, swapped as one unit by HTMX.
pub fn list_fragment(listing: &GamesListing<'_>) -> String {
    let next_rank = listing.max_rank() + 1;
    let (title, rank) = match listing.old {
        Some(old) => (escape(&old.title), escape(&old.rank)),
        None => (String::new(), next_rank.to_string()),
    };
    let form_error = listing.error(FORM_FIELD);
    let title_error = listing.error("title");
    let rank_error = listing.error("rank");

    let ranking = if listing.games.is_empty() {
        r#"<p class="empty">No games yet.</p>"#.to_owned()
    } else {
        let items: String = listing
            .games
            .iter()
            .map(|game| {
                format!(
                    r#"
      <li data-id="{id}"><input type="hidden" name="{REORDER_FIELD}" value="{id}"><span class="rank">{rank}</span> {title}</li>"#,
                    id = game.id,
                    rank = game.rank,
                    title = escape(&game.title),
                )
            })
            .collect();
        format!(r#"<ol class="sortable">{items}
    </ol>"#)
    };

    format!(
        r##"<div id="{FRAGMENT_ID}">
  <form class="games__add" method="post" action="/games" hx-post="/games" hx-target="#{FRAGMENT_ID}" hx-swap="outerHTML">
    {form_error}
    <label>Title <input name="title" value="{title}" required minlength="3"></label>
    {title_error}
    <label>Rank <input name="rank" type="number" min="1" max="{next_rank}" value="{rank}"></label>
    {rank_error}
    <button type="submit">Add game</button>
  </form>
  <form class="games__reorder" method="post" action="/games/reorder" hx-post="/games/reorder" hx-trigger="end" hx-target="#{FRAGMENT_ID}" hx-swap="outerHTML">
    {ranking}
    <noscript><button type="submit">Save order</button></noscript>
  </form>
</div>"##
    )
}

/// Full games page around [`list_fragment`].
pub fn page(config: &AppConfig, listing: &GamesListing<'_>) -> String {
    let body = format!("<h1>Games</h1>\n{}", list_fragment(listing));
    layout(
        config,
        &PageMeta {
            title: "Games",
            page: "games",
        },
        &body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn games() -> Vec<GameEntity> {
        vec![
            GameEntity {
                id: 7,
                title: "Chess".into(),
                rank: 1,
            },
            GameEntity {
                id: 3,
                title: "<Go>".into(),
                rank: 2,
            },
        ]
    }

    #[test]
    fn fragment_lists_games_in_rank_order_with_hidden_ids() {
        let games = games();
        let errors = FieldErrors::new();
        let html = list_fragment(&GamesListing {
            games: &games,
            errors: &errors,
            old: None,
        });

        let chess = html.find(r#"name="game" value="7""#).unwrap();
        let go = html.find(r#"name="game" value="3""#).unwrap();
        assert!(chess < go);
        assert!(html.contains("&lt;Go&gt;"));
        assert!(html.contains(r#"id="games__list""#));
        // default rank is the append slot
        assert!(html.contains(r#"max="3" value="3""#));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn fragment_shows_errors_and_echoes_input() {
        let games = games();
        let mut errors = FieldErrors::new();
        errors.insert("title", "The title must be at least 3 characters long.");
        errors.insert(FORM_FIELD, "Failed to add game. Please try again.");
        let old = OldInput::new(" ab\" ", "9");

        let html = list_fragment(&GamesListing {
            games: &games,
            errors: &errors,
            old: Some(&old),
        });

        assert!(html.contains(r#"data-field="title">The title must be at least 3 characters long."#));
        assert!(html.contains(r#"data-field="_form">Failed to add game."#));
        assert!(html.contains(r#"value="ab&quot;""#));
        assert!(html.contains(r#"value="9""#));
    }

    #[test]
    fn empty_ranking_offers_rank_one() {
        let errors = FieldErrors::new();
        let html = page(
            &AppConfig::default(),
            &GamesListing {
                games: &[],
                errors: &errors,
                old: None,
            },
        );
        assert!(html.contains("No games yet."));
        assert!(html.contains(r#"max="1" value="1""#));
        assert!(html.starts_with("<!doctype html>"));
    }
}
