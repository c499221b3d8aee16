use axum::{extract::State, response::Html};

use crate::{
    content,
    error::Result,
    storage::{NewsPost, SermonPost},
    sync::youtube,
    util::html_escape,
    AppState,
};

/// Layout template
const LAYOUT: &str = include_str!("../../templates/layout.html");
/// Home page content
const HOME_CONTENT: &str = include_str!("../../templates/home_content.html");
/// News / bulletin gallery content
const NEWS_CONTENT: &str = include_str!("../../templates/news_content.html");
/// Sermons gallery content
const SERMONS_CONTENT: &str = include_str!("../../templates/sermons_content.html");

/// Number of sermons shown per worship section
const SERMONS_PER_SECTION: usize = 3;

fn render_page(page_title: &str, active: &str, content: &str) -> Html<String> {
    let html = LAYOUT
        .replace("{{ page_title }}", page_title)
        .replace(
            "{{ home_active }}",
            if active == "home" { " class=\"active\"" } else { "" },
        )
        .replace(
            "{{ news_active }}",
            if active == "news" { " class=\"active\"" } else { "" },
        )
        .replace(
            "{{ sermons_active }}",
            if active == "sermons" { " class=\"active\"" } else { "" },
        )
        .replace("{{ content }}", content);
    Html(html)
}

/// Build the card markup for a single sermon, embedding the video when an
/// id is known
fn sermon_card(sermon: &SermonPost) -> String {
    let video_id = if sermon.video_id.is_empty() {
        youtube::video_id_from_url(&sermon.youtube_url)
    } else {
        Some(sermon.video_id.clone())
    };

    let embed = match video_id {
        Some(id) => format!(
            r#"<div class="video-frame"><iframe src="https://www.youtube.com/embed/{}" title="{}" allowfullscreen></iframe></div>"#,
            id,
            html_escape(&sermon.title)
        ),
        None => String::new(),
    };

    let date_badge = content::display_date(&sermon.title)
        .map(|d| format!(r#"<span class="date-badge">{}</span>"#, d))
        .unwrap_or_default();

    format!(
        r#"<div class="card sermon-card">{}<div class="card-body">{}<span class="category">{}</span><h3>{}</h3></div></div>"#,
        embed,
        date_badge,
        html_escape(&sermon.preacher),
        html_escape(&sermon.title)
    )
}

fn news_card(post: &NewsPost) -> String {
    let image = if post.image_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="card-image"><img src="{}" alt="{}" referrerpolicy="no-referrer" loading="lazy"></div>"#,
            html_escape(&post.image_url),
            html_escape(&post.title)
        )
    };

    let body = if post.content.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", html_escape(&post.content))
    };

    format!(
        r#"<div class="card news-card">{}<div class="card-body"><h3>{}</h3>{}</div></div>"#,
        image,
        html_escape(&post.title),
        body
    )
}

fn empty_state(message: &str) -> String {
    format!(r#"<div class="empty-state"><p>{}</p></div>"#, message)
}

/// GET / - Home page: hero, latest sermon, worship times, location, offering
pub async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    let sermons = state.storage.list_sermons().await?;
    let sunday = content::sunday_sermons(&sermons);

    let latest_sermon = sunday
        .first()
        .map(sermon_card)
        .unwrap_or_else(|| empty_state("등록된 주일예배 영상이 없습니다."));

    let content = HOME_CONTENT.replace("{{ latest_sermon }}", &latest_sermon);
    Ok(render_page("홈", "home", &content))
}

/// GET /news - Bulletin gallery, newest first by the title date prefix
pub async fn news_page(State(state): State<AppState>) -> Result<Html<String>> {
    let news = content::sort_news(state.storage.list_news().await?);

    let cards = if news.is_empty() {
        empty_state("등록된 소식이 없습니다.")
    } else {
        news.iter().map(news_card).collect::<Vec<_>>().join("\n")
    };

    let content = NEWS_CONTENT.replace("{{ news_cards }}", &cards);
    Ok(render_page("교회 소식", "news", &content))
}

/// GET /sermons - Sermon galleries for Sunday and dawn worship
pub async fn sermons_page(State(state): State<AppState>) -> Result<Html<String>> {
    let sermons = state.storage.list_sermons().await?;

    let section = |selected: Vec<SermonPost>, empty_message: &str| {
        if selected.is_empty() {
            empty_state(empty_message)
        } else {
            selected
                .iter()
                .take(SERMONS_PER_SECTION)
                .map(sermon_card)
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let sunday_cards = section(
        content::sunday_sermons(&sermons),
        "등록된 주일예배 영상이 없습니다.",
    );
    let dawn_cards = section(
        content::dawn_sermons(&sermons),
        "등록된 새벽예배 영상이 없습니다.",
    );

    let content = SERMONS_CONTENT
        .replace("{{ sunday_cards }}", &sunday_cards)
        .replace("{{ dawn_cards }}", &dawn_cards)
        .replace("{{ channel_url }}", &state.config.youtube_channel_url);
    Ok(render_page("말씀", "sermons", &content))
}
