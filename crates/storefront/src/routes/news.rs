//! News route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::NewsId;

use super::PageContext;
use super::home::NewsCardView;
use super::views::format_date;
use crate::backend::News;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::state::AppState;

/// A full article. The body is plain text; blank lines separate paragraphs.
#[derive(Clone)]
pub struct ArticleView {
    pub title: String,
    pub date: String,
    pub image: Option<String>,
    pub paragraphs: Vec<String>,
}

impl From<&News> for ArticleView {
    fn from(news: &News) -> Self {
        Self {
            title: news.title.clone(),
            date: format_date(news.created_at),
            image: news.image.clone(),
            paragraphs: paragraphs(&news.content),
        }
    }
}

fn paragraphs(content: &str) -> Vec<String> {
    content
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect()
}

#[derive(Template, WebTemplate)]
#[template(path = "news/index.html")]
pub struct NewsIndexTemplate {
    pub page: PageContext,
    pub articles: Vec<NewsCardView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "news/show.html")]
pub struct NewsShowTemplate {
    pub page: PageContext,
    pub article: ArticleView,
}

/// Published articles, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let articles = match state.backend().list_news().await {
        Ok(mut news) => {
            news.retain(|n| n.published);
            news.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            news.iter().map(NewsCardView::from).collect()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load news");
            Vec::new()
        }
    };

    NewsIndexTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, "Tin tức").await,
        articles,
    }
}

/// A single article. Unpublished drafts are not shown.
#[instrument(skip(state, session, user, nonce), fields(news_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let news = state.backend().get_news(&NewsId::new(id)).await?;
    if !news.published {
        return Err(AppError::NotFound("Không tìm thấy bài viết".to_string()));
    }

    Ok(NewsShowTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, news.title.clone()).await,
        article: ArticleView::from(&news),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let text = "Dòng một\ncòn tiếp\r\n\r\nĐoạn hai\n\n\n  \n";
        assert_eq!(paragraphs(text), vec!["Dòng một còn tiếp", "Đoạn hai"]);
    }

    #[test]
    fn test_paragraphs_empty() {
        assert!(paragraphs("   ").is_empty());
    }
}
