//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use super::views::{ProductCardView, format_date, product_cards, shorten};
use crate::backend::{News, ProductQuery};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::state::AppState;

const FEATURED_COUNT: u32 = 8;
const LATEST_COUNT: u32 = 8;
const NEWS_COUNT: usize = 3;

/// News teaser on the home page and news index.
#[derive(Clone)]
pub struct NewsCardView {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub image: Option<String>,
    pub date: String,
}

impl From<&News> for NewsCardView {
    fn from(news: &News) -> Self {
        let summary = news
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| news.content.clone());
        Self {
            id: news.id.to_string(),
            title: news.title.clone(),
            summary: shorten(&summary, 160),
            image: news.image.clone(),
            date: format_date(news.created_at),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCardView>,
    pub latest: Vec<ProductCardView>,
    pub news: Vec<NewsCardView>,
}

/// Display the home page.
///
/// Featured and latest products and news load in parallel; any failing
/// section renders empty.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let featured_query = ProductQuery {
        limit: Some(FEATURED_COUNT),
        sort: Some("-rating".to_string()),
        ..ProductQuery::default()
    };
    let latest_query = ProductQuery {
        limit: Some(LATEST_COUNT),
        sort: Some("-createdAt".to_string()),
        ..ProductQuery::default()
    };

    let backend = state.backend();
    let (featured, latest, news) = tokio::join!(
        backend.list_products(&featured_query),
        backend.list_products(&latest_query),
        backend.list_news(),
    );

    let featured = featured.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load featured products");
            Vec::new()
        },
        |page| product_cards(&page.products),
    );
    let latest = latest.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load latest products");
            Vec::new()
        },
        |page| product_cards(&page.products),
    );
    let news = news.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load news");
            Vec::new()
        },
        |items| items.iter().take(NEWS_COUNT).map(NewsCardView::from).collect(),
    );

    HomeTemplate {
        page: PageContext::load(&session, user.as_ref(), nonce, "Mobistore").await,
        featured,
        latest,
        news,
    }
}
