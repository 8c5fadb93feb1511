//! News management: list, create, edit and delete articles.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use mobistore_core::NewsId;
use mobistore_core::validation::{FieldErrors, NewsForm};

use super::views::NewsRowView;
use super::{PageContext, set_flash};
use crate::backend::News;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "news/index.html")]
pub struct NewsIndexTemplate {
    pub page: PageContext,
    pub articles: Vec<NewsRowView>,
}

/// Values of the create/edit form.
#[derive(Clone, Default)]
pub struct NewsFormView {
    pub action: String,
    pub heading: &'static str,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub image: String,
    pub published: bool,
}

impl NewsFormView {
    fn blank() -> Self {
        Self {
            action: "/news".to_string(),
            heading: "Viết bài mới",
            published: true,
            ..Self::default()
        }
    }

    fn for_article(news: &News) -> Self {
        Self {
            action: format!("/news/{}", news.id),
            heading: "Sửa bài viết",
            title: news.title.clone(),
            summary: news.summary.clone().unwrap_or_default(),
            content: news.content.clone(),
            image: news.image.clone().unwrap_or_default(),
            published: news.published,
        }
    }

    /// Re-show what was submitted.
    fn resubmitted(form: &NewsForm, editing: Option<&NewsId>) -> Self {
        let (action, heading) = match editing {
            Some(id) => (format!("/news/{id}"), "Sửa bài viết"),
            None => ("/news".to_string(), "Viết bài mới"),
        };
        Self {
            action,
            heading,
            title: form.title.clone(),
            summary: form.summary.clone().unwrap_or_default(),
            content: form.content.clone(),
            image: form.image.clone().unwrap_or_default(),
            published: form.published.is_some(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "news/form.html")]
pub struct NewsFormTemplate {
    pub page: PageContext,
    pub form: NewsFormView,
    pub errors: FieldErrors,
}

async fn render_form(
    session: &Session,
    admin: &CurrentAdmin,
    form: NewsFormView,
    errors: FieldErrors,
) -> Response {
    let title = form.heading;
    NewsFormTemplate {
        page: PageContext::load(session, admin, "/news", title).await,
        form,
        errors,
    }
    .into_response()
}

/// Turn a backend rejection into a form error, or propagate it.
fn rejection(err: crate::backend::BackendError) -> Result<FieldErrors> {
    let Some(message) = err.user_message().map(str::to_owned) else {
        return Err(err.into());
    };
    let mut errors = FieldErrors::new();
    errors.add("form", message);
    Ok(errors)
}

/// All articles, newest first.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse> {
    let mut news = state.backend().list_news(&admin.token).await?;
    news.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(NewsIndexTemplate {
        page: PageContext::load(&session, &admin, "/news", "Tin tức").await,
        articles: news.iter().map(NewsRowView::from).collect(),
    })
}

/// Empty create form.
pub async fn new_page(session: Session, RequireAdmin(admin): RequireAdmin) -> Response {
    render_form(&session, &admin, NewsFormView::blank(), FieldErrors::new()).await
}

/// Create an article.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<NewsForm>,
) -> Result<Response> {
    let errors = match form.validate() {
        Ok(article) => match state.backend().create_news(&admin.token, &article).await {
            Ok(created) => {
                tracing::info!(news_id = %created.id, "News article created");
                set_flash(&session, Flash::success("Đã đăng bài viết")).await;
                return Ok(Redirect::to("/news").into_response());
            }
            Err(e) => rejection(e)?,
        },
        Err(errors) => errors,
    };

    Ok(render_form(&session, &admin, NewsFormView::resubmitted(&form, None), errors).await)
}

/// Edit form for an existing article.
#[instrument(skip(state, session, admin), fields(news_id = %id))]
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Response> {
    let news = state.backend().get_news(&admin.token, &NewsId::new(id)).await?;
    Ok(render_form(&session, &admin, NewsFormView::for_article(&news), FieldErrors::new()).await)
}

/// Update an article.
#[instrument(skip(state, session, admin, form), fields(news_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(form): Form<NewsForm>,
) -> Result<Response> {
    let id = NewsId::new(id);
    let errors = match form.validate() {
        Ok(article) => match state.backend().update_news(&admin.token, &id, &article).await {
            Ok(_) => {
                tracing::info!(news_id = %id, "News article updated");
                set_flash(&session, Flash::success("Đã cập nhật bài viết")).await;
                return Ok(Redirect::to("/news").into_response());
            }
            Err(e) => rejection(e)?,
        },
        Err(errors) => errors,
    };

    Ok(render_form(&session, &admin, NewsFormView::resubmitted(&form, Some(&id)), errors).await)
}

/// Delete an article.
#[instrument(skip(state, session, admin), fields(news_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    let id = NewsId::new(id);
    match state.backend().delete_news(&admin.token, &id).await {
        Ok(()) => {
            tracing::info!(news_id = %id, "News article deleted");
            set_flash(&session, Flash::success("Đã xóa bài viết")).await;
        }
        Err(e) => {
            let errors = rejection(e)?;
            if let Some(message) = errors.get("form") {
                set_flash(&session, Flash::error(message)).await;
            }
        }
    }
    Ok(Redirect::to("/news"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resubmitted_keeps_values() {
        let form = NewsForm {
            title: "Ra mắt".into(),
            summary: None,
            content: String::new(),
            image: Some("https://cdn.mobistore.vn/a.jpg".into()),
            published: None,
        };
        let view = NewsFormView::resubmitted(&form, Some(&NewsId::new("n1")));
        assert_eq!(view.action, "/news/n1");
        assert_eq!(view.image, "https://cdn.mobistore.vn/a.jpg");
        assert!(!view.published);
    }

    #[test]
    fn test_blank_form_defaults_to_published() {
        let view = NewsFormView::blank();
        assert_eq!(view.action, "/news");
        assert!(view.published);
    }

    #[test]
    fn test_server_rejection_propagates() {
        let err = crate::backend::BackendError::Status {
            status: 500,
            message: "boom".into(),
        };
        assert!(rejection(err).is_err());
        let err = crate::backend::BackendError::Status {
            status: 400,
            message: "Tiêu đề đã tồn tại".into(),
        };
        assert_eq!(rejection(err).unwrap().get("form"), Some("Tiêu đề đã tồn tại"));
    }
}
