use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::{
    error::{UserError, UserResult},
    hal::{self, LinkBuilder, PagedUsers, RootResource, UserResource},
    model::User,
    repo::PageRequest,
    services,
};
use crate::{config::PagingConfig, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    /// Zero or missing size falls back to the default; oversized requests are capped.
    pub fn resolve(&self, paging: &PagingConfig) -> PageRequest {
        let size = match self.size {
            None | Some(0) => paging.default_size,
            Some(s) => s.min(paging.max_size),
        };
        PageRequest {
            number: self.page.unwrap_or(0),
            size,
        }
    }
}

fn link_builder(state: &AppState) -> LinkBuilder {
    LinkBuilder::new(state.config.public_base_url.clone())
}

fn hal_json<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (status, [hal::content_type()], Json(body)).into_response()
}

fn id_from(path: Result<Path<i64>, PathRejection>) -> UserResult<i64> {
    path.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e, "invalid user id");
        UserError::BadRequest(e.body_text())
    })
}

fn body_from(body: Result<Json<User>, JsonRejection>) -> UserResult<User> {
    body.map(|Json(user)| user).map_err(|e| {
        warn!(error = %e, "unreadable user payload");
        UserError::BadRequest(e.body_text())
    })
}

#[instrument(skip(state))]
pub async fn root(State(state): State<AppState>) -> Response {
    hal_json(StatusCode::OK, RootResource::new(&link_builder(&state)))
}

#[instrument(skip(state, params))]
pub async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> UserResult<Response> {
    let Query(params) = params.map_err(|e| {
        warn!(error = %e, "invalid paging parameters");
        UserError::BadRequest(e.body_text())
    })?;
    let request = params.resolve(&state.config.paging);

    let page = services::list_users(state.users.as_ref(), request).await?;
    Ok(hal_json(
        StatusCode::OK,
        PagedUsers::new(page, &link_builder(&state)),
    ))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> UserResult<Response> {
    let id = id_from(id)?;
    let user = services::get_user(state.users.as_ref(), id).await?;
    Ok(hal_json(
        StatusCode::OK,
        UserResource::new(user, &link_builder(&state)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<User>, JsonRejection>,
) -> UserResult<Response> {
    let user = body_from(payload)?;
    let user = services::create_user(state.users.as_ref(), user).await?;

    let resource = UserResource::new(user, &link_builder(&state));
    let location = resource
        .self_href()
        .and_then(|href| HeaderValue::from_str(href).ok());

    let mut response = hal_json(StatusCode::CREATED, resource);
    if let Some(location) = location {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

#[instrument(skip(state, id, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<User>, JsonRejection>,
) -> UserResult<Response> {
    let id = id_from(id)?;
    let user = body_from(payload)?;
    let user = services::update_user(state.users.as_ref(), id, user).await?;
    Ok(hal_json(
        StatusCode::OK,
        UserResource::new(user, &link_builder(&state)),
    ))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> UserResult<StatusCode> {
    let id = id_from(id)?;
    services::delete_user(state.users.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging() -> PagingConfig {
        PagingConfig {
            default_size: 20,
            max_size: 100,
        }
    }

    #[test]
    fn page_params_defaults() {
        let req = PageParams::default().resolve(&paging());
        assert_eq!(req, PageRequest { number: 0, size: 20 });
    }

    #[test]
    fn page_params_cap_and_zero_size() {
        let capped = PageParams {
            page: Some(2),
            size: Some(5000),
        }
        .resolve(&paging());
        assert_eq!(capped, PageRequest { number: 2, size: 100 });

        let zero = PageParams {
            page: None,
            size: Some(0),
        }
        .resolve(&paging());
        assert_eq!(zero.size, 20);
    }
}
