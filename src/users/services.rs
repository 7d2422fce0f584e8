use tracing::{info, warn};

use super::{
    error::{UserError, UserResult},
    model::User,
    repo::{Page, PageRequest, UserRepository},
};

fn validated(user: &User) -> UserResult<()> {
    user.validate().map_err(|errors| {
        warn!(?user, violations = errors.len(), "user rejected");
        UserError::Validation(errors)
    })
}

/// Email must not belong to any user other than `owner`.
async fn ensure_email_free(
    repo: &dyn UserRepository,
    email: &str,
    owner: Option<i64>,
) -> UserResult<()> {
    match repo.find_by_email(email).await? {
        Some(existing) if existing.id != owner => {
            warn!(email, "email already registered");
            Err(UserError::DuplicateEmail(email.to_string()))
        }
        _ => Ok(()),
    }
}

pub async fn list_users(repo: &dyn UserRepository, page: PageRequest) -> UserResult<Page<User>> {
    repo.find_all(page).await
}

pub async fn get_user(repo: &dyn UserRepository, id: i64) -> UserResult<User> {
    repo.find_by_id(id).await?.ok_or(UserError::NotFound(id))
}

pub async fn create_user(repo: &dyn UserRepository, mut user: User) -> UserResult<User> {
    user.id = None;
    validated(&user)?;
    ensure_email_free(repo, &user.email, None).await?;

    let user = repo.save(user).await?;
    info!(?user, "user created");
    Ok(user)
}

/// Full replace: every field of the stored record is overwritten.
pub async fn update_user(repo: &dyn UserRepository, id: i64, mut user: User) -> UserResult<User> {
    validated(&user)?;
    if repo.find_by_id(id).await?.is_none() {
        return Err(UserError::NotFound(id));
    }
    ensure_email_free(repo, &user.email, Some(id)).await?;

    user.id = Some(id);
    let user = repo.save(user).await?;
    info!(?user, "user updated");
    Ok(user)
}

pub async fn delete_user(repo: &dyn UserRepository, id: i64) -> UserResult<()> {
    if !repo.delete_by_id(id).await? {
        return Err(UserError::NotFound(id));
    }
    info!(user_id = id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::InMemoryUserRepository;

    fn user() -> User {
        User::new("fname", "lname", "lf@email.local", "12345678")
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let repo = InMemoryUserRepository::new();
        let created = create_user(&repo, user()).await.unwrap();
        let id = created.id.unwrap();
        assert_eq!(get_user(&repo, id).await.unwrap(), user());
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let repo = InMemoryUserRepository::new();
        let mut input = user();
        input.id = Some(500);
        let created = create_user(&repo, input).await.unwrap();
        assert_eq!(created.id, Some(1));
    }

    #[tokio::test]
    async fn invalid_user_is_never_stored() {
        let repo = InMemoryUserRepository::new();
        let mut input = user();
        input.password = "short".into();
        let err = create_user(&repo, input).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
        let page = list_users(&repo, PageRequest { number: 0, size: 20 })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let repo = InMemoryUserRepository::new();
        let err = update_user(&repo, 3, user()).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound(3)));
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let repo = InMemoryUserRepository::new();
        let mut input = user();
        input.lastname.clear();
        let err = update_user(&repo, 3, input).await.unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        create_user(&repo, user()).await.unwrap();
        let other = create_user(
            &repo,
            User::new("a", "b", "other@email.local", "12345678"),
        )
        .await
        .unwrap();

        let err = update_user(&repo, other.id.unwrap(), user()).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let repo = InMemoryUserRepository::new();
        assert!(matches!(
            delete_user(&repo, 1).await.unwrap_err(),
            UserError::NotFound(1)
        ));
    }
}
