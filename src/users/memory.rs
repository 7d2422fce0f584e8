use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    error::{UserError, UserResult},
    model::User,
    repo::{Page, PageRequest, UserRepository},
};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

/// In-memory store for development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &BTreeMap<i64, User>, email: &str, except: Option<i64>) -> bool {
    users
        .values()
        .any(|u| u.email == email && u.id != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self, page: PageRequest) -> UserResult<Page<User>> {
        let inner = self.inner.read().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content = inner
            .users
            .values()
            .skip(offset)
            .take(page.size as usize)
            .cloned()
            .collect();
        Ok(Page {
            content,
            request: page,
            total_elements: inner.users.len() as u64,
        })
    }

    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn save(&self, mut user: User) -> UserResult<User> {
        let mut inner = self.inner.write().await;

        if let Some(id) = user.id {
            if !inner.users.contains_key(&id) {
                return Err(UserError::NotFound(id));
            }
        }
        if email_taken(&inner.users, &user.email, user.id) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        let id = match user.id {
            Some(id) => id,
            None => {
                inner.last_id += 1;
                inner.last_id
            }
        };
        user.id = Some(id);
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> UserResult<bool> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }

    async fn delete_all(&self) -> UserResult<u64> {
        let mut inner = self.inner.write().await;
        let removed = inner.users.len() as u64;
        inner.users.clear();
        Ok(removed)
    }
}
