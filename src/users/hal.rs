//! HAL (`application/hal+json`) representations of users.

use std::collections::BTreeMap;

use axum::http::{header, HeaderValue};
use serde::Serialize;

use super::{model::User, repo::Page};

pub const HAL_JSON: &str = "application/hal+json";

pub fn content_type() -> (header::HeaderName, HeaderValue) {
    (header::CONTENT_TYPE, HeaderValue::from_static(HAL_JSON))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
        }
    }

    pub fn templated(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: true,
        }
    }
}

pub type Links = BTreeMap<&'static str, Link>;

/// Builds hrefs under an optional public base URL.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn users(&self) -> String {
        format!("{}/users", self.base)
    }

    pub fn user(&self, id: i64) -> String {
        format!("{}/users/{}", self.base, id)
    }

    pub fn users_page(&self, number: u64, size: u32) -> String {
        format!("{}/users?page={}&size={}", self.base, number, size)
    }
}

#[derive(Debug, Serialize)]
pub struct UserResource {
    #[serde(flatten)]
    pub user: User,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl UserResource {
    pub fn new(user: User, links: &LinkBuilder) -> Self {
        let mut map = Links::new();
        if let Some(id) = user.id {
            let href = links.user(id);
            map.insert("self", Link::new(href.clone()));
            map.insert("user", Link::new(href));
        }
        Self { user, links: map }
    }

    /// Target of the `self` link, used for the `Location` header.
    pub fn self_href(&self) -> Option<&str> {
        self.links.get("self").map(|l| l.href.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct EmbeddedUsers {
    pub users: Vec<UserResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u32,
}

#[derive(Debug, Serialize)]
pub struct PagedUsers {
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedUsers,
    #[serde(rename = "_links")]
    pub links: Links,
    pub page: PageMetadata,
}

impl PagedUsers {
    pub fn new(page: Page<User>, links: &LinkBuilder) -> Self {
        let size = page.request.size;
        let number = page.request.number;
        let total_pages = page.total_pages();
        let current = u64::from(number);

        let mut map = Links::new();
        map.insert("self", Link::new(links.users_page(current, size)));
        if total_pages > 0 {
            map.insert("first", Link::new(links.users_page(0, size)));
            map.insert("last", Link::new(links.users_page(total_pages - 1, size)));
        }
        if current > 0 {
            // past-the-end pages point back at the last real page
            let prev = (current - 1).min(total_pages.saturating_sub(1));
            map.insert("prev", Link::new(links.users_page(prev, size)));
        }
        if current + 1 < total_pages {
            map.insert("next", Link::new(links.users_page(current + 1, size)));
        }

        let metadata = PageMetadata {
            size,
            total_elements: page.total_elements,
            total_pages,
            number,
        };
        let users = page
            .content
            .into_iter()
            .map(|u| UserResource::new(u, links))
            .collect();

        Self {
            embedded: EmbeddedUsers { users },
            links: map,
            page: metadata,
        }
    }
}

/// Entry point document listing the exported collections.
#[derive(Debug, Serialize)]
pub struct RootResource {
    #[serde(rename = "_links")]
    pub links: Links,
}

impl RootResource {
    pub fn new(links: &LinkBuilder) -> Self {
        let mut map = Links::new();
        map.insert(
            "users",
            Link::templated(format!("{}{{?page,size}}", links.users())),
        );
        Self { links: map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::PageRequest;
    use serde_json::{json, Value};

    fn stored(id: i64) -> User {
        User::with_id(id, "fname", "lname", format!("u{id}@email.local"), "12345678")
    }

    fn page(number: u32, size: u32, total: u64, ids: &[i64]) -> Page<User> {
        Page {
            content: ids.iter().copied().map(stored).collect(),
            request: PageRequest { number, size },
            total_elements: total,
        }
    }

    #[test]
    fn user_resource_shape() {
        let resource = UserResource::new(stored(1), &LinkBuilder::new(""));
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "firstname": "fname",
                "lastname": "lname",
                "email": "u1@email.local",
                "password": "12345678",
                "_links": {
                    "self": { "href": "/users/1" },
                    "user": { "href": "/users/1" }
                }
            })
        );
        assert_eq!(resource.self_href(), Some("/users/1"));
    }

    #[test]
    fn links_use_public_base_url() {
        let resource = UserResource::new(stored(5), &LinkBuilder::new("http://api.local"));
        assert_eq!(resource.self_href(), Some("http://api.local/users/5"));
    }

    #[test]
    fn empty_collection_keeps_embedded_array() {
        let paged = PagedUsers::new(page(0, 20, 0, &[]), &LinkBuilder::new(""));
        let value = serde_json::to_value(&paged).unwrap();
        assert_eq!(value["_embedded"]["users"], json!([]));
        assert_eq!(
            value["page"],
            json!({ "size": 20, "totalElements": 0, "totalPages": 0, "number": 0 })
        );
        let links = value["_links"].as_object().unwrap();
        let keys: Vec<_> = links.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["self"]);
    }

    #[test]
    fn middle_page_has_full_navigation() {
        let paged = PagedUsers::new(page(1, 2, 5, &[3, 4]), &LinkBuilder::new(""));
        let value: Value = serde_json::to_value(&paged).unwrap();
        let links = &value["_links"];
        assert_eq!(links["self"]["href"], "/users?page=1&size=2");
        assert_eq!(links["first"]["href"], "/users?page=0&size=2");
        assert_eq!(links["prev"]["href"], "/users?page=0&size=2");
        assert_eq!(links["next"]["href"], "/users?page=2&size=2");
        assert_eq!(links["last"]["href"], "/users?page=2&size=2");
        assert_eq!(value["page"]["totalPages"], 3);
        assert_eq!(value["_embedded"]["users"][0]["_links"]["self"]["href"], "/users/3");
    }

    #[test]
    fn last_page_has_no_next() {
        let paged = PagedUsers::new(page(2, 2, 5, &[5]), &LinkBuilder::new(""));
        assert!(paged.links.get("next").is_none());
        assert!(paged.links.get("prev").is_some());
    }

    #[test]
    fn page_past_the_end_points_back_to_last() {
        let paged = PagedUsers::new(page(9, 2, 5, &[]), &LinkBuilder::new(""));
        assert_eq!(paged.links["prev"].href, "/users?page=2&size=2");
        assert!(paged.links.get("next").is_none());
    }

    #[test]
    fn root_links_to_templated_users() {
        let value = serde_json::to_value(RootResource::new(&LinkBuilder::new(""))).unwrap();
        assert_eq!(
            value,
            json!({ "_links": { "users": { "href": "/users{?page,size}", "templated": true } } })
        );
    }
}
