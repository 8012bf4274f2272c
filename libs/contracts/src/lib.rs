//! Data shapes shared between the services and their clients.
//!
//! Nothing here owns behaviour beyond construction helpers and validation rules:
//!
//! - [`products`], [`users`], [`identity`], [`orders`]: request and response DTOs
//! - [`events`]: integration event payloads
//! - [`mediator`]: the `Request`/`Handler` pair used to route commands and queries

pub mod events;
pub mod identity;
pub mod mediator;
pub mod orders;
pub mod products;
pub mod users;

pub use mediator::{Handler, Request};

mod serde_helpers {
    use serde::{Deserialize, Deserializer};

    /// Accepts `"a,b"` (query strings) as well as `["a","b"]` (JSON bodies).
    pub fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Joined(String),
            List(Vec<String>),
        }

        let items = match Option::<Raw>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Raw::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
            Some(Raw::List(list)) => list,
        };

        Ok(items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect())
    }
}
