use serde::{Deserialize, Serialize};

use wikidb_common::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub admin: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub name: String,
    pub content: String,
}

/// The durable replica store: the users and pages tables every node serves
/// reads from locally, with no cross-replica consistency guarantee.
pub struct ReplicaStore {
    users: sled::Tree,
    pages: sled::Tree,
}

impl ReplicaStore {
    pub(crate) fn new(users: sled::Tree, pages: sled::Tree) -> Self {
        Self { users, pages }
    }

    /// Create-or-overwrite. Applied only from inside the same atomic step
    /// that moves a replica log entry to `committed`.
    pub fn upsert_user(&self, name: &str, admin: bool) -> Result<()> {
        let user = User {
            name: name.to_owned(),
            admin,
        };
        self.users.insert(name.as_bytes(), serde_json::to_vec(&user)?)?;
        Ok(())
    }

    pub fn upsert_page(&self, name: &str, content: &str) -> Result<()> {
        let page = Page {
            name: name.to_owned(),
            content: content.to_owned(),
        };
        self.pages.insert(name.as_bytes(), serde_json::to_vec(&page)?)?;
        Ok(())
    }

    pub fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        match self.users.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_page(&self, name: &str) -> Result<Option<Page>> {
        match self.pages.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_pages(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for item in self.pages.iter() {
            let (_, bytes) = item?;
            pages.push(serde_json::from_slice(&bytes)?);
        }
        Ok(pages)
    }

    pub fn search_pages(&self, substring: &str) -> Result<Vec<Page>> {
        Ok(self
            .list_pages()?
            .into_iter()
            .filter(|p| p.content.contains(substring) || p.name.contains(substring))
            .collect())
    }
}
