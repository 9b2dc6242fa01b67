use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A tracked site and the reporting view it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub domain: String,
    pub view_id: String,
}

impl Property {
    pub fn new(domain: &str, view_id: &str) -> Self {
        Self {
            domain: domain.to_string(),
            view_id: view_id.to_string(),
        }
    }
}

/// Supplies the properties a run reports on.
///
/// A failure here is fatal to the run: without the list there is nothing to
/// fetch.
#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn list_properties(&self) -> anyhow::Result<Vec<Property>>;
}

/// A fixed, in-memory property list.
#[derive(Debug, Clone, Default)]
pub struct StaticPropertySource {
    properties: Vec<Property>,
}

impl StaticPropertySource {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Parse `domain=view_id` pairs separated by commas.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut properties = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (domain, view_id) = entry
                .split_once('=')
                .map(|(d, v)| (d.trim(), v.trim()))
                .filter(|(d, v)| !d.is_empty() && !v.is_empty())
                .ok_or_else(|| {
                    CoreError::Config(format!("property entry '{entry}' must be domain=view_id"))
                })?;
            properties.push(Property::new(domain, view_id));
        }
        Ok(Self { properties })
    }
}

#[async_trait]
impl PropertySource for StaticPropertySource {
    async fn list_properties(&self) -> anyhow::Result<Vec<Property>> {
        Ok(self.properties.clone())
    }
}
