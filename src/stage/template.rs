use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::order::EnemyOrder;
use crate::path::Path;
use crate::trigger::EntityKind;

/// Static description of a spawnable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub name: String,
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
    /// Orders queued on every entity spawned from this template.
    #[serde(default)]
    pub orders: Vec<EnemyOrder>,
}

fn default_hit_points() -> u32 {
    1
}

impl EntityTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hit_points: default_hit_points(),
            orders: Vec::new(),
        }
    }
}

/// Immutable table of entity templates, indexed per [`EntityKind`].
///
/// Owned by the level-loading context and handed to the driver at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRegistry {
    enemy: Vec<EntityTemplate>,
    powerup: Vec<EntityTemplate>,
    object: Vec<EntityTemplate>,
}

impl TemplateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a registry of the form `{"enemy": [...], "powerup": [...], "object": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Malformed)
    }

    /// Adds a template after the existing ones of `kind`.
    #[must_use]
    pub fn with(mut self, kind: EntityKind, template: EntityTemplate) -> Self {
        self.table_mut(kind).push(template);
        self
    }

    fn table(&self, kind: EntityKind) -> &[EntityTemplate] {
        match kind {
            EntityKind::Enemy => &self.enemy,
            EntityKind::Powerup => &self.powerup,
            EntityKind::Object => &self.object,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityTemplate> {
        match kind {
            EntityKind::Enemy => &mut self.enemy,
            EntityKind::Powerup => &mut self.powerup,
            EntityKind::Object => &mut self.object,
        }
    }

    #[must_use]
    pub fn get(&self, kind: EntityKind, index: usize) -> Option<&EntityTemplate> {
        self.table(kind).get(index)
    }

    /// Looks up a template, treating a miss as a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTemplate`] if nothing is registered there.
    pub fn require(&self, kind: EntityKind, index: usize) -> Result<&EntityTemplate, ConfigError> {
        self.get(kind, index)
            .ok_or(ConfigError::UnknownTemplate { kind, index })
    }

    /// Checks that every creation node on `paths` names a registered template.
    ///
    /// # Errors
    ///
    /// Returns the first unknown template found.
    pub fn validate<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a Path>,
    ) -> Result<(), ConfigError> {
        for path in paths {
            for creation in path.nodes().filter_map(|n| n.as_creation()) {
                self.require(creation.entity_kind, creation.template_index)?;
            }
        }
        Ok(())
    }
}
