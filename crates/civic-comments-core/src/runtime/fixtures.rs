// crates/civic-comments-core/src/runtime/fixtures.rs
// ============================================================================
// Module: Fixture Seeding
// Description: Bulk loading of organizations, spaces, resources, and users.
// Purpose: Seed any backend from a JSON document in dependency order.
// Dependencies: crate::core, crate::interfaces, serde, serde_json
// ============================================================================

//! ## Overview
//! Organizations, processes, components, resources, and users are not managed
//! by the comments service; they are seeded. A [`FixtureSet`] is applied in
//! dependency order (organizations, users, processes, components, resources)
//! so a single document can describe a complete space.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::Component;
use crate::core::Organization;
use crate::core::ParticipatoryProcess;
use crate::core::Resource;
use crate::core::User;
use crate::interfaces::FixtureWriter;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Records to seed into a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSet {
    /// Organizations.
    #[serde(default)]
    pub organizations: Vec<Organization>,
    /// Users.
    #[serde(default)]
    pub users: Vec<User>,
    /// Participatory processes.
    #[serde(default)]
    pub processes: Vec<ParticipatoryProcess>,
    /// Components.
    #[serde(default)]
    pub components: Vec<Component>,
    /// Commentable resources.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Counts of seeded records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FixtureSummary {
    /// Seeded organizations.
    pub organizations: usize,
    /// Seeded users.
    pub users: usize,
    /// Seeded processes.
    pub processes: usize,
    /// Seeded components.
    pub components: usize,
    /// Seeded resources.
    pub resources: usize,
}

impl FixtureSet {
    /// Parses a fixture document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the document is not valid fixture JSON.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|err| StoreError::Invalid(err.to_string()))
    }

    /// Applies every record to the writer in dependency order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on the first failing write.
    pub fn apply<W: FixtureWriter + ?Sized>(&self, writer: &W) -> Result<FixtureSummary, StoreError> {
        for organization in &self.organizations {
            writer.put_organization(organization)?;
        }
        for user in &self.users {
            writer.put_user(user)?;
        }
        for process in &self.processes {
            writer.put_process(process)?;
        }
        for component in &self.components {
            writer.put_component(component)?;
        }
        for resource in &self.resources {
            writer.put_resource(resource)?;
        }
        Ok(FixtureSummary {
            organizations: self.organizations.len(),
            users: self.users.len(),
            processes: self.processes.len(),
            components: self.components.len(),
            resources: self.resources.len(),
        })
    }
}
