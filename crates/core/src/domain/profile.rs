// Profile Domain Model - named ordered sets of changes

use serde::Serialize;
use std::collections::HashSet;

use super::change::ChangeSpec;
use super::error::{DomainError, Result};

/// Name of the profile that concatenates every category
pub const ALL_PROFILE: &str = "All";

/// Named, ordered sequence of changes
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    name: String,
    specs: Vec<ChangeSpec>,
}

impl Profile {
    /// Create a profile; `order` and descriptor ids must be unique
    pub fn new(name: impl Into<String>, mut specs: Vec<ChangeSpec>) -> Result<Self> {
        let name = name.into();

        let mut orders = HashSet::new();
        let mut ids = HashSet::new();
        for spec in &specs {
            if !orders.insert(spec.order) {
                return Err(DomainError::DuplicateOrder {
                    profile: name,
                    order: spec.order,
                });
            }
            if !ids.insert(spec.id.as_str()) {
                return Err(DomainError::DuplicateDescriptor {
                    profile: name,
                    id: spec.id.clone(),
                });
            }
        }

        specs.sort_by_key(|s| s.order);
        Ok(Self { name, specs })
    }

    /// Concatenate profiles, keeping each one's internal order
    ///
    /// Orders are renumbered from 1 so they stay unique in the result.
    pub fn concat<'a>(
        name: impl Into<String>,
        parts: impl IntoIterator<Item = &'a Profile>,
    ) -> Result<Self> {
        let specs = parts
            .into_iter()
            .flat_map(|p| p.specs.iter())
            .enumerate()
            .map(|(i, spec)| spec.with_order(i as u32 + 1))
            .collect();
        Self::new(name, specs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[ChangeSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Process-wide set of profiles, built once at startup
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
}

impl ProfileCatalog {
    /// Profile names must be unique (case-insensitive)
    pub fn new(profiles: Vec<Profile>) -> Result<Self> {
        let mut names = HashSet::new();
        for profile in &profiles {
            if !names.insert(profile.name.to_ascii_lowercase()) {
                return Err(DomainError::DuplicateProfile(profile.name.clone()));
            }
        }
        Ok(Self { profiles })
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.name.clone()).collect()
    }

    /// Case-insensitive lookup
    pub fn resolve(&self, name: &str) -> Option<&Profile> {
        let name = name.trim();
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }
}
