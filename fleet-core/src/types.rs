//! Domain types for a fleet build run.
//!
//! A [`ProjectDescriptor`] is resolved once per project per run and never
//! mutated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed project identity as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(pub String);

impl ProjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Everything needed to materialize and build one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub name: ProjectName,
    /// Name of the executable the build produces.
    pub daemon_name: String,
    /// Source repository URL, as published (not yet normalized).
    pub git_repo: String,
    /// Tag or branch to check out.
    pub recommended_version: String,
}

/// A required descriptor field that may be left empty by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorField {
    GitRepo,
    DaemonName,
    RecommendedVersion,
}

impl fmt::Display for DescriptorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorField::GitRepo => write!(f, "git repo"),
            DescriptorField::DaemonName => write!(f, "daemon name"),
            DescriptorField::RecommendedVersion => write!(f, "recommended version"),
        }
    }
}

impl ProjectDescriptor {
    /// First required field that is empty or whitespace, checked in the
    /// order repo, daemon, version.
    pub fn missing_field(&self) -> Option<DescriptorField> {
        if self.git_repo.trim().is_empty() {
            Some(DescriptorField::GitRepo)
        } else if self.daemon_name.trim().is_empty() {
            Some(DescriptorField::DaemonName)
        } else if self.recommended_version.trim().is_empty() {
            Some(DescriptorField::RecommendedVersion)
        } else {
            None
        }
    }

    /// Canonical clone URL: trailing `/` and `.git` stripped, then `.git`
    /// re-appended.
    pub fn clone_url(&self) -> String {
        normalize_git_url(&self.git_repo)
    }
}

/// `https://host/org/repo/` and `https://host/org/repo.git` both become
/// `https://host/org/repo.git`.
pub fn normalize_git_url(url: &str) -> String {
    let trimmed = url.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    format!("{trimmed}.git")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
