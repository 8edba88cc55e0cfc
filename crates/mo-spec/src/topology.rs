//! Topology types and orchestration resource paths
//!
//! Every deployment lives under a resource collection of the orchestration
//! service:
//! - `Standalone` → `/v1/servers`
//! - `Sharded` → `/v1/sharded_clusters`
//! - `ReplicaSet` → `/v1/replica_sets`
//!
//! A single deployment is addressed as `/v1/{collection}/{id}` where `id` is
//! the `initConfig.id` of the specification.

use crate::error::SpecError;
use crate::specification::TestSpecification;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// API version prefix of every orchestration resource path
pub const API_PREFIX: &str = "/v1";

/// Kind of deployment a specification asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopologyType {
    /// A single mongod
    Standalone,
    /// A sharded cluster with mongos routers
    Sharded,
    /// A replica set
    ReplicaSet,
}

impl TopologyType {
    /// All known topology types
    pub const ALL: [Self; 3] = [Self::Standalone, Self::Sharded, Self::ReplicaSet];

    /// Resource collection the orchestration service keeps this topology in
    #[inline]
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Standalone => "servers",
            Self::Sharded => "sharded_clusters",
            Self::ReplicaSet => "replica_sets",
        }
    }

    /// Name as written in a specification
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "Standalone",
            Self::Sharded => "Sharded",
            Self::ReplicaSet => "ReplicaSet",
        }
    }
}

impl FromStr for TopologyType {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpecError::UnrecognizedTopologyType(s.to_string()))
    }
}

impl Display for TopologyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestration resource path for a specification's deployment
///
/// With `include_id` false the path names the resource collection and is the
/// target of the provisioning `post`. With `include_id` true the deployment id
/// from `initConfig.id` is appended after exactly one `/`; that path is the
/// target of the deprovisioning `delete`.
///
/// # Errors
/// [`SpecError::MissingDeploymentId`] when `include_id` is set and
/// `initConfig.id` is absent or not a string.
pub fn resolve_path(spec: &TestSpecification, include_id: bool) -> Result<String, SpecError> {
    let base = format!("{API_PREFIX}/{}", spec.topology.collection());
    if !include_id {
        return Ok(base);
    }

    let id = spec.deployment_id()?;
    Ok(format!("{base}/{id}"))
}
