pub mod resolver;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::{BastionError, Result};

pub use resolver::{resolve, ResolvedNode};

/// Infrastructure provider hosting the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfrastructureKind {
    Aws,
    Google,
    Azure,
    Alicloud,
    Openstack,
}

impl InfrastructureKind {
    pub const ALL: [InfrastructureKind; 5] = [
        InfrastructureKind::Aws,
        InfrastructureKind::Google,
        InfrastructureKind::Azure,
        InfrastructureKind::Alicloud,
        InfrastructureKind::Openstack,
    ];

    /// Provider name as it appears in Terraform provider blocks.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfrastructureKind::Aws => "aws",
            InfrastructureKind::Google => "google",
            InfrastructureKind::Azure => "azurerm",
            InfrastructureKind::Alicloud => "alicloud",
            InfrastructureKind::Openstack => "openstack",
        }
    }
}

impl fmt::Display for InfrastructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InfrastructureKind {
    type Err = BastionError;

    fn from_str(s: &str) -> Result<Self> {
        InfrastructureKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BastionError::UnsupportedInfrastructure(s.to_string()))
    }
}

/// Read the infrastructure kind from the first line of a Terraform root
/// module, e.g. `provider "aws" {`.
pub fn load_kind(terraform_main: &Path) -> Result<InfrastructureKind> {
    let content = std::fs::read_to_string(terraform_main).map_err(|e| {
        BastionError::InfrastructureDescriptor {
            path: terraform_main.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let first_line = content.lines().next().unwrap_or_default();
    let token = provider_token(first_line).ok_or_else(|| {
        BastionError::InfrastructureDescriptor {
            path: terraform_main.display().to_string(),
            reason: "first line does not name a provider".to_string(),
        }
    })?;

    token.parse()
}

fn provider_token(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    let token = match tokens.next()? {
        "provider" => tokens.next()?,
        other => other,
    };
    let token = token.trim_matches('"');
    (!token.is_empty()).then_some(token)
}
