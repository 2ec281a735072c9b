//! Node address resolution per infrastructure provider.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use super::InfrastructureKind;
use crate::exec::{CommandExecutor, CommandLine};
use crate::{BastionError, Result};

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("dotted quad pattern is valid")
});

const ALICLOUD_IP_POINTER: &str = "/VpcAttributes/PrivateIpAddress/IpAddress/0";

/// How to find a node's address on a given provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressLookup {
    /// The node name is itself reachable.
    NodeName,
    /// Run a command and take the first IPv4 address in its output.
    FirstIpInOutput(CommandLine),
    /// Query the Alibaba Cloud instance attributes as JSON.
    AlicloudInstance {
        instance_id: String,
        command: CommandLine,
    },
}

impl InfrastructureKind {
    pub fn lookup(&self, node_name: &str) -> AddressLookup {
        match self {
            InfrastructureKind::Aws | InfrastructureKind::Openstack => AddressLookup::NodeName,
            InfrastructureKind::Google => AddressLookup::FirstIpInOutput(
                CommandLine::new("gcloud").args([
                    "compute",
                    "instances",
                    "describe",
                    node_name,
                    "--flatten=networkInterfaces[0].networkIP",
                ]),
            ),
            InfrastructureKind::Azure => AddressLookup::FirstIpInOutput(
                CommandLine::new("az").args([
                    "vm",
                    "list-ip-addresses",
                    "--name",
                    node_name,
                    "--query",
                    "[0].virtualMachine.network.privateIpAddresses",
                    "-o",
                    "json",
                ]),
            ),
            InfrastructureKind::Alicloud => {
                let instance_id = alicloud_instance_id(node_name);
                let command = CommandLine::new("aliyun").args([
                    "ecs".to_string(),
                    "DescribeInstanceAttribute".to_string(),
                    format!("--InstanceId={}", instance_id),
                ]);
                AddressLookup::AlicloudInstance {
                    instance_id,
                    command,
                }
            }
        }
    }
}

/// A node whose address has been determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    address: String,
    instance_id: Option<String>,
}

impl ResolvedNode {
    pub fn new(address: impl Into<String>, instance_id: Option<String>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(BastionError::InvalidAddress(address));
        }
        Ok(Self {
            address,
            instance_id,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Cloud instance ID, only known on Alibaba Cloud.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }
}

pub async fn resolve<E>(
    executor: &E,
    node_name: &str,
    kind: InfrastructureKind,
) -> Result<ResolvedNode>
where
    E: CommandExecutor + ?Sized,
{
    let resolved = match kind.lookup(node_name) {
        AddressLookup::NodeName => ResolvedNode::new(node_name, None)?,
        AddressLookup::FirstIpInOutput(command) => {
            let output = executor.execute(&command).await?;
            ResolvedNode::new(find_ip(&output, &command)?, None)?
        }
        AddressLookup::AlicloudInstance {
            instance_id,
            command,
        } => {
            debug!(%instance_id, "querying alicloud instance");
            let output = executor.execute(&command).await?;
            ResolvedNode::new(alicloud_private_ip(&output)?, Some(instance_id))?
        }
    };

    info!(node = node_name, infra = %kind, address = resolved.address(), "resolved node address");
    Ok(resolved)
}

/// First valid IPv4 address in free-form command output.
pub fn find_ip(output: &str, command: &CommandLine) -> Result<String> {
    DOTTED_QUAD
        .find_iter(output)
        .map(|m| m.as_str())
        .find(|candidate| candidate.parse::<Ipv4Addr>().is_ok())
        .map(String::from)
        .ok_or_else(|| BastionError::IpNotFound(command.to_string()))
}

/// Alibaba Cloud node names look like `iz<id>z`; the instance is `i-<id>`.
pub fn alicloud_instance_id(node_name: &str) -> String {
    let id = node_name
        .trim_start_matches(['i', 'z'])
        .trim_end_matches('z');
    format!("i-{}", id)
}

fn alicloud_private_ip(output: &str) -> Result<String> {
    let attributes: Value = serde_json::from_str(output).map_err(BastionError::provider_query)?;

    attributes
        .pointer(ALICLOUD_IP_POINTER)
        .and_then(Value::as_str)
        .filter(|ip| !ip.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            BastionError::ProviderQuery(
                "VpcAttributes.PrivateIpAddress.IpAddress[0] missing from instance attributes"
                    .to_string(),
            )
        })
}
