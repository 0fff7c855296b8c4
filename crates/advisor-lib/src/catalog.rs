//! Size catalog per tier
//!
//! Builds the ordered list of purchasable node shapes for every tier from
//! an Elastic Cloud deployment template, and maps an observed disk total
//! back to the catalog entry it most likely came from.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use crate::models::{Size, Tier};
use crate::units::bytes_size;

/// Highest node count a single tier can be scaled out to
pub const MAX_NODES_PER_TIER: u64 = 32;

/// Bytes per MiB, the unit of template discrete sizes
pub const MIB: u64 = 1024 * 1024;

/// Deployment template as returned by `/api/v1/deployments/templates`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentTemplate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instance_configurations: Vec<InstanceConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceConfiguration {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub node_types: Vec<String>,
    #[serde(default)]
    pub discrete_sizes: DiscreteSizes,
    #[serde(default)]
    pub storage_multiplier: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscreteSizes {
    /// Memory sizes in MiB, ascending
    #[serde(default)]
    pub sizes: Vec<u64>,
    #[serde(default)]
    pub default_size: Option<u64>,
    #[serde(default)]
    pub resource: Option<String>,
}

fn tier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.es\.data([^.]+)\.").expect("valid tier pattern"))
}

/// Ordered size catalog for each tier, smallest shape first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierSizes(BTreeMap<Tier, Vec<Size>>);

impl TierSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from the instance configurations of a template.
    ///
    /// Every discrete size becomes one entry. Beyond the largest discrete
    /// size, full nodes are appended for 2 up to [`MAX_NODES_PER_TIER`]
    /// nodes. Configurations whose ID does not name a data tier are skipped.
    pub fn from_template(template: &DeploymentTemplate) -> Self {
        let mut tier_sizes = Self::new();

        for config in &template.instance_configurations {
            let Some(tier) = tier_pattern()
                .captures(&config.id)
                .and_then(|captures| captures[1].parse::<Tier>().ok())
            else {
                debug!(instance_configuration = %config.id, "Skipping non data tier configuration");
                continue;
            };

            let sizes = build_sizes(&config.discrete_sizes.sizes, config.storage_multiplier);
            if sizes.is_empty() {
                debug!(instance_configuration = %config.id, "Skipping configuration without discrete sizes");
                continue;
            }

            tier_sizes.insert(tier, sizes);
        }

        tier_sizes
    }

    pub fn insert(&mut self, tier: Tier, sizes: Vec<Size>) {
        self.0.insert(tier, sizes);
    }

    pub fn get(&self, tier: Tier) -> Option<&[Size]> {
        self.0.get(&tier).map(Vec::as_slice)
    }

    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the catalog entry whose disk is closest to `disk_total`.
    ///
    /// The first entry reaching the minimal delta wins. A tier without a
    /// catalog maps to index 0.
    pub fn nearest_index(&self, tier: Tier, disk_total: u64) -> usize {
        let Some(sizes) = self.get(tier) else {
            return 0;
        };

        let mut index = 0;
        let mut min_delta = u64::MAX;
        for (i, size) in sizes.iter().enumerate() {
            let delta = size.disk.abs_diff(disk_total);
            if delta < min_delta {
                min_delta = delta;
                index = i;
            }
        }

        index
    }
}

fn build_sizes(discrete_sizes: &[u64], storage_multiplier: f64) -> Vec<Size> {
    let Some(&largest) = discrete_sizes.last() else {
        return Vec::new();
    };

    let disk_for = |memory_mib: u64| (memory_mib as f64 * storage_multiplier * MIB as f64) as u64;

    let mut sizes: Vec<Size> = discrete_sizes
        .iter()
        .map(|&memory_mib| Size {
            disk: disk_for(memory_mib),
            memory: memory_mib * MIB,
        })
        .collect();

    let full_node = Size {
        disk: disk_for(largest),
        memory: largest * MIB,
    };
    sizes.extend((2..=MAX_NODES_PER_TIER).map(|nodes| Size {
        disk: nodes * full_node.disk,
        memory: nodes * full_node.memory,
    }));

    sizes
}

impl fmt::Display for TierSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Disk sizes per tier:")?;
        for (tier, sizes) in &self.0 {
            writeln!(f, "{tier}:")?;
            let line = sizes
                .iter()
                .map(|size| format!("disk: {} (memory: {})", bytes_size(size.disk as f64), bytes_size(size.memory as f64)))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "{line}")?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> DeploymentTemplate {
        serde_json::from_str(
            r#"{
                "id": "azure-general-purpose-v2",
                "instance_configurations": [
                    {
                        "id": "azure.es.datahot.edsv4",
                        "discrete_sizes": {"sizes": [1024, 2048, 4096], "default_size": 4096, "resource": "memory"},
                        "storage_multiplier": 35.0
                    },
                    {
                        "id": "azure.es.datafrozen.edsv4",
                        "discrete_sizes": {"sizes": [4096, 8192], "resource": "memory"},
                        "storage_multiplier": 90.0
                    },
                    {
                        "id": "azure.es.master.fsv2",
                        "discrete_sizes": {"sizes": [1024]},
                        "storage_multiplier": 4.0
                    },
                    {
                        "id": "azure.es.datacontent.edsv4",
                        "discrete_sizes": {"sizes": [1024]},
                        "storage_multiplier": 35.0
                    },
                    {
                        "id": "azure.es.datawarm.empty",
                        "discrete_sizes": {"sizes": []},
                        "storage_multiplier": 35.0
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_template_tiers() {
        let sizes = TierSizes::from_template(&template());
        let tiers: Vec<_> = sizes.tiers().collect();
        assert_eq!(tiers, vec![Tier::Hot, Tier::Frozen]);
    }

    #[test]
    fn test_discrete_and_full_node_entries() {
        let sizes = TierSizes::from_template(&template());
        let hot = sizes.get(Tier::Hot).unwrap();

        assert_eq!(hot.len(), 3 + MAX_NODES_PER_TIER as usize - 1);
        assert_eq!(hot[0], Size { disk: 1024 * 35 * MIB, memory: 1024 * MIB });
        assert_eq!(hot[2], Size { disk: 4096 * 35 * MIB, memory: 4096 * MIB });
        assert_eq!(hot[3], Size { disk: 2 * 4096 * 35 * MIB, memory: 2 * 4096 * MIB });
        assert_eq!(hot.last().unwrap().disk, 32 * 4096 * 35 * MIB);
    }

    #[test]
    fn test_catalog_ascending() {
        let sizes = TierSizes::from_template(&template());
        for tier in sizes.tiers() {
            let catalog = sizes.get(tier).unwrap();
            assert!(catalog.windows(2).all(|w| w[0].disk < w[1].disk));
        }
    }

    #[test]
    fn test_nearest_index_first_minimum_wins() {
        let mut sizes = TierSizes::new();
        sizes.insert(
            Tier::Hot,
            [10, 20, 30].map(|disk| Size { disk, memory: disk }).to_vec(),
        );

        assert_eq!(sizes.nearest_index(Tier::Hot, 15), 0);
        assert_eq!(sizes.nearest_index(Tier::Hot, 16), 1);
        assert_eq!(sizes.nearest_index(Tier::Hot, 25), 1);
        assert_eq!(sizes.nearest_index(Tier::Hot, 1000), 2);
        assert_eq!(sizes.nearest_index(Tier::Hot, 0), 0);
    }

    #[test]
    fn test_nearest_index_missing_tier() {
        let sizes = TierSizes::new();
        assert_eq!(sizes.nearest_index(Tier::Cold, 12345), 0);
    }

    #[test]
    fn test_display_lists_tiers() {
        let sizes = TierSizes::from_template(&template());
        let rendered = sizes.to_string();
        assert!(rendered.starts_with("Disk sizes per tier:\nhot:\ndisk: 35GiB (memory: 1GiB), disk: 70GiB (memory: 2GiB)"));
        assert!(rendered.contains("frozen:\n"));
    }
}
