//! Zone capability aggregation
//!
//! Pure converters from backend infrastructure-element descriptors to the
//! canonical zone capability summary. Tag mapping is table driven with an
//! explicit fallback, so classification always succeeds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::edge::{
    ComputeResourceInfo, CpuArchType, Flavour, OsType, ZoneRegisteredData,
};

// =============================================================================
// Infrastructure Elements
// =============================================================================

/// One compute element of an edge domain, as the backend reports it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureElement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub container_technology: String,
    #[serde(default)]
    pub cpu_cores: u64,
    /// MB
    #[serde(default)]
    pub ram_capacity: u64,
    /// MB
    #[serde(default)]
    pub disk_capacity: u64,
    #[serde(default)]
    pub available_ram: u64,
    #[serde(default)]
    pub available_disk: u64,
    /// Backend-native architecture tag (e.g. a URN ending in `x64`)
    #[serde(default)]
    pub cpu_architecture: String,
    /// Backend-native OS tag (e.g. a URN ending in `Linux`)
    #[serde(default)]
    pub operating_system: String,
    #[serde(default)]
    pub domain: String,
}

// =============================================================================
// Tag Mapping
// =============================================================================

/// Last `:`-separated segment of a URN-style tag, lowercased.
fn tag_suffix(tag: &str) -> String {
    tag.rsplit(':').next().unwrap_or(tag).trim().to_lowercase()
}

/// Map a backend architecture tag to the canonical ISA enumeration.
/// Unrecognized tags classify as x86-64.
pub fn map_cpu_arch(tag: &str) -> CpuArchType {
    match tag_suffix(tag).as_str() {
        "x64" | "x86_64" | "amd64" => CpuArchType::X86_64,
        "x86" | "i386" | "i686" => CpuArchType::X86,
        "arm64" | "aarch64" => CpuArchType::Arm64,
        // only ARM_64 exists canonically; closest match for 32-bit ARM
        "arm32" | "arm" => CpuArchType::Arm64,
        _ => CpuArchType::X86_64,
    }
}

/// OS-type architecture literal ("x86_64" or "x86") for a backend tag.
pub fn map_os_architecture(tag: &str) -> &'static str {
    match tag_suffix(tag).as_str() {
        "x86" | "i386" | "i686" | "arm32" | "arm" => "x86",
        _ => "x86_64",
    }
}

/// Map a backend OS tag to the canonical distribution literal.
pub fn map_os_distribution(tag: &str) -> &'static str {
    if tag_suffix(tag) == "linux" {
        "UBUNTU"
    } else {
        "OTHER"
    }
}

fn default_os_version(distribution: &str) -> &'static str {
    if distribution == "UBUNTU" {
        "OS_VERSION_UBUNTU_2204_LTS"
    } else {
        "OTHER"
    }
}

/// Aggregate ISA for the zone-level resource blocks.
/// Fixed preference order: x86-64, then 64-bit ARM, then 32-bit x86.
fn pick_aggregate_isa(seen: &BTreeSet<CpuArchType>) -> CpuArchType {
    if seen.contains(&CpuArchType::X86_64) {
        CpuArchType::X86_64
    } else if seen.contains(&CpuArchType::Arm64) {
        CpuArchType::Arm64
    } else if seen.contains(&CpuArchType::X86) {
        CpuArchType::X86
    } else {
        CpuArchType::X86_64
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// Fold a zone's infrastructure elements into the canonical capability
/// summary: element-wise totals, one flavour per element, and a single
/// aggregate ISA chosen by the fixed preference order.
pub fn aggregate_zone(zone_id: &str, elements: &[InfrastructureElement]) -> ZoneRegisteredData {
    let mut total_cpu = 0u64;
    let mut total_ram = 0u64;

    let mut flavours = Vec::with_capacity(elements.len());
    let mut seen_isas = BTreeSet::new();

    for element in elements {
        total_cpu += element.cpu_cores;
        total_ram += element.ram_capacity;

        let isa = map_cpu_arch(&element.cpu_architecture);
        seen_isas.insert(isa);

        let distribution = map_os_distribution(&element.operating_system);
        flavours.push(Flavour {
            flavour_id: format!(
                "{}-{}",
                if element.hostname.is_empty() {
                    "host"
                } else {
                    element.hostname.as_str()
                },
                if element.container_technology.is_empty() {
                    "CT"
                } else {
                    element.container_technology.as_str()
                }
            ),
            cpu_arch_type: isa,
            supported_os_types: vec![OsType {
                architecture: map_os_architecture(&element.cpu_architecture).to_string(),
                distribution: distribution.to_string(),
                version: default_os_version(distribution).to_string(),
                license: "OS_LICENSE_TYPE_FREE".to_string(),
            }],
            num_cpu: element.cpu_cores,
            memory_size: element.ram_capacity,
            storage_size: element.disk_capacity,
        });
    }

    let aggregate_isa = pick_aggregate_isa(&seen_isas);
    let aggregate = ComputeResourceInfo {
        cpu_arch_type: aggregate_isa,
        num_cpu: total_cpu,
        memory: total_ram,
    };

    ZoneRegisteredData {
        zone_id: zone_id.to_string(),
        reserved_compute_resources: vec![aggregate.clone()],
        compute_resource_quota_limits: vec![aggregate],
        flavours_supported: flavours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(hostname: &str, cpu: u64, ram: u64, arch: &str) -> InfrastructureElement {
        InfrastructureElement {
            id: format!("urn:ngsi-ld:InfrastructureElement:{}", hostname),
            hostname: hostname.to_string(),
            container_technology: "docker".to_string(),
            cpu_cores: cpu,
            ram_capacity: ram,
            disk_capacity: 10240,
            available_ram: ram / 2,
            available_disk: 5120,
            cpu_architecture: format!("urn:ngsi-ld:CpuArchitecture:{}", arch),
            operating_system: "urn:ngsi-ld:OperatingSystem:Linux".to_string(),
            domain: "urn:ngsi-ld:Domain:zone-a".to_string(),
        }
    }

    #[test]
    fn test_aggregation_sums_and_flavour_count() {
        let elements = vec![
            element("node-a", 4, 4096, "x64"),
            element("node-b", 8, 8192, "x64"),
        ];
        let zone = aggregate_zone("zone-a", &elements);

        assert_eq!(zone.zone_id, "zone-a");
        assert_eq!(zone.reserved_compute_resources[0].num_cpu, 12);
        assert_eq!(zone.reserved_compute_resources[0].memory, 12288);
        assert_eq!(zone.compute_resource_quota_limits[0].num_cpu, 12);
        assert_eq!(zone.flavours_supported.len(), 2);
        assert_eq!(zone.flavours_supported[0].flavour_id, "node-a-docker");
        assert_eq!(zone.flavours_supported[1].num_cpu, 8);
    }

    #[test]
    fn test_arch_table_with_fallback() {
        assert_eq!(map_cpu_arch("urn:ngsi-ld:CpuArchitecture:x64"), CpuArchType::X86_64);
        assert_eq!(map_cpu_arch("amd64"), CpuArchType::X86_64);
        assert_eq!(map_cpu_arch("aarch64"), CpuArchType::Arm64);
        assert_eq!(map_cpu_arch("arm32"), CpuArchType::Arm64);
        assert_eq!(map_cpu_arch("i686"), CpuArchType::X86);
        // unrecognized tags never fail
        assert_eq!(map_cpu_arch("riscv64"), CpuArchType::X86_64);
        assert_eq!(map_cpu_arch(""), CpuArchType::X86_64);
    }

    #[test]
    fn test_os_mapping() {
        assert_eq!(map_os_distribution("urn:ngsi-ld:OperatingSystem:Linux"), "UBUNTU");
        assert_eq!(map_os_distribution("windows"), "OTHER");
        assert_eq!(map_os_architecture("arm"), "x86");
        assert_eq!(map_os_architecture("arm64"), "x86_64");
    }

    #[test]
    fn test_aggregate_isa_preference_order() {
        let mixed = vec![
            element("a", 2, 2048, "arm64"),
            element("b", 2, 2048, "x64"),
        ];
        assert_eq!(
            aggregate_zone("z", &mixed).reserved_compute_resources[0].cpu_arch_type,
            CpuArchType::X86_64
        );

        let arm_only = vec![element("a", 2, 2048, "arm64"), element("b", 2, 2048, "arm")];
        assert_eq!(
            aggregate_zone("z", &arm_only).reserved_compute_resources[0].cpu_arch_type,
            CpuArchType::Arm64
        );

        let x86_only = vec![element("a", 2, 2048, "i386")];
        assert_eq!(
            aggregate_zone("z", &x86_only).reserved_compute_resources[0].cpu_arch_type,
            CpuArchType::X86
        );

        // empty zone falls back
        assert_eq!(
            aggregate_zone("z", &[]).reserved_compute_resources[0].cpu_arch_type,
            CpuArchType::X86_64
        );
    }
}
