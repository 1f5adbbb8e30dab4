//! Static catalogue of supported regions and the instance types they offer.

/// Regions the operator can be deployed into.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "sa-east-1",
];

// Regions offering GPU (p3) and Inferentia (inf1) capacity. g4dn is offered
// everywhere except sa-east-1.
const P3_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-2",
    "eu-central-1",
    "eu-west-1",
    "ap-northeast-1",
];
const INF1_REGIONS: &[&str] = &["us-east-1", "us-west-2"];

/// Hardware and pricing details for one instance type in one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceMetadata {
    /// Region the metadata applies to.
    pub region: &'static str,
    /// Instance type, e.g. `m5.large`.
    pub instance_type: &'static str,
    /// Virtual CPU count.
    pub vcpus: u32,
    /// Memory in MiB.
    pub memory_mib: u64,
    /// Attached NVIDIA GPUs.
    pub gpus: u32,
    /// Attached Inferentia chips.
    pub inferentia: u32,
    /// On-demand price per hour in millionths of a US dollar.
    pub hourly_price_micros: u64,
}

struct InstanceSpec {
    instance_type: &'static str,
    vcpus: u32,
    memory_mib: u64,
    gpus: u32,
    inferentia: u32,
    // us-east-1 on-demand price.
    base_price_micros: u64,
}

const fn spec(
    instance_type: &'static str,
    vcpus: u32,
    memory_mib: u64,
    gpus: u32,
    inferentia: u32,
    base_price_micros: u64,
) -> InstanceSpec {
    InstanceSpec {
        instance_type,
        vcpus,
        memory_mib,
        gpus,
        inferentia,
        base_price_micros,
    }
}

const INSTANCE_SPECS: &[InstanceSpec] = &[
    // Burstable.
    spec("t3.nano", 2, 512, 0, 0, 5_200),
    spec("t3.micro", 2, 1_024, 0, 0, 10_400),
    spec("t3.small", 2, 2_048, 0, 0, 20_800),
    spec("t3.medium", 2, 4_096, 0, 0, 41_600),
    spec("t3.large", 2, 8_192, 0, 0, 83_200),
    spec("t3.xlarge", 4, 16_384, 0, 0, 166_400),
    spec("t3.2xlarge", 8, 32_768, 0, 0, 332_800),
    spec("t3a.nano", 2, 512, 0, 0, 4_700),
    spec("t3a.micro", 2, 1_024, 0, 0, 9_400),
    spec("t3a.small", 2, 2_048, 0, 0, 18_800),
    spec("t3a.medium", 2, 4_096, 0, 0, 37_600),
    spec("t3a.large", 2, 8_192, 0, 0, 75_200),
    spec("t3a.xlarge", 4, 16_384, 0, 0, 150_400),
    spec("t3a.2xlarge", 8, 32_768, 0, 0, 300_800),
    // General purpose.
    spec("m5.large", 2, 8_192, 0, 0, 96_000),
    spec("m5.xlarge", 4, 16_384, 0, 0, 192_000),
    spec("m5.2xlarge", 8, 32_768, 0, 0, 384_000),
    spec("m5.4xlarge", 16, 65_536, 0, 0, 768_000),
    spec("m5.8xlarge", 32, 131_072, 0, 0, 1_536_000),
    spec("m5.12xlarge", 48, 196_608, 0, 0, 2_304_000),
    spec("m5.16xlarge", 64, 262_144, 0, 0, 3_072_000),
    spec("m5.24xlarge", 96, 393_216, 0, 0, 4_608_000),
    spec("m5a.large", 2, 8_192, 0, 0, 86_000),
    spec("m5a.xlarge", 4, 16_384, 0, 0, 172_000),
    spec("m5a.2xlarge", 8, 32_768, 0, 0, 344_000),
    spec("m5a.4xlarge", 16, 65_536, 0, 0, 688_000),
    spec("m5a.8xlarge", 32, 131_072, 0, 0, 1_376_000),
    spec("m5a.12xlarge", 48, 196_608, 0, 0, 2_064_000),
    spec("m5a.16xlarge", 64, 262_144, 0, 0, 2_752_000),
    spec("m5a.24xlarge", 96, 393_216, 0, 0, 4_128_000),
    spec("m6i.large", 2, 8_192, 0, 0, 96_000),
    spec("m6i.xlarge", 4, 16_384, 0, 0, 192_000),
    spec("m6i.2xlarge", 8, 32_768, 0, 0, 384_000),
    spec("m6i.4xlarge", 16, 65_536, 0, 0, 768_000),
    spec("m6i.8xlarge", 32, 131_072, 0, 0, 1_536_000),
    spec("m6i.12xlarge", 48, 196_608, 0, 0, 2_304_000),
    spec("m6i.16xlarge", 64, 262_144, 0, 0, 3_072_000),
    spec("m6i.24xlarge", 96, 393_216, 0, 0, 4_608_000),
    spec("m6i.32xlarge", 128, 524_288, 0, 0, 6_144_000),
    // Compute optimised.
    spec("c5.large", 2, 4_096, 0, 0, 85_000),
    spec("c5.xlarge", 4, 8_192, 0, 0, 170_000),
    spec("c5.2xlarge", 8, 16_384, 0, 0, 340_000),
    spec("c5.4xlarge", 16, 32_768, 0, 0, 680_000),
    spec("c5.9xlarge", 36, 73_728, 0, 0, 1_530_000),
    spec("c5.12xlarge", 48, 98_304, 0, 0, 2_040_000),
    spec("c5.18xlarge", 72, 147_456, 0, 0, 3_060_000),
    spec("c5.24xlarge", 96, 196_608, 0, 0, 4_080_000),
    spec("c6i.large", 2, 4_096, 0, 0, 85_000),
    spec("c6i.xlarge", 4, 8_192, 0, 0, 170_000),
    spec("c6i.2xlarge", 8, 16_384, 0, 0, 340_000),
    spec("c6i.4xlarge", 16, 32_768, 0, 0, 680_000),
    spec("c6i.8xlarge", 32, 65_536, 0, 0, 1_360_000),
    spec("c6i.12xlarge", 48, 98_304, 0, 0, 2_040_000),
    spec("c6i.16xlarge", 64, 131_072, 0, 0, 2_720_000),
    // Memory optimised.
    spec("r5.large", 2, 16_384, 0, 0, 126_000),
    spec("r5.xlarge", 4, 32_768, 0, 0, 252_000),
    spec("r5.2xlarge", 8, 65_536, 0, 0, 504_000),
    spec("r5.4xlarge", 16, 131_072, 0, 0, 1_008_000),
    spec("r5.8xlarge", 32, 262_144, 0, 0, 2_016_000),
    spec("r5.12xlarge", 48, 393_216, 0, 0, 3_024_000),
    spec("r5.16xlarge", 64, 524_288, 0, 0, 4_032_000),
    spec("r5.24xlarge", 96, 786_432, 0, 0, 6_048_000),
    // Accelerated.
    spec("g4dn.xlarge", 4, 16_384, 1, 0, 526_000),
    spec("g4dn.2xlarge", 8, 32_768, 1, 0, 752_000),
    spec("g4dn.4xlarge", 16, 65_536, 1, 0, 1_204_000),
    spec("g4dn.8xlarge", 32, 131_072, 1, 0, 2_176_000),
    spec("g4dn.12xlarge", 48, 196_608, 4, 0, 3_912_000),
    spec("g4dn.16xlarge", 64, 262_144, 1, 0, 4_352_000),
    spec("p3.2xlarge", 8, 62_464, 1, 0, 3_060_000),
    spec("p3.8xlarge", 32, 249_856, 4, 0, 12_240_000),
    spec("p3.16xlarge", 64, 499_712, 8, 0, 24_480_000),
    spec("inf1.xlarge", 4, 8_192, 0, 1, 228_000),
    spec("inf1.2xlarge", 8, 16_384, 0, 1, 362_000),
    spec("inf1.6xlarge", 24, 49_152, 0, 4, 1_180_000),
    spec("inf1.24xlarge", 96, 196_608, 0, 16, 4_721_000),
];

/// Returns `true` when the operator supports `region`.
#[must_use]
pub fn is_supported_region(region: &str) -> bool {
    canonical_region(region).is_some()
}

/// Returns `true` when the catalogue lists `instance_type` in any region.
#[must_use]
pub fn is_known_instance_type(instance_type: &str) -> bool {
    find_spec(instance_type).is_some()
}

/// Looks up the metadata for an instance type offered in `region`.
///
/// Returns `None` when the region is unsupported, the instance type is
/// unknown, or the type is not offered in that region. Use
/// [`is_known_instance_type`] to tell the last two apart.
#[must_use]
pub fn instance_metadata(region: &str, instance_type: &str) -> Option<InstanceMetadata> {
    let region = canonical_region(region)?;
    let spec = find_spec(instance_type)?;
    if !offered_in(spec.instance_type, region) {
        return None;
    }
    Some(InstanceMetadata {
        region,
        instance_type: spec.instance_type,
        vcpus: spec.vcpus,
        memory_mib: spec.memory_mib,
        gpus: spec.gpus,
        inferentia: spec.inferentia,
        hourly_price_micros: regional_price(spec.base_price_micros, region),
    })
}

fn find_spec(instance_type: &str) -> Option<&'static InstanceSpec> {
    INSTANCE_SPECS
        .iter()
        .find(|candidate| candidate.instance_type == instance_type)
}

fn canonical_region(region: &str) -> Option<&'static str> {
    SUPPORTED_REGIONS
        .iter()
        .copied()
        .find(|supported| *supported == region)
}

fn offered_in(instance_type: &str, region: &str) -> bool {
    match instance_type.split_once('.').map(|(family, _)| family) {
        Some("p3") => P3_REGIONS.contains(&region),
        Some("inf1") => INF1_REGIONS.contains(&region),
        Some("g4dn") => region != "sa-east-1",
        _ => true,
    }
}

// Percentage of the us-east-1 price charged in each region.
fn regional_price(base_price_micros: u64, region: &str) -> u64 {
    let percent: u64 = match region {
        "us-east-1" | "us-east-2" | "us-west-2" => 100,
        "ca-central-1" => 111,
        "us-west-1" | "eu-west-1" | "eu-north-1" => 112,
        "eu-west-2" | "eu-west-3" | "eu-central-1" => 118,
        "ap-south-1" => 105,
        "ap-northeast-1" | "ap-northeast-2" | "ap-southeast-1" | "ap-southeast-2" => 125,
        _ => 160,
    };
    base_price_micros
        .saturating_mul(percent)
        .checked_div(100)
        .unwrap_or_default()
}
