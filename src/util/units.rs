//! Units formatting and conversion utilities
//!
//! Binary size units as `dd` understands them, block size parsing and
//! human-readable formatting of sizes, durations and throughput.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Format bytes into human-readable size with appropriate units
///
/// # Examples
/// ```
/// use lustre_bench::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(1048576), "1.0 MiB");
/// assert_eq!(format_bytes(1073741824), "1.0 GiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Size in binary gigabytes, as reported in generation logs
pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

/// Format duration into human-readable string
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use lustre_bench::util::units::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 3600 {
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if total_secs >= 60 {
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{}m {}s", minutes, seconds)
    } else if total_secs > 0 {
        if millis > 0 {
            format!("{}.{:02}s", total_secs, millis / 10)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        format!("{}ms", millis)
    }
}

/// Throughput in MB/s, or `None` when the duration cannot be a denominator
///
/// # Examples
/// ```
/// use lustre_bench::util::units::throughput_mbps;
///
/// assert_eq!(throughput_mbps(1024, 2.0), Some(512.0));
/// assert_eq!(throughput_mbps(1024, 0.0), None);
/// ```
pub fn throughput_mbps(size_mb: u64, duration_secs: f64) -> Option<f64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return None;
    }
    let throughput = size_mb as f64 / duration_secs;
    throughput.is_finite().then_some(throughput)
}

/// Format throughput value with appropriate units
pub fn format_throughput(mbps: f64) -> String {
    if mbps >= 1024.0 {
        format!("{:.1} GiB/s", mbps / 1024.0)
    } else if mbps >= 1.0 {
        format!("{:.1} MiB/s", mbps)
    } else if mbps >= 0.001 {
        format!("{:.1} KiB/s", mbps * 1024.0)
    } else {
        format!("{:.3} MiB/s", mbps)
    }
}

/// A `dd` block size such as `1M` or `20M`.
///
/// Suffixes are binary (`K`, `M`, `G`), matching `dd`. The original text is
/// kept so the exact operand reaches `dd` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockSize {
    text: String,
    bytes: u64,
}

impl BlockSize {
    /// Parse a `dd`-style block size
    ///
    /// # Examples
    /// ```
    /// use lustre_bench::util::units::BlockSize;
    ///
    /// assert_eq!(BlockSize::parse("1M").unwrap().bytes(), 1048576);
    /// assert_eq!(BlockSize::parse("20M").unwrap().whole_megabytes(), Some(20));
    /// assert!(BlockSize::parse("fast").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, String> {
        let text = input.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (number, suffix) = text.split_at(split);

        let number: u64 = number
            .parse()
            .map_err(|_| format!("Invalid block size: {}", input))?;

        let multiplier = match suffix {
            "" | "c" => 1,
            "K" | "k" | "KiB" => KIB,
            "M" | "MiB" => MIB,
            "G" | "GiB" => GIB,
            _ => return Err(format!("Unknown block size unit: {}", suffix)),
        };

        let bytes = number
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Block size too large: {}", input))?;
        if bytes == 0 {
            return Err("Block size must be greater than 0".to_string());
        }

        Ok(Self {
            text: text.to_string(),
            bytes,
        })
    }

    /// Whole-megabyte block, rendered as `<n>M`
    pub fn from_megabytes(megabytes: u64) -> Self {
        let megabytes = megabytes.max(1);
        Self {
            text: format!("{}M", megabytes),
            bytes: megabytes.saturating_mul(MIB),
        }
    }

    /// Block size in bytes
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// MiB per block when the block is a nonzero whole number of MiB.
    ///
    /// `dd` always moves whole blocks, so only these sizes give a block count
    /// that covers an exact number of megabytes.
    ///
    /// ```
    /// use lustre_bench::util::units::BlockSize;
    ///
    /// assert_eq!(BlockSize::parse("20M").unwrap().whole_megabytes(), Some(20));
    /// assert_eq!(BlockSize::parse("2048K").unwrap().whole_megabytes(), Some(2));
    /// assert_eq!(BlockSize::parse("1536K").unwrap().whole_megabytes(), None);
    /// assert_eq!(BlockSize::parse("512K").unwrap().whole_megabytes(), None);
    /// ```
    pub fn whole_megabytes(&self) -> Option<u64> {
        (self.bytes % MIB == 0)
            .then_some(self.bytes / MIB)
            .filter(|&mb| mb > 0)
    }

    /// Text passed to `dd bs=`
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for BlockSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlockSize {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlockSize> for String {
    fn from(value: BlockSize) -> Self {
        value.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(1073741824), "1.0 GiB");
        assert_eq!(format_bytes(1099511627776), "1.0 TiB");
    }

    #[test]
    fn test_bytes_to_gb() {
        assert_eq!(bytes_to_gb(GIB), 1.0);
        assert_eq!(bytes_to_gb(GIB / 2), 0.5);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_throughput_guards_zero_and_nan() {
        assert_eq!(throughput_mbps(2048, 4.0), Some(512.0));
        assert_eq!(throughput_mbps(2048, 0.0), None);
        assert_eq!(throughput_mbps(2048, -1.0), None);
        assert_eq!(throughput_mbps(2048, f64::NAN), None);
        assert_eq!(throughput_mbps(u64::MAX, f64::MIN_POSITIVE), None);
    }

    #[test]
    fn test_format_throughput() {
        assert_eq!(format_throughput(1.5), "1.5 MiB/s");
        assert_eq!(format_throughput(1024.0), "1.0 GiB/s");
        assert_eq!(format_throughput(0.5), "512.0 KiB/s");
    }

    #[test]
    fn test_block_size_parse() {
        let bs = BlockSize::parse("1M").unwrap();
        assert_eq!(bs.bytes(), MIB);
        assert_eq!(bs.whole_megabytes(), Some(1));
        assert_eq!(bs.as_str(), "1M");

        assert_eq!(BlockSize::parse("20M").unwrap().whole_megabytes(), Some(20));
        assert_eq!(BlockSize::parse("1G").unwrap().whole_megabytes(), Some(1024));
        assert_eq!(BlockSize::parse("512K").unwrap().whole_megabytes(), None);
        assert_eq!(BlockSize::parse("4096").unwrap().bytes(), 4096);

        assert!(BlockSize::parse("").is_err());
        assert!(BlockSize::parse("0M").is_err());
        assert!(BlockSize::parse("1X").is_err());
        assert!(BlockSize::parse("M").is_err());
    }

    #[test]
    fn test_block_size_serde_as_string() {
        let bs = BlockSize::parse("20M").unwrap();
        let json = serde_json::to_string(&bs).unwrap();
        assert_eq!(json, "\"20M\"");
        let back: BlockSize = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bs);
        assert!(serde_json::from_str::<BlockSize>("\"bogus\"").is_err());
    }
}
