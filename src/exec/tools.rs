//! Builders for the external tools the benchmarks drive: `dd`, `lfs`,
//! `sync` and the page-cache control file.

use super::runner::CommandSpec;
use crate::models::StripePolicy;
use crate::util::units::BlockSize;
use std::path::Path;

const ZERO_SOURCE: &str = "/dev/zero";
const NULL_SINK: &str = "/dev/null";

/// `dd` sequential transfers with direct I/O
pub struct Dd;

impl Dd {
    /// `dd if=/dev/zero of=<file> bs=<bs> count=<n> oflag=direct conv=sparse`
    pub fn write(file: &Path, block_size: &BlockSize, count: u64) -> CommandSpec {
        CommandSpec::new("dd")
            .arg(format!("if={}", ZERO_SOURCE))
            .arg(Self::operand("of", file))
            .arg(format!("bs={}", block_size))
            .arg(format!("count={}", count))
            .arg("oflag=direct")
            .arg("conv=sparse")
    }

    /// `dd if=<file> of=/dev/null bs=<bs> count=<n> iflag=direct`
    pub fn read(file: &Path, block_size: &BlockSize, count: u64) -> CommandSpec {
        CommandSpec::new("dd")
            .arg(Self::operand("if", file))
            .arg(format!("of={}", NULL_SINK))
            .arg(format!("bs={}", block_size))
            .arg(format!("count={}", count))
            .arg("iflag=direct")
    }

    fn operand(key: &str, path: &Path) -> std::ffi::OsString {
        let mut operand = std::ffi::OsString::from(format!("{}=", key));
        operand.push(path.as_os_str());
        operand
    }
}

/// Lustre client `lfs` subcommands
pub struct Lfs;

impl Lfs {
    /// `lfs getstripe <path>`
    pub fn getstripe(path: &Path) -> CommandSpec {
        CommandSpec::new("lfs").arg("getstripe").path_arg(path)
    }

    /// `lfs setstripe -c <count> <path>`
    pub fn setstripe(policy: &StripePolicy) -> CommandSpec {
        CommandSpec::new("lfs")
            .arg("setstripe")
            .arg("-c")
            .arg(policy.stripe_count.to_string())
            .path_arg(&policy.path)
    }

    /// `lfs df -h`
    pub fn df_human() -> CommandSpec {
        CommandSpec::new("lfs").args(["df", "-h"])
    }
}

/// Flush dirty pages to storage
pub fn sync() -> CommandSpec {
    CommandSpec::new("sync")
}

/// Write `3` to the page-cache control file, dropping page cache, dentries
/// and inodes. Uses `tee` so no shell redirection is involved.
pub fn drop_caches(control_file: &Path) -> CommandSpec {
    CommandSpec::new("tee").path_arg(control_file).with_stdin("3\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_dd_write_template() {
        let bs = BlockSize::parse("1M").unwrap();
        let cmd = Dd::write(Path::new("/scratch/write_test_1024mb.dat"), &bs, 1024);
        assert_eq!(
            cmd.to_string(),
            "dd if=/dev/zero of=/scratch/write_test_1024mb.dat bs=1M count=1024 oflag=direct conv=sparse"
        );
    }

    #[test]
    fn test_dd_read_template() {
        let bs = BlockSize::parse("1M").unwrap();
        let cmd = Dd::read(Path::new("/scratch/write_test_2048mb.dat"), &bs, 2048);
        assert_eq!(
            cmd.to_string(),
            "dd if=/scratch/write_test_2048mb.dat of=/dev/null bs=1M count=2048 iflag=direct"
        );
    }

    #[test]
    fn test_path_with_spaces_stays_one_argument() {
        let bs = BlockSize::parse("1M").unwrap();
        let cmd = Dd::write(Path::new("/scratch/my dir/f.dat"), &bs, 1);
        assert_eq!(cmd.argv()[2], "of=/scratch/my dir/f.dat");
    }

    #[test]
    fn test_lfs_templates() {
        assert_eq!(Lfs::getstripe(Path::new("/scratch")).to_string(), "lfs getstripe /scratch");
        assert_eq!(
            Lfs::setstripe(&StripePolicy::all_targets(PathBuf::from("/scratch"))).to_string(),
            "lfs setstripe -c -1 /scratch"
        );
        assert_eq!(Lfs::df_human().to_string(), "lfs df -h");
    }

    #[test]
    fn test_cache_drop_commands() {
        assert_eq!(sync().to_string(), "sync");
        let drop = drop_caches(Path::new("/proc/sys/vm/drop_caches"));
        assert_eq!(drop.to_string(), "tee /proc/sys/vm/drop_caches");
        assert_eq!(drop.stdin(), Some("3\n"));
    }
}
