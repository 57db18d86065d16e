//! Device-mapper queries.

use crate::HalResult;

pub trait DmOps {
    /// Raw `name:blkdevs_used` line reported by dmsetup for `/dev/<dm_name>`,
    /// trailing whitespace removed.
    fn dm_info(&self, dm_name: &str) -> HalResult<String>;
}
