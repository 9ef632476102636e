use std::path::Path;

use log::info;

use crate::error::Result;
use crate::store::BlobStore;
use crate::timing::Timer;

/// Topology file read by the TensorFlow loader.
pub const MODEL_TOPOLOGY: &str = "saved_model.pb";

/// Weight shards referenced by the topology, plus the index that maps
/// variables onto them.
pub const MODEL_SHARDS: [&str; 5] = [
    "variables/variables.index",
    "variables/variables.data-00000-of-00004",
    "variables/variables.data-00001-of-00004",
    "variables/variables.data-00002-of-00004",
    "variables/variables.data-00003-of-00004",
];

/// Every artifact the model needs, topology first. The set is fixed and
/// versionless.
pub fn artifact_keys() -> Vec<&'static str> {
    let mut keys = vec![MODEL_TOPOLOGY];
    keys.extend(MODEL_SHARDS);
    keys
}

/// Download the full artifact set into `cache_dir`.
///
/// Runs once at startup. There is no retry: the first failure is returned
/// and the caller treats it as fatal.
pub async fn fetch_model(store: &BlobStore, cache_dir: &Path) -> Result<()> {
    let t = Timer::start("fetching model artifacts");
    tokio::fs::create_dir_all(cache_dir).await?;
    for key in artifact_keys() {
        info!("downloading {key}");
        store.download_to(key, &cache_dir.join(key)).await?;
    }
    t.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_topology_plus_shards() {
        let keys = artifact_keys();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], MODEL_TOPOLOGY);
        for shard in &keys[1..] {
            assert!(shard.starts_with("variables/"));
        }
    }

    #[test]
    fn shard_set_is_complete() {
        for i in 0..4 {
            let name = format!("variables/variables.data-0000{i}-of-00004");
            assert!(MODEL_SHARDS.contains(&name.as_str()));
        }
        assert!(MODEL_SHARDS.contains(&"variables/variables.index"));
    }
}
