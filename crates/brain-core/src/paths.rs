use std::path::{Path, PathBuf};

pub const CONFIG_DIR: &str = "config";
pub const ENVS_FILE: &str = "config/agent_engine_envs.yaml";

pub fn envs_config_path(root: &Path) -> PathBuf {
    root.join(ENVS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envs_config_path_is_under_config_dir() {
        let p = envs_config_path(Path::new("/repo"));
        assert_eq!(p, PathBuf::from("/repo/config/agent_engine_envs.yaml"));
        assert!(p.parent().unwrap().ends_with(CONFIG_DIR));
    }
}
