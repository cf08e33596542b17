// apps/cf_cli/src/commands/mod.rs

//! 子命令实现

pub mod info;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use cf_config::SimulationParams;

/// 加载配置文件，未指定时构造方腔驱动流
pub(crate) fn load_params(config: Option<&Path>, resolution: usize) -> Result<SimulationParams> {
    match config {
        Some(path) => SimulationParams::from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display())),
        None => {
            let params = SimulationParams::lid_driven_cavity(resolution);
            params.validate().context("内置方腔配置无效")?;
            Ok(params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_cavity() {
        let params = load_params(None, 17).unwrap();
        assert_eq!((params.wp, params.hp), (17, 17));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cavity.json");
        SimulationParams::lid_driven_cavity(9).save_to_file(&path).unwrap();

        let params = load_params(Some(&path), 33).unwrap();
        assert_eq!(params.wp, 9);
        assert!(load_params(Some(&dir.path().join("missing.json")), 9).is_err());
    }
}
