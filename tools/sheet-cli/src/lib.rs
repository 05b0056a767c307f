//! 命令行工具依赖的通用组件.

use anyhow::Context;
use sheet_berry::ReportConfig;
use std::fs;
use std::path::Path;

pub mod loader;
pub mod measure;
pub mod pdf;
pub mod writer;

/// 读取 TOML 格式的报告参数. 缺失的字段取默认值.
///
/// `path` 为 `None` 时直接返回默认参数. 参数不合理时返回错误.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ReportConfig> {
    let config = match path {
        Some(p) => {
            let text = fs::read_to_string(p)
                .with_context(|| format!("无法读取配置文件 `{}`", p.display()))?;
            toml::from_str::<ReportConfig>(&text)
                .with_context(|| format!("配置文件 `{}` 格式错误", p.display()))?
        }
        None => ReportConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_berry::ColormapId;

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None).unwrap(), ReportConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("report.toml");
        fs::write(
            &p,
            "row_width = 4\ntransparency = 0.6\nleft_colormap = \"green-iron\"\n",
        )
        .unwrap();
        let c = load_config(Some(p.as_path())).unwrap();
        assert_eq!(c.row_width, 4);
        assert_eq!(c.transparency, 0.6);
        assert_eq!(c.left_colormap, ColormapId::GreenIron);
        assert_eq!(c.cell_width, ReportConfig::default().cell_width);

        fs::write(&p, "transparency = 2.0\n").unwrap();
        assert!(load_config(Some(p.as_path())).is_err());

        fs::write(&p, "row_width = \"five\"\n").unwrap();
        assert!(load_config(Some(p.as_path())).is_err());
    }
}
