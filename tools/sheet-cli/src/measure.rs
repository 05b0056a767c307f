//! 体积测量表与页眉文本.
//!
//! 测量表是逗号分隔的文本文件, 第一行为表头, 第二行依次为
//! 颅内总体积, 左侧和右侧 ROI 体积, 单位均为 mm³.

use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

/// 页眉标题.
pub const TITLE: &str = "HippoDeep Report";

/// 一个受试者的体积测量值 (mm³).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    /// 颅内总体积.
    pub intracranial: f64,

    /// 左侧 ROI 体积.
    pub left: f64,

    /// 右侧 ROI 体积.
    pub right: f64,
}

impl Measurements {
    /// 解析测量表文本.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let Some(row) = text.lines().nth(1) else {
            bail!("测量表少于两行");
        };
        let fields: Vec<&str> = row.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            bail!("测量表第二行只有 {} 列: `{row}`", fields.len());
        }
        let num = |i: usize| -> anyhow::Result<f64> {
            fields[i]
                .parse::<f64>()
                .with_context(|| format!("第 {} 列不是数值: `{}`", i + 1, fields[i]))
        };
        Ok(Self {
            intracranial: num(0)?,
            left: num(1)?,
            right: num(2)?,
        })
    }

    /// 读取并解析测量表文件.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("无法读取测量表 `{}`", path.display()))?;
        Self::parse(&text).with_context(|| format!("测量表 `{}` 格式错误", path.display()))
    }

    /// 四行页眉: 标题, 颅内总体积 (升), 左右 ROI 体积 (毫升).
    pub fn header_lines(&self) -> [String; 4] {
        [
            TITLE.to_string(),
            format!(
                "Total Intracranial Volume:  {:.2} l",
                self.intracranial / 1_000_000.0
            ),
            format!("Left  Hippocampus  Volume:  {:.2} ml", self.left / 1000.0),
            format!("Right Hippocampus  Volume:  {:.2} ml", self.right / 1000.0),
        ]
    }
}
