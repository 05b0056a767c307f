//! 生成 ROI 多平面切片总览报告.
//!
//! 输入为解剖扫描 `<stem>.nii[.gz]`, 同目录下需存在 `<stem>_mask_L.nii.gz`,
//! `<stem>_mask_R.nii.gz`, `<stem>_brain_mask.nii.gz` 与 `<stem>_hippoLR_volumes.csv`.
//! 输出写入 `<stem>_report/`, 其中 `<stem>.pdf` 为报告文档.

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use sheet_berry::prelude::*;
use sheet_cli::loader::SubjectPaths;
use sheet_cli::measure::Measurements;
use sheet_cli::{load_config, writer};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::process::ExitCode;

/// ROI 多平面切片总览报告
#[derive(Parser, Debug)]
#[command(name = "sheet-cli", version)]
#[command(about = "Render a multi-plane ROI slice sheet from a NIfTI scan and its masks")]
struct Cli {
    /// 解剖扫描 (.nii / .nii.gz)
    input: PathBuf,

    /// TOML 格式的报告参数
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 输出目录, 默认为 `<stem>_report`
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// 整页栅格分辨率
    #[arg(long, default_value_t = writer::DEFAULT_DPI)]
    dpi: u32,

    /// 日志详细程度, 可重复
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = SubjectPaths::from_input(&cli.input)?;
    let config = load_config(cli.config.as_deref())?;
    let measurements = Measurements::read(&paths.volumes_csv)?;

    let subject = SubjectVolumes::open(
        &paths.base,
        &paths.roi_left,
        &paths.roi_right,
        &paths.extent_ref,
    )
    .with_context(|| format!("无法加载受试者 `{}`", paths.stem))?;
    log::info!("voxel orientation: {:?}", subject.orientation());

    let report = build_report_from(subject.into_las(), measurements.header_lines(), &config)?;
    for o in &report.planes {
        if o.status == PlaneStatus::NoOverlap {
            log::warn!("plane `{}` has no slice to show", o.plane);
        }
    }

    let out_dir = cli.out_dir.unwrap_or_else(|| paths.default_out_dir());
    let manifest = writer::write_report(&report, &config, &out_dir, &paths.stem, cli.dpi)?;
    log::info!(
        "{} images written, manifest at `{}`",
        report.placements.len(),
        manifest.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = SimpleLogger::new().with_level(level(cli.verbose)).init() {
        eprintln!("Error: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
