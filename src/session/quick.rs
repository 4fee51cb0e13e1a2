use std::io::{BufRead, Write};
use tracing::info;

use crate::error::{Result, VidpipeError};
use crate::processor::{ProcessRequest, Quality, VideoProcessor};
use crate::prompt::{ask_with_default, choose};
use super::{report_error, SessionOutcome};

/// Quick-test parameters; a preset watermark skips the watermark prompt
#[derive(Debug, Clone)]
pub struct QuickSettings {
    pub samples: Vec<String>,
    pub default_watermark: String,
    pub watermark: Option<String>,
    pub quality: Quality,
    pub embed_subtitles: bool,
}

/// Pick a sample video and a watermark, then run the pipeline at low quality
pub async fn run_quick<P, R, W>(
    processor: &P,
    settings: &QuickSettings,
    input: &mut R,
    out: &mut W,
) -> Result<SessionOutcome>
where
    P: VideoProcessor + ?Sized,
    R: BufRead,
    W: Write,
{
    if settings.samples.is_empty() {
        return Err(VidpipeError::Config("no sample videos configured in [quick].samples".to_string()));
    }

    writeln!(out, "=== 快速测试模式 ===")?;
    writeln!(out, "选择测试视频:")?;
    let index = choose(input, out, "选择视频编号 (直接回车使用第1个): ", &settings.samples)?;
    let url = settings.samples[index].clone();

    let watermark = match &settings.watermark {
        Some(watermark) => watermark.clone(),
        None => ask_with_default(
            input,
            out,
            &format!("输入水印文字 (默认: {}): ", settings.default_watermark),
            &settings.default_watermark,
        )?,
    };

    writeln!(out, "\n正在处理视频: {}", url)?;
    writeln!(out, "水印文字: {}", watermark)?;
    out.flush()?;
    info!("Quick test with sample #{}: {}", index + 1, url);

    let request = ProcessRequest {
        url,
        watermark,
        quality: settings.quality,
        embed_subtitles: settings.embed_subtitles,
    };

    let result = match processor.check_availability() {
        Ok(()) => processor.process_video(&request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => match outcome.output {
            Some(produced) => {
                writeln!(out, "\n✅ 测试成功！")?;
                writeln!(out, "输出文件: {}", produced.display())?;
                writeln!(out, "输出目录: {}", outcome.output_dir.display())?;
                Ok(SessionOutcome::Completed)
            }
            None => {
                writeln!(out, "\n❌ 测试失败")?;
                Ok(SessionOutcome::Failed { exit_code: 1 })
            }
        },
        Err(e) => {
            report_error(out, "测试过程中出错", &e)?;
            Ok(SessionOutcome::Failed { exit_code: e.exit_code() })
        }
    }
}
