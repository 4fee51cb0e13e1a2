use std::io::{BufRead, Write};
use tracing::{info, warn};

use crate::error::Result;
use crate::output::{format_size, list_output_files};
use crate::processor::{ProcessRequest, VideoProcessor};
use crate::prompt::{confirm, DEMO_ACCEPT};
use super::{report_error, show_info, SessionOutcome};

/// Show the feature list, confirm, then run the pipeline on the demo video.
/// With `assume_yes` the confirmation prompt is skipped.
pub async fn run_demo<P, R, W>(
    processor: &P,
    request: &ProcessRequest,
    assume_yes: bool,
    input: &mut R,
    out: &mut W,
) -> Result<SessionOutcome>
where
    P: VideoProcessor + ?Sized,
    R: BufRead,
    W: Write,
{
    show_info(out)?;

    if !assume_yes && !confirm(input, out, "是否运行演示？(y/n): ", DEMO_ACCEPT)? {
        writeln!(out, "演示已取消")?;
        writeln!(out, "你可以运行 `vidpipe quick` 进行快速测试")?;
        info!("Demo cancelled by user");
        return Ok(SessionOutcome::Cancelled);
    }

    writeln!(out, "=== YouTube视频处理工具演示 ===")?;
    writeln!(out, "这个演示将下载一个短视频并进行处理")?;
    writeln!(out)?;
    writeln!(out, "演示视频URL: {}", request.url)?;
    writeln!(out, "水印文字: {}", request.watermark)?;
    writeln!(out, "视频质量: {}", request.quality)?;
    writeln!(out)?;
    writeln!(out, "开始处理...")?;
    out.flush()?;

    let result = match processor.check_availability() {
        Ok(()) => processor.process_video(request).await,
        Err(e) => Err(e),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            report_error(out, "演示过程中出错", &e)?;
            return Ok(SessionOutcome::Failed { exit_code: e.exit_code() });
        }
    };

    let Some(produced) = &outcome.output else {
        writeln!(out, "\n❌ 演示失败")?;
        return Ok(SessionOutcome::Failed { exit_code: 1 });
    };

    writeln!(out, "\n🎉 演示成功完成！")?;
    writeln!(out, "处理后的视频: {}", produced.display())?;
    writeln!(out, "输出目录: {}", outcome.output_dir.display())?;
    writeln!(out, "开始时间: {}", outcome.started_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "耗时: {:.1}秒", outcome.elapsed.as_secs_f64())?;

    writeln!(out, "\n生成的文件:")?;
    match list_output_files(processor.output_dir()) {
        Ok(entries) => {
            for entry in entries {
                if entry.is_dir {
                    writeln!(out, "  - {}/", entry.name.display())?;
                } else {
                    writeln!(out, "  - {} ({})", entry.name.display(), format_size(entry.size))?;
                }
            }
        }
        Err(e) => {
            warn!("Failed to list output directory: {}", e);
            writeln!(out, "  (无法列出输出目录: {})", e)?;
        }
    }

    Ok(SessionOutcome::Completed)
}
