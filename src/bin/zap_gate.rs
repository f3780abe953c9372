//! CI 安全扫描门禁：读取 zap-report.xml，只有 High 级别告警会让构建失败

use std::path::Path;
use std::process::ExitCode;

use user_crud::scan_gate::{
    evaluate, load_report, render_summary, render_verdict, Verdict, REPORT_PATH,
};

fn main() -> ExitCode {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("OWASP ZAP Scan Results");
    println!("{rule}");

    let counts = match load_report(Path::new(REPORT_PATH)) {
        Ok(counts) => counts,
        Err(e) => {
            println!("Error parsing ZAP XML report: {e}");
            println!("❌ Failed to parse ZAP report");
            return ExitCode::FAILURE;
        }
    };

    println!("\n📊 {}", render_summary(&counts));
    println!("{rule}");

    let verdict = evaluate(&counts);
    let icon = match verdict {
        Verdict::Fail => "❌",
        Verdict::PassWithWarnings => "⚠️ ",
        Verdict::Pass => "✅",
    };
    println!("\n{icon} {}", render_verdict(verdict, &counts));

    ExitCode::from(verdict.exit_code())
}
