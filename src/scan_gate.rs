//! OWASP ZAP 扫描结果门禁
//!
//! 统计报告中各风险级别的告警数量：有 High 即失败，只有 Medium 时告警通过，
//! 其余情况通过。报告无法解析是另一种失败，与"扫描发现问题"区分开。

use std::fs;
use std::path::{Path, PathBuf};

/// CI 流水线固定输出的报告路径
pub const REPORT_PATH: &str = "zap-report.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
    Informational,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Informational,
    ];

    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "High" => Some(Severity::High),
            "Medium" => Some(Severity::Medium),
            "Low" => Some(Severity::Low),
            "Informational" => Some(Severity::Informational),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub informational: usize,
}

impl AlertCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Informational => self.informational,
        }
    }

    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Informational => self.informational += 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot read report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed report: {0}")]
    Malformed(#[from] roxmltree::Error),
    #[error("alert item has an empty riskdesc")]
    BlankRisk,
}

/// 统计 `site` 下每个 `alertitem` 的风险级别
///
/// 级别取 `riskdesc` 文本的第一个词，例如 "Medium (High)" 记为 Medium。
/// 缺少 `riskdesc` 或级别无法识别的告警不计数；`riskdesc` 存在但为空白时
/// 整份报告视为无法解析。
pub fn parse_report(xml: &str) -> Result<AlertCounts, ReportError> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut counts = AlertCounts::default();

    let alert_items = doc.descendants().filter(|node| {
        node.has_tag_name("alertitem") && node.ancestors().any(|a| a.has_tag_name("site"))
    });

    for item in alert_items {
        let Some(risk) = item.children().find(|child| child.has_tag_name("riskdesc")) else {
            continue;
        };
        let word = risk
            .text()
            .and_then(|text| text.split_whitespace().next())
            .ok_or(ReportError::BlankRisk)?;

        if let Some(severity) = Severity::parse(word) {
            counts.record(severity);
        }
    }

    Ok(counts)
}

pub fn load_report(path: &Path) -> Result<AlertCounts, ReportError> {
    let xml = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(&xml)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fail,
    PassWithWarnings,
    Pass,
}

impl Verdict {
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Fail => 1,
            Verdict::PassWithWarnings | Verdict::Pass => 0,
        }
    }
}

pub fn evaluate(counts: &AlertCounts) -> Verdict {
    if counts.high > 0 {
        Verdict::Fail
    } else if counts.medium > 0 {
        Verdict::PassWithWarnings
    } else {
        Verdict::Pass
    }
}

pub fn render_summary(counts: &AlertCounts) -> String {
    let mut out = String::from("Alert Summary:\n");
    for severity in Severity::ALL {
        let label = format!("{}:", severity.label());
        out.push_str(&format!("   {label:<15}{}\n", counts.get(severity)));
    }
    out
}

pub fn render_verdict(verdict: Verdict, counts: &AlertCounts) -> String {
    match verdict {
        Verdict::Fail => format!(
            "DAST SCAN FAILED!\n   Found {} High severity alerts\n   Security threshold exceeded - failing build",
            counts.high
        ),
        Verdict::PassWithWarnings => format!(
            "DAST SCAN PASSED WITH WARNINGS!\n   Found {} Medium severity alerts\n   These should be reviewed and fixed in future iterations\n   Build will continue (only HIGH alerts block deployment)",
            counts.medium
        ),
        Verdict::Pass => {
            "DAST SCAN PASSED!\n   No High or Medium severity alerts found".to_string()
        }
    }
}
