//! Report rendering for terminal, markdown, JSON and document export.
//!
//! Every text renderer is a pure function of [`Report`]. PDF bytes come
//! from [`export`], which lays out the plain text view.

use clap::ValueEnum;

use super::pdf::{render_pdf, PdfError, PdfOptions};
use super::Report;
use crate::utils::sanitize_filename;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable printable terminal view.
    #[default]
    Pretty,
    /// Markdown report.
    Markdown,
    /// JSON snapshot.
    Json,
    /// Standalone HTML for word-processor import (`.doc`).
    Html,
    /// Paginated A4 print document, suitable for PDF conversion.
    Print,
    /// Paginated A4 PDF.
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pretty => "txt",
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Html => "doc",
            Self::Print => "html",
            Self::Pdf => "pdf",
        }
    }

    /// Whether the format can be shown on a terminal.
    pub fn is_text(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Render `report` in `format` for the terminal.
///
/// `Pdf` has no terminal form and yields the plain text its pages are
/// laid out from.
pub fn render(report: &Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Pretty => format_pretty(report, true),
        OutputFormat::Pdf => format_pretty(report, false),
        OutputFormat::Markdown => format_markdown(report),
        OutputFormat::Json => format_json(report),
        OutputFormat::Html => format_word_html(report),
        OutputFormat::Print => format_print_html(report),
    }
}

/// Bytes of `report` in `format` for writing to a file. Terminal styling
/// is left out.
pub fn export(
    report: &Report,
    format: OutputFormat,
    pdf: &PdfOptions,
) -> Result<Vec<u8>, PdfError> {
    match format {
        OutputFormat::Pretty => Ok(format_pretty(report, false).into_bytes()),
        OutputFormat::Pdf => render_pdf(report, &format_pretty(report, false), pdf),
        other => Ok(render(report, other).into_bytes()),
    }
}

/// `HRIA_Report_{name}.{ext}` with the name reduced to ASCII alphanumerics.
pub fn export_filename(report: &Report, format: OutputFormat) -> String {
    format!(
        "HRIA_Report_{}.{}",
        sanitize_filename(&report.info.name),
        format.extension()
    )
}

fn type_label(report: &Report) -> &'static str {
    report
        .info
        .assessment_type
        .map(|t| t.label())
        .unwrap_or("-")
}

fn date(report: &Report) -> String {
    report.last_updated.format("%Y-%m-%d").to_string()
}

fn score_label(score: Option<crate::answers::Score>) -> String {
    score
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| "ยังไม่ตอบ".to_string())
}

fn bar(percent: u8, width: usize) -> String {
    let filled = (percent as usize * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn format_pretty(report: &Report, styled: bool) -> String {
    let mut output = String::new();
    let counts = &report.counts;

    if styled {
        output.push_str(&format!("\x1b[1m{}\x1b[0m\n", report.info.name));
    } else {
        output.push_str(&format!("{}\n", report.info.name));
    }
    output.push_str(&format!(
        "{} | {} | {}\n",
        type_label(report),
        report.info.sector_text(),
        date(report)
    ));
    if !report.info.owner.is_empty() {
        output.push_str(&format!("ผู้รับผิดชอบ: {}\n", report.info.owner));
    }
    output.push('\n');

    output.push_str(&format!(
        "คะแนนรวม: {}% ({})\n",
        report.completion_rate,
        report.overall_label()
    ));
    output.push_str(&format!(
        "ผ่าน {}/{} | บางส่วน {}/{} | ไม่ผ่าน {} | ยังไม่ตอบ {}\n",
        counts.passed,
        counts.total,
        counts.partial,
        counts.total,
        counts.failed,
        counts.unanswered()
    ));
    output.push_str(&format!(
        "ความเสี่ยง {} | ผลกระทบเชิงบวก {}\n\n",
        report.risks.len(),
        report.positive_impacts.len()
    ));

    if !report.category_scores.is_empty() {
        output.push_str("คะแนนรายหมวด:\n");
        let width = report
            .category_scores
            .iter()
            .map(|c| c.category.chars().count())
            .max()
            .unwrap_or(0);
        for c in &report.category_scores {
            let pad = width - c.category.chars().count();
            output.push_str(&format!(
                "  {}{}  {} {:>3}%\n",
                c.category,
                " ".repeat(pad),
                bar(c.percent, 20),
                c.percent
            ));
        }
        output.push('\n');
    }

    if !report.risks.is_empty() {
        output.push_str(&format!("ความเสี่ยงที่พบ ({}):\n", report.risks.len()));
        for (i, risk) in report.risks.iter().enumerate() {
            output.push_str(&format!("  {}. [{}] {}\n", i + 1, risk.severity, risk.title));
            if !risk.description.is_empty() {
                output.push_str(&format!("     {}\n", risk.description));
            }
            if !risk.rights_affected.is_empty() {
                output.push_str(&format!(
                    "     สิทธิที่ได้รับผลกระทบ: {}\n",
                    risk.rights_affected.join(", ")
                ));
            }
        }
        output.push('\n');
    }

    if !report.positive_impacts.is_empty() {
        output.push_str(&format!(
            "ผลกระทบเชิงบวก ({}):\n",
            report.positive_impacts.len()
        ));
        for (i, impact) in report.positive_impacts.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, impact.title));
            if !impact.description.is_empty() {
                output.push_str(&format!("     {}\n", impact.description));
            }
        }
        output.push('\n');
    }

    if !report.recommendations.is_empty() {
        output.push_str(&format!("ข้อเสนอแนะ ({}):\n", report.recommendations.len()));
        for (i, rec) in report.recommendations.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", i + 1, rec));
        }
        output.push('\n');
    }

    if !report.responses.is_empty() {
        output.push_str("ผลการตอบแบบประเมิน:\n");
        for line in &report.responses {
            output.push_str(&format!(
                "  [{}] {} ({})\n",
                score_label(line.score),
                line.text,
                line.category
            ));
            if let Some(evidence) = &line.evidence {
                output.push_str(&format!("     หลักฐาน: {}\n", evidence));
            }
        }
    }

    if let Some(notes) = &report.analysis_notes {
        output.push_str(&format!("\nหมายเหตุการวิเคราะห์เอกสาร: {}\n", notes));
    }

    output
}

fn format_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("Error: {}", e))
}

/// Keep a value inside one markdown table cell.
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

fn format_markdown(report: &Report) -> String {
    let mut output = String::new();
    let counts = &report.counts;

    output.push_str(&format!(
        "# {}\n\n**Type**: {}\n**Sector**: {}\n**Date**: {}\n**Score**: {}% ({})\n\n",
        report.info.name,
        type_label(report),
        report.info.sector_text(),
        date(report),
        report.completion_rate,
        report.overall_label()
    ));

    output.push_str("## Summary\n\n| Metric | Value |\n|--------|-------|\n");
    output.push_str(&format!("| Score | {}% |\n", report.completion_rate));
    output.push_str(&format!("| Total Risks Found | {} |\n", report.risks.len()));
    output.push_str(&format!("| Passed | {}/{} |\n", counts.passed, counts.total));
    output.push_str(&format!("| Partial | {}/{} |\n", counts.partial, counts.total));
    output.push_str(&format!("| Failed | {} |\n", counts.failed));
    output.push_str(&format!(
        "| Positive Impacts | {} |\n\n",
        report.positive_impacts.len()
    ));

    if !report.category_scores.is_empty() {
        output.push_str("## Category Scores\n\n| Category | Score |\n|----------|-------|\n");
        for c in &report.category_scores {
            output.push_str(&format!("| {} | {}% |\n", md_cell(&c.category), c.percent));
        }
        output.push('\n');
    }

    output.push_str(&format!("## Identified Risks ({})\n\n", report.risks.len()));
    for (i, risk) in report.risks.iter().enumerate() {
        output.push_str(&format!(
            "{}. **{}** ({})\n",
            i + 1,
            risk.title,
            risk.severity
        ));
        if !risk.description.is_empty() {
            output.push_str(&format!("   {}\n", risk.description));
        }
        if !risk.rights_affected.is_empty() {
            output.push_str(&format!("   *{}*\n", risk.rights_affected.join(", ")));
        }
    }
    output.push('\n');

    if !report.positive_impacts.is_empty() {
        output.push_str(&format!(
            "## Positive Impacts ({})\n\n",
            report.positive_impacts.len()
        ));
        for (i, impact) in report.positive_impacts.iter().enumerate() {
            output.push_str(&format!("{}. **{}**\n", i + 1, impact.title));
            if !impact.description.is_empty() {
                output.push_str(&format!("   {}\n", impact.description));
            }
        }
        output.push('\n');
    }

    if !report.recommendations.is_empty() {
        output.push_str(&format!(
            "## Recommendations ({})\n\n",
            report.recommendations.len()
        ));
        for (i, rec) in report.recommendations.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        output.push('\n');
    }

    if !report.responses.is_empty() {
        output.push_str("## Responses\n\n| Category | Question | Answer | Evidence |\n|----------|----------|--------|----------|\n");
        for line in &report.responses {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                md_cell(&line.category),
                md_cell(&line.text),
                score_label(line.score),
                md_cell(line.evidence.as_deref().unwrap_or(""))
            ));
        }
    }

    output
}

/// Escape text for inclusion in HTML element content or attributes.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_summary_table(report: &Report) -> String {
    let counts = &report.counts;
    format!(
        "<table>\n\
         <tr><th>Metric</th><th>Value</th></tr>\n\
         <tr><td>Score</td><td>{}%</td></tr>\n\
         <tr><td>Total Risks Found</td><td>{}</td></tr>\n\
         <tr><td>Passed (Full)</td><td>{}/{}</td></tr>\n\
         <tr><td>Partial</td><td>{}/{}</td></tr>\n\
         <tr><td>Failed</td><td>{}</td></tr>\n\
         <tr><td>Positive Impacts</td><td>{}</td></tr>\n\
         </table>\n",
        report.completion_rate,
        report.risks.len(),
        counts.passed,
        counts.total,
        counts.partial,
        counts.total,
        counts.failed,
        report.positive_impacts.len()
    )
}

fn html_lists(report: &Report) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<h2>Identified Risks ({})</h2>\n",
        report.risks.len()
    ));
    for (i, risk) in report.risks.iter().enumerate() {
        body.push_str(&format!(
            "<div class=\"risk\"><strong>{}. {}</strong><br/><em>Severity: {}</em><br/>{}</div>\n",
            i + 1,
            escape_html(&risk.title),
            risk.severity,
            escape_html(&risk.description)
        ));
    }

    if !report.positive_impacts.is_empty() {
        body.push_str(&format!(
            "<h2>Positive Impacts ({})</h2>\n",
            report.positive_impacts.len()
        ));
        for (i, impact) in report.positive_impacts.iter().enumerate() {
            body.push_str(&format!(
                "<div class=\"impact\"><strong>{}. {}</strong><br/>{}</div>\n",
                i + 1,
                escape_html(&impact.title),
                escape_html(&impact.description)
            ));
        }
    }

    if !report.recommendations.is_empty() {
        body.push_str(&format!(
            "<h2>Recommendations ({})</h2>\n",
            report.recommendations.len()
        ));
        for (i, rec) in report.recommendations.iter().enumerate() {
            body.push_str(&format!(
                "<div class=\"recommendation\">{}. {}</div>\n",
                i + 1,
                escape_html(rec)
            ));
        }
    }

    body
}

const BASE_CSS: &str = "\
body { font-family: Arial, sans-serif; padding: 20px; }
h1 { color: #1e40af; font-size: 24pt; }
h2 { color: #059669; font-size: 18pt; margin-top: 20px; }
table { border-collapse: collapse; width: 100%; margin: 10px 0; }
th, td { border: 1px solid #ccc; padding: 8px; text-align: left; }
th { background-color: #e5e7eb; font-weight: bold; }
.risk { background-color: #fee2e2; padding: 10px; margin: 5px 0; border-left: 4px solid #ef4444; }
.impact { background-color: #d1fae5; padding: 10px; margin: 5px 0; }
.recommendation { background-color: #f3e8ff; padding: 10px; margin: 5px 0; }
.footer { text-align: center; color: #666; font-size: 10pt; }
";

/// HTML document for word-processor import, prefixed with a UTF-8 BOM.
fn format_word_html(report: &Report) -> String {
    let mut html = String::from('\u{feff}');
    html.push_str(&format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>HRIA Report</title>\n<style>\n{}</style>\n</head>\n<body>\n",
        BASE_CSS
    ));
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&report.info.name)));
    html.push_str(&format!(
        "<p><strong>Type:</strong> {}</p>\n<p><strong>Date:</strong> {}</p>\n",
        type_label(report),
        date(report)
    ));
    html.push_str("<h2>Summary Statistics</h2>\n");
    html.push_str(&html_summary_table(report));
    html.push_str(&html_lists(report));
    html.push_str(&format!(
        "<hr style=\"margin-top: 30px;\"/>\n<p class=\"footer\">Generated by HRIA Assessment Tool - {}</p>\n</body>\n</html>\n",
        date(report)
    ));
    html
}

/// Paginated print document: A4 pages, one major section per page.
fn format_print_html(report: &Report) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"th\">\n<head>\n<meta charset=\"utf-8\">\n<title>HRIA Report - {}</title>\n<style>\n{}\
         @page {{ size: A4 portrait; margin: 10mm; }}\n\
         .page {{ page-break-after: always; }}\n\
         .page:last-child {{ page-break-after: auto; }}\n\
         </style>\n</head>\n<body>\n",
        escape_html(&report.info.name),
        BASE_CSS
    );

    html.push_str("<section class=\"page\">\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&report.info.name)));
    html.push_str(&format!(
        "<p><strong>ประเภท:</strong> {} | <strong>สาขา:</strong> {} | <strong>วันที่:</strong> {}</p>\n",
        type_label(report),
        escape_html(&report.info.sector_text()),
        date(report)
    ));
    if !report.info.description.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", escape_html(&report.info.description)));
    }
    html.push_str(&format!(
        "<p><strong>คะแนนรวม:</strong> {}% ({})</p>\n",
        report.completion_rate,
        report.overall_label()
    ));
    html.push_str(&html_summary_table(report));
    if !report.category_scores.is_empty() {
        html.push_str("<h2>คะแนนรายหมวด</h2>\n<table>\n<tr><th>หมวด</th><th>คะแนน</th></tr>\n");
        for c in &report.category_scores {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}%</td></tr>\n",
                escape_html(&c.category),
                c.percent
            ));
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section class=\"page\">\n");
    html.push_str(&html_lists(report));
    html.push_str("</section>\n");

    if !report.responses.is_empty() {
        html.push_str("<section class=\"page\">\n<h2>ผลการตอบแบบประเมิน</h2>\n<table>\n<tr><th>หมวด</th><th>คำถาม</th><th>คำตอบ</th><th>หลักฐาน</th></tr>\n");
        for line in &report.responses {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&line.category),
                escape_html(&line.text),
                score_label(line.score),
                escape_html(line.evidence.as_deref().unwrap_or(""))
            ));
        }
        html.push_str("</table>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Score;
    use crate::models::{AssessmentType, Question, Risk, Severity};
    use crate::report::assemble;
    use crate::test_utils::assessment_with;

    fn make_test_report() -> Report {
        let mut assessment = assessment_with(vec![
            Question::new("a", "สิทธิ", "มีการชดเชย ใช่หรือไม่"),
            Question::new("b", "สิทธิ", "มีการเยียวยา ใช่หรือไม่"),
        ]);
        assessment.info.name = "Coal <Plant> #2".to_string();
        assessment.info.assessment_type = Some(AssessmentType::Project);
        assessment.answers.set("a", Score::Yes);
        assessment.answers.set("b", Score::No);
        assessment.answers.set_evidence("b", "ไม่มีแผน & ไม่มีงบ");
        assessment.risks.push(Risk {
            title: "น้ำเสีย".to_string(),
            description: "ปล่อยลงลำน้ำ".to_string(),
            severity: Severity::High,
            rights_affected: vec!["สิทธิในน้ำ".to_string()],
            document_reference: None,
        });
        assessment.recommendations.push("ติดตามคุณภาพน้ำ".to_string());
        assemble(&assessment).unwrap()
    }

    #[test]
    fn pretty_format_includes_score() {
        let output = render(&make_test_report(), OutputFormat::Pretty);
        assert!(output.contains("คะแนนรวม: 50% (ปานกลาง)"));
        assert!(output.contains("[High] น้ำเสีย"));
        assert!(output.contains("หลักฐาน: ไม่มีแผน & ไม่มีงบ"));
    }

    #[test]
    fn json_format_is_valid() {
        let report = make_test_report();
        let output = render(&report, OutputFormat::Json);
        let parsed: Report = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn markdown_has_summary_rows() {
        let output = render(&make_test_report(), OutputFormat::Markdown);
        assert!(output.contains("| Score | 50% |"));
        assert!(output.contains("| Passed | 1/2 |"));
        assert!(output.contains("| Failed | 1 |"));
        assert!(output.contains("| สิทธิ | 50% |"));
    }

    #[test]
    fn word_html_starts_with_bom_and_escapes() {
        let output = render(&make_test_report(), OutputFormat::Html);
        assert!(output.starts_with('\u{feff}'));
        assert!(output.contains("<h1>Coal &lt;Plant&gt; #2</h1>"));
        assert!(output.contains("<tr><td>Total Risks Found</td><td>1</td></tr>"));
        assert!(output.contains("class=\"risk\""));
        assert!(output.contains("Generated by HRIA Assessment Tool"));
        assert!(!output.contains("<Plant>"));
    }

    #[test]
    fn print_html_is_paginated() {
        let output = render(&make_test_report(), OutputFormat::Print);
        assert!(output.contains("@page { size: A4 portrait; margin: 10mm; }"));
        assert_eq!(output.matches("<section class=\"page\">").count(), 3);
        assert!(output.contains("ไม่มีแผน &amp; ไม่มีงบ"));
    }

    #[test]
    fn exports_agree_on_score() {
        let report = make_test_report();
        for format in [OutputFormat::Html, OutputFormat::Print] {
            assert!(render(&report, format).contains("<tr><td>Score</td><td>50%</td></tr>"));
        }
    }

    #[test]
    fn exported_text_has_no_terminal_styling() {
        let report = make_test_report();
        assert!(render(&report, OutputFormat::Pretty).contains("\x1b[1m"));
        let bytes = export(&report, OutputFormat::Pretty, &PdfOptions::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains('\x1b'));
        assert!(text.starts_with("Coal <Plant> #2\n"));
    }

    #[test]
    fn markdown_cells_escape_pipes_and_newlines() {
        let mut assessment = assessment_with(vec![Question::new(
            "a",
            "สิทธิ|แรงงาน",
            "มีค่าจ้าง A|B ใช่หรือไม่",
        )]);
        assessment.answers.set("a", Score::Partial);
        assessment.answers.set_evidence("a", "สัญญา|ฉบับที่ 1\nภาคผนวก");
        let output = render(&assemble(&assessment).unwrap(), OutputFormat::Markdown);
        assert!(output.contains(
            "| สิทธิ\\|แรงงาน | มีค่าจ้าง A\\|B ใช่หรือไม่ | ใช่บางส่วน | สัญญา\\|ฉบับที่ 1 ภาคผนวก |"
        ));
        assert!(output.contains("| สิทธิ\\|แรงงาน | 50% |"));
    }

    #[test]
    fn pdf_export_is_paginated() {
        let questions = (0..120)
            .map(|i| Question::new(format!("q{}", i), "สิทธิ", format!("Question {}", i)))
            .collect();
        let report = assemble(&assessment_with(questions)).unwrap();

        let bytes = export(&report, OutputFormat::Pdf, &PdfOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let expected = crate::report::pdf::paginate(&render(&report, OutputFormat::Pdf)).len();
        assert!(expected > 1);
        let document = printpdf::lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(document.get_pages().len(), expected);
    }

    #[test]
    fn filename_is_sanitized() {
        let report = make_test_report();
        assert_eq!(
            export_filename(&report, OutputFormat::Html),
            "HRIA_Report_Coal__Plant___2.doc"
        );
        assert_eq!(
            export_filename(&report, OutputFormat::Print),
            "HRIA_Report_Coal__Plant___2.html"
        );
        assert_eq!(
            export_filename(&report, OutputFormat::Pdf),
            "HRIA_Report_Coal__Plant___2.pdf"
        );
    }
}
