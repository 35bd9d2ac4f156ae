use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::RenderError;
use crate::models::{NormalizedLicense, Outcome, Verdict};

use super::{write_artifact, Artifact, Renderer, Report};

const STYLE: &str = "\
body { font-family: -apple-system, Helvetica, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.2rem; }
.meta { color: #666; margin-bottom: 1.5rem; }
table { border-collapse: collapse; width: 100%; margin-bottom: 2rem; }
th, td { border: 1px solid #ddd; padding: 0.4rem 0.6rem; text-align: left; }
th { background: #f4f4f4; }
.allowed { color: #1a7f37; }
.violation { color: #cf222e; font-weight: bold; }
.unknown { color: #9a6700; }
.summary span { margin-right: 1.5rem; }
";

/// Writes the human-readable inventory: one table per scope.
pub struct InventoryHtmlRenderer {
    output: PathBuf,
    title: Option<String>,
}

impl InventoryHtmlRenderer {
    pub fn new(output: &Path, title: Option<String>) -> Self {
        InventoryHtmlRenderer {
            output: output.to_path_buf(),
            title,
        }
    }
}

impl Renderer for InventoryHtmlRenderer {
    fn name(&self) -> &str {
        "inventory-html"
    }

    fn render(&self, report: &Report) -> Result<Artifact, RenderError> {
        let document = to_html(report, self.title.as_deref());
        // An existing directory gets the page as its index.
        let output = if self.output.is_dir() {
            self.output.join("index.html")
        } else {
            self.output.clone()
        };
        write_artifact(self.name(), &output, document.as_bytes())
    }
}

pub fn to_html(report: &Report, title: Option<&str>) -> String {
    let meta = &report.metadata;
    let heading = match title {
        Some(title) => format!("{} - {}", meta.project, title),
        None => format!("{} - Dependency Licenses", meta.project),
    };

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{}</title>", escape_html(&heading));
    let _ = writeln!(out, "<style>\n{STYLE}</style>\n</head>\n<body>");
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(&heading));
    let _ = writeln!(
        out,
        "<p class=\"meta\">Generated {} by {}</p>",
        escape_html(&meta.generated_at),
        escape_html(&meta.generator)
    );

    let summary = &report.summary;
    let _ = writeln!(
        out,
        "<p class=\"summary\"><span>Total: {}</span><span class=\"allowed\">Allowed: {}</span>\
         <span class=\"violation\">Violations: {}</span><span class=\"unknown\">Unknown: {}</span></p>",
        summary.total, summary.allowed, summary.violations, summary.unknown
    );

    if report.sections.is_empty() {
        let _ = writeln!(out, "<p>No dependencies.</p>");
    }

    for section in &report.sections {
        let _ = writeln!(out, "<h2>{}</h2>", escape_html(&section.scope));
        let _ = writeln!(
            out,
            "<table>\n<thead><tr><th>Library</th><th>Version</th><th>Group</th>\
             <th>License(s)</th><th>Risk</th><th>Verdict</th><th>Origin</th></tr></thead>\n<tbody>"
        );
        for verdict in &section.verdicts {
            write_row(&mut out, verdict);
        }
        let _ = writeln!(out, "</tbody>\n</table>");
    }

    if !meta.warnings.is_empty() {
        let _ = writeln!(out, "<h2>Warnings</h2>\n<ul>");
        for warning in &meta.warnings {
            let _ = writeln!(out, "<li>{}</li>", escape_html(warning));
        }
        let _ = writeln!(out, "</ul>");
    }

    let _ = writeln!(out, "</body>\n</html>");
    out
}

fn write_row(out: &mut String, verdict: &Verdict) {
    let dep = &verdict.dependency;
    let risk = crate::license::classifier::classify(&verdict.licenses);
    let verdict_cell = match &verdict.outcome {
        Outcome::Allowed => "<td class=\"allowed\">allowed</td>".to_string(),
        Outcome::Violation { reason, .. } => format!(
            "<td class=\"violation\" title=\"{}\">violation</td>",
            escape_html(reason)
        ),
        Outcome::Unknown => "<td class=\"unknown\">unknown</td>".to_string(),
    };

    let _ = writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>{}<td>{}</td></tr>",
        escape_html(&dep.name),
        escape_html(&dep.version),
        escape_html(&dep.group),
        license_cell(&verdict.licenses),
        risk,
        verdict_cell,
        dep.origin,
    );
}

fn license_cell(licenses: &[NormalizedLicense]) -> String {
    if licenses.is_empty() {
        return "<em>none declared</em>".to_string();
    }
    licenses
        .iter()
        .map(|license| match license {
            NormalizedLicense::Resolved(canonical) => format!(
                "<a href=\"{}\" title=\"{}\">{}</a>",
                escape_html(&canonical.url),
                escape_html(&canonical.name),
                escape_html(&canonical.id)
            ),
            NormalizedLicense::Unresolved { raw } => escape_html(raw),
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
