//! Self-contained HTML report assembled from maud markup and plotly figures.
use std::fs;
use std::path::Path;

use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::error::Result;
use crate::evaluation::PerformanceReport;

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2em auto; max-width: 1100px; color: #222; }
h1 { margin-bottom: 0; }
.subtitle { color: #666; margin-top: 0.2em; }
section { margin-top: 2.5em; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.code-container { background-color: #f5f5f5; padding: 10px; border-radius: 5px; overflow-x: auto; font-family: monospace; white-space: pre-wrap; }
";

pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, markup: Markup) {
        self.content.push(markup);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.content.push(PreEscaped(plot.to_inline_html(None)));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    div { (block) }
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    version: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str, subtitle: &str) -> Self {
        Report {
            title: title.to_string(),
            version: version.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let page = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_JS) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { (self.title) }
                    p class="subtitle" { (self.subtitle) " | version " (self.version) " | generated " (generated.to_string()) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        };
        page.into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.render())?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

fn metric(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.4}", value)
    }
}

/// Table of the headline metrics, one row per model.
pub fn performance_table(reports: &[PerformanceReport]) -> Markup {
    html! {
        table {
            tr {
                th { "Model" } th { "Cutoff" } th { "AUC" } th { "Accuracy" }
                th { "Precision" } th { "Recall" } th { "F1" }
                th { "TP" } th { "FP" } th { "TN" } th { "FN" }
            }
            @for r in reports {
                tr {
                    td { (r.label) }
                    td { (r.cutoff) }
                    td { (metric(r.auc)) }
                    td { (metric(r.accuracy)) }
                    td { (metric(r.precision)) }
                    td { (metric(r.recall)) }
                    td { (metric(r.f1)) }
                    td { (r.confusion.tp) }
                    td { (r.confusion.fp) }
                    td { (r.confusion.tn) }
                    td { (r.confusion.fn_) }
                }
            }
        }
    }
}

/// Pretty-printed JSON block.
pub fn code_block(json: &str) -> Markup {
    html! {
        div class="code-container" {
            pre { code { (json) } }
        }
    }
}
