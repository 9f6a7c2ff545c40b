use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use maud::html;
use serde::Serialize;

use xrisk_classifiers::explain::Profile;
use xrisk_classifiers::report::{
    code_block, performance_table, plot_attribution, plot_importance, plot_lift, plot_profiles, plot_roc, Report,
    ReportSection,
};

use crate::pipeline::input::PipelineConfig;
use crate::pipeline::runner::PipelineOutcome;
use crate::util::ensure_output_dir;

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

#[derive(Serialize)]
struct ProfilesOutput<'a> {
    partial_dependence: &'a [Profile],
    ceteris_paribus: &'a [Profile],
}

/// Write every result as JSON into the configured output directory, plus
/// the HTML report unless disabled. Returns the written paths.
pub fn write_outputs(config: &PipelineConfig, outcome: &PipelineOutcome) -> Result<Vec<PathBuf>> {
    let dir = PathBuf::from(&config.output_dir);
    ensure_output_dir(&dir)?;

    let mut written = vec![
        write_json(&dir, "performance.json", &outcome.performance)?,
        write_json(&dir, "importance.json", &outcome.importance)?,
        write_json(
            &dir,
            "profiles.json",
            &ProfilesOutput {
                partial_dependence: &outcome.partial_dependence,
                ceteris_paribus: &outcome.ceteris_paribus,
            },
        )?,
        write_json(&dir, "attribution.json", &outcome.attributions)?,
    ];
    if let Some(trials) = &outcome.tuning_trials {
        written.push(write_json(&dir, "tuning.json", trials)?);
    }

    if config.report {
        let path = dir.join("report.html");
        build_report(config, outcome)?.save_to_file(&path)?;
        written.push(path);
    }
    Ok(written)
}

/// Profiles keyed by variable, keeping first-seen order of models.
fn by_variable(profiles: &[Profile]) -> BTreeMap<&str, Vec<Profile>> {
    let mut grouped: BTreeMap<&str, Vec<Profile>> = BTreeMap::new();
    for profile in profiles {
        grouped.entry(profile.variable.as_str()).or_default().push(profile.clone());
    }
    grouped
}

pub fn build_report(config: &PipelineConfig, outcome: &PipelineOutcome) -> Result<Report> {
    let mut report = Report::new("xrisk", env!("CARGO_PKG_VERSION"), "Mortality risk model evaluation and explanation");

    let mut performance = ReportSection::new("Model performance");
    performance.add_content(html! {
        p { "Validation cohort, cutoff " (config.cutoff.unwrap_or(f64::NAN)) "." }
    });
    performance.add_content(performance_table(&outcome.performance));
    performance.add_plot(plot_roc(&outcome.performance));
    performance.add_plot(plot_lift(&outcome.performance));
    report.add_section(performance);

    let mut importance = ReportSection::new("Variable importance");
    for r in &outcome.importance {
        importance.add_plot(plot_importance(r));
    }
    report.add_section(importance);

    let mut profiles = ReportSection::new("Partial dependence");
    for (variable, group) in by_variable(&outcome.partial_dependence) {
        profiles.add_plot(plot_profiles(&group, &format!("Partial dependence of {}", variable)));
    }
    report.add_section(profiles);

    let mut local = ReportSection::new("Instance explanation");
    for r in &outcome.attributions {
        local.add_plot(plot_attribution(r));
    }
    for (variable, group) in by_variable(&outcome.ceteris_paribus) {
        local.add_plot(plot_profiles(&group, &format!("Ceteris paribus profile of {}", variable)));
    }
    report.add_section(local);

    let mut configuration = ReportSection::new("Configuration");
    configuration.add_content(code_block(&serde_json::to_string_pretty(config)?));
    report.add_section(configuration);

    Ok(report)
}
