use plotly::common::{DashType, ErrorData, ErrorType, Line, Mode, Orientation};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter, Trace};

use crate::data_handling::Value;
use crate::evaluation::PerformanceReport;
use crate::explain::{AttributionReport, ImportanceReport, Profile};

fn diagonal() -> Box<Scatter<f64, f64>> {
    Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Random")
        .line(Line::new().color("grey").dash(DashType::Dash))
}

/// ROC curves of several models on one figure.
pub fn plot_roc(reports: &[PerformanceReport]) -> Plot {
    let mut plot = Plot::new();
    for report in reports {
        let fpr: Vec<f64> = report.roc.iter().map(|p| p.fpr).collect();
        let tpr: Vec<f64> = report.roc.iter().map(|p| p.tpr).collect();
        plot.add_trace(
            Scatter::new(fpr, tpr)
                .mode(Mode::Lines)
                .name(&format!("{} (AUC {:.3})", report.label, report.auc)),
        );
    }
    plot.add_trace(diagonal());
    plot.set_layout(
        Layout::new()
            .title("ROC curve")
            .x_axis(Axis::new().title("False positive rate"))
            .y_axis(Axis::new().title("True positive rate")),
    );
    plot
}

pub fn plot_lift(reports: &[PerformanceReport]) -> Plot {
    let mut plot = Plot::new();
    for report in reports {
        let fraction: Vec<f64> = report.lift.iter().map(|p| p.fraction).collect();
        let lift: Vec<f64> = report.lift.iter().map(|p| p.lift).collect();
        plot.add_trace(Scatter::new(fraction, lift).mode(Mode::Lines).name(&report.label));
    }
    plot.set_layout(
        Layout::new()
            .title("Lift curve")
            .x_axis(Axis::new().title("Fraction of population"))
            .y_axis(Axis::new().title("Lift")),
    );
    plot
}

/// Horizontal bars of mean loss increase with one standard deviation error
/// bars, most important variable on top.
pub fn plot_importance(report: &ImportanceReport) -> Plot {
    // plotly draws the first category at the bottom
    let variables: Vec<String> = report.variables.iter().rev().map(|v| v.variable.clone()).collect();
    let means: Vec<f64> = report.variables.iter().rev().map(|v| v.mean_increase).collect();
    let stds: Vec<f64> = report.variables.iter().rev().map(|v| v.std_increase).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(means, variables)
            .orientation(Orientation::Horizontal)
            .name(&report.label)
            .error_x(ErrorData::new(ErrorType::Data).array(stds)),
    );
    plot.set_layout(
        Layout::new()
            .title(format!("{}: permutation importance", report.label).as_str())
            .x_axis(Axis::new().title(format!("Increase of {:?} loss", report.loss).as_str())),
    );
    plot
}

fn profile_trace(profile: &Profile) -> Box<dyn Trace> {
    let name = match &profile.group {
        Some(group) => format!("{} [{}]", profile.label, group),
        None => profile.label.clone(),
    };
    let numeric: Option<Vec<f64>> = profile.grid.iter().map(Value::as_number).collect();
    match numeric {
        Some(x) => Scatter::new(x, profile.predictions.clone())
            .mode(Mode::LinesMarkers)
            .name(&name),
        None => {
            let x: Vec<String> = profile.grid.iter().map(|v| v.to_string()).collect();
            Scatter::new(x, profile.predictions.clone())
                .mode(Mode::LinesMarkers)
                .name(&name)
        }
    }
}

/// Response curves (partial dependence or ceteris paribus) of one variable.
pub fn plot_profiles(profiles: &[Profile], title: &str) -> Plot {
    let mut plot = Plot::new();
    for profile in profiles {
        plot.add_trace(profile_trace(profile));
    }
    let variable = profiles.first().map(|p| p.variable.as_str()).unwrap_or_default();
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title(variable))
            .y_axis(Axis::new().title("Predicted probability")),
    );
    plot
}

/// Per-feature contributions of one prediction, largest magnitude on top.
pub fn plot_attribution(report: &AttributionReport) -> Plot {
    let sorted = report.sorted_by_magnitude();
    let names: Vec<String> = sorted
        .iter()
        .rev()
        .map(|c| format!("{} = {}", c.variable, c.value))
        .collect();
    let values: Vec<f64> = sorted.iter().rev().map(|c| c.contribution).collect();
    let stds: Vec<f64> = sorted.iter().rev().map(|c| c.std_dev).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(values, names)
            .orientation(Orientation::Horizontal)
            .name(&report.label)
            .error_x(ErrorData::new(ErrorType::Data).array(stds)),
    );
    plot.set_layout(
        Layout::new()
            .title(
                format!(
                    "{}: prediction {:.4}, baseline {:.4}",
                    report.label, report.prediction, report.baseline
                )
                .as_str(),
            )
            .x_axis(Axis::new().title("Shapley contribution")),
    );
    plot
}
