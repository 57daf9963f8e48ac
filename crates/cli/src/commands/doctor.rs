use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use catalog_core::config::{AppConfig, LoadOptions};
use catalog_db::open_catalog;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(into_check("catalog_readable", check_catalog_readable(&config)));
            checks.push(into_check(
                "catalog_writable",
                check_catalog_writable(&config.storage.catalog_path),
            ));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_readable", "catalog_writable"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn into_check(name: &'static str, result: anyhow::Result<String>) -> DoctorCheck {
    match result {
        Ok(details) => DoctorCheck { name, status: CheckStatus::Pass, details },
        Err(error) => DoctorCheck { name, status: CheckStatus::Fail, details: format!("{error:#}") },
    }
}

fn check_catalog_readable(config: &AppConfig) -> anyhow::Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;

    let repo = open_catalog(config);
    let catalog = runtime
        .block_on(repo.store().load())
        .with_context(|| format!("failed to load `{}`", config.storage.catalog_path.display()))?;
    let active = catalog.products().iter().filter(|p| p.is_active.is_true()).count();

    Ok(format!("decoded {} product(s), {active} active", catalog.len()))
}

/// Creates and removes a probe file beside the catalog.
fn check_catalog_writable(catalog_path: &Path) -> anyhow::Result<String> {
    let dir = catalog_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    if dir.exists() && !dir.is_dir() {
        return Err(anyhow!("`{}` is not a directory", dir.display()));
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create catalog directory `{}`", dir.display()))?;

    let probe = dir.join(format!(".catalog-doctor-{}.probe", std::process::id()));
    fs::write(&probe, b"probe")
        .with_context(|| format!("cannot write into `{}`", dir.display()))?;
    fs::remove_file(&probe)
        .with_context(|| format!("cannot remove probe file `{}`", probe.display()))?;

    Ok(format!("`{}` is writable", dir.display()))
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
