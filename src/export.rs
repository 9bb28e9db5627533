use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::ExportError;
use crate::models::JobApplication;

pub const DEFAULT_EXPORT_FILE: &str = "hirebot_applications.csv";

const HEADERS: [&str; 6] = ["Company", "Role", "Platform", "Status", "Date", "Match Score"];

// No quoting: a comma inside a field shifts that row's columns.
pub fn export_csv(applications: &[JobApplication]) -> Result<String, ExportError> {
    if applications.is_empty() {
        return Err(ExportError::NoApplications);
    }

    let mut lines = Vec::with_capacity(applications.len() + 1);
    lines.push(HEADERS.join(","));
    for app in applications {
        let score = app.match_score.to_string();
        lines.push(
            [
                app.company_name.as_str(),
                app.role.as_str(),
                app.platform.as_str(),
                app.status.as_str(),
                app.applied_date.as_str(),
                score.as_str(),
            ]
            .join(","),
        );
    }
    Ok(lines.join("\n"))
}

pub fn write_csv(applications: &[JobApplication], path: Option<&Path>) -> Result<PathBuf, ExportError> {
    let content = export_csv(applications)?;
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_FILE));
    std::fs::write(&path, content)?;
    info!(rows = applications.len(), path = %path.display(), "exported applications");
    Ok(path)
}
