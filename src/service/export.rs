use std::path::Path;

use crate::domain::JobRecord;
use crate::error::{HarvestError, Result};

/// Writes qualified records as CSV, one row per record, header first.
/// Returns the number of rows written; nothing is written for an empty set.
pub fn write_csv(path: &Path, jobs: &[JobRecord]) -> Result<usize> {
    if jobs.is_empty() {
        tracing::info!("[EXPORT] No qualified leads found, nothing written");
        return Ok(0);
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| HarvestError::export(format!("{}: {}", path.display(), e)))?;
    for job in jobs {
        writer
            .serialize(job)
            .map_err(|e| HarvestError::export(e.to_string()))?;
    }
    writer.flush()?;

    tracing::info!("[EXPORT] Saved {} qualified leads to {}", jobs.len(), path.display());
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawCard;
    use chrono::NaiveDate;

    fn qualified_job() -> JobRecord {
        let mut job = JobRecord::from_card(
            RawCard {
                title: "Marketing Manager".into(),
                company: "Acme, Inc.".into(),
                link: "https://x/?jk=1".into(),
                ..Default::default()
            },
            "https://www.site.test/viewjob?jk=1".into(),
            "Indeed",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        job.full_description = "SaaS \"startup\"".into();
        job.score = Some(8.0);
        job.reason = Some("SaaS startup".into());
        job
    }

    #[test]
    fn test_header_and_row_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");

        assert_eq!(write_csv(&path, &[qualified_job()]).unwrap(), 1);

        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,company,location,salary,short_description,full_description,link,canonical_link,source,published_date,score,reason"
        );
        assert_eq!(
            lines.next().unwrap(),
            r#"Marketing Manager,"Acme, Inc.",,,,"SaaS ""startup""",https://x/?jk=1,https://www.site.test/viewjob?jk=1,Indeed,2024-05-01,8.0,SaaS startup"#
        );
    }

    #[test]
    fn test_empty_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        assert_eq!(write_csv(&path, &[]).unwrap(), 0);
        assert!(!path.exists());
    }
}
