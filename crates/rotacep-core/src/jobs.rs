use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{cep, ConfigError};

/// One delivery-radius job: an origin CEP measured against every postal
/// code of a target city, published under the company label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub company: String,
    pub origin_cep: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct JobsFile {
    pub jobs: Vec<JobConfig>,
}

/// Load and validate the jobs list from a YAML file.
///
/// Origin CEPs are normalized in place (separators stripped, leading
/// zeros restored), so downstream code always sees 8-digit strings.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_jobs(path: &Path) -> Result<JobsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::JobsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut jobs_file: JobsFile = serde_yaml::from_str(&content)?;
    normalize_jobs(&mut jobs_file)?;
    Ok(jobs_file)
}

fn normalize_jobs(jobs_file: &mut JobsFile) -> Result<(), ConfigError> {
    let mut seen_companies = HashSet::new();

    for job in &mut jobs_file.jobs {
        if job.company.trim().is_empty() {
            return Err(ConfigError::Validation(
                "job company label must be non-empty".to_string(),
            ));
        }
        if job.state.trim().is_empty() || job.city.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "job '{}' must name both a state and a city",
                job.company
            )));
        }

        let normalized = cep::normalize_padded(&job.origin_cep).ok_or_else(|| {
            ConfigError::Validation(format!(
                "job '{}' has an invalid origin CEP: '{}'",
                job.company, job.origin_cep
            ))
        })?;
        job.origin_cep = normalized;

        if !seen_companies.insert(job.company.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate job company label: '{}'",
                job.company
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, origin_cep: &str) -> JobConfig {
        JobConfig {
            company: company.to_string(),
            origin_cep: origin_cep.to_string(),
            state: "São Paulo".to_string(),
            city: "Guarulhos".to_string(),
        }
    }

    #[test]
    fn normalize_pads_spreadsheet_eaten_zeros() {
        let mut file = JobsFile {
            jobs: vec![job("Rex Delivery", "1310-100")],
        };
        normalize_jobs(&mut file).unwrap();
        assert_eq!(file.jobs[0].origin_cep, "01310100");
    }

    #[test]
    fn rejects_invalid_origin_cep() {
        let mut file = JobsFile {
            jobs: vec![job("Rex Delivery", "013101001")],
        };
        let err = normalize_jobs(&mut file).unwrap_err();
        assert!(err.to_string().contains("invalid origin CEP"));
    }

    #[test]
    fn rejects_empty_company() {
        let mut file = JobsFile {
            jobs: vec![job("  ", "01310100")],
        };
        let err = normalize_jobs(&mut file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn rejects_missing_city() {
        let mut file = JobsFile {
            jobs: vec![JobConfig {
                company: "Rex Delivery".to_string(),
                origin_cep: "01310100".to_string(),
                state: "São Paulo".to_string(),
                city: " ".to_string(),
            }],
        };
        let err = normalize_jobs(&mut file).unwrap_err();
        assert!(err.to_string().contains("state and a city"));
    }

    #[test]
    fn rejects_duplicate_company_case_insensitively() {
        let mut file = JobsFile {
            jobs: vec![job("Rex Delivery", "01310100"), job("rex delivery", "37002970")],
        };
        let err = normalize_jobs(&mut file).unwrap_err();
        assert!(err.to_string().contains("duplicate job company"));
    }

    #[test]
    fn accepts_distinct_jobs() {
        let mut file = JobsFile {
            jobs: vec![job("Rex Delivery", "01310100"), job("Vale Express", "37002970")],
        };
        assert!(normalize_jobs(&mut file).is_ok());
    }

    #[test]
    fn load_jobs_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("jobs.yaml");
        assert!(
            path.exists(),
            "jobs.yaml missing at {path:?}; required for this test"
        );
        let result = load_jobs(&path);
        assert!(result.is_ok(), "failed to load jobs.yaml: {result:?}");
        let jobs_file = result.unwrap();
        assert!(!jobs_file.jobs.is_empty());
    }
}
