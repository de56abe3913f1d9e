//! # .env File Loading
//!
//! Credentials for CI runs are commonly handed over through a `.env` file
//! (`GCP_SA_KEY=...`). Files are read from the working directory:
//! 1. `.env.local` - local overrides (gitignored)
//! 2. `.env` - shared defaults
//!
//! Existing process variables are never overwritten, and since dotenvy never
//! replaces a variable it has already set, the higher-priority file is loaded
//! first.

use std::path::Path;
use tracing::{debug, info};

const ENV_FILES: [&str; 2] = [".env.local", ".env"];

pub fn load_dotenv_files(directory: &Path) {
    for env_file in ENV_FILES {
        let env_path = directory.join(env_file);

        if !env_path.exists() {
            debug!("Skipping {} (file not found)", env_file);
            continue;
        }

        match dotenvy::from_path(&env_path) {
            Ok(_) => info!("Loaded environment from {}", env_path.display()),
            Err(e) => debug!("Failed to load {}: {}", env_path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        load_dotenv_files(temp_dir.path());
    }

    #[test]
    #[serial_test::serial(env)]
    fn test_process_vars_not_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let var = "QUERY_HARNESS_TEST_DO_NOT_OVERWRITE";
        env::set_var(var, "process_value");
        std::fs::write(temp_dir.path().join(".env"), format!("{var}=file_value")).unwrap();

        load_dotenv_files(temp_dir.path());

        assert_eq!(env::var(var).unwrap(), "process_value");
        env::remove_var(var);
    }

    #[test]
    #[serial_test::serial(env)]
    fn test_local_file_wins_over_shared_file() {
        let temp_dir = TempDir::new().unwrap();
        let var = "QUERY_HARNESS_TEST_LOCAL_WINS";
        std::fs::write(temp_dir.path().join(".env"), format!("{var}=shared")).unwrap();
        std::fs::write(temp_dir.path().join(".env.local"), format!("{var}=local")).unwrap();

        load_dotenv_files(temp_dir.path());

        assert_eq!(env::var(var).unwrap(), "local");
        env::remove_var(var);
    }
}
