//! PHPUnit-backed test executor
//!
//! Writes the exported test into a scratch directory, runs the configured
//! PHPUnit command against it and collects whatever screenshots the test
//! saved into `$WALKHUB_SCREENSHOT_DIR`.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use super::executor::{ExecutionFailure, ExecutionResult, TestCase, TestExecutor};
use crate::client::{ExecutionStatus, Screenshot};
use crate::config::ExecutorConfig;

/// Environment variable telling the test where to save screenshots
pub const SCREENSHOT_DIR_ENV: &str = "WALKHUB_SCREENSHOT_DIR";

const DEFAULT_CLASS_NAME: &str = "WalkhubTest";

/// Runs exported tests with PHPUnit
pub struct PhpunitExecutor {
    config: ExecutorConfig,
}

impl PhpunitExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    async fn run_in(&self, dir: &Path, case: &TestCase) -> Result<ExecutionResult, ExecutionFailure> {
        let screenshot_dir = dir.join("screenshots");
        tokio::fs::create_dir_all(&screenshot_dir)
            .await
            .map_err(|e| ExecutionFailure::new(format!("Failed to prepare {}: {}", screenshot_dir.display(), e)))?;

        let class_name = test_class_name(&case.source).unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string());
        let test_file = dir.join(format!("{}.php", class_name));
        tokio::fs::write(&test_file, &case.source)
            .await
            .map_err(|e| ExecutionFailure::new(format!("Failed to write {}: {}", test_file.display(), e)))?;

        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .arg(&test_file)
            .current_dir(dir)
            .env(SCREENSHOT_DIR_ENV, &screenshot_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!(
            "Running {} for {} {}",
            self.config.command, case.entity_type, case.uuid
        );
        let run = command.output();
        let output = match self.config.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                .await
                .map_err(|_| ExecutionFailure::new(format!("Test timed out after {}s", secs)))?,
            None => run.await,
        }
        .map_err(|e| {
            ExecutionFailure::new(format!("Failed to start '{}': {}", self.config.command, e))
        })?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !log.is_empty() && !log.ends_with('\n') {
                log.push('\n');
            }
            log.push_str(&stderr);
        }

        let status = match output.status.code() {
            Some(0) => ExecutionStatus::Passed,
            Some(1) => ExecutionStatus::Failed,
            Some(code) => {
                debug!("{} exited with {}", self.config.command, code);
                ExecutionStatus::Error
            }
            None => {
                return Err(ExecutionFailure::new(format!(
                    "'{}' was terminated by a signal\n{}",
                    self.config.command, log
                )));
            }
        };

        let screenshots = collect_screenshots(&screenshot_dir)
            .await
            .map_err(|e| ExecutionFailure::new(format!("Failed to read screenshots: {}", e)))?;
        debug!("Collected {} screenshot(s)", screenshots.len());

        Ok(ExecutionResult {
            status,
            screenshots,
            log,
        })
    }
}

#[async_trait]
impl TestExecutor for PhpunitExecutor {
    async fn execute(&self, case: &TestCase) -> Result<ExecutionResult, ExecutionFailure> {
        if !is_plain_dir_name(&case.uuid) {
            return Err(ExecutionFailure::new(format!(
                "Refusing to use queue item uuid '{}' as a directory name",
                case.uuid
            )));
        }

        match &self.config.work_dir {
            Some(work_dir) => {
                let dir: PathBuf = work_dir.join(&case.uuid);
                if dir.exists() {
                    tokio::fs::remove_dir_all(&dir).await.map_err(|e| {
                        ExecutionFailure::new(format!("Failed to clear {}: {}", dir.display(), e))
                    })?;
                }
                self.run_in(&dir, case).await
            }
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix("walkhub-")
                    .tempdir()
                    .map_err(|e| ExecutionFailure::new(format!("Failed to create temp dir: {}", e)))?;
                self.run_in(scratch.path(), case).await
            }
        }
    }
}

/// Whether `name` is exactly one ordinary path component
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part.to_str() == Some(name)
    )
}

/// Name of the first class declared in a PHP source file
fn test_class_name(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        while let Some(word) = words.next() {
            if word == "class" {
                let name: String = words
                    .next()?
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                return (!name.is_empty()).then_some(name);
            }
            if word.starts_with("//") || word.starts_with('#') || word.starts_with('*') {
                break;
            }
        }
        None
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// Image files in a directory, sorted by file name
async fn collect_screenshots(dir: &Path) -> std::io::Result<Vec<Screenshot>> {
    let mut screenshots = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Some(content_type) = content_type_for(&path) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let data = tokio::fs::read(&path).await?;
        screenshots.push(Screenshot {
            name,
            content_type: content_type.to_string(),
            data,
        });
    }

    screenshots.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(screenshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EntityType;

    fn case(source: &str) -> TestCase {
        TestCase {
            uuid: "abc123".to_string(),
            entity_type: EntityType::Walkthrough,
            title: None,
            source: source.to_string(),
        }
    }

    #[test]
    fn test_class_name_detection() {
        let source = "<?php\n// class Commented\nclass Walkthrough_abc123Test extends PHPUnit_Extensions_Selenium2TestCase {\n}";
        assert_eq!(
            test_class_name(source).as_deref(),
            Some("Walkthrough_abc123Test")
        );
        assert_eq!(test_class_name("<?php echo 1;"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("notes.txt")), None);
    }

    #[tokio::test]
    async fn test_collect_screenshots_sorted_images_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("02-cart.png"), [2u8]).unwrap();
        std::fs::write(dir.path().join("01-home.png"), [1u8]).unwrap();
        std::fs::write(dir.path().join("trace.log"), b"log").unwrap();

        let shots = collect_screenshots(dir.path()).await.unwrap();
        let names: Vec<_> = shots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["01-home.png", "02-cart.png"]);
        assert_eq!(shots[0].data, vec![1u8]);
    }

    #[test]
    fn test_plain_dir_names() {
        assert!(is_plain_dir_name("abc123"));
        assert!(is_plain_dir_name("6f1c-4b2a_x"));
        for name in ["", ".", "..", "../sibling", "/tmp/other", "a/b", "abc/"] {
            assert!(!is_plain_dir_name(name), "{name:?} accepted");
        }
    }

    #[tokio::test]
    async fn test_uuid_cannot_escape_work_dir() {
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("work");
        let sibling = root.path().join("sibling");
        let outside = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(&work).unwrap();
        std::fs::create_dir_all(&sibling).unwrap();
        std::fs::write(work.join("keep.txt"), b"keep").unwrap();
        std::fs::write(sibling.join("data.txt"), b"data").unwrap();
        std::fs::write(outside.path().join("precious.txt"), b"precious").unwrap();

        let executor = PhpunitExecutor::new(ExecutorConfig {
            command: "/nonexistent/phpunit-binary".to_string(),
            work_dir: Some(work.clone()),
            ..ExecutorConfig::default()
        });

        let outside_path = outside.path().to_string_lossy().into_owned();
        for uuid in ["../sibling", outside_path.as_str(), ""] {
            let mut case = case("<?php class T {}");
            case.uuid = uuid.to_string();

            let err = executor.execute(&case).await.unwrap_err();
            assert!(err.diagnostic.contains("Refusing"), "{uuid:?}: {}", err.diagnostic);
        }

        assert!(sibling.join("data.txt").exists());
        assert!(outside.path().join("precious.txt").exists());
        assert!(work.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_command_is_execution_failure() {
        let executor = PhpunitExecutor::new(ExecutorConfig {
            command: "/nonexistent/phpunit-binary".to_string(),
            ..ExecutorConfig::default()
        });

        let err = executor.execute(&case("<?php class T {}")).await.unwrap_err();
        assert!(err.diagnostic.contains("Failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_command_and_collects_screenshots() {
        let work = tempfile::tempdir().unwrap();
        let executor = PhpunitExecutor::new(ExecutorConfig {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "printf png > \"$WALKHUB_SCREENSHOT_DIR/s1.png\"; echo \"ran $0\"".to_string(),
            ],
            work_dir: Some(work.path().to_path_buf()),
            timeout_secs: Some(30),
        });

        let result = executor
            .execute(&case("<?php class CheckoutTest {}"))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Passed);
        assert!(result.log.contains("CheckoutTest.php"));
        assert_eq!(result.screenshots.len(), 1);
        assert_eq!(result.screenshots[0].name, "s1.png");
        assert_eq!(result.screenshots[0].data, b"png".to_vec());
        assert!(work.path().join("abc123").join("CheckoutTest.php").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_codes_map_to_status() {
        for (code, expected) in [
            (1, ExecutionStatus::Failed),
            (2, ExecutionStatus::Error),
        ] {
            let executor = PhpunitExecutor::new(ExecutorConfig {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), format!("echo failing >&2; exit {}", code)],
                ..ExecutorConfig::default()
            });

            let result = executor.execute(&case("<?php class T {}")).await.unwrap();
            assert_eq!(result.status, expected);
            assert!(result.log.contains("failing"));
            assert!(result.screenshots.is_empty());
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_execution_failure() {
        let executor = PhpunitExecutor::new(ExecutorConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
            timeout_secs: Some(1),
            ..ExecutorConfig::default()
        });

        let err = executor.execute(&case("<?php class T {}")).await.unwrap_err();
        assert!(err.diagnostic.contains("timed out"));
    }
}
