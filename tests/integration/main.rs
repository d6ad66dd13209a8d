//! Integration tests for Hoist

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn hoist() -> Command {
        cargo_bin_cmd!("hoist")
    }

    /// Project dir with a .hoist.toml declaring the given targets
    fn project_with_targets(toml_targets: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".hoist.toml"),
            format!("[targets]\n{toml_targets}"),
        )
        .unwrap();
        dir
    }

    /// Point --config at a nonexistent file so the user's real global
    /// config never leaks into a test
    fn isolated_config(dir: &TempDir) -> String {
        dir.path().join("no-global.toml").display().to_string()
    }

    #[test]
    fn help_displays() {
        hoist()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build-event relay"));
    }

    #[test]
    fn version_displays() {
        hoist()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("hoist"));
    }

    #[test]
    fn plan_together_is_one_batch() {
        hoist()
            .args(["plan", "A", "B", "C", "--mode", "together"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 batch(es)"))
            .stdout(predicate::str::contains("[A,B,C]"));
    }

    #[test]
    fn plan_separate_is_one_batch_per_target() {
        hoist()
            .args(["plan", "A", "B", "C", "--mode", "separate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("3 batch(es)"))
            .stdout(predicate::str::contains("[A]"));
    }

    #[test]
    fn config_path() {
        hoist()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn run_invokes_configured_target() {
        let dir = project_with_targets("Build = \"printf 'out1\\n'\"\n");

        hoist()
            .current_dir(dir.path())
            .args(["run", "Build", "--config", &isolated_config(&dir)])
            .assert()
            .success()
            .stdout(predicate::str::contains("out1"))
            .stdout(predicate::str::contains("Succeeded"));
    }

    #[test]
    fn run_failed_target_exits_nonzero() {
        let dir = project_with_targets("Broken = \"exit 3\"\n");

        hoist()
            .current_dir(dir.path())
            .args(["run", "Broken", "--config", &isolated_config(&dir)])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed"));
    }

    #[test]
    fn run_unconfigured_target_reports_fault() {
        let dir = project_with_targets("");

        hoist()
            .current_dir(dir.path())
            .args(["run", "Mystery", "--config", &isolated_config(&dir)])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No command configured"));
    }

    #[test]
    fn run_keep_going_aggregates_later_outputs() {
        let dir = project_with_targets(
            "Broken = \"exit 1\"\nAfter = \"printf 'after-out\\n'\"\n",
        );

        hoist()
            .current_dir(dir.path())
            .args([
                "run",
                "Broken",
                "After",
                "--mode",
                "separate",
                "--keep-going",
                "--config",
                &isolated_config(&dir),
            ])
            .assert()
            .failure()
            .stdout(predicate::str::contains("after-out"));
    }

    #[test]
    fn run_writes_event_log() {
        let dir = project_with_targets("Build = \"true\"\n");
        let events = dir.path().join("events.jsonl");

        hoist()
            .current_dir(dir.path())
            .args([
                "run",
                "Build",
                "--events",
                &events.display().to_string(),
                "--config",
                &isolated_config(&dir),
            ])
            .assert()
            .success();

        let content = std::fs::read_to_string(&events).unwrap();
        let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert!(first["build_id"].is_string());
        assert_eq!(first["event"]["kind"], "message");
    }

    #[test]
    fn run_uses_configured_event_log() {
        let dir = TempDir::new().unwrap();
        let events = dir.path().join("configured-events.jsonl");
        let global = dir.path().join("global.toml");
        std::fs::write(
            &global,
            format!(
                "[general]\nevent_log = {:?}\n\n[targets]\nBuild = \"true\"\n",
                events.display().to_string()
            ),
        )
        .unwrap();

        hoist()
            .current_dir(dir.path())
            .args([
                "run",
                "Build",
                "--no-local",
                "--config",
                &global.display().to_string(),
            ])
            .assert()
            .success();

        let content = std::fs::read_to_string(&events).unwrap();
        assert!(content.lines().count() >= 1);
    }

    #[test]
    fn init_creates_local_config() {
        let dir = TempDir::new().unwrap();

        hoist()
            .current_dir(dir.path())
            .args(["init"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".hoist.toml"));

        assert!(dir.path().join(".hoist.toml").exists());

        hoist()
            .current_dir(dir.path())
            .args(["init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }
}
