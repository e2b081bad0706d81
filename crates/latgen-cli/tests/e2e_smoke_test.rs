use std::{fs, path::PathBuf};

use tempfile::tempdir;

use latgen_cli::{Args, run};

/// Collects all .toml hierarchies from a directory
fn collect_toml_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demo hierarchies live at the workspace root
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args_for(input: &PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_toml_files(demos_path());

    assert!(!demos.is_empty(), "No demo hierarchies found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let output_path = temp_dir.path().join(format!(
            "{}.xml",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        match run(&args_for(demo, output_path.clone())) {
            Ok(()) => {
                let xml = fs::read_to_string(&output_path).expect("output written");
                assert!(
                    xml.trim_end().ends_with("</Lattice>"),
                    "{} produced an incomplete document",
                    demo.display()
                );
            }
            Err(e) => failed.push((demo.clone(), e)),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_toml_files(demos_path().join("errors"));

    assert!(!demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &demos {
        let output_path = temp_dir.path().join(format!(
            "error_{}.xml",
            demo.file_stem().unwrap().to_string_lossy()
        ));

        if run(&args_for(demo, output_path)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_explicit_config_is_applied() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[export]\ninclude_markers = true\n").expect("config written");

    let demo = demos_path().join("mebt.toml");
    let output_path = temp_dir.path().join("mebt.xml");
    let mut args = args_for(&demo, output_path.clone());
    args.config = Some(config_path.to_string_lossy().to_string());

    run(&args).expect("mebt demo builds");

    let xml = fs::read_to_string(&output_path).expect("output written");
    assert!(xml.contains(r#"id="MARKER""#));
}
