//! Check command - load the site and print its task plan

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use lightsite_core::GenContext;
use lightsite_generator::Builder;

use super::load_site;

/// Run the check command.
///
/// Registers every include and freezes the task list, which surfaces
/// duplicate locations and missing sources, without writing anything.
pub fn run(config_path: &Path) -> Result<()> {
    tracing::info!(?config_path, "Checking site");

    println!("Checking configuration...");
    let (config, site) = load_site(config_path, false)?;
    println!("  ✓ Configuration valid");

    println!("\nPlanning tasks...");
    let ctx = Builder::new(site, config.output_dir())
        .plan()
        .wrap_err("Failed to plan tasks")?;

    for line in plan_lines(&ctx) {
        println!("{line}");
    }

    println!();
    println!("✓ {} task(s) in {} group(s)", ctx.tasks().len(), ctx.tasks_by_cwd().len());
    Ok(())
}

/// The frozen plan: one header per directory group, one line per task.
pub fn plan_lines(ctx: &GenContext) -> Vec<String> {
    let mut lines = Vec::new();
    for (dir, tasks) in ctx.tasks_by_cwd() {
        lines.push(format!("  {}", dir.display()));
        for task in tasks {
            lines.push(format!("    {} -> {}", task.location(), task.url()));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_check_plans_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "").unwrap();
        fs::write(
            dir.path().join("lightsite.toml"),
            r#"
[site]
url = "https://example.org/"

[[include]]
location = "assets"
kind = "copy"
"#,
        )
        .unwrap();

        let config_path = dir.path().join("lightsite.toml");
        run(&config_path).unwrap();
        assert!(!dir.path().join("out").exists());

        let (config, site) = load_site(&config_path, false).unwrap();
        let ctx = Builder::new(site, config.output_dir()).plan().unwrap();
        let lines = plan_lines(&ctx);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "    assets -> https://example.org/assets");
    }

    #[test]
    fn test_check_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("lightsite.toml")).is_err());
    }
}
