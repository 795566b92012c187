use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use classdelta_model::strip::{strip_debug, strip_unknown_attributes};
use classdelta_sdk::{
    ClassFormat, ClassNode, ClassPatcher, DiffStats, JsonClassFormat, PatchBytes, PatcherConfig,
};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

use crate::cli::*;

/// Settings shared by every subcommand.
struct Session {
    patcher: ClassPatcher,
    format: OutputFormat,
    skip_debug: bool,
    skip_unknown_attributes: bool,
}

impl Session {
    fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config(path)?,
            None => PatcherConfig::default(),
        };
        Ok(Self {
            patcher: ClassPatcher::new(config),
            format: cli.format,
            skip_debug: cli.skip_debug,
            skip_unknown_attributes: cli.skip_unknown_attributes,
        })
    }

    fn load_class(&self, path: &Path) -> anyhow::Result<ClassNode> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let mut class = JsonClassFormat::default()
            .parse(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        if self.skip_debug {
            strip_debug(&mut class);
        }
        if self.skip_unknown_attributes {
            strip_unknown_attributes(&mut class);
        }
        Ok(class)
    }

    fn load_patch(&self, path: &Path) -> anyhow::Result<PatchBytes> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(PatchBytes::from(bytes))
    }
}

fn load_config(path: &Path) -> anyhow::Result<PatcherConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session = Session::new(&cli)?;
    match cli.command {
        Command::Diff(args) => cmd_diff(&session, args),
        Command::Apply(args) => cmd_apply(&session, args),
        Command::Inspect(args) => cmd_inspect(&session, args),
        Command::Test(args) => cmd_test(&session, args),
    }
}

fn cmd_diff(session: &Session, args: DiffArgs) -> anyhow::Result<()> {
    let old = session.load_class(&args.old)?;
    let new = session.load_class(&args.new)?;
    let patch = session.patcher.diff(&old, &new)?;
    fs::write(&args.output, patch.as_bytes())
        .with_context(|| format!("writing {}", args.output.display()))?;
    let stats = session.patcher.inspect(&patch)?.stats;

    match session.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "patch": args.output.display().to_string(),
                "bytes": patch.len(),
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Wrote {} ({} bytes)",
                "✓".green().bold(),
                args.output.display().to_string().bold(),
                patch.len()
            );
            print_stats(&stats);
        }
    }
    Ok(())
}

fn cmd_apply(session: &Session, args: ApplyArgs) -> anyhow::Result<()> {
    let old = session.load_class(&args.old)?;
    let patch = session.load_patch(&args.patch)?;
    let target = session.patcher.apply(&old, &patch)?;
    let bytes = JsonClassFormat::pretty().write(&target)?;
    fs::write(&args.output, bytes).with_context(|| format!("writing {}", args.output.display()))?;

    match session.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "class": target.name,
                "output": args.output.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => println!(
            "{} Patched {} into {}",
            "✓".green().bold(),
            target.name.yellow(),
            args.output.display().to_string().bold()
        ),
    }
    Ok(())
}

fn cmd_inspect(session: &Session, args: InspectArgs) -> anyhow::Result<()> {
    let patch = session.load_patch(&args.patch)?;
    let summary = session.patcher.inspect(&patch)?;

    match session.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            println!("Patch {} ({} bytes)", args.patch.display().to_string().bold(), summary.size);
            println!("  Format version: {}", summary.format_version);
            println!("  Source name hash: {}", format!("{:08x}", summary.source_name_hash).cyan());
            println!("  Target name hash: {}", format!("{:08x}", summary.target_name_hash).cyan());
            println!("  Target digest: {}", summary.target_digest.to_hex().cyan());
            print_stats(&summary.stats);
        }
    }
    Ok(())
}

fn cmd_test(session: &Session, args: TestArgs) -> anyhow::Result<()> {
    let old = session.load_class(&args.old)?;
    let new = session.load_class(&args.new)?;
    let patch = session.patcher.diff(&old, &new)?;
    let rebuilt = session.patcher.apply(&old, &patch)?;

    if rebuilt != new {
        let format = JsonClassFormat::pretty();
        let expected = String::from_utf8(format.write(&new)?)?;
        let actual = String::from_utf8(format.write(&rebuilt)?)?;
        print_line_diff(&expected, &actual);
        bail!("{} did not survive the round trip", new.name);
    }

    match session.format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "class": new.name,
                "bytes": patch.len(),
                "ok": true,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => println!(
            "{} {} round-trips through a {}-byte patch",
            "✓".green().bold(),
            new.name.yellow(),
            patch.len()
        ),
    }
    Ok(())
}

fn print_stats(stats: &DiffStats) {
    if stats.is_identity() {
        println!("  {}", "No changes.".dimmed());
        return;
    }
    println!(
        "  {} equal, {} inserted, {} deleted, {} updated, {} scalars changed",
        stats.equal,
        stats.inserted.to_string().green(),
        stats.deleted.to_string().red(),
        stats.updated.to_string().yellow(),
        stats.changed_scalars
    );
}

fn print_line_diff(expected: &str, actual: &str) {
    let diff = TextDiff::from_lines(expected, actual);
    for change in diff.iter_all_changes() {
        let line = change.to_string_lossy();
        match change.tag() {
            ChangeTag::Delete => print!("{}", format!("-{line}").red()),
            ChangeTag::Insert => print!("{}", format!("+{line}").green()),
            ChangeTag::Equal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use classdelta_model::opcodes::*;
    use classdelta_model::{Attribute, Field, Instruction, LineNumber, Method};

    fn class(body: Vec<Instruction>) -> ClassNode {
        let mut main = Method::new(9, "main", "([Ljava/lang/String;)V").with_body(1, 1, body);
        main.attributes
            .push(Attribute::line_numbers(vec![LineNumber { start: 0, line: 1 }]));
        let mut class = ClassNode::new("demo/App").with_field(Field::new(2, "x", "I"));
        class.methods.push(main);
        class.source_file = Some("App.java".into());
        class
    }

    fn write_class(dir: &Path, name: &str, class: &ClassNode) -> String {
        let path = dir.join(name);
        fs::write(&path, JsonClassFormat::pretty().write(class).unwrap()).unwrap();
        path.display().to_string()
    }

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["classdelta"];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?)
    }

    #[test]
    fn diff_apply_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = class(vec![Instruction::simple(RETURN)]);
        let new = class(vec![Instruction::simple(NOP), Instruction::simple(RETURN)]);
        let old_path = write_class(dir.path(), "old.json", &old);
        let new_path = write_class(dir.path(), "new.json", &new);
        let patch = dir.path().join("app.cdlt").display().to_string();
        let out = dir.path().join("out.json").display().to_string();

        run(&["diff", &old_path, &new_path, "-o", &patch]).unwrap();
        run(&["inspect", &patch, "--format", "json"]).unwrap();
        run(&["apply", &old_path, &patch, "-o", &out]).unwrap();

        let rebuilt = JsonClassFormat::default()
            .parse(&fs::read(&out).unwrap())
            .unwrap();
        assert_eq!(rebuilt, new);
    }

    #[test]
    fn test_command_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let old = write_class(dir.path(), "old.json", &class(vec![Instruction::simple(RETURN)]));
        let new = write_class(
            dir.path(),
            "new.json",
            &class(vec![Instruction::int(BIPUSH, 3), Instruction::simple(POP), Instruction::simple(RETURN)]),
        );
        run(&["test", &old, &new]).unwrap();
        run(&["test", &old, &new, "-D", "-A"]).unwrap();
    }

    #[test]
    fn skip_debug_strips_both_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let old = class(vec![Instruction::simple(RETURN)]);
        let old_path = write_class(dir.path(), "old.json", &old);
        let patch = dir.path().join("p.cdlt").display().to_string();
        let out = dir.path().join("out.json").display().to_string();

        run(&["diff", &old_path, &old_path, "-o", &patch, "-D"]).unwrap();
        run(&["apply", &old_path, &patch, "-o", &out, "-D"]).unwrap();
        let rebuilt = JsonClassFormat::default()
            .parse(&fs::read(&out).unwrap())
            .unwrap();
        assert_eq!(rebuilt.source_file, None);
        assert!(rebuilt.methods[0].attributes.is_empty());
    }

    #[test]
    fn corrupt_patch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = write_class(dir.path(), "old.json", &class(vec![Instruction::simple(RETURN)]));
        let patch = dir.path().join("p.cdlt");
        fs::write(&patch, b"CDLT\x00\x01garbage").unwrap();
        let patch = patch.display().to_string();
        let out = dir.path().join("out.json").display().to_string();

        let err = run(&["apply", &old_path, &patch, "-o", &out]).unwrap_err();
        assert!(err.to_string().contains("corrupt patch"), "{err}");
        assert!(!Path::new(&out).exists());
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("classdelta.toml");
        fs::write(&config, "zstd_level = 3\nverify_target = false\n[align]\nexact_limit = 8\n")
            .unwrap();
        assert_eq!(
            load_config(&config).unwrap(),
            PatcherConfig {
                align: classdelta_sdk::AlignConfig { exact_limit: 8 },
                zstd_level: 3,
                verify_target: false,
            }
        );

        fs::write(&config, "zstd_level = \"high\"").unwrap();
        assert!(load_config(&config).is_err());
    }

    #[test]
    fn missing_input_has_context() {
        let err = run(&["inspect", "/nonexistent/patch.cdlt"]).unwrap_err();
        assert!(err.to_string().contains("reading /nonexistent/patch.cdlt"), "{err}");
    }
}
