mod scenario_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use engine::{EngineError, FormState};
use formblocks::PageDefinition;

const SUBCOMMANDS: &[&str] = &["render", "run", "test", "help"];

#[derive(Parser)]
#[command(name = "formblocks", version, about = "Repeatable form block manager")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a page manifest to HTML
    Render(RenderArgs),

    /// Replay user gestures against a page and print what it would submit
    Run(RunArgs),

    /// Run .scenario test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// TOML page manifest
    file: String,
}

#[derive(clap::Args)]
struct RunArgs {
    /// TOML page manifest
    file: String,

    /// Gesture script to replay (one gesture per line)
    #[arg(short, long)]
    script: Option<String>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// List the block kinds declared by the page
    #[arg(long)]
    list_kinds: bool,

    /// Print the submission as JSON
    #[arg(long)]
    json: bool,

    /// Decode the submission per kind instead of printing raw fields
    #[arg(long)]
    decode: bool,

    /// Suppress output (just check for errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .scenario file or directory containing them
    path: String,

    /// Run only scenarios in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Shorthand: `formblocks page.toml` renders the page.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Render(render_args) => {
            let form = FormState::from_page(&load_page(&render_args.file, color_choice));
            print!("{}", form.to_html());
        }
        Command::Run(run_args) => do_run(run_args, color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                scenario_runner::list_categories(path);
                return;
            }
            let exit_code = scenario_runner::run_scenarios(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Read and parse a page manifest, printing diagnostics and exiting on failure.
fn load_page(file: &str, color_choice: ColorChoice) -> PageDefinition {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(file.to_string(), source.clone());

    match formblocks::parser::Parser::new(source, file_id).parse() {
        Ok(page) => page,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    }
}

fn do_run(args: RunArgs, color_choice: ColorChoice) {
    let page = load_page(&args.file, color_choice);

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    if args.list_kinds {
        for def in &page.kinds {
            let fields: Vec<&str> = def.kind.fields.iter().map(|f| f.name.as_str()).collect();
            println!(
                "{} ({} initial, floor {}): {}",
                def.kind.name,
                def.initial.len(),
                def.kind.floor.min_blocks(),
                fields.join(", ")
            );
        }
        return;
    }

    let mut form = FormState::from_page(&page);

    if let Some(script_path) = &args.script {
        let source = match std::fs::read_to_string(script_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", script_path, e);
                process::exit(1);
            }
        };
        let result = engine::parse_script(&source).and_then(|script| {
            tracing::info!(gestures = script.len(), script = %script_path, "replaying gestures");
            engine::run_script(&mut form, &script)
        });
        if let Err(error) = result {
            report(script_path, &error);
            process::exit(1);
        }
    }

    let submission = form.submission();

    if args.decode {
        let mut failed = false;
        for registry in form.registries() {
            let kind = registry.kind();
            match engine::decode(kind, &submission) {
                Ok(blocks) if !args.quiet => {
                    if args.json {
                        match serde_json::to_string_pretty(&blocks) {
                            Ok(json) => println!("{}: {}", kind.name, json),
                            Err(e) => eprintln!("error: {}", e),
                        }
                    } else {
                        println!("{} ({} blocks)", kind.name, blocks.len());
                        for (i, values) in blocks.iter().enumerate() {
                            let pairs: Vec<String> =
                                values.iter().map(|(k, v)| format!("{}={:?}", k, v)).collect();
                            println!("  {}. {}", i + 1, pairs.join(" "));
                        }
                    }
                }
                Ok(_) => {}
                Err(errors) => {
                    failed = true;
                    for error in errors {
                        eprintln!("error: {}", error);
                    }
                }
            }
        }
        if failed {
            process::exit(1);
        }
        return;
    }

    if args.quiet {
        return;
    }
    if args.json {
        match serde_json::to_string_pretty(&submission) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    } else {
        for field in submission.fields() {
            println!("{}={}", field.name, field.value);
        }
    }
}

fn report(script_path: &str, error: &EngineError) {
    eprintln!("error: {}: {}", script_path, error);
}
