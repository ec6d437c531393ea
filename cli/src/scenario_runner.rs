use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use engine::FormState;

const SCENARIO_SUFFIX: &str = ".scenario";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Human-readable scenario description.
    #[serde(default)]
    pub description: Option<String>,

    /// Page manifest, relative to the scenario file.
    pub page: String,

    /// Expected parsing failure of the page manifest.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected gesture failure; the error's Display string must contain this.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected block count per kind, checked against both the registry
    /// and the mirrored `num-<kind>s` field.
    #[serde(default)]
    pub expect_counts: BTreeMap<String, usize>,

    /// Expected submitted values by field name.
    #[serde(default)]
    pub expect_fields: BTreeMap<String, String>,

    /// Fields that must not be submitted at all.
    #[serde(default)]
    pub expect_absent: Vec<String>,

    /// Substrings the rendered page must contain.
    #[serde(default)]
    pub expect_html_contains: Vec<String>,

    /// Expected server-side decode failure (substring of any decode error).
    #[serde(default)]
    pub expect_decode_error: Option<String>,
}

/// Split a `.scenario` file into its TOML config and gesture script.
fn parse_scenario_file(content: &str) -> Result<(ScenarioConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let script = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: ScenarioConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, script))
}

pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct ScenarioResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

impl ScenarioResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim_end_matches(SCENARIO_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_scenario(path: &Path) -> ScenarioResult {
    let (description, outcome) = match check_scenario(path) {
        Ok(description) => (description, Outcome::Pass),
        Err((description, reason)) => (description, Outcome::Fail(reason)),
    };
    ScenarioResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

type CheckResult = Result<Option<String>, (Option<String>, String)>;

fn check_scenario(path: &Path) -> CheckResult {
    let content =
        std::fs::read_to_string(path).map_err(|e| (None, format!("cannot read file: {}", e)))?;
    let (config, script_source) =
        parse_scenario_file(&content).map_err(|e| (None, format!("frontmatter error: {}", e)))?;
    let description = config.description.clone();
    let fail = |reason: String| (description.clone(), reason);

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let page_path = base_dir.join(&config.page);
    let page_source = std::fs::read_to_string(&page_path)
        .map_err(|e| fail(format!("cannot read page {}: {}", page_path.display(), e)))?;

    let parse_result = formblocks::parser::Parser::new(page_source, 0).parse();
    if config.expect_parse_error {
        return match parse_result {
            Err(_) => Ok(description.clone()),
            Ok(_) => Err(fail("expected page parse error, but parsing succeeded".into())),
        };
    }
    let page = parse_result.map_err(|errs| {
        let msgs: Vec<String> = errs.iter().map(|e| e.message.clone()).collect();
        fail(format!("unexpected page parse error: {}", msgs.join("; ")))
    })?;

    let mut form = FormState::from_page(&page);
    let run_result = engine::parse_script(script_source)
        .and_then(|script| engine::run_script(&mut form, &script));

    match (&config.expect_error, run_result) {
        (Some(expected), Err(err)) => {
            let err_str = err.to_string();
            if !err_str.contains(expected.as_str()) {
                return Err(fail(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, err_str
                )));
            }
        }
        (Some(expected), Ok(())) => {
            return Err(fail(format!(
                "expected error containing \"{}\", but every gesture succeeded",
                expected
            )));
        }
        (None, Err(err)) => return Err(fail(format!("unexpected error: {}", err))),
        (None, Ok(())) => {}
    }

    let submission = form.submission();

    for (kind, expected) in &config.expect_counts {
        let registry = form
            .registry(kind)
            .ok_or_else(|| fail(format!("page has no kind {:?}", kind)))?;
        if registry.len() != *expected {
            return Err(fail(format!(
                "{}: expected {} blocks, registry holds {}",
                kind,
                expected,
                registry.len()
            )));
        }
        let count_field = registry.kind().count_field();
        let mirrored = submission.get(&count_field).unwrap_or("(missing)");
        if mirrored != expected.to_string() {
            return Err(fail(format!(
                "{}: expected {}, submitted {}",
                count_field, expected, mirrored
            )));
        }
    }

    for (name, expected) in &config.expect_fields {
        match submission.get(name) {
            Some(actual) if actual == expected => {}
            Some(actual) => {
                return Err(fail(format!(
                    "field {}\n  expected: {:?}\n  actual:   {:?}",
                    name, expected, actual
                )));
            }
            None => return Err(fail(format!("field {} was not submitted", name))),
        }
    }

    for name in &config.expect_absent {
        if let Some(actual) = submission.get(name) {
            return Err(fail(format!(
                "field {} should not be submitted, got {:?}",
                name, actual
            )));
        }
    }

    if !config.expect_html_contains.is_empty() {
        let html = form.to_html();
        for needle in &config.expect_html_contains {
            if !html.contains(needle.as_str()) {
                return Err(fail(format!("rendered page lacks {:?}", needle)));
            }
        }
    }

    let decode_errors: Vec<String> = form
        .registries()
        .iter()
        .filter_map(|r| engine::decode(r.kind(), &submission).err())
        .flatten()
        .map(|e| e.to_string())
        .collect();
    match &config.expect_decode_error {
        Some(expected) if !decode_errors.iter().any(|e| e.contains(expected.as_str())) => {
            return Err(fail(format!(
                "expected decode error containing \"{}\", got: [{}]",
                expected,
                decode_errors.join("; ")
            )));
        }
        None if !decode_errors.is_empty() => {
            return Err(fail(format!(
                "unexpected decode errors: {}",
                decode_errors.join("; ")
            )));
        }
        _ => {}
    }

    Ok(description)
}

/// `.scenario` files under a directory, grouped by the subfolder they sit
/// in. Files directly in the root belong to category "".
struct ScenarioSet {
    by_category: BTreeMap<String, Vec<PathBuf>>,
}

impl ScenarioSet {
    fn discover(root: &Path) -> Self {
        let mut by_category: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.is_dir() {
                    pending.push(path);
                } else if is_scenario(&path) {
                    by_category
                        .entry(category_of(root, &path))
                        .or_default()
                        .push(path);
                }
            }
        }
        for files in by_category.values_mut() {
            files.sort();
        }
        ScenarioSet { by_category }
    }

    fn single(file: &Path) -> Self {
        ScenarioSet {
            by_category: BTreeMap::from([(String::new(), vec![file.to_path_buf()])]),
        }
    }

    fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    fn labels(&self) -> Vec<&str> {
        self.by_category.keys().map(|c| category_label(c)).collect()
    }

    /// Narrow to the requested categories and anything nested below them.
    fn select(self, requested: &[String]) -> Self {
        if requested.is_empty() {
            return self;
        }
        let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();
        for name in &wanted {
            if !self.by_category.keys().any(|cat| within(cat, name)) {
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    name,
                    self.labels().join(", ")
                );
            }
        }
        let by_category = self
            .by_category
            .into_iter()
            .filter(|(cat, _)| wanted.iter().any(|name| within(cat, name)))
            .collect();
        ScenarioSet { by_category }
    }
}

fn is_scenario(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(SCENARIO_SUFFIX))
}

fn category_of(root: &Path, file: &Path) -> String {
    file.parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn within(category: &str, requested: &str) -> bool {
    category == requested
        || category
            .strip_prefix(requested)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// Print the scenario categories found under `path` with their sizes.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let set = ScenarioSet::discover(path);
    if set.is_empty() {
        eprintln!("no {} files found in {}", SCENARIO_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (cat, files) in &set.by_category {
        eprintln!("  {} ({} scenarios)", category_label(cat), files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

/// Run every `.scenario` file under `path` (or a single file).
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_scenarios(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let set = if path.is_file() {
        ScenarioSet::single(path)
    } else {
        let all = ScenarioSet::discover(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", SCENARIO_SUFFIX, path.display());
            return 1;
        }
        all.select(categories)
    };

    if set.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<ScenarioResult> = Vec::new();

    for (cat, files) in &set.by_category {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", paint(category_label(cat), "1", no_color));
        }

        for file in files {
            let result = run_single_scenario(file);
            match &result.outcome {
                Outcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                Outcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let Outcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!(
            "scenario result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "scenario result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}
