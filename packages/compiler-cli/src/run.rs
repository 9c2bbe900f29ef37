//! Glues file discovery, the declaration-scanner stand-in, and the core
//! pipeline into one project-wide compilation pass (spec §1's "CLI driver"
//! external collaborator).

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use weaver_compiler::generator::default_template_bundle;
use weaver_compiler::pipeline::{compile_unit, CompilationUnit};
use weaver_compiler::template::TemplateBundle;
use weaver_compiler::PipelineError;

use crate::config::Config;
use crate::declaration_scanner::DeclarationScanner;
use crate::discover::discover_source_files;

/// What the driver does with a single file: either it produced generated
/// output, or the pipeline rejected it with a user-visible error.
pub enum FileOutcome {
    Compiled { file: PathBuf, written: Vec<PathBuf> },
    Failed { file: PathBuf, error: PipelineError },
}

pub struct RunOutcome {
    pub results: Vec<FileOutcome>,
}

impl RunOutcome {
    /// Exit code per spec §6: `0` if every unit compiled, `1` if any
    /// pipeline error was user-visible.
    pub fn exit_code(&self) -> i32 {
        if self.results.iter().any(|r| matches!(r, FileOutcome::Failed { .. })) {
            1
        } else {
            0
        }
    }
}

/// Runs the whole pipeline over `project_dir`: loads config, discovers
/// source files, scans and compiles each (in parallel across files, per
/// spec §5's "multiple compilation units may be processed in parallel"),
/// and writes generated output. Returns a per-file outcome list rather than
/// aborting on the first failure, since the driver — unlike the pipeline
/// itself — is free to continue with other units.
pub fn run(project_dir: &Path, config_path: Option<&Path>) -> anyhow::Result<RunOutcome> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_dir.join("weaver.config.json"));
    let config = Config::load(&config_path)?;

    let source_roots = config.resolved_source_roots(project_dir);
    let output_dir = config.resolved_output_dir(project_dir);
    fs::create_dir_all(&output_dir)?;

    let templates = load_templates(&config, project_dir)?;
    let files = discover_source_files(&source_roots, &config.source_extension);
    tracing::info!(count = files.len(), "discovered source files");

    let results: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| compile_one(path, &templates, &output_dir, &config.annotation_prefix))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(RunOutcome { results })
}

fn load_templates(config: &Config, project_dir: &Path) -> anyhow::Result<TemplateBundle> {
    // Start from the built-ins, then let an override directory replace
    // individual templates — a partial override directory still compiles.
    let mut bundle = default_template_bundle();
    let Some(template_dir) = &config.template_dir else {
        return Ok(bundle);
    };
    let dir = project_dir.join(template_dir);
    for (name, path) in [
        (weaver_compiler::generator::CONTAINER_TEMPLATE_PATH, "container.mustache"),
        (weaver_compiler::generator::RESOLVER_TEMPLATE_PATH, "resolver.mustache"),
    ] {
        let override_path = dir.join(path);
        if override_path.exists() {
            bundle.insert(name, fs::read_to_string(&override_path)?);
        }
    }
    Ok(bundle)
}

fn compile_one(
    path: &Path,
    templates: &TemplateBundle,
    output_dir: &Path,
    annotation_prefix: &str,
) -> anyhow::Result<FileOutcome> {
    let source = fs::read_to_string(path)?;
    let declarations = DeclarationScanner::scan(&source);
    let file_label = path.to_string_lossy().to_string();

    let unit = CompilationUnit {
        file: file_label.clone(),
        source: &source,
        declarations,
        templates: templates.clone(),
        annotation_prefix: annotation_prefix.to_string(),
    };

    match compile_unit(&unit) {
        Ok(compiled) => {
            let mut written = Vec::new();
            for (name, text) in compiled.outputs {
                let out_path = output_dir.join(name);
                fs::write(&out_path, text)?;
                written.push(out_path);
            }
            Ok(FileOutcome::Compiled { file: path.to_path_buf(), written })
        }
        Err(error) => {
            tracing::error!(file = %file_label, %error, "compilation failed");
            Ok(FileOutcome::Failed { file: path.to_path_buf(), error })
        }
    }
}
