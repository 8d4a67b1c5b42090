use std::{env, fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use ircore::{
    compile_unit_with,
    compiler::backend::{BackendRegistry, CompilationContext},
    config::CompilerOptions,
    display_diagnostic, SourceDocument,
};

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let emit = args.iter().any(|a| a == "--emit");
    let target = args.iter().find_map(|a| a.strip_prefix("--target="));
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let [file_path] = files.as_slice() else {
        eprintln!("usage: ircore <file> [--emit] [--target=<backend>]");
        return ExitCode::from(2);
    };

    let path = PathBuf::from(file_path.as_str());
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.to_string());

    let document = match read_to_string(&path) {
        Ok(text) => SourceDocument::new(file_name, text),
        Err(error) => {
            tracing::warn!(%error, path = %path.display(), "could not read source file");
            SourceDocument::missing(file_name)
        }
    };

    let start = Instant::now();
    let options = match target {
        Some(target) => CompilerOptions::default().with_target(target),
        None => CompilerOptions::default(),
    };
    let compilation = compile_unit_with(&document, &options);
    tracing::info!(elapsed = ?start.elapsed(), "compiled");

    let source = document.text.as_deref().unwrap_or_default();
    for diagnostic in compilation.diagnostics.iter() {
        println!("{}\n", display_diagnostic(diagnostic, source));
    }

    if compilation.has_errors() {
        return ExitCode::FAILURE;
    }

    if emit {
        let mut registry = BackendRegistry::with_defaults();
        match compilation.emit_with(&mut registry, &options.target, &mut CompilationContext::new()) {
            Ok(artifact) => print!("{}", String::from_utf8_lossy(&artifact)),
            Err(error) => {
                eprintln!("error: {}", error);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
