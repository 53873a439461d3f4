use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::brackets::match_brackets;
use crate::cells::StackCells;
use crate::codegen::generate;
use crate::error::CoreError;
use crate::grouping::group_runs;
use crate::lexer::lex;

/// Per-compilation settings. Nothing here is global, so independent
/// compilations never observe each other's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fold runs of `+`/`-` into a single add or subtract.
    pub optimize: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

/// Counts gathered while compiling, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileSummary {
    /// Number of opcodes after filtering.
    pub instructions: usize,
    /// Number of bracket pairs.
    pub loops: usize,
    /// Number of grouping entries; zero when optimization is off.
    pub runs: usize,
}

/// Compile `source` and stream the assembly into `out`.
///
/// Bracket matching and grouping both complete before the first byte is
/// written, so a malformed program leaves `out` untouched.
pub fn compile_to<W: Write>(
    source: impl AsRef<[u8]>,
    options: &CompileOptions,
    out: &mut W,
) -> Result<CompileSummary, CoreError> {
    let ops = lex(source);
    let brackets = match_brackets(&ops)?;
    let grouping = options.optimize.then(|| group_runs(&ops));

    generate(out, &ops, &brackets, grouping.as_ref(), &StackCells)?;

    Ok(CompileSummary {
        instructions: ops.len(),
        loops: brackets.len(),
        runs: grouping.as_ref().map_or(0, |table| table.len()),
    })
}

/// Compile `source` into an assembly string.
pub fn compile(source: impl AsRef<[u8]>, options: &CompileOptions) -> Result<String, CoreError> {
    let mut buffer = Vec::new();
    compile_to(source, options, &mut buffer)?;
    // Every byte we emit is ASCII.
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Compile the file at `input` into `output`.
///
/// The assembly is written to a temporary file next to `output` and only
/// moved into place once compilation succeeded; on any failure `output` is
/// left as it was and the temporary file is removed.
pub fn compile_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompileSummary, CoreError> {
    let input = input.as_ref();
    let output = output.as_ref();

    let source = fs::read(input).map_err(|source| CoreError::SourceRead {
        path: input.to_path_buf(),
        source,
    })?;

    let output_error = |source| CoreError::OutputWrite {
        path: output.to_path_buf(),
        source,
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir).map_err(output_error)?;

    let mut writer = BufWriter::new(staging);
    let summary = compile_staged(&source, options, &mut writer, output)?;
    let staging = writer
        .into_inner()
        .map_err(|err| output_error(err.into_error()))?;
    staging
        .persist(output)
        .map_err(|err| output_error(err.error))?;

    Ok(summary)
}

/// [`compile_to`] for a writer that stands in for `output`: emission
/// failures are reported against `output`, structural errors pass through.
fn compile_staged<W: Write>(
    source: &[u8],
    options: &CompileOptions,
    writer: &mut W,
    output: &Path,
) -> Result<CompileSummary, CoreError> {
    compile_to(source, options, writer).map_err(|err| match err {
        CoreError::Io(source) => CoreError::OutputWrite {
            path: output.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// `program.bf` -> `program.asm`.
pub fn default_output_path(input: impl AsRef<Path>) -> PathBuf {
    input.as_ref().with_extension("asm")
}
