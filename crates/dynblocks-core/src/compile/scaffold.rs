//! Source materialization for compiled fragments and build files.

use std::fs;
use std::path::PathBuf;

use crate::discover::SourceFragment;
use crate::error::Result;
use crate::paths::DocumentDirs;

/// Filename prefix that marks a bare snippet needing a `main`.
pub const SNIPPET_PREFIX: &str = "snippet_";

/// Filename used for build-file fragments that name none.
pub const DEFAULT_BUILD_FILE: &str = "CMakeLists.txt";

const CPP_INCLUDES: &str = "\
#include <iostream>
#include <string>
#include <string_view>
#include <cassert>
";

const C_INCLUDES: &str = "\
#include <stdio.h>
#include <stdlib.h>
#include <assert.h>
";

/// Wrap snippet code in a minimal runnable program.
///
/// Code whose filename does not start with [`SNIPPET_PREFIX`] is returned
/// unchanged.
pub fn wrap_snippet(code: &str, filename: &str, language: &str) -> String {
    if !filename.starts_with(SNIPPET_PREFIX) {
        return code.to_string();
    }
    let includes = if language == "c" { C_INCLUDES } else { CPP_INCLUDES };
    format!("{includes}\nint main()\n{{\n   {code}\n}}")
}

/// Default source filename of a compiled fragment.
pub fn default_filename(fragment: &SourceFragment) -> String {
    format!("dynblock_{}.{}", fragment.ordinal, fragment.language)
}

/// Write a compiled fragment's source, scaffolded if it is a snippet.
pub fn write_source(dirs: &DocumentDirs, fragment: &SourceFragment, filename: &str) -> Result<PathBuf> {
    let path = dirs.file(filename);
    let code = wrap_snippet(&fragment.code, filename, &fragment.language);
    tracing::info!("Writing {} to {}", fragment.label(), path.display());
    fs::write(&path, code)?;
    Ok(path)
}

/// Write a build-file fragment verbatim next to the compiled sources.
pub fn write_build_file(dirs: &DocumentDirs, fragment: &SourceFragment) -> Result<PathBuf> {
    let filename = fragment
        .options
        .filename
        .as_deref()
        .unwrap_or(DEFAULT_BUILD_FILE);
    let path = dirs.file(filename);
    tracing::info!("Writing build file {}", path.display());
    fs::write(&path, &fragment.code)?;
    Ok(path)
}
