//! Fragment options: the attribute surface of a dynamic block.

use std::collections::BTreeSet;

use crate::document::ListingBlock;

/// Option flag that marks a listing for execution.
pub const EXECUTE_OPTION: &str = "dynamic";
/// Document attribute that enables dynamic execution.
pub const DOCUMENT_MARKER: &str = "dynamic-blocks";
/// Document attribute naming the result cache directory.
pub const CACHE_ATTRIBUTE: &str = "dynamic-blocks-cache-result";

/// Separator between argument sets in the `args` attribute.
pub const ARG_SETS_DELIMITER: char = ';';

/// Declared kind of a fragment's captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredOutput {
    /// No `output` attribute.
    Unspecified,
    Plotly,
    PyVista,
    Other(String),
}

impl DeclaredOutput {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") => Self::Unspecified,
            Some("plotly") => Self::Plotly,
            Some("pyvista") => Self::PyVista,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

/// Options declared on one fragment.
#[derive(Debug, Clone)]
pub struct FragmentOptions {
    /// `%dynamic`
    pub execute: bool,
    /// `%open`
    pub open: bool,
    /// `%raw`
    pub raw: bool,
    /// `fail-on-error` attribute present (any value)
    pub fail_on_error: bool,
    /// `output=`
    pub output: DeclaredOutput,
    /// `compile=`
    pub compile: Option<String>,
    /// `build=`
    pub build_dir: Option<String>,
    /// `comp-args=`
    pub compiler_flags: Option<String>,
    /// `filename=`
    pub filename: Option<String>,
    /// `exec=`
    pub executable: Option<String>,
    /// `run=false` disables execution after compiling
    pub run: bool,
    /// `inputs=` with `\n` sequences turned into newlines
    pub stdin: Option<String>,
    /// `args=` split on `;`
    pub arg_sets: Vec<String>,
    /// `np=`
    pub process_count: Option<u32>,
    /// Every option flag, forwarded onto result containers
    pub flags: BTreeSet<String>,
}

impl FragmentOptions {
    /// Read options from a listing block.
    pub fn from_listing(listing: &ListingBlock) -> Self {
        let non_empty = |name: &str| {
            listing
                .attribute(name)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            execute: listing.has_option(EXECUTE_OPTION),
            open: listing.has_option("open"),
            raw: listing.has_option("raw"),
            fail_on_error: listing.has_attribute("fail-on-error"),
            output: DeclaredOutput::parse(listing.attribute("output")),
            compile: non_empty("compile"),
            build_dir: listing.attribute("build").map(str::to_string),
            compiler_flags: listing.attribute("comp-args").map(str::to_string),
            filename: non_empty("filename"),
            executable: non_empty("exec"),
            run: listing.attribute("run") != Some("false"),
            stdin: non_empty("inputs").map(|v| v.replace("\\n", "\n")),
            arg_sets: parse_arg_sets(listing.attribute("args").unwrap_or("")),
            process_count: listing.attribute("np").and_then(|v| v.trim().parse().ok()),
            flags: listing.options.clone(),
        }
    }
}

/// Split an `args` attribute into trimmed argument sets.
///
/// An absent or empty attribute yields one empty set, so a fragment always
/// runs at least once.
pub fn parse_arg_sets(value: &str) -> Vec<String> {
    value
        .split(ARG_SETS_DELIMITER)
        .map(|s| s.trim().to_string())
        .collect()
}
