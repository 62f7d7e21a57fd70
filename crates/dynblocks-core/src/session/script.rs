//! Session script synthesis.
//!
//! All fragments of a document become cells of one IPython session:
//!
//! ```text
//! fragment 0 ──► prepare_code ──► cell 0 ─┐
//! fragment 1 ──► prepare_code ──► cell 1 ─┼─► one script on interpreter stdin
//! fragment n ──► prepare_code ──► cell n ─┘        │
//!                                                  └─► JSON results on stderr
//! ```

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Callout markers as rendered by the document converter.
static CONVERTED_CALLOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*<i class="conum" data-value="[0-9]+"></i><b>[^>]+</b>"#)
        .expect("callout pattern is valid")
});

/// Callout markers as written in source (`# <1>`), at the end of a line.
static SOURCE_CALLOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)[ \t]+(?:#[ \t]*)?<[0-9]+>[ \t]*$").expect("callout pattern is valid")
});

/// A trailing "show the chart" call and its capture-to-stdout substitute.
#[derive(Debug, Clone, Copy)]
pub struct Visualization {
    pub name: &'static str,
    pub trigger: &'static str,
    pub substitute: &'static str,
}

/// Visualization families whose viewer calls are rewritten.
pub const VISUALIZATIONS: &[Visualization] = &[
    Visualization {
        name: "plotly",
        trigger: "fig.show()",
        substitute: "import sys; fig.write_html(file=sys.stdout, include_plotlyjs=False)",
    },
    Visualization {
        name: "pyvista",
        trigger: "plotter.show()",
        substitute: "import sys; sys.stdout.write(plotter.export_html(None).getvalue())",
    },
];

/// Strip callout markers and rewrite viewer calls.
///
/// Only the matched text changes; every other line is left untouched.
pub fn prepare_code(code: &str) -> String {
    let code = CONVERTED_CALLOUT.replace_all(code, "");
    let code = SOURCE_CALLOUT.replace_all(&code, "");
    VISUALIZATIONS
        .iter()
        .fold(code.into_owned(), |code, viz| code.replace(viz.trigger, viz.substitute))
}

/// One prepared cell of the session script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCell {
    pub code: String,
    pub id: String,
}

const PRELUDE: &str = "\
from IPython.core.interactiveshell import InteractiveShell
from IPython.utils.capture import capture_output
import json
import sys

shell = InteractiveShell()
results = []

shell.run_cell('%colors nocolor')
";

const EPILOGUE: &str = "
sys.stderr.write('\\n' + json.dumps(results) + '\\n')
";

/// Build the session script for the given cells.
pub fn synthesize(cells: &[ScriptCell]) -> Result<String> {
    let mut script = String::from(PRELUDE);

    for (index, cell) in cells.iter().enumerate() {
        let code = python_literal(&cell.code)?;
        let id = python_literal(&cell.id)?;
        // `write!` into a String cannot fail.
        let _ = write!(
            script,
            "
with capture_output() as io{index}:
    r{index} = shell.run_cell({code})
results.append({{
    'success': r{index}.success,
    'stderr': io{index}.stderr,
    'stdout': io{index}.stdout,
    'id': {id},
    'code': {code},
}})
"
        );
    }

    script.push_str(EPILOGUE);
    Ok(script)
}

/// Encode text as a Python string literal.
///
/// JSON string escapes are a subset of Python's.
fn python_literal(text: &str) -> Result<String> {
    Ok(serde_json::to_string(text)?)
}
