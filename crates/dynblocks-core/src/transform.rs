//! Output transformer: captured results to document nodes.
//!
//! Session results become one collapsible *Results* example per fragment,
//! rendered by the [`OutputKind`] selected from the fragment's options.
//! Compiled fragments become command-line examples with nested results.

use std::sync::LazyLock;

use html_escape::encode_text;
use regex::{NoExpand, Regex};

use crate::compile::{CompileSummary, CompiledFragment, RunOutcome, StageFailure};
use crate::discover::SourceFragment;
use crate::document::OutputNode;
use crate::options::{DeclaredOutput, FragmentOptions};
use crate::session::CellResult;

pub const ROLE_PY_RESULT: &str = "dynamic-py-result";
pub const ROLE_PLOTLY: &str = "dynamic-py-result-plotly";
pub const ROLE_PLOTLY_GRID: &str = "dynamic-py-result-plotly-grid";
pub const ROLE_COMPILE_COMMAND: &str = "compile-command";
pub const ROLE_EXECUTION_COMMAND: &str = "execution-command";
pub const ROLE_CPP_RESULT: &str = "dynamic-cpp-result";
pub const ROLE_CPP_ERROR: &str = "dynamic-cpp-result-error";

const RESULTS_TITLE: &str = "Results";

static PLOTLY_CHART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)<div id="[^"]+" class="plotly-graph-div" .*</script>"#)
        .expect("plotly pattern is valid")
});

static PYVISTA_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^var container = document\.querySelector\('.content'\);$")
        .expect("pyvista container pattern is valid")
});

static PYVISTA_FAVICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"n\.setAttribute\("href","https://kitware.github.io/vtk-js/icon/favicon-".concat\(t,"x"\).concat\(t,".png"\)\),"#,
    )
    .expect("pyvista favicon pattern is valid")
});

static PYVISTA_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?P<script><script .*</script>)").expect("pyvista script pattern is valid")
});

/// How a session fragment's stdout is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Pre-formatted literal text.
    Literal,
    /// Raw markup scanned for Plotly charts.
    Plotly,
    /// Raw PyVista export, rebound to its own container.
    PyVista,
}

impl OutputKind {
    pub fn for_fragment(options: &FragmentOptions) -> Self {
        match (options.raw, &options.output) {
            (false, _) => Self::Literal,
            (true, DeclaredOutput::PyVista) => Self::PyVista,
            (true, _) => Self::Plotly,
        }
    }
}

/// A transformed session result.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub node: OutputNode,
    /// Set when the output did not look like what was declared.
    pub warning: Option<String>,
}

/// Build the *Results* example for one session cell.
pub fn session_result(fragment: &SourceFragment, result: &CellResult) -> Transformed {
    let mut container = results_container(&fragment.options);
    let stdout = result.stdout.as_str();
    let mut warning = None;

    match OutputKind::for_fragment(&fragment.options) {
        OutputKind::Literal => {
            container.append(OutputNode::literal(stdout, ROLE_PY_RESULT));
        }
        OutputKind::Plotly => {
            container.add_role(ROLE_PY_RESULT);
            let charts = plotly_charts(stdout);
            if charts.is_empty() {
                container.append(OutputNode::pass(stdout, None));
            } else {
                container.add_role(ROLE_PLOTLY);
                if charts.len() > 1 {
                    container.add_role(ROLE_PLOTLY_GRID);
                }
                container.append(OutputNode::pass(charts.join("\n"), None));
            }
        }
        OutputKind::PyVista => match pyvista_markup(stdout, fragment.ordinal) {
            Some(markup) => container.append(OutputNode::pass(markup, Some(ROLE_PY_RESULT))),
            None => {
                let message = format!("{}: no PyVista script found in output", fragment.label());
                tracing::warn!("{}", message);
                warning = Some(message);
                container.append(OutputNode::pass(stdout, Some(ROLE_PY_RESULT)));
            }
        },
    }

    Transformed {
        node: container,
        warning,
    }
}

/// Every independent Plotly chart in `output`, in order.
pub fn plotly_charts(output: &str) -> Vec<&str> {
    PLOTLY_CHART.find_iter(output).map(|m| m.as_str()).collect()
}

/// Rebind a PyVista HTML export to the `pyvista-<ordinal>` container.
///
/// Returns `None` when the export holds no script.
pub fn pyvista_markup(output: &str, ordinal: usize) -> Option<String> {
    let container_id = format!("pyvista-{}", ordinal);
    let rebound = PYVISTA_CONTAINER.replace(
        output,
        NoExpand(&format!(
            "var container = document.getElementById('{}')",
            container_id
        )),
    );
    let rebound = PYVISTA_FAVICON.replace(&rebound, "");
    let script = PYVISTA_SCRIPT.captures(&rebound)?.name("script")?.as_str();

    Some(format!(
        r#"<div id="{id}" style="position: relative; height: 500px; border: 1px solid #cecece;"></div>
<script>
const resizeObserver = new ResizeObserver((entries) => {{
  for (const entry of entries) {{
    window.dispatchEvent(new Event('resize'))
  }}
}})
resizeObserver.observe(document.getElementById('{id}'))
</script>
{script}"#,
        id = container_id,
    ))
}

/// Collapsible *Results* container carrying the fragment's option flags.
fn results_container(options: &FragmentOptions) -> OutputNode {
    let mut container = OutputNode::example(RESULTS_TITLE);
    for flag in &options.flags {
        container.set_option(flag);
    }
    container.set_option("collapsible");
    container
}

/// *Results* example for compiled output; `open` fragments also get `folded`.
fn compiled_results_container(options: &FragmentOptions) -> OutputNode {
    let mut container = results_container(options);
    if options.flags.contains("open") {
        container.set_option("folded");
    }
    container
}

/// *Compilation Command Line* example.
pub fn compile_summary(fragment: &SourceFragment, summary: &CompileSummary) -> OutputNode {
    let mut example = OutputNode::example("Compilation Command Line");
    example.append(OutputNode::literal(summary.display(), ROLE_COMPILE_COMMAND));

    if !summary.stdout.is_empty() {
        let mut results = compiled_results_container(&fragment.options);
        results.append(OutputNode::escaped_literal(
            encode_text(&summary.stdout),
            ROLE_CPP_RESULT,
        ));
        example.append(results);
    }
    example
}

/// *Execution Command Line* example for one argument set.
pub fn execution_result(fragment: &SourceFragment, run: &RunOutcome) -> OutputNode {
    let title = if run.args.is_empty() {
        "Execution Command Line".to_string()
    } else {
        format!("Execution Command Line with arguments `{}`", run.args)
    };
    let mut example = OutputNode::example(title);
    example.append(OutputNode::literal(&run.display, ROLE_EXECUTION_COMMAND));

    let mut results = compiled_results_container(&fragment.options);
    results.append(OutputNode::escaped_literal(
        encode_text(&run.stdout),
        ROLE_CPP_RESULT,
    ));
    if !run.stderr.is_empty() {
        results.append(OutputNode::escaped_literal(
            encode_text(&run.stderr),
            ROLE_CPP_ERROR,
        ));
    }
    example.append(results);
    example
}

/// Error example for a contained failure.
pub fn stage_failure(failure: &StageFailure) -> OutputNode {
    let mut text = failure.error.to_string();
    if let Some(stderr) = failure.error.stderr().filter(|s| !s.is_empty()) {
        text.push('\n');
        text.push_str(stderr);
    }
    let mut example = OutputNode::example(failure.stage.title());
    example.append(OutputNode::escaped_literal(encode_text(&text), ROLE_CPP_ERROR));
    example
}

/// Every node a compiled fragment contributes, in document order.
pub fn compiled_nodes(fragment: &SourceFragment, compiled: &CompiledFragment) -> Vec<OutputNode> {
    let mut nodes: Vec<OutputNode> = compiled
        .summary
        .iter()
        .map(|summary| compile_summary(fragment, summary))
        .collect();
    nodes.extend(compiled.runs.iter().map(|run| execution_result(fragment, run)));
    nodes.extend(compiled.failure.iter().map(stage_failure));
    nodes
}
