//! Integration tests for the interpreter-session strategy.
//!
//! The interpreter is faked with a scripted runner that reads cell ids and
//! code back out of the synthesized script, so these tests need no Python.

use std::fs;

use dynblocks_core::document::html;
use dynblocks_core::options::{CACHE_ATTRIBUTE, DOCUMENT_MARKER};
use dynblocks_core::{
    Block, CellResult, Document, Engine, EngineConfig, Error, ListingBlock, MockRunner,
    ProcessOutput, SystemRunner,
};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A runner that answers like IPython would, evaluating each cell with `eval`.
fn fake_ipython<F>(eval: F) -> MockRunner
where
    F: Fn(&str) -> (bool, String) + Send + Sync + 'static,
{
    MockRunner::with_handler(move |req| {
        let script = req.stdin.as_deref().unwrap_or_default();
        let mut ids = Vec::new();
        let mut codes = Vec::new();
        for line in script.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("'id': ") {
                ids.push(serde_json::from_str::<String>(rest.trim_end_matches(','))?);
            }
            if let Some(rest) = line.strip_prefix("'code': ") {
                codes.push(serde_json::from_str::<String>(rest.trim_end_matches(','))?);
            }
        }

        let results: Vec<CellResult> = ids
            .into_iter()
            .zip(codes)
            .map(|(id, code)| {
                let (success, stdout) = eval(&code);
                CellResult {
                    success,
                    stderr: String::new(),
                    stdout,
                    id,
                    code,
                }
            })
            .collect();

        Ok(ProcessOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: format!("\n{}\n", serde_json::to_string(&results)?),
        })
    })
}

/// Echo runner: every cell prints its own code.
fn echo_ipython() -> MockRunner {
    fake_ipython(|code| (true, format!("{}\n", code)))
}

fn python(code: &str) -> ListingBlock {
    ListingBlock::new("python", code).with_option("dynamic")
}

fn enabled_doc() -> Document {
    let mut doc = Document::new("guide.adoc");
    doc.set_attribute(DOCUMENT_MARKER, "");
    doc
}

fn literal_text(block: &Block) -> Option<&str> {
    match block {
        Block::Example { blocks, .. } => match blocks.first()? {
            Block::Literal { text, .. } => Some(text),
            _ => None,
        },
        _ => None,
    }
}

fn describe(block: &Block) -> String {
    match block {
        Block::Listing(listing) => format!("listing:{}", listing.source),
        Block::Example { .. } => format!("result:{}", literal_text(block).unwrap_or("").trim()),
        Block::Section { title, .. } => format!("section:{}", title),
        Block::Paragraph { text } => format!("paragraph:{}", text),
        other => format!("{:?}", other),
    }
}

// =============================================================================
// Ordering and splicing
// =============================================================================

#[test]
fn test_results_follow_their_fragments_in_order() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Paragraph { text: "intro".into() });
    doc.push(root, Block::Listing(python("a")));
    doc.push(root, Block::Listing(ListingBlock::new("python", "static")));
    let section = doc.push(
        root,
        Block::Section {
            title: "More".into(),
            blocks: Vec::new(),
        },
    );
    doc.push(section, Block::Listing(python("b")));
    doc.push(section, Block::Listing(python("c")));
    doc.push(root, Block::Listing(python("d")));

    let config = EngineConfig::default();
    let runner = echo_ipython();
    let report = Engine::new(&config, &runner).process(&mut doc).unwrap();

    assert_eq!(report.session_cells, 4);
    assert_eq!(report.inserted, 4);
    assert!(report.is_clean());

    let top: Vec<String> = doc.blocks().iter().map(describe).collect();
    assert_eq!(
        top,
        vec![
            "paragraph:intro",
            "listing:a",
            "result:a",
            "listing:static",
            "section:More",
            "listing:d",
            "result:d",
        ]
    );
    match &doc.blocks()[4] {
        Block::Section { blocks, .. } => {
            let nested: Vec<String> = blocks.iter().map(describe).collect();
            assert_eq!(nested, vec!["listing:b", "result:b", "listing:c", "result:c"]);
        }
        other => panic!("Expected section, got {:?}", other),
    }

    // One interpreter process for the whole document.
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn test_hello_world_is_open_literal() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("print('hello')").with_option("open")));

    let config = EngineConfig::default();
    let runner = fake_ipython(|_| (true, "hello\n".to_string()));
    Engine::new(&config, &runner).process(&mut doc).unwrap();

    let rendered = html::render(&doc);
    assert!(rendered.contains(
        "<details open>\n<summary class=\"title\">Results</summary>\n<div class=\"content\">\n<div class=\"literalblock dynamic-py-result\">\n<div class=\"content\">\n<pre>hello\n</pre>"
    ));
}

// =============================================================================
// Failure policy
// =============================================================================

const TRACEBACK: &str = "---------------------------------------------------------------------------\nNameError                                 Traceback (most recent call last)\nCell In[1], line 1\n----> 1 invalid_name\n\nNameError: name 'invalid_name' is not defined\n";

fn failing_ipython() -> MockRunner {
    fake_ipython(|code| {
        if code == "invalid_name" {
            (false, TRACEBACK.to_string())
        } else {
            (true, String::new())
        }
    })
}

#[test]
fn test_failed_cell_embeds_traceback_and_continues() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("invalid_name")));
    doc.push(root, Block::Listing(python("x = 1")));

    let config = EngineConfig::default();
    let runner = failing_ipython();
    let report = Engine::new(&config, &runner).process(&mut doc).unwrap();

    assert_eq!(report.session_cells, 2);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("NameError"));
    assert_eq!(literal_text(&doc.blocks()[1]), Some(TRACEBACK));
}

#[test]
fn test_fail_on_error_aborts_pass() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(
        root,
        Block::Listing(python("invalid_name").with_attribute("fail-on-error", "")),
    );

    let config = EngineConfig::default();
    let runner = failing_ipython();
    let err = Engine::new(&config, &runner).process(&mut doc).unwrap_err();

    match err {
        Error::CellFailed { output, .. } => {
            assert!(output.contains("NameError: name 'invalid_name' is not defined"));
        }
        other => panic!("Expected CellFailed, got {:?}", other),
    }
}

#[test]
fn test_interpreter_failure_is_fatal() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("a = 1")));

    let config = EngineConfig::default();
    let runner = MockRunner::new();
    runner.push_failure(1, "", "/usr/bin/python3: No module named IPython");
    let err = Engine::new(&config, &runner).process(&mut doc).unwrap_err();

    assert!(matches!(err, Error::Execution { .. }));
    assert_eq!(doc.blocks().len(), 1);
}

#[test]
fn test_garbled_side_channel_is_fatal() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("a = 1")));

    let config = EngineConfig::default();
    let runner = MockRunner::new();
    runner.push_success("", "Segmentation fault");
    let err = Engine::new(&config, &runner).process(&mut doc).unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}

// =============================================================================
// Raw output
// =============================================================================

fn chart(id: &str) -> String {
    format!(
        r#"<div id="{id}" class="plotly-graph-div" style="height:525px; width:100%;"></div>            <script type="text/javascript">window.PLOTLYENV=window.PLOTLYENV || {{}};Plotly.newPlot("{id}", [], {{}})</script>"#
    )
}

#[test]
fn test_plotly_grid_holds_every_chart() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(
        root,
        Block::Listing(
            python("for fig in figs:\n    fig.show()")
                .with_option("raw")
                .with_attribute("output", "plotly"),
        ),
    );

    let config = EngineConfig::default();
    let runner = fake_ipython(|code| {
        assert!(code.contains("fig.write_html(file=sys.stdout, include_plotlyjs=False)"));
        let charts: Vec<String> = ["c1", "c2", "c3"].iter().map(|id| chart(id)).collect();
        (true, format!("<div>\n{}\n</div>\n", charts.join("\n")))
    });
    Engine::new(&config, &runner).process(&mut doc).unwrap();

    match &doc.blocks()[1] {
        Block::Example { roles, blocks, .. } => {
            assert_eq!(
                roles,
                &vec![
                    "dynamic-py-result".to_string(),
                    "dynamic-py-result-plotly".to_string(),
                    "dynamic-py-result-plotly-grid".to_string(),
                ]
            );
            match &blocks[0] {
                Block::Pass { content, .. } => {
                    assert_eq!(content.matches("class=\"plotly-graph-div\"").count(), 3);
                    assert!(!content.contains("<div>\n"));
                }
                other => panic!("Expected pass, got {:?}", other),
            }
        }
        other => panic!("Expected example, got {:?}", other),
    }
}

// =============================================================================
// Code handling
// =============================================================================

#[test]
fn test_angle_brackets_escaped_only_in_rendering() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("print(1 < 2 > 0)")));

    let config = EngineConfig::default();
    let runner = echo_ipython();
    Engine::new(&config, &runner).process(&mut doc).unwrap();

    let script = runner.calls()[0].stdin.clone().unwrap();
    assert!(script.contains("shell.run_cell(\"print(1 < 2 > 0)\")"));

    let rendered = html::render(&doc);
    assert!(rendered.contains("<code class=\"language-python\" data-lang=\"python\">print(1 &lt; 2 &gt; 0)</code>"));
}

#[test]
fn test_callouts_are_not_executed() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("x = 1 # <1>\nprint(x)")));

    let config = EngineConfig::default();
    let runner = echo_ipython();
    Engine::new(&config, &runner).process(&mut doc).unwrap();

    assert_eq!(literal_text(&doc.blocks()[1]), Some("x = 1\nprint(x)\n"));
    // The listing itself keeps its callout.
    match &doc.blocks()[0] {
        Block::Listing(listing) => assert_eq!(listing.source, "x = 1 # <1>\nprint(x)"),
        other => panic!("Expected listing, got {:?}", other),
    }
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_cache_files_are_byte_identical_across_runs() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let cache_dir = temp.path().join("results");

    let build = || {
        let mut doc = enabled_doc();
        doc.set_attribute(CACHE_ATTRIBUTE, cache_dir.to_string_lossy());
        let root = doc.root();
        doc.push(root, Block::Listing(python("a = 1")));
        doc.push(root, Block::Listing(python("print(a)")));
        doc
    };
    let config = EngineConfig::default();

    let mut first = build();
    Engine::new(&config, &echo_ipython()).process(&mut first).unwrap();
    let mut names: Vec<_> = fs::read_dir(&cache_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    let before: Vec<Vec<u8>> = names.iter().map(|n| fs::read(cache_dir.join(n)).unwrap()).collect();

    let mut second = build();
    Engine::new(&config, &echo_ipython()).process(&mut second).unwrap();
    let after: Vec<Vec<u8>> = names.iter().map(|n| fs::read(cache_dir.join(n)).unwrap()).collect();

    assert_eq!(before, after);
    assert!(names[0].to_string_lossy().ends_with(".json"));
}

#[test]
fn test_empty_cache_attribute_uses_default_dir() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut doc = enabled_doc();
    doc.set_attribute(CACHE_ATTRIBUTE, "");
    let root = doc.root();
    doc.push(root, Block::Listing(python("a = 1")));

    let config = EngineConfig::for_document_root(temp.path());
    Engine::new(&config, &echo_ipython()).process(&mut doc).unwrap();

    let entries = fs::read_dir(temp.path().join(".cache")).unwrap().count();
    assert_eq!(entries, 1);
}

// =============================================================================
// Real interpreter
// =============================================================================

#[test]
#[ignore = "Requires python3 with IPython"]
fn test_real_ipython_shares_namespace() {
    let mut doc = enabled_doc();
    let root = doc.root();
    doc.push(root, Block::Listing(python("greeting = 'hello'")));
    doc.push(root, Block::Listing(python("print(greeting)")));
    doc.push(root, Block::Listing(python("invalid_name")));

    let config = EngineConfig::default();
    let runner = SystemRunner::new();
    let report = Engine::new(&config, &runner).process(&mut doc).unwrap();

    assert_eq!(report.session_cells, 3);
    assert_eq!(literal_text(&doc.blocks()[3]), Some("hello\n"));
    assert!(literal_text(&doc.blocks()[5]).unwrap().contains("NameError"));
}
