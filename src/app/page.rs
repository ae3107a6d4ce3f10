//! HTML for the webview backend.

use std::fmt::Write as _;

use crate::logsink::{LogRecord, Severity};

use super::AppContext;

const STYLE: &str = r#"
  body { margin: 0; background: #070a18; color: #c9d2ff; font-family: system-ui, sans-serif; }
  header { display: flex; gap: 24px; align-items: baseline; padding: 14px 20px; }
  header { background: #0e1226; border-bottom: 1px solid #2a2450; }
  header h1 { margin: 0; font-size: 22px; color: #f7931a; }
  main { display: grid; grid-template-columns: 260px 1fr; height: calc(100vh - 56px); }
  aside { padding: 16px 20px; border-right: 1px solid #2a2450; overflow: auto; }
  aside table { border-collapse: collapse; width: 100%; font-size: 13px; }
  aside td { padding: 3px 4px; border-bottom: 1px solid #12162a; }
  section { padding: 16px 20px; overflow: auto; }
  pre { margin: 0; font-size: 12px; line-height: 1.5; white-space: pre-wrap; }
  .warning { color: #ffc14d; } .error { color: #ff4d6d; } .debug { opacity: .6; }
"#;

pub(crate) fn loading() -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><style>{STYLE}</style></head>\
         <body><header><h1>Smore</h1><span>Loading&hellip;</span></header></body></html>"
    )
}

pub(crate) fn render(context: &AppContext, records: &[LogRecord]) -> String {
    let mut html = String::with_capacity(4096 + records.len() * 120);
    let _ = write!(
        html,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Smore</title>\
         <style>{STYLE}</style></head><body>\
         <header><h1>Smore</h1><span>Backend: {}</span><span>Worker threads: {}</span></header>\
         <main><aside><h3>Hardware</h3>",
        context.backend, context.worker_threads
    );

    if let Some(err) = &context.preload_error {
        let _ = write!(
            html,
            "<p class=\"warning\">Hardware acceleration unavailable: {}</p>",
            escape(err)
        );
    }
    match &context.hardware {
        Some(info) => {
            html.push_str("<table>");
            for (key, value) in info {
                let _ = write!(html, "<tr><td>{}</td><td>{}</td></tr>", escape(key), escape(value));
            }
            html.push_str("</table>");
        }
        None => html.push_str("<p>No hardware information.</p>"),
    }

    html.push_str("</aside><section><h3>Startup log</h3><pre>");
    for record in records {
        let class = match record.severity {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        let _ = writeln!(html, "<span class=\"{class}\">{}</span>", escape(&record.to_string()));
    }
    html.push_str("</pre></section></main></body></html>");
    html
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
