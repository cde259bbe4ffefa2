use flowboard_batch::{BatchReport, CommandStatus, Notice};
use flowboard_graph::{Board, LayerCycle, LayerForest};
use flowboard_search::{highlight, SearchResult};
use std::ops::Range;

const VALUE_PREVIEW_CHARS: usize = 80;

pub fn render_search_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results for \"{query}\"");
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {} (score: {:.3})\n",
            i + 1,
            result.kind.as_str(),
            mark(&result.name, &highlight(&result.name, query)),
            result.score
        ));
        if !result.layer_path.is_empty() {
            out.push_str(&format!("   Layer: {}\n", result.layer_path.join(" > ")));
        }
        if let Some(pin) = &result.pin_name {
            out.push_str(&format!("   Pin: {pin}\n"));
        }
        if let Some(value) = &result.matched_value {
            let preview = truncate_one_line(value, VALUE_PREVIEW_CHARS);
            out.push_str(&format!(
                "   Value: {}\n",
                mark(&preview, &highlight(&preview, query))
            ));
        }
        out.push_str(&format!("   Id: {}\n", result.id));
    }
    out.trim_end().to_string()
}

pub fn render_batch_report(report: &BatchReport, notices: &[Notice]) -> String {
    let mut out = format!(
        "Applied {}/{} commands ({} failed)\n",
        report.applied(),
        report.outcomes.len(),
        report.failed()
    );

    let mut outcomes: Vec<_> = report.outcomes.iter().collect();
    outcomes.sort_by_key(|outcome| outcome.index);
    for outcome in outcomes {
        match &outcome.status {
            CommandStatus::Applied => out.push_str(&format!(
                "  #{} {} ok{}\n",
                outcome.index,
                outcome.kind,
                outcome
                    .entity_id
                    .as_deref()
                    .map(|id| format!(" -> {id}"))
                    .unwrap_or_default()
            )),
            CommandStatus::Failed { reason } => out.push_str(&format!(
                "  #{} {} FAILED: {reason}\n",
                outcome.index, outcome.kind
            )),
        }
    }

    for created in &report.created {
        out.push_str(&format!(
            "  node {} <- {}\n",
            created.node_id,
            created.aliases.join(", ")
        ));
    }
    if !notices.is_empty() {
        out.push_str(&format!("{} notice(s) raised\n", notices.len()));
    }
    out.trim_end().to_string()
}

pub fn render_layers(board: &Board, forest: &LayerForest<'_>, cycles: &[LayerCycle]) -> String {
    if board.layers.is_empty() {
        return "No layers".to_string();
    }

    let mut ids: Vec<&str> = board.layers.keys().map(String::as_str).collect();
    ids.sort_unstable();

    let mut out = String::new();
    for id in ids {
        match forest.path(id) {
            Ok(path) => out.push_str(&format!("{id}: {}\n", path.join(" > "))),
            Err(err) => out.push_str(&format!("{id}: ! {err}\n")),
        }
    }
    for cycle in cycles {
        out.push_str(&format!("cycle: {}\n", cycle.layers.join(", ")));
    }
    out.trim_end().to_string()
}

/// Wrap matched spans in `[` `]`
fn mark(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 2);
    let mut cursor = 0;
    for span in spans {
        let (Some(before), Some(hit)) = (text.get(cursor..span.start), text.get(span.clone()))
        else {
            continue;
        };
        out.push_str(before);
        out.push('[');
        out.push_str(hit);
        out.push(']');
        cursor = span.end;
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max_chars).collect();
    out.push('…');
    out
}
