//! Terminal rendering of live events and final reports.

use tandem_protocols::event::StreamEvent;
use tandem_protocols::usage::UsageSnapshot;
use tandem_runtime::{RunOutcome, RunReport};

fn indent(depth: u32) -> String {
    "  ".repeat(depth as usize)
}

/// One line per event worth showing; `None` for internal bookkeeping.
pub(crate) fn format_event(event: &StreamEvent) -> Option<String> {
    let line = match event {
        StreamEvent::RunStarted { agent_id, .. } => format!("[{}] started", agent_id),
        StreamEvent::StateChanged { .. } => return None,
        StreamEvent::TextDelta { agent_id, content, .. } => {
            format!("[{}] {}", agent_id, content.trim())
        }
        StreamEvent::ToolCallStart {
            agent_id,
            tool_name,
            arguments,
            delegated,
            ..
        } => {
            let kind = if *delegated { "delegate" } else { "tool" };
            format!("[{}] -> {} {} {}", agent_id, kind, tool_name, arguments)
        }
        StreamEvent::ToolCallComplete { agent_id, record, .. } => {
            let status = if record.succeeded() { "ok" } else { "failed" };
            format!(
                "[{}] <- {} {} ({} ms): {}",
                agent_id, record.tool_name, status, record.duration_ms, record.result_summary
            )
        }
        StreamEvent::Degraded {
            agent_id,
            degradation,
            ..
        } => format!(
            "[{}] continuing without {}: {}",
            agent_id, degradation.tool_name, degradation.reason
        ),
        StreamEvent::RunFinished { agent_id, usage, .. } => {
            format!("[{}] finished ({})", agent_id, format_usage(usage))
        }
        StreamEvent::RunFailed { agent_id, error, .. } => format!("[{}] failed: {}", agent_id, error),
    };
    Some(format!("{}{}", indent(event.depth()), line))
}

pub(crate) fn format_usage(usage: &UsageSnapshot) -> String {
    format!(
        "{} requests, {} units",
        usage.requests_issued, usage.units_consumed
    )
}

/// Human-readable summary of a finished run.
pub(crate) fn format_report(report: &RunReport<String>) -> String {
    let mut out = String::new();
    match (&report.outcome, report.kind()) {
        (Ok(result), RunOutcome::Degraded) => {
            out.push_str("Answer (incomplete, some delegated work failed):\n");
            out.push_str(&result.data);
            for degradation in &result.degradations {
                out.push_str(&format!(
                    "\n  - {} failed: {}",
                    degradation.tool_name, degradation.reason
                ));
            }
        }
        (Ok(result), _) => {
            out.push_str("Answer:\n");
            out.push_str(&result.data);
        }
        (Err(e), _) => {
            out.push_str(&format!("Run failed: {}", e));
        }
    }
    out.push_str(&format!(
        "\n\n{} tool call(s); usage: {}",
        report.tool_calls.len(),
        format_usage(&report.usage)
    ));
    if let Some(overflow) = report.overflow() {
        out.push_str(&format!("\nwarning: {}", overflow));
    }
    out
}

/// JSON form of a finished run.
pub(crate) fn report_json(report: &RunReport<String>) -> serde_json::Value {
    let (answer, error, degradations) = match &report.outcome {
        Ok(result) => (Some(result.data.clone()), None, result.degradations.clone()),
        Err(e) => (None, Some(e.to_string()), Vec::new()),
    };
    serde_json::json!({
        "outcome": report.kind(),
        "answer": answer,
        "error": error,
        "degradations": degradations,
        "tool_calls": report.tool_calls,
        "usage": report.usage,
    })
}
