//! Collection-tool selection.
//!
//! Each input kind maps to exactly one tool. What varies is whether
//! enrichment is chained after it, which depends on the configured
//! credentials, the operator's priority, and the budget.

use crate::{OutreachError, Result};
use outreach_types::{
    AvailableCredentials, CollectionTool, Constraints, CostLevel, InputDescriptor, InputKind,
    Priority, Rationale, Selection, ToolOption,
};

/// Confidence added by chaining enrichment after a tool.
const ENRICHMENT_BOOST: f64 = 0.05;

/// Pick a collection tool for `input`.
///
/// Fails only when the tool the input needs is not configured. Budget and
/// priority never reject a request; an unmet constraint is recorded in the
/// rationale instead.
pub fn select_tool(
    input: &InputDescriptor,
    constraints: Constraints,
    credentials: AvailableCredentials,
) -> Result<Selection> {
    let kind = input.kind();
    let tool = tool_for(kind);

    let missing = credentials.missing_for(tool);
    if !missing.is_empty() {
        tracing::debug!(
            target: "outreach::selector",
            input = %kind,
            tool = %tool,
            missing = ?missing,
            "No tool available"
        );
        return Err(OutreachError::NoToolAvailable(format!(
            "{} input needs {}, which requires {}",
            kind,
            tool,
            missing.join(", ")
        )));
    }

    let mut notes = Vec::new();
    let mut options = vec![plain_option(tool)];
    if credentials.enrichment_api {
        options.push(enriched_option(tool));
    } else if constraints.priority == Priority::Accuracy {
        notes.push("accuracy requested but no enrichment credential is configured".to_string());
    }

    match constraints.priority {
        Priority::Speed => options.sort_by_key(|o| o.round_trips),
        Priority::Accuracy => options.sort_by(|a, b| b.confidence.total_cmp(&a.confidence)),
        // Enriched first for the offline processor, plain first for network tools
        Priority::Balanced => {
            let enrich_first = tool == CollectionTool::SalesNavProcessor;
            options.sort_by_key(|o| o.enrich != enrich_first);
        }
    }

    // Options within budget come first; the sort is stable so priority
    // order holds inside each group.
    let preferred_enriched = options[0].enrich;
    options.sort_by_key(|o| o.cost > constraints.budget);
    if preferred_enriched && !options[0].enrich {
        notes.push(format!(
            "enrichment skipped: over the {} budget",
            constraints.budget
        ));
    }

    let chosen = options.remove(0);
    let over_budget = chosen.cost > constraints.budget;
    if over_budget {
        notes.push(format!(
            "{} costs {}, above the {} budget",
            chosen.tool, chosen.cost, constraints.budget
        ));
    }

    let summary = format!(
        "{}{} for {} {} target(s), {} priority",
        chosen.tool,
        if chosen.enrich { " with enrichment" } else { "" },
        input.target_count(),
        kind,
        constraints.priority
    );

    tracing::debug!(
        target: "outreach::selector",
        tool = %chosen.tool,
        enrich = chosen.enrich,
        over_budget,
        fallbacks = options.len(),
        "Selected collection tool"
    );

    Ok(Selection {
        confidence: chosen.confidence,
        chosen,
        fallbacks: options,
        rationale: Rationale {
            summary,
            over_budget,
            notes,
        },
    })
}

fn tool_for(kind: InputKind) -> CollectionTool {
    match kind {
        InputKind::LinkedInUrl | InputKind::CompanyUrl => CollectionTool::BrowserScraper,
        InputKind::SearchQuery => CollectionTool::SearchApi,
        InputKind::SalesNavCsv => CollectionTool::SalesNavProcessor,
    }
}

fn base_confidence(tool: CollectionTool) -> f64 {
    match tool {
        CollectionTool::BrowserScraper => 0.9,
        CollectionTool::SearchApi => 0.7,
        CollectionTool::SalesNavProcessor => 0.95,
    }
}

fn plain_option(tool: CollectionTool) -> ToolOption {
    let capability = tool.capability();
    ToolOption {
        tool,
        enrich: false,
        confidence: base_confidence(tool),
        cost: capability.cost,
        round_trips: capability.round_trips,
    }
}

fn enriched_option(tool: CollectionTool) -> ToolOption {
    let plain = plain_option(tool);
    ToolOption {
        enrich: true,
        confidence: (plain.confidence + ENRICHMENT_BOOST).min(1.0),
        cost: plain.cost.max(CostLevel::Low),
        round_trips: plain.round_trips + 1,
        ..plain
    }
}
