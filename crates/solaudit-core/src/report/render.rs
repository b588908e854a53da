use crate::report::model::{AuditReport, AuditResult, MAX_STARS};
use crate::rules::eval::PolicyOutcome;
use crate::TOOL_NAME;

/// Star bar such as `★★☆☆☆`.
pub fn star_bar(stars: u8) -> String {
    let filled = stars.min(MAX_STARS) as usize;
    let empty = MAX_STARS as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("{title}:\n"));
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
}

/// Human-readable rendering of a sanitized audit.
pub fn render_result(result: &AuditResult, policy: &PolicyOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Rating: {} ({}/{})\n",
        star_bar(result.stars),
        result.stars,
        MAX_STARS
    ));
    out.push_str(&format!("Summary: {}\n", result.summary));

    if result.vulnerabilities.total() == 0 {
        out.push_str("Vulnerabilities: none reported\n");
    } else {
        for (severity, issues) in result.vulnerabilities.non_empty() {
            push_list(&mut out, severity.label(), issues);
        }
    }
    push_list(&mut out, "Recommendations", &result.recommendations);
    push_list(&mut out, "Gas optimizations", &result.gas_optimizations);

    if policy.was_lowered() {
        out.push_str(&format!(
            "Rating lowered from {} to {} by policy '{}':\n",
            policy.model_stars, policy.final_stars, policy.policy
        ));
    }
    for rule in &policy.applied {
        out.push_str(&format!(
            "  - {} {} ({} -> {})\n",
            rule.rule_id, rule.title, rule.stars_before, rule.stars_after
        ));
    }
    out
}

pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    if let Some(path) = &report.source.path {
        out.push_str(&format!("Source: {path}\n"));
    }
    out.push_str(&format!(
        "Contract hash ({}): {}\n",
        report.source.hash_algorithm, report.source.contract_hash
    ));
    out.push_str(&render_result(&report.result, &report.policy));
    if let Some(reg) = &report.registration {
        out.push_str(&format!(
            "Registered on {} ({}): {}\n",
            reg.chain, reg.chain_id, reg.explorer_url
        ));
    }
    out
}
