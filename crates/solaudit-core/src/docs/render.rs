use crate::docs::model::{Documentation, EventDoc, FunctionDoc, ParamDoc, VariableDoc};

/// Download name of the Markdown export, e.g. `vault-documentation.md`.
pub fn export_file_name(docs: &Documentation) -> String {
    let slug: String = docs
        .name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!("{slug}-documentation.md")
}

fn function_block(f: &FunctionDoc) -> String {
    let mut lines = vec![
        format!("### {}", f.name),
        format!("* **Visibility:** {}", f.visibility),
        format!("* **Description:** {}", f.description),
    ];
    if !f.params.is_empty() {
        lines.push("* **Parameters:**".to_string());
        lines.extend(f.params.iter().map(|p| match &p.description {
            Some(d) => format!("  * `{}` ({}) - {d}", p.name, p.type_name),
            None => format!("  * `{}` ({})", p.name, p.type_name),
        }));
    }
    lines.join("\n")
}

fn event_param(p: &ParamDoc) -> String {
    let indexed = if p.indexed { " - indexed" } else { "" };
    format!("  * `{}` ({}){indexed}", p.name, p.type_name)
}

fn event_block(e: &EventDoc) -> String {
    let mut lines = vec![
        format!("### {}", e.name),
        format!("* **Description:** {}", e.description),
    ];
    if !e.params.is_empty() {
        lines.push("* **Parameters:**".to_string());
        lines.extend(e.params.iter().map(event_param));
    }
    lines.join("\n")
}

fn variable_block(v: &VariableDoc) -> String {
    format!(
        "### {}\n* **Type:** {}\n* **Visibility:** {}\n* **Description:** {}",
        v.name, v.type_name, v.visibility, v.description
    )
}

fn section<T>(title: &str, items: &[T], block: impl Fn(&T) -> String) -> String {
    let body: Vec<String> = items.iter().map(block).collect();
    format!("## {title}\n\n{}", body.join("\n\n"))
}

/// Render documentation as the Markdown export document.
pub fn render_markdown(docs: &Documentation) -> String {
    let mut out = format!(
        "# {}\n\n{}\n\n**Version:** {}\n**License:** {}\n\n",
        docs.name, docs.description, docs.version, docs.license
    );
    out.push_str(&section("Functions", &docs.functions, function_block));
    out.push_str("\n\n");
    out.push_str(&section("Events", &docs.events, event_block));
    out.push_str("\n\n");
    out.push_str(&section("State Variables", &docs.variables, variable_block));
    out.push('\n');
    out
}
