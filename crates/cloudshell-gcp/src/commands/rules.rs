//! Rule listing and the table rows shared by the rule-producing commands.

use tabled::Tabled;

use cloudshell_gcp_core::{EnsuredRule, FirewallRule, SandboxDriver};

use crate::cli::{GlobalOpts, RulesArgs};
use crate::error::CliError;
use crate::output;

// ── Rule table rows ─────────────────────────────────────────────────

#[derive(Tabled)]
pub struct RuleRow {
    #[tabled(rename = "Priority")]
    priority: u16,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
}

impl From<&FirewallRule> for RuleRow {
    fn from(r: &FirewallRule) -> Self {
        let protocol = if r.ports.is_empty() {
            r.protocol.to_string()
        } else {
            format!("{}:{}", r.protocol, r.ports.join(","))
        };
        Self {
            priority: r.priority,
            name: r.name.clone(),
            action: r.action.to_string(),
            protocol,
            source: or_dash(&r.source_ranges),
            destination: if r.target_tags.is_empty() {
                or_dash(&r.destination_ranges)
            } else {
                format!("tag:{}", r.target_tags.join(","))
            },
        }
    }
}

#[derive(Tabled)]
pub struct EnsuredRow {
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(inline)]
    rule: RuleRow,
}

impl From<&EnsuredRule> for EnsuredRow {
    fn from(e: &EnsuredRule) -> Self {
        Self {
            outcome: e.outcome.to_string(),
            rule: RuleRow::from(&e.rule),
        }
    }
}

fn or_dash(values: &[String]) -> String {
    if values.is_empty() {
        "-".into()
    } else {
        values.join(",")
    }
}

/// Render rules returned by `prepare`/`inbound`.
pub fn print_ensured(rules: &[EnsuredRule], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output_format(),
        rules,
        |e| EnsuredRow::from(e),
        |e| e.rule.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: &cloudshell_gcp_core::DriverConfig,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let driver = SandboxDriver::new(config)?;
    let rules = driver.list_rules(&args.network).await?;
    let out = output::render_list(
        &global.output_format(),
        &rules,
        |r| RuleRow::from(r),
        |r| r.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
