//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;

use crate::application::services::deploy::DeployOutcome;
use crate::domain::bundle::Bundle;
use crate::domain::plan::{ProvisionStep, StepPolicy};
use crate::domain::remote_state::RemoteState;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("convoy {version}");
    }

    /// Render the summary printed after a successful deploy.
    pub fn render_deploy(&self, outcome: &DeployOutcome) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx
            .header(&format!("Deployed {} to {}", outcome.unit, outcome.host));
        self.ctx.kv("Bundle:", &short_digest(&outcome.bundle_sha256));
        self.ctx.kv("Executed:", &step_list(&outcome.provision.executed));
        self.ctx.kv("Skipped:", &step_list(&outcome.provision.skipped));
        println!();
        self.render_service_status(&outcome.lifecycle.status, outcome.lifecycle.active);
    }

    /// Render the probed host state and, when available, the service status.
    pub fn render_status(&self, host: &str, state: &RemoteState, service: Option<(&str, bool)>) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(&format!("Host {host}"));
        for (label, present) in state.rows() {
            self.print_check(present, label);
        }
        if let Some((text, active)) = service {
            println!();
            self.render_service_status(text, active);
        }
    }

    /// Render the ordered action list for a dry run.
    pub fn render_plan(&self, host: &str, planned: &[ProvisionStep], skipped: &[ProvisionStep]) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.header(&format!("Plan for {host}"));
        for step in ProvisionStep::ALL {
            let policy = match step.policy() {
                StepPolicy::Always => "always",
                StepPolicy::CreateIfAbsent => "if absent",
            };
            if planned.contains(&step) {
                println!(
                    "  {} {}. {:<22} {}",
                    "→".style(self.ctx.styles.step),
                    step.number(),
                    step.name(),
                    policy.style(self.ctx.styles.dim)
                );
            } else if skipped.contains(&step) {
                println!(
                    "  {} {}. {:<22} {}",
                    "·".style(self.ctx.styles.dim),
                    step.number(),
                    step.name().style(self.ctx.styles.dim),
                    "already present".style(self.ctx.styles.dim)
                );
            }
        }
        println!(
            "  {} restart service",
            "→".style(self.ctx.styles.step)
        );
    }

    /// Render a locally built bundle.
    pub fn render_bundle(&self, bundle: &Bundle) {
        if self.ctx.quiet {
            return;
        }
        self.ctx.kv("Archive:", &bundle.archive.display().to_string());
        self.ctx.kv("Files:", &bundle.files.len().to_string());
        self.ctx.kv("Size:", &format!("{} bytes", bundle.size));
        self.ctx.kv("SHA-256:", &bundle.sha256);
    }

    fn render_service_status(&self, text: &str, active: bool) {
        if active {
            self.ctx.success("service active");
        } else {
            self.ctx.warn("service not active");
        }
        for line in text.lines() {
            println!("    {}", line.style(self.ctx.styles.dim));
        }
    }

    fn print_check(&self, ok: bool, label: &str) {
        if ok {
            println!("  {} {label}", "✓".style(self.ctx.styles.success));
        } else {
            println!("  {} {label}", "✗".style(self.ctx.styles.dim));
        }
    }
}

fn step_list(steps: &[ProvisionStep]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(|s| s.number().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn short_digest(sha256: &str) -> String {
    format!("sha256:{}", sha256.get(..12).unwrap_or(sha256))
}
