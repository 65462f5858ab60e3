//! CLI wizard — stdin/stdout REPL that drives an onboarding session.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::onboarding::{
    FieldKind, OnboardingManager, OnboardingSession, RegistryField, RegistryRecord, RoleRecord,
    ServiceRecord, SessionCommand, SignatureMode, SignaturePolicy, TemplateFormat, TemplateRecord,
};

pub const HELP: &str = "\
Commands:
  status                              show the current step and progress
  next | skip | back | launch         navigate
  set <key> <value>                   set a profile field
  service <name> <fee> [days]         add a service
  template <name> <pdf|docx|html>     add a document template
  signature <none|single|dual> [a,b]  set the signature policy
  role <name> <perm,perm>             add a role
  registry <name> <field:kind,...>    add a registry
  skip-to-dashboard                   mark onboarding done without finishing
  reset                               start over
  quit";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Status,
    Next,
    Skip,
    Back,
    Launch,
    Set { key: String, value: String },
    Service { name: String, fee: Decimal, days: u32 },
    Template { name: String, format: TemplateFormat },
    Signature { mode: SignatureMode, signatories: Vec<String> },
    Role { name: String, permissions: Vec<String> },
    Registry { name: String, fields: Vec<RegistryField> },
    SkipToDashboard,
    Reset,
    Help,
    Quit,
}

impl FromStr for CliCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| "Empty command".to_string())?;
        let args: Vec<&str> = parts.collect();

        let command = match (verb, args.as_slice()) {
            ("status", []) => Self::Status,
            ("next", []) => Self::Next,
            ("skip", []) => Self::Skip,
            ("back", []) => Self::Back,
            ("launch", []) => Self::Launch,
            ("skip-to-dashboard", []) => Self::SkipToDashboard,
            ("reset", []) => Self::Reset,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            ("set", [key, value @ ..]) if !value.is_empty() => Self::Set {
                key: key.to_string(),
                value: value.join(" "),
            },
            ("service", [name, fee, rest @ ..]) if rest.len() <= 1 => Self::Service {
                name: name.to_string(),
                fee: Decimal::from_str(fee).map_err(|e| format!("Invalid fee {fee:?}: {e}"))?,
                days: match rest.first() {
                    Some(d) => d.parse().map_err(|_| format!("Invalid day count {d:?}"))?,
                    None => 7,
                },
            },
            ("template", [name, format]) => Self::Template {
                name: name.to_string(),
                format: TemplateFormat::parse(format)
                    .ok_or_else(|| format!("Unknown template format {format:?}"))?,
            },
            ("signature", [mode, rest @ ..]) if rest.len() <= 1 => Self::Signature {
                mode: SignatureMode::parse(mode)
                    .ok_or_else(|| format!("Unknown signature mode {mode:?}"))?,
                signatories: rest.first().map(|s| split_list(s)).unwrap_or_default(),
            },
            ("role", [name, permissions]) => Self::Role {
                name: name.to_string(),
                permissions: split_list(permissions),
            },
            ("registry", [name, fields]) => Self::Registry {
                name: name.to_string(),
                fields: split_list(fields)
                    .iter()
                    .map(|f| parse_field(f))
                    .collect::<Result<_, _>>()?,
            },
            _ => return Err(format!("Unrecognized command: {line}")),
        };
        Ok(command)
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// `name:kind`, with a trailing `!` on the kind marking the field required.
fn parse_field(field: &str) -> Result<RegistryField, String> {
    let (name, kind) = field
        .split_once(':')
        .ok_or_else(|| format!("Field {field:?} must look like name:kind"))?;
    let (kind, required) = match kind.strip_suffix('!') {
        Some(k) => (k, true),
        None => (kind, false),
    };
    Ok(RegistryField {
        name: name.to_string(),
        kind: FieldKind::parse(kind).ok_or_else(|| format!("Unknown field kind {kind:?}"))?,
        required,
    })
}

/// Run one command against the manager and render the reply.
pub async fn execute(manager: &OnboardingManager, command: CliCommand) -> String {
    let session = manager.session().await;
    let is_help = matches!(command, CliCommand::Help);
    let result = match command {
        CliCommand::Status | CliCommand::Help | CliCommand::Quit => Ok(()),
        CliCommand::Next => manager.advance().await.map(drop),
        CliCommand::Skip => manager.skip().await.map(drop),
        CliCommand::Back => manager.back().await.map(drop),
        CliCommand::Launch => manager.launch().await.map(drop),
        CliCommand::SkipToDashboard => manager.skip_to_dashboard().await,
        CliCommand::Reset => {
            manager.reset().await;
            Ok(())
        }
        CliCommand::Set { key, value } => {
            let mut patch = Map::new();
            patch.insert(key, Value::String(value));
            manager
                .dispatch(SessionCommand::UpdateProfile { patch })
                .await;
            Ok(())
        }
        CliCommand::Signature { mode, signatories } => {
            let policy = SignaturePolicy {
                mode,
                signatories,
                require_seal: false,
            };
            manager
                .dispatch(SessionCommand::UpdateProfile {
                    patch: policy.to_profile_patch(),
                })
                .await;
            Ok(())
        }
        CliCommand::Service { name, fee, days } => {
            let services = appended(&session.services, ServiceRecord::new(name, fee, days));
            manager
                .dispatch(SessionCommand::ReplaceServices { services })
                .await;
            Ok(())
        }
        CliCommand::Template { name, format } => {
            let templates = appended(&session.templates, TemplateRecord::new(name, format));
            manager
                .dispatch(SessionCommand::ReplaceTemplates { templates })
                .await;
            Ok(())
        }
        CliCommand::Role { name, permissions } => {
            let roles = appended(&session.roles, RoleRecord::new(name, permissions));
            manager.dispatch(SessionCommand::ReplaceRoles { roles }).await;
            Ok(())
        }
        CliCommand::Registry { name, fields } => {
            let registries = appended(&session.registries, RegistryRecord::new(name, fields));
            manager
                .dispatch(SessionCommand::ReplaceRegistries { registries })
                .await;
            Ok(())
        }
    };

    match (result, is_help) {
        (Err(e), _) => format!("Error: {e}"),
        (Ok(()), true) => HELP.to_string(),
        (Ok(()), false) => render_status(manager).await,
    }
}

fn appended<T: Clone>(items: &[T], item: T) -> Vec<T> {
    let mut items = items.to_vec();
    items.push(item);
    items
}

async fn render_status(manager: &OnboardingManager) -> String {
    let status = manager.get_status().await;
    if status.onboarding_completed {
        return "Onboarding complete. Opening the institution dashboard.".to_string();
    }
    let session = manager.session().await;
    let mut lines = vec![format!(
        "Step {}/{}: {}  ({}% done)",
        status.current_step_index + 1,
        status.progress.total,
        session.current_step().title,
        status.progress.percent
    )];
    lines.extend(step_lines(&session));
    if !status.can_advance {
        lines.push("Next is disabled until this step's required fields are filled in.".into());
    }
    lines.join("\n")
}

fn step_lines(session: &OnboardingSession) -> Vec<String> {
    session
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let marker = if i == session.current_step_index() {
                ">"
            } else {
                " "
            };
            let check = if step.completed { "x" } else { " " };
            let optional = if step.required { "" } else { " (optional)" };
            format!("{marker} [{check}] {}{optional}", step.title)
        })
        .collect()
}

/// Read commands from stdin until `quit` or EOF.
pub async fn run(manager: &OnboardingManager) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render_status(manager).await);
    eprint!("> ");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        match line.parse::<CliCommand>() {
            Ok(CliCommand::Quit) => break,
            Ok(command) => {
                let reply = execute(manager, command).await;
                println!("\n{reply}\n");
                if manager.get_status().await.onboarding_completed {
                    break;
                }
            }
            Err(e) => println!("{e}\n{HELP}"),
        }
        eprint!("> ");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::onboarding::{InMemoryMarkerStore, StepId};

    fn manager() -> OnboardingManager {
        OnboardingManager::new(Arc::new(InMemoryMarkerStore::new()), Some("ins-1".into()))
    }

    #[test]
    fn parses_navigation_commands() {
        assert_eq!("next".parse::<CliCommand>().unwrap(), CliCommand::Next);
        assert_eq!("  skip ".parse::<CliCommand>().unwrap(), CliCommand::Skip);
        assert_eq!("exit".parse::<CliCommand>().unwrap(), CliCommand::Quit);
        assert!("next now".parse::<CliCommand>().is_err());
        assert!("".parse::<CliCommand>().is_err());
    }

    #[test]
    fn parses_data_commands() {
        assert_eq!(
            "set name University of Cape Coast".parse::<CliCommand>().unwrap(),
            CliCommand::Set {
                key: "name".into(),
                value: "University of Cape Coast".into()
            }
        );
        assert_eq!(
            "service transcript 120.50".parse::<CliCommand>().unwrap(),
            CliCommand::Service {
                name: "transcript".into(),
                fee: dec!(120.50),
                days: 7
            }
        );
        assert_eq!(
            "role registrar verify,issue".parse::<CliCommand>().unwrap(),
            CliCommand::Role {
                name: "registrar".into(),
                permissions: vec!["verify".into(), "issue".into()]
            }
        );
        assert_eq!(
            "registry graduates index:text!,year:number"
                .parse::<CliCommand>()
                .unwrap(),
            CliCommand::Registry {
                name: "graduates".into(),
                fields: vec![
                    RegistryField {
                        name: "index".into(),
                        kind: FieldKind::Text,
                        required: true
                    },
                    RegistryField {
                        name: "year".into(),
                        kind: FieldKind::Number,
                        required: false
                    },
                ]
            }
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!("service transcript abc".parse::<CliCommand>().is_err());
        assert!("template letter odt".parse::<CliCommand>().is_err());
        assert!("registry graduates index".parse::<CliCommand>().is_err());
        assert!("signature triple".parse::<CliCommand>().is_err());
    }

    #[tokio::test]
    async fn execute_reports_guard_errors() {
        let manager = manager();
        execute(&manager, CliCommand::Next).await;
        let reply = execute(&manager, CliCommand::Next).await;
        assert!(reply.starts_with("Error:"), "{reply}");
        assert_eq!(manager.current_step().await, StepId::Profile);
    }

    #[tokio::test]
    async fn execute_appends_records() {
        let manager = manager();
        for line in ["service transcript 100", "service certificate 50 3"] {
            execute(&manager, line.parse().unwrap()).await;
        }
        let session = manager.session().await;
        assert_eq!(session.services.len(), 2);
        assert_eq!(session.services[1].turnaround_days, 3);
        assert_ne!(session.services[0].id, session.services[1].id);
    }

    #[tokio::test]
    async fn execute_signature_updates_profile() {
        let manager = manager();
        execute(&manager, "signature dual Registrar,Dean".parse().unwrap()).await;
        let policy = manager.session().await.profile.signature_policy().unwrap();
        assert_eq!(policy.mode, SignatureMode::Dual);
        assert_eq!(policy.signatories, vec!["Registrar", "Dean"]);
    }

    #[tokio::test]
    async fn status_lists_steps() {
        let reply = execute(&manager(), CliCommand::Status).await;
        assert!(reply.starts_with("Step 1/8: Welcome"));
        assert!(reply.contains("> [ ] Welcome"));
        assert!(reply.contains("Document Templates (optional)"));
    }

    #[tokio::test]
    async fn skip_to_dashboard_reports_completion() {
        let reply = execute(&manager(), CliCommand::SkipToDashboard).await;
        assert!(reply.contains("Onboarding complete"));
    }
}
