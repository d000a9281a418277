//! Command and event surface.
//!
//! Hosts drive the engine with two closed variant types: [`Event`]s coming
//! from the tab directory and page-content collaborators, and [`Command`]s
//! issued by the user interface. Each is dispatched with an exhaustive match.
//! Commands always produce a [`CommandResponse`]; failures are reported in
//! it, never raised.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::types::{BulkOutcome, Category, TabId, TabStatus, WorkspaceId};

/// Something that happened in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    TabUpdated {
        tab_id: TabId,
        status: TabStatus,
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    TabActivated { tab_id: TabId },
    #[serde(rename_all = "camelCase")]
    TabRemoved { tab_id: TabId },
    #[serde(rename_all = "camelCase")]
    ContentExtracted {
        tab_id: TabId,
        url: String,
        title: String,
        #[serde(default)]
        text: String,
    },
    /// Continue to a blocked page from the interstitial
    #[serde(rename_all = "camelCase")]
    OverrideBlock { tab_id: TabId, url: String },
}

/// A user request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    ToggleFocusMode,
    SetGoal {
        goal: String,
    },
    CreateWorkspace {
        name: String,
    },
    CleanupDistractions,
    #[serde(rename_all = "camelCase")]
    SetTabCategory {
        tab_id: TabId,
        category: Category,
    },
    #[serde(rename_all = "camelCase")]
    AssignTabToWorkspace {
        tab_id: TabId,
        #[serde(default)]
        workspace_id: Option<WorkspaceId>,
    },
    ResolveReview {
        url: String,
        category: Category,
    },
    AddCustomCategory {
        name: String,
    },
    AddRule {
        pattern: String,
        category: Category,
    },
    #[serde(rename_all = "camelCase")]
    LoadWorkspace { workspace_id: WorkspaceId },
    #[serde(rename_all = "camelCase")]
    FocusOnWorkspace { workspace_id: WorkspaceId },
    #[serde(rename_all = "camelCase")]
    SuspendWorkspace { workspace_id: WorkspaceId },
    #[serde(rename_all = "camelCase")]
    RenameWorkspace {
        workspace_id: WorkspaceId,
        new_name: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteWorkspace { workspace_id: WorkspaceId },
    AnalyzeSession,
}

/// Result of a command, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    /// Error kind tag when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data,
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            error: Some(error.kind().to_string()),
            data: Value::Null,
        }
    }

    /// Bulk results succeed only when every item did.
    fn bulk<T: Serialize>(message: String, outcome: &BulkOutcome<T>) -> Self {
        let data = to_data(outcome);
        match outcome.failure() {
            None => Self::ok(message, data),
            Some(error) => Self {
                data,
                ..Self::failed(&error)
            },
        }
    }
}

fn to_data<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Engine {
    /// Apply a browser event.
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        match event {
            Event::TabUpdated {
                tab_id,
                status,
                url,
            } => self.on_tab_updated(tab_id, status, &url).await,
            Event::TabActivated { tab_id } => self.on_tab_activated(tab_id).await,
            Event::TabRemoved { tab_id } => self.on_tab_removed(tab_id).await,
            Event::ContentExtracted {
                tab_id,
                url,
                title,
                text,
            } => self
                .on_content_extracted(tab_id, &url, &title, &text)
                .await
                .map(|_| ()),
            Event::OverrideBlock { tab_id, url } => self.override_block(tab_id, &url).await,
        }
    }

    /// Run a user command.
    pub async fn execute(&self, command: Command) -> CommandResponse {
        match self.run(command).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Command failed");
                CommandResponse::failed(&e)
            }
        }
    }

    async fn run(&self, command: Command) -> Result<CommandResponse> {
        let response = match command {
            Command::ToggleFocusMode => {
                let active = self.toggle_focus_mode().await?;
                let state = if active { "on" } else { "off" };
                CommandResponse::ok(
                    format!("Focus mode is now {state}"),
                    json!({ "focusModeActive": active }),
                )
            }
            Command::SetGoal { goal } => {
                let goal = self.set_goal(&goal).await?;
                let message = match &goal {
                    Some(goal) => format!("Goal set: {goal}"),
                    None => "Goal cleared".to_string(),
                };
                CommandResponse::ok(message, json!({ "goal": goal }))
            }
            Command::CreateWorkspace { name } => {
                let created = self.create_workspace(&name).await?;
                CommandResponse::ok(
                    format!("Workspace '{}' created", created.name),
                    json!({ "id": created.id }),
                )
            }
            Command::CleanupDistractions => {
                let outcome = self.cleanup_distractions().await?;
                CommandResponse::bulk(
                    format!("Closed {} distracting tabs", outcome.succeeded.len()),
                    &outcome,
                )
            }
            Command::SetTabCategory { tab_id, category } => {
                self.set_tab_category(tab_id, category.clone()).await?;
                CommandResponse::ok(
                    format!("Tab {tab_id} set to {category}"),
                    Value::Null,
                )
            }
            Command::AssignTabToWorkspace {
                tab_id,
                workspace_id,
            } => {
                self.assign_tab(tab_id, workspace_id.as_deref()).await?;
                let message = match &workspace_id {
                    Some(ws_id) => format!("Tab {tab_id} assigned to {ws_id}"),
                    None => format!("Tab {tab_id} unassigned"),
                };
                CommandResponse::ok(message, Value::Null)
            }
            Command::ResolveReview { url, category } => {
                let resolution = self.resolve_review(&url, category.clone()).await?;
                CommandResponse::ok(
                    format!("{url} categorized as {category}"),
                    json!({
                        "ruleDomain": resolution.rule_domain,
                        "tabsUpdated": resolution.tabs_updated,
                    }),
                )
            }
            Command::AddCustomCategory { name } => {
                let category = self.add_custom_category(&name).await?;
                CommandResponse::ok(
                    format!("Category '{category}' added"),
                    json!({ "category": category }),
                )
            }
            Command::AddRule { pattern, category } => {
                let updated = self.add_rule(&pattern, category.clone()).await?;
                CommandResponse::ok(
                    format!("Rule {pattern} -> {category} saved"),
                    json!({ "tabsUpdated": updated }),
                )
            }
            Command::LoadWorkspace { workspace_id } => {
                let outcome = self.load_workspace(&workspace_id).await?;
                CommandResponse::bulk(
                    format!("Opened {} tabs", outcome.succeeded.len()),
                    &outcome,
                )
            }
            Command::FocusOnWorkspace { workspace_id } => {
                let outcome = self.focus_on_workspace(&workspace_id).await?;
                CommandResponse::bulk(
                    format!("Closed {} tabs outside the workspace", outcome.succeeded.len()),
                    &outcome,
                )
            }
            Command::SuspendWorkspace { workspace_id } => {
                let outcome = self.suspend_workspace(&workspace_id).await?;
                CommandResponse::bulk(
                    format!("Suspended {} tabs", outcome.succeeded.len()),
                    &outcome,
                )
            }
            Command::RenameWorkspace {
                workspace_id,
                new_name,
            } => {
                let name = self.rename_workspace(&workspace_id, &new_name).await?;
                CommandResponse::ok(
                    format!("Workspace renamed to '{name}'"),
                    json!({ "newName": name }),
                )
            }
            Command::DeleteWorkspace { workspace_id } => {
                self.delete_workspace(&workspace_id).await?;
                CommandResponse::ok("Workspace deleted", Value::Null)
            }
            Command::AnalyzeSession => {
                let report = self.analyze_session().await?;
                CommandResponse::ok(
                    format!("Productivity score: {}", report.score),
                    to_data(&report),
                )
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_wire_format() {
        let event: Event = serde_json::from_str(
            r#"{"type":"tabUpdated","tabId":3,"status":"complete","url":"https://a.com"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::TabUpdated {
                tab_id: 3,
                status: TabStatus::Complete,
                url: "https://a.com".to_string(),
            }
        );

        let event: Event = serde_json::from_str(
            r#"{"type":"contentExtracted","tabId":3,"url":"https://a.com","title":"A"}"#,
        )
        .unwrap();
        assert!(matches!(event, Event::ContentExtracted { text, .. } if text.is_empty()));
    }

    #[test]
    fn test_command_wire_format() {
        let command: Command = serde_json::from_str(
            r#"{"type":"assignTabToWorkspace","tabId":1,"workspaceId":null}"#,
        )
        .unwrap();
        assert_eq!(
            command,
            Command::AssignTabToWorkspace {
                tab_id: 1,
                workspace_id: None
            }
        );

        let command: Command =
            serde_json::from_str(r#"{"type":"setTabCategory","tabId":2,"category":"Research"}"#)
                .unwrap();
        assert_eq!(
            command,
            Command::SetTabCategory {
                tab_id: 2,
                category: Category::Custom("Research".to_string())
            }
        );
    }

    #[test]
    fn test_bulk_response_reports_partial_failure() {
        let mut outcome: BulkOutcome<TabId> = BulkOutcome::default();
        outcome.succeeded.push(1);
        let response = CommandResponse::bulk("Closed 1 tabs".to_string(), &outcome);
        assert!(response.success);

        outcome.failed.push((2, "gone".to_string()));
        let response = CommandResponse::bulk("Closed 1 tabs".to_string(), &outcome);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("partial_failure"));
        assert_eq!(response.message, "1 of 2 items failed");
        assert_eq!(response.data["succeeded"], json!([1]));
    }
}
