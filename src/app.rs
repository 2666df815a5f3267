//! Application shell: which view is showing and how user actions are dispatched.
//!
//! Every action error is caught here and turned into an inline notice, so a
//! failed action never takes the rendered view down with it.

use crate::error::TaskResult;
use crate::filter::TaskFilter;
use crate::manager::TaskListManager;
use crate::types::{Task, UserProfile};
use chrono::NaiveDate;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    SignIn,
    Tasks,
}

/// A discrete user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create(String),
    ToggleComplete(String),
    TogglePriority(String),
    SetDueDate(String, Option<NaiveDate>),
    SetTag(String, Option<String>),
    SetDependencies(String, Vec<String>),
    SetRecurrence(String, Option<String>),
    ToggleTimeTracking(String),
    AddSubtask(String, String),
    ToggleSubtask(String, String),
    Delete(String),
    AddTag(String),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Create(_) => "create",
            Action::ToggleComplete(_) => "toggle_complete",
            Action::TogglePriority(_) => "toggle_priority",
            Action::SetDueDate(..) => "set_due_date",
            Action::SetTag(..) => "set_tag",
            Action::SetDependencies(..) => "set_dependencies",
            Action::SetRecurrence(..) => "set_recurrence",
            Action::ToggleTimeTracking(_) => "toggle_time_tracking",
            Action::AddSubtask(..) => "add_subtask",
            Action::ToggleSubtask(..) => "toggle_subtask",
            Action::Delete(_) => "delete",
            Action::AddTag(_) => "add_tag",
        }
    }
}

pub struct App {
    view: View,
    manager: TaskListManager,
    notice: Option<String>,
    pub filter: TaskFilter,
}

impl App {
    /// A remembered email skips the landing view on return visits.
    pub fn new(manager: TaskListManager, remembered_email: Option<&str>) -> Self {
        let view = if remembered_email.is_some() {
            View::Tasks
        } else {
            View::Landing
        };
        Self {
            view,
            manager,
            notice: None,
            filter: TaskFilter::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn manager(&self) -> &TaskListManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut TaskListManager {
        &mut self.manager
    }

    pub fn get_started(&mut self) {
        if self.view == View::Landing {
            self.view = View::SignIn;
        }
    }

    pub fn back_to_landing(&mut self) {
        if self.view == View::SignIn {
            self.view = View::Landing;
        }
    }

    /// Identity callback: the provider's answer overrides any remembered state.
    pub async fn on_auth_changed(&mut self, profile: Option<UserProfile>) {
        match profile {
            Some(profile) => {
                let already_attached = self
                    .manager
                    .profile()
                    .is_some_and(|p| p.email == profile.email);
                if !already_attached {
                    if let Err(e) = self.manager.attach(profile).await {
                        warn!(error = %e, "Failed to open task subscription");
                        self.notice = Some(e.to_string());
                    }
                }
                self.view = View::Tasks;
            }
            None => {
                self.manager.detach();
                if self.view == View::Tasks {
                    self.view = View::Landing;
                }
                info!("Signed out, returning to landing view");
            }
        }
    }

    /// Pull in any snapshot the store has published.
    pub fn on_remote_change(&mut self) -> bool {
        self.manager.refresh()
    }

    /// Run one action. Failures become the inline notice.
    pub async fn dispatch(&mut self, action: Action) {
        let name = action.name();
        match self.run(action).await {
            Ok(()) => self.notice = None,
            Err(e) => {
                warn!(action = name, code = ?e.code, error = %e, "Action failed");
                self.notice = Some(e.to_string());
            }
        }
    }

    async fn run(&mut self, action: Action) -> TaskResult<()> {
        let manager = &mut self.manager;
        match action {
            Action::Create(text) => manager.create(&text).await.map(|_| ()),
            Action::ToggleComplete(id) => manager.toggle_complete(&id).await,
            Action::TogglePriority(id) => manager.toggle_priority(&id).await,
            Action::SetDueDate(id, date) => manager.set_due_date(&id, date).await,
            Action::SetTag(id, tag) => manager.set_tag(&id, tag.as_deref()).await,
            Action::SetDependencies(id, deps) => manager.set_dependencies(&id, deps).await,
            Action::SetRecurrence(id, rule) => manager.set_recurrence(&id, rule.as_deref()).await,
            Action::ToggleTimeTracking(id) => manager.toggle_time_tracking(&id).await.map(|_| ()),
            Action::AddSubtask(id, text) => manager.add_subtask(&id, &text).await.map(|_| ()),
            Action::ToggleSubtask(id, subtask_id) => {
                manager.toggle_subtask_complete(&id, &subtask_id).await
            }
            Action::Delete(id) => manager.delete(&id).await,
            Action::AddTag(tag) => manager.add_tag(&tag),
        }
    }

    /// Tasks visible under the current filter.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.manager.view(&self.filter)
    }

    /// `Hi, <first name>` for the signed-in user.
    pub fn greeting(&self) -> String {
        let first = self.manager.profile().map(|p| p.first_name()).unwrap_or("");
        format!("Hi, {}", first)
    }
}
