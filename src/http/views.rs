//! Server-rendered HTML pages.
//!
//! Templates are `maud` macros; every dynamic value is escaped on output.

use axum::http::StatusCode;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::users::{CreateUserForm, User};

/// Whether the last upstream call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Connected,
    Disconnected,
}

impl ApiStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiStatus::Connected => "connected",
            ApiStatus::Disconnected => "disconnected",
        }
    }
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
.status-connected { color: #1a7f37; }
.status-disconnected { color: #cf222e; }
.alert { padding: .75rem 1rem; border-radius: .25rem; margin: 1rem 0; }
.alert-error { background: #ffebe9; }
.alert-success { background: #dafbe1; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: .5rem; border-bottom: 1px solid #d0d7de; }
pre { overflow-x: auto; background: #f6f8fa; padding: 1rem; }
";

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                nav {
                    a href="/" { "Users" }
                    " | "
                    a href="/create" { "Create user" }
                }
                (body)
            }
        }
    }
}

fn alert(kind: &str, message: &str) -> Markup {
    html! {
        div class={ "alert alert-" (kind) } role="alert" { (message) }
    }
}

/// The user list page.
#[derive(Debug)]
pub struct IndexView<'a> {
    pub users: &'a [User],
    pub api_status: ApiStatus,
    pub error: Option<&'a str>,
    pub success: Option<&'a str>,
}

impl IndexView<'_> {
    pub fn render(&self) -> String {
        let status = self.api_status.as_str();
        let body = html! {
            h1 { "Users" }
            p {
                "API status: "
                span class={ "status-" (status) } data-api-status=(status) { (status) }
            }
            @if let Some(success) = self.success {
                (alert("success", success))
            }
            @if let Some(error) = self.error {
                (alert("error", error))
            }
            @if self.users.is_empty() {
                p class="empty" { "No users found." }
            } @else {
                table {
                    thead {
                        tr { th { "ID" } th { "Username" } th { "Email" } th { "Created" } }
                    }
                    tbody {
                        @for user in self.users {
                            tr {
                                td { @if let Some(id) = user.id { (id) } }
                                td { (user.username) }
                                td { (user.email) }
                                td { (user.created_at.as_deref().unwrap_or("")) }
                            }
                        }
                    }
                }
            }
        };
        layout("Users", body).into_string()
    }
}

/// The create-user form, optionally re-rendered with an error.
///
/// The password is never written back into the page.
#[derive(Debug)]
pub struct CreateUserView<'a> {
    pub error: Option<&'a str>,
    pub form: &'a CreateUserForm,
}

impl CreateUserView<'_> {
    pub fn render(&self) -> String {
        let body = html! {
            h1 { "Create user" }
            @if let Some(error) = self.error {
                (alert("error", error))
            }
            form method="post" action="/users" {
                label {
                    "Username "
                    input type="text" name="username" value=(self.form.username) required minlength="3" maxlength="50";
                }
                label {
                    "Email "
                    input type="email" name="email" value=(self.form.email) required;
                }
                label {
                    "Password "
                    input type="password" name="password" required minlength="6";
                }
                button type="submit" { "Create" }
            }
        };
        layout("Create user", body).into_string()
    }
}

/// Error page for browser navigations.
#[derive(Debug)]
pub struct ErrorView<'a> {
    pub status: StatusCode,
    pub message: &'a str,
    pub stack: Option<&'a str>,
}

impl ErrorView<'_> {
    pub fn render(&self) -> String {
        let code = self.status.as_u16();
        let body = html! {
            h1 { (code) }
            p class="error-message" { (self.message) }
            @if let Some(stack) = self.stack {
                pre { (stack) }
            }
        };
        layout(&format!("Error {code}"), body).into_string()
    }
}
