//! The rendering seam.
//!
//! Page markup is the embedding application's concern; the handlers only
//! produce a context and hand it to a [`TemplateRenderer`].
//! [`BasicFormRenderer`] is a dependency-free implementation good enough for
//! development and the test suite.

use super::forms::{ChangePasswordContext, LoginContext, SignupContext};
use crate::csrf::CSRF_FIELD;

/// One renderable page with its context.
#[derive(Debug)]
pub enum View<'a> {
    Login(&'a LoginContext),
    Signup(&'a SignupContext),
    ChangePassword(&'a ChangePasswordContext),
}

/// Renders a view to an HTML body.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, view: &View<'_>) -> String;
}

/// Minimal built-in forms: no styling, correct field names, escaped values.
pub struct BasicFormRenderer;

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: String) -> String {
    format!(
        "<!doctype html>\n<html><head><title>{title}</title></head><body>\n{body}</body></html>\n"
    )
}

fn error_line(error: Option<&String>) -> String {
    error.map_or_else(String::new, |e| {
        format!("<p class=\"error\">{}</p>\n", escape_html(e))
    })
}

fn csrf_input(token: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"{CSRF_FIELD}\" value=\"{}\">\n",
        escape_html(token)
    )
}

impl TemplateRenderer for BasicFormRenderer {
    fn render(&self, view: &View<'_>) -> String {
        match view {
            View::Login(ctx) => {
                let body = format!(
                    "{error}<form method=\"post\">\n\
                     <input type=\"email\" name=\"email\" value=\"{email}\">\n\
                     <input type=\"password\" name=\"password\">\n\
                     {csrf}\
                     <button type=\"submit\">Log in</button>\n\
                     </form>\n\
                     <a href=\"{oauth}\">Log in with Facebook</a>\n",
                    error = error_line(ctx.error.as_ref()),
                    email = escape_html(&ctx.email),
                    csrf = csrf_input(&ctx.csrf_token),
                    oauth = escape_html(&ctx.oauth_url),
                );
                page("Log in", body)
            }
            View::Signup(ctx) => {
                let errors: String = ctx
                    .errors
                    .iter()
                    .map(|(field, message)| {
                        format!(
                            "<p class=\"error\" data-field=\"{field}\">{}</p>\n",
                            escape_html(message)
                        )
                    })
                    .collect();
                let body = format!(
                    "{errors}<form method=\"post\">\n\
                     <input type=\"email\" name=\"email\" value=\"{email}\">\n\
                     <input type=\"password\" name=\"password\" minlength=\"{min}\">\n\
                     <input type=\"password\" name=\"password2\">\n\
                     {csrf}\
                     <button type=\"submit\">Sign up</button>\n\
                     </form>\n",
                    email = escape_html(&ctx.email),
                    min = ctx.min_password_len,
                    csrf = csrf_input(&ctx.csrf_token),
                );
                page("Sign up", body)
            }
            View::ChangePassword(ctx) => {
                let message = ctx.message.as_ref().map_or_else(String::new, |m| {
                    format!("<p class=\"message\">{}</p>\n", escape_html(m))
                });
                let body = format!(
                    "{error}{message}<form method=\"post\">\n\
                     <input type=\"password\" name=\"old_password\">\n\
                     <input type=\"password\" name=\"new_password\">\n\
                     <input type=\"password\" name=\"confirm_new_password\">\n\
                     {csrf}\
                     <button type=\"submit\">Change password</button>\n\
                     </form>\n",
                    error = error_line(ctx.error.as_ref()),
                    csrf = csrf_input(&ctx.csrf_token),
                );
                page("Change password", body)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn login_view_embeds_token_email_and_error() {
        let ctx = LoginContext {
            email: "a@example.com".to_owned(),
            error: Some("Invalid email or password".to_owned()),
            oauth_url: "/login/oauth-start".to_owned(),
            csrf_token: "tok123".to_owned(),
        };
        let html = BasicFormRenderer.render(&View::Login(&ctx));

        assert!(html.contains("name=\"csrf_token\" value=\"tok123\""));
        assert!(html.contains("value=\"a@example.com\""));
        assert!(html.contains("Invalid email or password"));
        assert!(html.contains("href=\"/login/oauth-start\""));
    }

    #[test]
    fn signup_view_lists_field_errors() {
        let mut errors = BTreeMap::new();
        errors.insert("email", "User already exists".to_owned());
        let ctx = SignupContext {
            email: "a@example.com".to_owned(),
            min_password_len: 4,
            errors,
            csrf_token: "tok".to_owned(),
        };
        let html = BasicFormRenderer.render(&View::Signup(&ctx));

        assert!(html.contains("data-field=\"email\""));
        assert!(html.contains("User already exists"));
    }

    #[test]
    fn user_input_is_escaped() {
        let ctx = LoginContext {
            email: "<script>alert(1)</script>".to_owned(),
            error: None,
            oauth_url: "/login/oauth-start".to_owned(),
            csrf_token: "tok".to_owned(),
        };
        let html = BasicFormRenderer.render(&View::Login(&ctx));

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
