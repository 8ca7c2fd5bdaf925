//! # Redirection Form
//!
//! A description of where and how to send the end user to complete payment.
//! The caller renders or executes it; drivers never perform the redirect
//! themselves.

use serde::{Deserialize, Serialize};

/// HTTP verb for the redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The sole caller-facing output of `pay()`: a target URL, the form fields
/// to submit, and the verb to submit them with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionForm {
    action: String,
    inputs: Vec<(String, String)>,
    method: HttpMethod,
}

impl RedirectionForm {
    /// Create a redirection instruction.
    pub fn new(
        action: impl Into<String>,
        inputs: Vec<(String, String)>,
        method: HttpMethod,
    ) -> Self {
        Self {
            action: action.into(),
            inputs,
            method,
        }
    }

    /// Plain GET redirect with no form fields.
    pub fn get(action: impl Into<String>) -> Self {
        Self::new(action, Vec::new(), HttpMethod::Get)
    }

    /// Auto-submitting POST form.
    pub fn post(action: impl Into<String>, inputs: Vec<(String, String)>) -> Self {
        Self::new(action, inputs, HttpMethod::Post)
    }

    /// Destination URL.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Form fields in submission order.
    pub fn inputs(&self) -> &[(String, String)] {
        &self.inputs
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Render as a self-submitting HTML page.
    ///
    /// Pure view construction; performs no I/O. Callers that redirect at
    /// the HTTP layer (a `Location` header for GET forms) can ignore this.
    pub fn render(&self) -> String {
        let mut fields = String::new();
        for (name, value) in &self.inputs {
            fields.push_str(&format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                escape_html(name),
                escape_html(value)
            ));
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<body onload=\"document.forms[0].submit()\">\n\
             <form action=\"{}\" method=\"{}\">\n{}</form>\n</body>\n</html>\n",
            escape_html(&self.action),
            self.method.as_str(),
            fields
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
