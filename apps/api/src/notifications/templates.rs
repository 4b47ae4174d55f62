//! Fixed email templates.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    MatchReady,
}

impl EmailTemplate {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim() {
            "welcome" => Some(EmailTemplate::Welcome),
            "match_ready" => Some(EmailTemplate::MatchReady),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty())
}

/// Renders a template with caller-supplied data. Missing fields fall back to
/// neutral wording; every interpolated value is HTML-escaped.
pub fn render(template: EmailTemplate, data: &Value, app_url: &str) -> RenderedEmail {
    let greeting = field(data, "name")
        .map(|n| format!("Hi {},", escape_html(n)))
        .unwrap_or_else(|| "Hi,".to_string());
    let app_url = escape_html(app_url);

    match template {
        EmailTemplate::Welcome => RenderedEmail {
            subject: "Welcome to CV Match".to_string(),
            html: format!(
                "<p>{greeting}</p>\
                 <p>Thanks for signing up. Upload your CV, paste a job description \
                 and we will show you how well you match and how to close the gaps.</p>\
                 <p><a href=\"{app_url}\">Get started</a></p>"
            ),
        },
        EmailTemplate::MatchReady => {
            let job = field(data, "job_title")
                .map(escape_html)
                .unwrap_or_else(|| "your target role".to_string());
            let score = data
                .get("score")
                .and_then(|v| v.as_u64())
                .map(|s| format!(" Your match score is <strong>{s}/100</strong>."))
                .unwrap_or_default();
            RenderedEmail {
                subject: format!("Your CV match for {} is ready", unescape_html(&job)),
                html: format!(
                    "<p>{greeting}</p>\
                     <p>Your CV analysis for {job} is ready.{score}</p>\
                     <p><a href=\"{app_url}/dashboard\">View your results</a></p>"
                ),
            }
        }
    }
}

/// Subjects are plain text: undo the escaping applied for the HTML body.
fn unescape_html(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
