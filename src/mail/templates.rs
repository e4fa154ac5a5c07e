use super::OutgoingEmail;

const STYLE: &str = r#"body { font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f9fafb; }
.container { background-color: #ffffff; border-radius: 12px; padding: 40px; }
.logo { font-size: 24px; font-weight: bold; color: #9333ea; text-align: center; }
.title { font-size: 20px; font-weight: 600; color: #1f2937; margin: 20px 0; }
.message { background-color: #f3f4f6; padding: 15px; border-radius: 8px; font-style: italic; }
.alert { background-color: #fef3c7; border-left: 4px solid #f59e0b; padding: 15px; border-radius: 4px; }
.button { display: inline-block; padding: 14px 32px; background: #9333ea; color: #ffffff; text-decoration: none; border-radius: 8px; font-weight: 600; }
.footer { text-align: center; margin-top: 30px; font-size: 12px; color: #6b7280; }"#;

pub fn invitation_email(
    to: &str,
    form_title: &str,
    survey_url: &str,
    recipient_name: Option<&str>,
    message: Option<&str>,
) -> OutgoingEmail {
    let message_block = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| format!(r#"<div class="message">{}</div>"#, escape_html(m)))
        .unwrap_or_default();

    let body = format!(
        r#"<p>{greeting}</p>
<p>You have been invited to take part in the following survey.</p>
<h2 class="title">{title}</h2>
{message_block}
<p>It takes about 5-10 minutes and stays open until its deadline.</p>
<p style="text-align: center;"><a href="{url}" class="button">Start the survey</a></p>
<p style="text-align: center; font-size: 14px;">Or open this link: <a href="{url}">{url}</a></p>"#,
        greeting = greeting(recipient_name),
        title = escape_html(form_title),
        message_block = message_block,
        url = escape_html(survey_url),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: format!("[Survey] You're invited: {}", form_title),
        html: layout("Survey invitation", &body, "Questions about this survey? Reply to the sender directly."),
    }
}

pub fn reminder_email(
    to: &str,
    form_title: &str,
    survey_url: &str,
    recipient_name: Option<&str>,
    days_until_deadline: Option<i64>,
) -> OutgoingEmail {
    let deadline_line = match days_until_deadline {
        Some(1) => "There is <strong>1 day</strong> left before the survey closes.".to_string(),
        Some(days) => format!(
            "There are <strong>{} days</strong> left before the survey closes.",
            days
        ),
        None => "Please respond as soon as you can.".to_string(),
    };

    let body = format!(
        r#"<p>{greeting}</p>
<div class="alert"><strong>We have not received your response yet.</strong><br>{deadline_line}</div>
<div class="title">{title}</div>
<p>Your feedback matters to us. Please take a moment to answer the survey.</p>
<p style="text-align: center;"><a href="{url}" class="button">Respond now</a></p>
<p style="text-align: center; font-size: 14px;"><a href="{url}">{url}</a></p>"#,
        greeting = greeting(recipient_name),
        deadline_line = deadline_line,
        title = escape_html(form_title),
        url = escape_html(survey_url),
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: format!("[Reminder] Please complete the survey: {}", form_title),
        html: layout("Survey reminder", &body, "If you have already responded, you can ignore this email."),
    }
}

fn greeting(recipient_name: Option<&str>) -> String {
    match recipient_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hi {},", escape_html(name)),
        None => "Hello,".to_string(),
    }
}

fn layout(page_title: &str, body: &str, footer_note: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{page_title}</title>
<style>{style}</style>
</head>
<body>
<div class="container">
<div class="logo">FormFlow</div>
{body}
<div class="footer">
<p>This email was sent through FormFlow.</p>
<p>{footer_note}</p>
</div>
</div>
</body>
</html>"#,
        page_title = page_title,
        style = STYLE,
        body = body,
        footer_note = footer_note,
    )
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
            c => out.push(c),
        }
    }
    out
}
