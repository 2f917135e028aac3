use super::sendmail::send_email;

pub async fn send_confirmation_code_email(
    to_email: &str,
    username: &str,
    confirmation_code: &str,
    frontend_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Your registration code";
    let template_path = "src/mail/templates/Confirmation-code-email.html";
    let token_link = format!("{}/auth/token", frontend_url);
    let placeholders = vec![
        ("{{username}}".to_string(), username.to_string()),
        (
            "{{confirmation_code}}".to_string(),
            confirmation_code.to_string(),
        ),
        ("{{token_link}}".to_string(), token_link),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}
