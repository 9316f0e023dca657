//! Client communication messages and the built-in per-status templates.

use serde::{Deserialize, Serialize};

use super::enums::ChannelKind;

/// An outbound message ready to hand to the backend's communication API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub customer_id: String,
    pub channel: ChannelKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
}

/// Variables available to template rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars<'a> {
    pub customer_name: &'a str,
    pub tax_year: &'a str,
    pub firm_name: &'a str,
    pub missing_items: &'a str,
    pub refund_info: &'a str,
}

/// A fill-in-the-blanks message template tied to a return status.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    pub trigger_status: &'static str,
    pub subject_template: Option<&'static str>,
    pub body_template: &'static str,
    pub channel: ChannelKind,
}

impl MessageTemplate {
    /// Substitute placeholders. Unknown placeholders are left untouched so
    /// a template typo shows up in the rendered output instead of failing.
    pub fn render(&self, vars: &TemplateVars<'_>) -> (Option<String>, String) {
        let subject = self.subject_template.map(|s| fill(s, vars));
        let body = fill(self.body_template, vars);
        (subject, body)
    }
}

fn fill(template: &str, vars: &TemplateVars<'_>) -> String {
    template
        .replace("{customer_name}", vars.customer_name)
        .replace("{tax_year}", vars.tax_year)
        .replace("{firm_name}", vars.firm_name)
        .replace("{missing_items}", vars.missing_items)
        .replace("{refund_info}", vars.refund_info)
}

/// Look up the built-in template for a return status, if one exists.
/// Statuses without a template fall through to AI-generated messages.
pub fn template_for(status: &str) -> Option<MessageTemplate> {
    let template = match status {
        "documents_complete" => MessageTemplate {
            trigger_status: "documents_complete",
            subject_template: Some("{firm_name} - Documents Received for {tax_year}"),
            body_template: "Dear {customer_name},\n\n\
                We have received all your tax documents for {tax_year}. Your return is now in our preparation queue.\n\n\
                We will contact you when your return is ready for review.\n\n\
                Thank you for choosing {firm_name}.\n\n\
                Best regards,\n{firm_name}",
            channel: ChannelKind::Email,
        },
        "ready_for_signing" => MessageTemplate {
            trigger_status: "ready_for_signing",
            subject_template: Some("Your {tax_year} Tax Return is Ready - {firm_name}"),
            body_template: "Dear {customer_name},\n\n\
                Great news! Your {tax_year} tax return is complete and ready for your signature.\n\n\
                Please call our office or reply to this email to schedule a time to review and sign your return.\n\n\
                You can also:\n\
                - Stop by our office during business hours\n\
                - Request electronic signing via our client portal\n\n\
                Thank you for your patience!\n\n\
                Best regards,\n{firm_name}",
            channel: ChannelKind::Email,
        },
        "waiting_on_client" => MessageTemplate {
            trigger_status: "waiting_on_client",
            subject_template: Some("Action Required: Missing Information for {tax_year} Return"),
            body_template: "Dear {customer_name},\n\n\
                We are working on your {tax_year} tax return and need additional information from you:\n\n\
                {missing_items}\n\n\
                Please provide this information as soon as possible so we can complete your return.\n\n\
                You can:\n\
                - Upload documents through our client portal\n\
                - Reply to this email with attachments\n\
                - Drop them off at our office\n\n\
                If you have any questions, please don't hesitate to contact us.\n\n\
                Best regards,\n{firm_name}",
            channel: ChannelKind::Email,
        },
        "filed" => MessageTemplate {
            trigger_status: "filed",
            subject_template: Some("Your {tax_year} Tax Return Has Been Filed!"),
            body_template: "Dear {customer_name},\n\n\
                Your {tax_year} tax return has been successfully filed with the IRS.\n\n\
                {refund_info}\n\n\
                Please keep a copy of your return for your records. If you have any questions, don't hesitate to reach out.\n\n\
                Thank you for choosing {firm_name} for your tax needs!\n\n\
                Best regards,\n{firm_name}",
            channel: ChannelKind::Email,
        },
        _ => return None,
    };
    Some(template)
}
