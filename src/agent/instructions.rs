pub const DEFAULT_SYSTEM_PREFIX: &str =
    "You are a useful assistant for answering questions by comparing two documents.";

pub const QUESTION_PLACEHOLDER: &str = "{question}";

pub const DEFAULT_QUESTION_TEMPLATE: &str =
    "document-1とdocument-2について比較し日本語で回答せよ: {question}";

/// Substitutes every `{question}` in `template`.
pub fn render_question(template: &str, question: &str) -> String {
    template.replace(QUESTION_PLACEHOLDER, question)
}

pub fn tool_description(document_label: &str) -> String {
    format!("useful when you want to answer questions about a {document_label}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_wraps_the_question() {
        assert_eq!(
            render_question(DEFAULT_QUESTION_TEMPLATE, "どちらが大きい?"),
            "document-1とdocument-2について比較し日本語で回答せよ: どちらが大きい?"
        );
    }

    #[test]
    fn custom_templates_are_supported() {
        assert_eq!(
            render_question("Compare both and answer in English: {question}", "size?"),
            "Compare both and answer in English: size?"
        );
    }
}
