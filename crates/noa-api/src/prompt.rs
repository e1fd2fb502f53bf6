//! Generation prompt assembly.

use noa_protocol::request::ConfigRequest;

/// Build the generation prompt from retrieved CLI blocks and the request.
///
/// Examples appear in the given order, separated by a blank line. The output
/// depends only on the inputs.
pub fn build_prompt<S: AsRef<str>>(examples: &[S], request: &ConfigRequest) -> String {
    let examples = examples
        .iter()
        .map(|example| example.as_ref())
        .collect::<Vec<&str>>()
        .join("\n\n");

    format!(
        "You are a network assistant. Based on the following CLI examples:

{examples}

Generate a configuration for:
- Vendor: {vendor}
- Model: {model}
- OS Version: {os_version}
- Feature: {feature}
- Parameters: {parameters}

Respond only with the CLI configuration block using triple backticks.
",
        vendor = request.vendor,
        model = request.model,
        os_version = request.os_version,
        feature = request.feature,
        parameters = request.parameters,
    )
}
