//! Proxy mode: the message names an operation and supplies typed arguments;
//! the operation is resolved against the configuration's resource interfaces
//! and translated into a request the way a typed REST client would.

use bridge::{
    join_path, BridgeError, Exchange, InvocationRequest, ParamSource, ResolvedMethod,
    ResponseType, TypedValue,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::trace;

use crate::direct::parse_method;
use crate::InvocationEngine;

/// Characters escaped when a value is substituted into one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Replaces every `{name}` placeholder in `template` with `lookup(name)`,
/// percent-encoded as a path segment.
///
/// # Errors
///
/// Returns [`BridgeError::MalformedInput`] if a placeholder is unterminated
/// or `lookup` has no value for it.
pub fn expand_template(
    template: &str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> Result<String, BridgeError> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = closing_brace(after).ok_or_else(|| {
            BridgeError::malformed(format!("unterminated template variable in '{template}'"))
        })?;
        // `{id: [0-9]+}` declares a pattern; only the name is substituted.
        let name = after[..close].split(':').next().unwrap_or_default().trim();
        let value = lookup(name).ok_or_else(|| {
            BridgeError::malformed(format!(
                "no value for template variable '{name}' in '{template}'"
            ))
        })?;
        expanded.extend(utf8_percent_encode(&value, PATH_SEGMENT));
        rest = &after[close + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Offset of the `}` closing a variable whose `{` precedes `text`. Braces in
/// a pattern such as `[0-9]{3}` nest.
fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(offset),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// The request a resolved method translates to, before it is bound to a
/// destination.
fn method_request(
    resolved: &ResolvedMethod<'_>,
    base: String,
    arguments: &[TypedValue],
) -> Result<InvocationRequest, BridgeError> {
    let method = resolved.method;
    let mut request = InvocationRequest::new(parse_method(&method.http_method)?, base);

    let path = expand_template(&method.path, |name| {
        method
            .params
            .iter()
            .zip(arguments)
            .find(|(spec, _)| matches!(&spec.source, ParamSource::Path(p) if p == name))
            .map(|(_, arg)| arg.to_text())
    })?;
    if !path.is_empty() {
        request.path = Some(path);
    }

    for (spec, arg) in method.params.iter().zip(arguments) {
        match &spec.source {
            ParamSource::Path(_) => {}
            ParamSource::Query(name) => {
                request.query.insert(name.clone(), arg.to_text());
            }
            ParamSource::Header(name) => {
                request.headers.insert(name.clone(), arg.to_text());
            }
            ParamSource::Body => {
                if request.method != http::Method::GET {
                    request.body = Some(arg.to_bytes());
                }
            }
        }
    }
    Ok(request)
}

impl InvocationEngine {
    /// Proxy mode.
    ///
    /// The inbound body supplies the arguments (see
    /// [`bridge::Body::into_arguments`]). When the message carries
    /// path-template values they fill the resource interface's path
    /// variables in order of appearance.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::MalformedInput`] — no operation name, unfilled or
    ///   malformed path template, invalid declared HTTP method.
    /// - [`BridgeError::MethodResolution`] — no interface declares a matching
    ///   method.
    /// - [`BridgeError::Configuration`], [`BridgeError::Transport`],
    ///   [`BridgeError::RemoteInvocation`], [`BridgeError::Conversion`].
    pub(crate) async fn invoke_proxy(&self, exchange: &mut Exchange) -> Result<(), BridgeError> {
        let message = exchange.in_message();
        let metadata = &message.metadata;

        let operation = metadata
            .operation_name
            .clone()
            .ok_or_else(|| BridgeError::malformed("operation name not set on message"))?;
        let config = self.cache.get(&self.effective_address(message))?;

        let arguments = message.body.clone().into_arguments();
        let resolved = config.registry().resolve(&operation, &arguments)?;
        trace!(
            exchange = %exchange.id(),
            %operation,
            interface = %resolved.interface.name,
            "Proxy invocation"
        );

        let mut path_values = metadata.path_values.iter().flatten();
        let interface_path =
            expand_template(&resolved.interface.path, |_| path_values.next().cloned())?;
        let surplus = path_values.count();
        if surplus > 0 {
            return Err(BridgeError::malformed(format!(
                "{surplus} path value(s) left over after expanding '{}'",
                resolved.interface.path
            )));
        }
        let base = join_path(config.address().as_str(), &interface_path);

        let request = method_request(&resolved, base, &arguments)?;
        let response_type: ResponseType = resolved.method.returns;

        let response = config.execute(request).await?;
        self.complete(exchange, response, response_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_named_variables_with_encoding() {
        let expanded = expand_template("/customers/{id}/orders/{order}", |name| match name {
            "id" => Some("a b/c".to_string()),
            "order" => Some("7".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(expanded, "/customers/a%20b%2Fc/orders/7");
    }

    #[test]
    fn pattern_suffix_is_ignored_when_substituting() {
        let expanded = expand_template("/items/{id: [0-9]+}", |name| {
            (name == "id").then(|| "42".to_string())
        })
        .unwrap();
        assert_eq!(expanded, "/items/42");
    }

    #[test]
    fn pattern_with_a_quantifier_closes_at_the_matching_brace() {
        let expanded = expand_template("/items/{id: [0-9]{3}}/detail", |name| {
            (name == "id").then(|| "042".to_string())
        })
        .unwrap();
        assert_eq!(expanded, "/items/042/detail");

        assert!(matches!(
            expand_template("/items/{id: [0-9]{3}", |_| Some("1".into())),
            Err(BridgeError::MalformedInput { .. })
        ));
    }

    #[test]
    fn missing_values_and_broken_templates_are_malformed() {
        assert!(matches!(
            expand_template("/tenants/{tenant}", |_| None),
            Err(BridgeError::MalformedInput { .. })
        ));
        assert!(matches!(
            expand_template("/tenants/{tenant", |_| Some("x".into())),
            Err(BridgeError::MalformedInput { .. })
        ));
        assert_eq!(expand_template("/plain", |_| None).unwrap(), "/plain");
    }
}
